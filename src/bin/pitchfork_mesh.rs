//! Command line runner for the `pitchfork_mesh` library.

#[cfg(not(feature = "for-testing"))]
#[quit::main]
fn main() {
    pitchfork_mesh::cli::run::run();
}

#[cfg(feature = "for-testing")]
fn main() {
    eprintln!(
        "Warning: The `for-testing` feature is enabled, which will clutter error messages\n\
         Tip: Build without the `for-testing` feature for regular use"
    );
    pitchfork_mesh::cli::run::run();
}
