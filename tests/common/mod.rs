use clap::Command;
use lazy_static::lazy_static;
use pitchfork_mesh::{
    cli, exit_on_error,
    io::vtk::reading::{self, RectilinearGridFileContent},
};
use std::{
    ffi::OsString,
    iter,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

lazy_static! {
    static ref COMMAND: Command<'static> = cli::build::build();
}

#[macro_export]
macro_rules! def_test {
    (
        OUT[$($out_ident:ident = $out_str:expr),*]
        fn $name:ident $test_body:expr
    ) => {
        #[test]
        fn $name() {
            let test = common::Test::new(stringify!($name));

            $( let $out_ident = test.output_path($out_str); )*

            let test_body = |$( $out_ident, )*| $test_body;

            test_body(
                $( path_str!($out_ident), )*
            );
        }
    };
}

#[macro_export]
macro_rules! path_str {
    ($path:expr) => {
        $path.to_string_lossy().as_ref()
    };
}

/// Runs the command line program with the given arguments, excluding the
/// program name.
pub fn run<I, T>(args: I)
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args = iter::once(OsString::from(clap::crate_name!()))
        .chain(args.into_iter().map(Into::into));
    cli::run::run_with_args(COMMAND.clone().get_matches_from(args));
}

pub fn read_grid_file<P: AsRef<Path>>(file_path: P) -> RectilinearGridFileContent {
    let file_path = file_path.as_ref();
    exit_on_error!(
        reading::read_rectilinear_grid_file(file_path),
        "Error: Could not read grid file {0}: {1}",
        file_path.display()
    )
}

pub fn assert_file_exists<P: AsRef<Path>>(file_path: P) {
    let file_path = file_path.as_ref();
    let exists = file_path.exists();
    assert!(
        exists,
        "File {} does not exist",
        file_path.to_string_lossy()
    );
}

pub fn assert_files_identical<P1, P2>(file_path_1: P1, file_path_2: P2)
where
    P1: AsRef<Path>,
    P2: AsRef<Path>,
{
    let file_path_1 = file_path_1.as_ref();
    let file_path_2 = file_path_2.as_ref();

    let content_1 = exit_on_error!(
        std::fs::read(file_path_1),
        "Error: Could not read file for comparison: {}"
    );
    let content_2 = exit_on_error!(
        std::fs::read(file_path_2),
        "Error: Could not read file for comparison: {}"
    );
    assert!(
        content_1 == content_2,
        "Files {} and {} not identical",
        file_path_1.to_string_lossy(),
        file_path_2.to_string_lossy()
    );
}

#[derive(Debug)]
pub struct Test {
    output_dir: TempDir,
}

impl Test {
    pub fn new<S: AsRef<str>>(name: S) -> Self {
        let name = name.as_ref();
        let output_dir = exit_on_error!(
            tempfile::Builder::new().prefix(name).tempdir(),
            "Error: Could not prepare output directory for test {}: {}",
            name
        );
        Self { output_dir }
    }

    pub fn output_path<S: AsRef<str>>(&self, file_name: S) -> PathBuf {
        self.output_dir.path().join(file_name.as_ref())
    }
}
