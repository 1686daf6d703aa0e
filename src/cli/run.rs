//! Function for running the command line program.

use super::{build, generate::run_generation, inspect::run_inspect_subcommand};
use clap::ArgMatches;
use std::time::Instant;

/// Runs the `pitchfork_mesh` command line program.
pub fn run() {
    run_with_args(build::build().get_matches());
}

/// Runs the command line program with already parsed arguments.
pub fn run_with_args(arguments: ArgMatches) {
    let start_instant = Instant::now();

    if let Some(inspect_arguments) = arguments.subcommand_matches("inspect") {
        run_inspect_subcommand(inspect_arguments);
    } else {
        run_generation(&arguments);
    }

    if arguments.is_present("timing") {
        println!("Elapsed time: {} s", start_instant.elapsed().as_secs_f64());
    }
}
