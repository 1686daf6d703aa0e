//! Function for building the command line hierarchy.

use super::{generate::add_generation_arguments, inspect::create_inspect_subcommand};
use clap::{self, Arg, Command};

/// Build the `pitchfork_mesh` command line hierarchy.
pub fn build() -> Command<'static> {
    let command = Command::new(clap::crate_name!())
        .version(clap::crate_version!())
        .about(clap::crate_description!())
        .disable_help_subcommand(true)
        .arg(
            Arg::new("timing")
                .short('t')
                .long("timing")
                .global(true)
                .help("Display elapsed time when done"),
        )
        .subcommand(create_inspect_subcommand());
    add_generation_arguments(command)
}
