//! Command line interface for inspecting written grid files.

use crate::{
    exit_on_error,
    geometry::Dim3,
    io::vtk::{reading, COORDINATE_ARRAY_NAMES},
};
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

/// Builds a representation of the `inspect` command line subcommand.
pub fn create_inspect_subcommand() -> Command<'static> {
    Command::new("inspect")
        .about("Print a summary of a VTK rectilinear grid file")
        .arg(
            Arg::new("input-file")
                .value_name("INPUT_FILE")
                .help("Path to the grid file to inspect")
                .required(true)
                .takes_value(true),
        )
}

/// Runs the actions for the `inspect` subcommand using the given arguments.
pub fn run_inspect_subcommand(arguments: &ArgMatches) {
    let input_file_path = PathBuf::from(
        arguments
            .value_of("input-file")
            .expect("No value for required argument"),
    );

    let content = exit_on_error!(
        reading::read_rectilinear_grid_file(&input_file_path),
        "Error: Could not read grid file {0}: {1}",
        input_file_path.display()
    );

    let shape = content.shape();
    println!("File: {}", input_file_path.display());
    println!(
        "Extent: 0 {} 0 {} 0 {}",
        shape[Dim3::X] - 1,
        shape[Dim3::Y] - 1,
        shape[Dim3::Z] - 1
    );
    for dim in Dim3::slice() {
        print_array_summary(COORDINATE_ARRAY_NAMES[dim.num()], &content.coords()[dim]);
    }
    for name in content.point_data_names() {
        if let Some(values) = content.point_data(name) {
            print_array_summary(name, values);
        }
    }
}

fn print_array_summary(name: &str, values: &[f64]) {
    match find_range(values) {
        Some((min, max)) => println!(
            "{}: {} values in [{}, {}]",
            name,
            values.len(),
            min,
            max
        ),
        None => println!("{}: {} values, none finite", name, values.len()),
    }
}

fn find_range(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|value| value.is_finite())
        .fold(None, |range, value| match range {
            None => Some((value, value)),
            Some((min, max)) => Some((f64::min(min, value), f64::max(max, value))),
        })
}
