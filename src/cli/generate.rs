//! Command line interface for generating the pitchfork unfolding grid file.

use super::utils;
use crate::{
    exit_on_error, exit_on_false,
    generation::{self, GenerationReport, GeneratorConfig},
    geometry::In3D,
    io::{
        vtk::{self, Encoding},
        OverwriteMode,
    },
    unfolding::ALPHA_2_KEYFRAMES,
};
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

/// Adds the arguments controlling grid file generation to the given command.
pub fn add_generation_arguments(command: Command<'static>) -> Command<'static> {
    command
        .arg(
            Arg::new("output-file")
                .value_name("OUTPUT_FILE")
                .help(
                    "Path where the grid file should be created\n\
                     [default: ./pitchforkMesh.vtr]",
                )
                .takes_value(true),
        )
        .arg(
            Arg::new("shape")
                .short('s')
                .long("shape")
                .require_equals(true)
                .use_value_delimiter(true)
                .require_value_delimiter(true)
                .value_names(&["NX", "NY", "NZ"])
                .help(
                    "Number of samples along the alpha, lambda and x axes\n\
                     [default: 101,101,101]",
                )
                .takes_value(true),
        )
        .arg(
            Arg::new("axis-bounds")
                .short('b')
                .long("axis-bounds")
                .require_equals(true)
                .use_value_delimiter(true)
                .require_value_delimiter(true)
                .allow_hyphen_values(true)
                .value_names(&["LOWER", "UPPER"])
                .help(
                    "Bounds of the evenly spaced values that are cubed into axis coordinates\n\
                     [default: -3,3]",
                )
                .takes_value(true),
        )
        .arg(
            Arg::new("encoding")
                .short('e')
                .long("encoding")
                .require_equals(true)
                .value_name("ENCODING")
                .possible_values(["raw", "ascii"])
                .help("How to store the data arrays in the file [default: raw]")
                .takes_value(true),
        )
        .arg(
            Arg::new("single-precision")
                .long("single-precision")
                .help("Write 32-bit instead of 64-bit floats"),
        )
        .arg(
            Arg::new("overwrite")
                .long("overwrite")
                .help("Overwrite any existing output file (default)"),
        )
        .arg(
            Arg::new("no-overwrite")
                .long("no-overwrite")
                .conflicts_with("overwrite")
                .help("Keep an existing output file instead of replacing it"),
        )
        .arg(
            Arg::new("print-keyframes")
                .long("print-keyframes")
                .help("Print the contour value keyframes animating alpha_2 and exit"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print status messages"),
        )
        .arg(
            Arg::new("progress")
                .short('p')
                .long("progress")
                .help("Print status messages and show progress bars"),
        )
}

/// Runs grid file generation using the given arguments.
pub fn run_generation(arguments: &ArgMatches) {
    if arguments.is_present("print-keyframes") {
        print_keyframes();
        return;
    }

    let config = configure_generation(arguments);

    let report = if arguments.is_present("single-precision") {
        generation::generate::<f32>(&config)
    } else {
        generation::generate::<f64>(&config)
    };
    let report = exit_on_error!(report, "Error: Could not generate grid file: {}");

    if config.verbosity.print_messages() {
        print_report(&report);
    }
}

/// Builds a generator configuration from the given arguments, using the
/// default configuration for anything not specified.
pub fn configure_generation(arguments: &ArgMatches) -> GeneratorConfig {
    let default_config = GeneratorConfig::default();

    let shape: Vec<usize> = utils::get_values_from_parseable_argument_with_custom_defaults(
        arguments,
        "shape",
        &|| default_config.shape.into_iter().copied().collect(),
    );
    utils::verify_argument_value_count("shape", &shape, 3);

    let axis_bounds: Vec<f64> =
        utils::get_finite_float_values_from_parseable_argument_with_custom_defaults(
            arguments,
            "axis-bounds",
            &|| vec![default_config.axis_bounds.0, default_config.axis_bounds.1],
        );
    utils::verify_argument_value_count("axis-bounds", &axis_bounds, 2);
    exit_on_false!(
        axis_bounds[1] > axis_bounds[0],
        "Error: Upper axis bound must be larger than lower bound"
    );

    let mut output_file_path = arguments
        .value_of("output-file")
        .map(PathBuf::from)
        .unwrap_or_else(generation::default_output_file_path);
    if output_file_path.extension().is_none() {
        output_file_path.set_extension(vtk::FILE_EXTENSION);
    }

    let encoding: Encoding = utils::get_value_from_parseable_argument_with_custom_default(
        arguments,
        "encoding",
        &|| default_config.encoding,
    );

    let overwrite_mode = if arguments.is_present("no-overwrite") {
        OverwriteMode::Never
    } else {
        OverwriteMode::Always
    };

    GeneratorConfig {
        shape: In3D::new(shape[0], shape[1], shape[2]),
        axis_bounds: (axis_bounds[0], axis_bounds[1]),
        output_file_path,
        encoding,
        overwrite_mode,
        verbosity: utils::parse_verbosity(arguments),
        ..default_config
    }
}

fn print_keyframes() {
    println!("Contour value keyframes for G sweeping alpha_2:");
    println!("{:>6}  {:>7}", "time", "alpha_2");
    for (time, contour_value) in ALPHA_2_KEYFRAMES {
        println!("{:>6.2}  {:>7.3}", time, contour_value);
    }
}

fn print_report(report: &GenerationReport) {
    if !report.written {
        return;
    }
    println!(
        "Wrote {} grid points to {}",
        report.n_points,
        report.output_file_path.display()
    );
    if let Some((min, max)) = report.value_range {
        println!("G range: [{}, {}]", min, max);
    }
    if let Some((min, max)) = report.state_derivative_range {
        println!("G_x range: [{}, {}]", min, max);
    }
    let counts = &report.stability_counts;
    println!(
        "Stable points: {}, unstable points: {}, bifurcation points: {}",
        counts.stable, counts.unstable, counts.bifurcating
    );
}
