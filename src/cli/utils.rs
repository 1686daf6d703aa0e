//! Utilities for creating the command line interface.

use crate::{exit_on_error, exit_on_false, io::Verbosity, num::BFloat};
use clap::ArgMatches;
use std::{fmt, str::FromStr};

pub fn parse_value_string<T>(argument_name: &str, value_string: &str) -> T
where
    T: FromStr,
    <T as FromStr>::Err: fmt::Display,
{
    exit_on_error!(
        value_string.parse(),
        "Error: Could not parse value for {0}: {1}",
        argument_name
    )
}

fn verify_finite_float_value<F: BFloat>(argument_name: &str, value: F) {
    exit_on_false!(value.is_finite(), "Error: {} must be finite", argument_name);
}

pub fn verify_argument_value_count<T>(argument_name: &str, values: &[T], required_count: usize) {
    let count = values.len();
    exit_on_false!(
        count == required_count,
        "Error: {} must have {} values, got {}",
        argument_name,
        required_count,
        count
    );
}

pub fn get_value_from_parseable_argument_with_custom_default<T, D>(
    arguments: &ArgMatches,
    argument_name: &str,
    default_constructor: &D,
) -> T
where
    T: FromStr,
    <T as FromStr>::Err: fmt::Display,
    D: Fn() -> T,
{
    if let Some(value_string) = arguments.value_of(argument_name) {
        parse_value_string(argument_name, value_string)
    } else {
        default_constructor()
    }
}

pub fn get_values_from_parseable_argument_with_custom_defaults<T, D>(
    arguments: &ArgMatches,
    argument_name: &str,
    default_constructor: &D,
) -> Vec<T>
where
    T: FromStr,
    <T as FromStr>::Err: fmt::Display,
    D: Fn() -> Vec<T>,
{
    if let Some(value_strings) = arguments.values_of(argument_name) {
        value_strings
            .map(|value_string| parse_value_string(argument_name, value_string))
            .collect()
    } else {
        default_constructor()
    }
}

pub fn get_finite_float_values_from_parseable_argument_with_custom_defaults<F, D>(
    arguments: &ArgMatches,
    argument_name: &str,
    default_constructor: &D,
) -> Vec<F>
where
    F: BFloat + FromStr,
    <F as FromStr>::Err: fmt::Display,
    D: Fn() -> Vec<F>,
{
    let values = get_values_from_parseable_argument_with_custom_defaults(
        arguments,
        argument_name,
        default_constructor,
    );
    values
        .iter()
        .for_each(|&value| verify_finite_float_value(argument_name, value));
    values
}

pub fn parse_verbosity(arguments: &ArgMatches) -> Verbosity {
    if arguments.is_present("progress") {
        Verbosity::Progress
    } else if arguments.is_present("verbose") {
        Verbosity::Messages
    } else {
        Verbosity::Quiet
    }
}
