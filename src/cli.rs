//! Command line interface.

pub mod build;
pub mod generate;
pub mod inspect;
pub mod run;
pub mod utils;
