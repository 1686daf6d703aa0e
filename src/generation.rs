//! Generation of the pitchfork unfolding grid file.

use crate::{
    field::{FieldNames, StabilityCounts, UnfoldingFields},
    geometry::In3D,
    grid::RectilinearGrid3,
    io::{
        vtk::{self, Encoding, VtkFloat},
        OverwriteMode, Verbosity,
    },
    num,
    unfolding::PitchforkUnfolding,
};
use std::{io, path::PathBuf, sync::Arc};

/// Number of samples along each axis of the default grid.
pub const DEFAULT_SAMPLE_COUNT: usize = 101;

/// Lower and upper bound of the evenly spaced values that are cubically
/// remapped into axis coordinates.
pub const DEFAULT_AXIS_BOUNDS: (f64, f64) = (-3.0, 3.0);

/// Base name of the default output file.
pub const DEFAULT_OUTPUT_BASENAME: &str = "pitchforkMesh";

/// Configuration parameters for generating the grid file.
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    /// Number of samples along the auxiliary parameter, main parameter
    /// and state axes (x, y and z in the file).
    pub shape: In3D<usize>,
    /// Bounds shared by all three axes.
    pub axis_bounds: (f64, f64),
    /// Path of the output file.
    pub output_file_path: PathBuf,
    /// Names of the point data arrays.
    pub field_names: FieldNames,
    /// How the arrays are stored in the output file.
    pub encoding: Encoding,
    /// What to do if the output file exists.
    pub overwrite_mode: OverwriteMode,
    pub verbosity: Verbosity,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            shape: In3D::same(DEFAULT_SAMPLE_COUNT),
            axis_bounds: DEFAULT_AXIS_BOUNDS,
            output_file_path: default_output_file_path(),
            field_names: FieldNames::default(),
            encoding: Encoding::RawAppended,
            overwrite_mode: OverwriteMode::Always,
            verbosity: Verbosity::Quiet,
        }
    }
}

/// Returns the path `./pitchforkMesh.vtr`.
pub fn default_output_file_path() -> PathBuf {
    PathBuf::from(".")
        .join(DEFAULT_OUTPUT_BASENAME)
        .with_extension(vtk::FILE_EXTENSION)
}

/// Summary of a completed generation.
#[derive(Clone, Debug)]
pub struct GenerationReport {
    pub output_file_path: PathBuf,
    /// Whether the file was written, as opposed to an existing file being kept.
    pub written: bool,
    pub n_points: usize,
    pub value_range: Option<(f64, f64)>,
    pub state_derivative_range: Option<(f64, f64)>,
    pub stability_counts: StabilityCounts,
}

/// Builds the grid described by the configuration and evaluates the
/// unfolding fields on it.
///
/// # Errors
///
/// Returns an `InvalidInput` error if the shape or axis bounds are invalid.
pub fn compute_fields<F: VtkFloat>(config: &GeneratorConfig) -> io::Result<UnfoldingFields<F>> {
    let (lower_bound, upper_bound) = config.axis_bounds;
    if config.verbosity.print_messages() {
        println!(
            "Building grid with shape {} on [{}, {}]",
            config.shape, lower_bound, upper_bound
        );
    }
    let grid = RectilinearGrid3::from_cubically_remapped_bounds(
        config.shape.clone(),
        num::from_f64::<F>(lower_bound),
        num::from_f64::<F>(upper_bound),
    )?;
    if config.verbosity.print_messages() {
        println!(
            "Axis coordinates span {} to {}",
            grid.lower_bounds(),
            grid.upper_bounds()
        );
    }
    Ok(UnfoldingFields::evaluate(
        Arc::new(grid),
        &PitchforkUnfolding,
        &config.field_names,
        &config.verbosity,
    ))
}

/// Runs the whole pipeline: builds the grid, evaluates the fields and
/// writes them to the configured output file.
pub fn generate<F: VtkFloat>(config: &GeneratorConfig) -> io::Result<GenerationReport> {
    let fields = compute_fields::<F>(config)?;

    let written = vtk::write_rectilinear_grid_file(
        &config.output_file_path,
        fields.grid(),
        &fields.in_output_order(),
        config.encoding,
        config.overwrite_mode,
        &config.verbosity,
    )?;

    let range_as_f64 = |range: Option<(F, F)>| {
        range.and_then(|(min, max)| Some((min.to_f64()?, max.to_f64()?)))
    };
    Ok(GenerationReport {
        output_file_path: config.output_file_path.clone(),
        written,
        n_points: fields.grid().n_points(),
        value_range: range_as_f64(fields.value.find_range()),
        state_derivative_range: range_as_f64(fields.state_derivative.find_range()),
        stability_counts: fields.count_stability_classes(),
    })
}
