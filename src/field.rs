//! Scalar fields sampled on a rectilinear grid.

use crate::{
    geometry::{
        Dim3::{X, Y, Z},
        Idx3,
    },
    grid::{self, RectilinearGrid3},
    io::Verbosity,
    num::BFloat,
    unfolding::{
        BifurcationFunction, Stability, AUXILIARY_PARAMETER_DIM, MAIN_PARAMETER_DIM, STATE_DIM,
    },
};
use indicatif::ParallelProgressIterator;
use ndarray::{Array3, ShapeBuilder};
use rayon::prelude::*;
use std::sync::Arc;

/// Name of the field holding the bifurcation function `G`.
pub const VALUE_FIELD_NAME: &str = "G";

/// Name of the field holding the sign of `G_x`.
pub const STABILITY_FIELD_NAME: &str = "stability";

/// Name of the field holding the state derivative `G_x`.
pub const STATE_DERIVATIVE_FIELD_NAME: &str = "G_x";

/// A 3D scalar field.
///
/// Holds the grid and the values of a 3D scalar field defined at the grid nodes.
/// The array of values is laid out in column-major order in memory, so the
/// x-index varies fastest.
#[derive(Clone, Debug)]
pub struct ScalarField3<F: BFloat> {
    name: String,
    grid: Arc<RectilinearGrid3<F>>,
    values: Array3<F>,
}

impl<F: BFloat> ScalarField3<F> {
    /// Creates a new scalar field given a name, a grid and the values at the grid nodes.
    ///
    /// Values not already laid out in column-major order are copied into that order.
    pub fn new(name: String, grid: Arc<RectilinearGrid3<F>>, values: Array3<F>) -> Self {
        let grid_shape = grid.shape();
        let values_shape = values.shape();
        assert!(
            grid_shape[X] == values_shape[0]
                && grid_shape[Y] == values_shape[1]
                && grid_shape[Z] == values_shape[2],
            "Shape of grid does not match shape of array of values."
        );
        let values = if values.t().is_standard_layout() {
            values
        } else {
            Array3::from_shape_vec(values.raw_dim().f(), values.t().iter().cloned().collect())
                .expect("Number of values changed during reordering.")
        };
        Self { name, grid, values }
    }

    /// Creates a new scalar field by evaluating the given function at every
    /// grid node, in parallel.
    ///
    /// The function receives the 3D index of the node.
    pub fn from_node_function<E>(
        name: String,
        grid: Arc<RectilinearGrid3<F>>,
        evaluate: E,
        verbosity: &Verbosity,
    ) -> Self
    where
        E: Fn(&Idx3<usize>) -> F + Sync,
    {
        let shape = grid.shape().clone();
        let mut values = Array3::zeros(shape.to_tuple().f());
        let buffer = values
            .as_slice_memory_order_mut()
            .expect("Values array not contiguous.");
        let n_values = buffer.len();

        buffer
            .par_iter_mut()
            .enumerate()
            .progress_with(verbosity.create_progress_bar(n_values))
            .for_each(|(idx, value)| {
                *value = evaluate(&grid::compute_3d_array_indices_from_flat_idx(&shape, idx));
            });

        Self::new(name, grid, values)
    }

    /// Returns a reference to the name of the field.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a reference to the grid.
    pub fn grid(&self) -> &RectilinearGrid3<F> {
        self.grid.as_ref()
    }

    /// Returns a reference to the 3D array of field values.
    pub fn values(&self) -> &Array3<F> {
        &self.values
    }

    /// Returns the field value at the given 3D index.
    pub fn value(&self, indices: &Idx3<usize>) -> F {
        self.values[[indices[X], indices[Y], indices[Z]]]
    }

    /// Returns the field values in column-major order, which is the
    /// point order of VTK structured data.
    pub fn values_in_point_order(&self) -> &[F] {
        self.values
            .as_slice_memory_order()
            .expect("Values array not contiguous.")
    }

    /// Computes the minimum and maximum of the field.
    ///
    /// NaN values are ignored. Returns `None` if there are no non-NaN values.
    pub fn find_range(&self) -> Option<(F, F)> {
        self.values_in_point_order()
            .par_iter()
            .filter(|value| !value.is_nan())
            .map(|&value| (value, value))
            .reduce_with(|(min_a, max_a), (min_b, max_b)| {
                (F::min(min_a, min_b), F::max(max_a, max_b))
            })
    }
}

/// Names to give the three unfolding fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldNames {
    pub value: String,
    pub stability: String,
    pub state_derivative: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            value: VALUE_FIELD_NAME.to_string(),
            stability: STABILITY_FIELD_NAME.to_string(),
            state_derivative: STATE_DERIVATIVE_FIELD_NAME.to_string(),
        }
    }
}

/// The three fields describing the pitchfork unfolding on a grid.
#[derive(Clone, Debug)]
pub struct UnfoldingFields<F: BFloat> {
    pub value: ScalarField3<F>,
    pub state_derivative: ScalarField3<F>,
    pub stability: ScalarField3<F>,
}

/// Number of grid nodes in each stability class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StabilityCounts {
    pub stable: usize,
    pub unstable: usize,
    pub bifurcating: usize,
}

impl<F: BFloat> UnfoldingFields<F> {
    /// Evaluates `G`, `G_x` and the sign of `G_x` at every node of the given grid.
    ///
    /// The auxiliary parameter varies along x, the main parameter along y and
    /// the state along z. Values are computed directly from the three axes.
    pub fn evaluate<B>(
        grid: Arc<RectilinearGrid3<F>>,
        function: &B,
        names: &FieldNames,
        verbosity: &Verbosity,
    ) -> Self
    where
        B: BifurcationFunction<F>,
    {
        let arguments = |indices: &Idx3<usize>| {
            let point = grid.point(indices);
            (
                point[STATE_DIM],
                point[MAIN_PARAMETER_DIM],
                point[AUXILIARY_PARAMETER_DIM],
            )
        };

        if verbosity.print_messages() {
            println!("Evaluating {}", names.value);
        }
        let value = ScalarField3::from_node_function(
            names.value.clone(),
            Arc::clone(&grid),
            |indices| {
                let (x, lambda, alpha) = arguments(indices);
                function.value(x, lambda, alpha)
            },
            verbosity,
        );

        if verbosity.print_messages() {
            println!("Evaluating {}", names.state_derivative);
        }
        let state_derivative = ScalarField3::from_node_function(
            names.state_derivative.clone(),
            Arc::clone(&grid),
            |indices| {
                let (x, lambda, alpha) = arguments(indices);
                function.state_derivative(x, lambda, alpha)
            },
            verbosity,
        );

        let stability = ScalarField3::from_node_function(
            names.stability.clone(),
            Arc::clone(&grid),
            |indices| Stability::from_state_derivative(state_derivative.value(indices)).value(),
            &Verbosity::Quiet,
        );

        Self {
            value,
            state_derivative,
            stability,
        }
    }

    /// Returns the grid the fields are defined on.
    pub fn grid(&self) -> &RectilinearGrid3<F> {
        self.value.grid()
    }

    /// Returns the fields in the order they are written to file.
    pub fn in_output_order(&self) -> [&ScalarField3<F>; 3] {
        [&self.value, &self.stability, &self.state_derivative]
    }

    /// Counts the grid nodes in each stability class.
    pub fn count_stability_classes(&self) -> StabilityCounts {
        self.state_derivative
            .values_in_point_order()
            .par_iter()
            .fold(StabilityCounts::default, |mut counts, &derivative| {
                match Stability::from_state_derivative(derivative) {
                    Stability::Stable => counts.stable += 1,
                    Stability::Unstable => counts.unstable += 1,
                    Stability::Bifurcating => counts.bifurcating += 1,
                }
                counts
            })
            .reduce(StabilityCounts::default, |a, b| StabilityCounts {
                stable: a.stable + b.stable,
                unstable: a.unstable + b.unstable,
                bifurcating: a.bifurcating + b.bifurcating,
            })
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::{
        geometry::{Coords3, In3D},
        unfolding::PitchforkUnfolding,
    };
    use approx::assert_relative_eq;

    fn small_fields() -> UnfoldingFields<f64> {
        let grid = Arc::new(
            RectilinearGrid3::from_cubically_remapped_bounds(In3D::new(3, 4, 5), -3.0, 3.0)
                .unwrap(),
        );
        UnfoldingFields::evaluate(
            grid,
            &PitchforkUnfolding,
            &FieldNames::default(),
            &Verbosity::Quiet,
        )
    }

    #[test]
    fn fields_follow_aux_main_state_index_convention() {
        let fields = small_fields();
        let grid = fields.grid();
        let (alphas, lambdas, xs) = (grid.axis(X), grid.axis(Y), grid.axis(Z));
        assert_eq!(fields.value.values().shape(), &[3, 4, 5]);

        for i in 0..3 {
            for j in 0..4 {
                for k in 0..5 {
                    let (x, lambda, alpha) = (xs[k], lambdas[j], alphas[i]);
                    let indices = Idx3::new(i, j, k);
                    let g = x.powi(3) + lambda * x + alpha * x.powi(2);
                    let gx = 3.0 * x.powi(2) + lambda + 2.0 * alpha * x;
                    assert_relative_eq!(
                        fields.value.value(&indices),
                        g,
                        epsilon = 1e-12,
                        max_relative = 1e-9
                    );
                    assert_relative_eq!(
                        fields.state_derivative.value(&indices),
                        gx,
                        epsilon = 1e-12,
                        max_relative = 1e-9
                    );
                    let expected_sign = if gx > 0.0 {
                        1.0
                    } else if gx < 0.0 {
                        -1.0
                    } else {
                        0.0
                    };
                    assert_eq!(fields.stability.value(&indices), expected_sign);
                }
            }
        }
    }

    #[test]
    fn memory_order_has_x_fastest() {
        let fields = small_fields();
        let point_order = fields.value.values_in_point_order();
        assert_eq!(point_order[1], fields.value.value(&Idx3::new(1, 0, 0)));
        assert_eq!(point_order[3], fields.value.value(&Idx3::new(0, 1, 0)));
        assert_eq!(point_order[12], fields.value.value(&Idx3::new(0, 0, 1)));
    }

    #[test]
    fn output_order_is_value_stability_derivative() {
        let fields = small_fields();
        let names: Vec<_> = fields
            .in_output_order()
            .iter()
            .map(|field| field.name().to_string())
            .collect();
        assert_eq!(names, ["G", "stability", "G_x"]);
    }

    #[test]
    fn stability_counts_cover_all_nodes() {
        let fields = small_fields();
        let counts = fields.count_stability_classes();
        assert_eq!(counts.stable + counts.unstable + counts.bifurcating, 60);
        let n_positive = fields
            .stability
            .values()
            .iter()
            .filter(|&&sign| sign == 1.0)
            .count();
        assert_eq!(counts.stable, n_positive);
    }

    #[test]
    fn row_major_values_are_reordered() {
        let grid = Arc::new(RectilinearGrid3::from_coords(Coords3::new(
            vec![0.0, 1.0],
            vec![0.0, 1.0, 2.0],
            vec![0.0],
        )));
        let values = Array3::from_shape_fn((2, 3, 1), |(i, j, _)| (10 * i + j) as f64);
        let field = ScalarField3::new("f".to_string(), grid, values);
        assert_eq!(field.value(&Idx3::new(1, 2, 0)), 12.0);
        assert_eq!(
            field.values_in_point_order(),
            &[0.0, 10.0, 1.0, 11.0, 2.0, 12.0]
        );
    }

    #[test]
    fn range_ignores_nan() {
        let grid = Arc::new(RectilinearGrid3::from_coords(Coords3::new(
            vec![0.0, 1.0],
            vec![0.0],
            vec![0.0],
        )));
        let field = ScalarField3::new(
            "f".to_string(),
            grid,
            Array3::from_shape_vec((2, 1, 1).f(), vec![f64::NAN, 2.0]).unwrap(),
        );
        assert_eq!(field.find_range(), Some((2.0, 2.0)));
    }

    #[test]
    #[should_panic(expected = "Shape of grid does not match")]
    fn mismatched_values_are_refused() {
        let grid = Arc::new(RectilinearGrid3::from_coords(Coords3::new(
            vec![0.0, 1.0],
            vec![0.0],
            vec![0.0],
        )));
        ScalarField3::new("f".to_string(), grid, Array3::zeros((1, 2, 1)));
    }
}
