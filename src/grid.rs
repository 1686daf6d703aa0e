//! Rectilinear grids with independently spaced coordinate axes.

use crate::{
    geometry::{
        Coords3,
        Dim3::{self, X, Y, Z},
        Idx3, In3D,
    },
    num::{self, BFloat},
};
use std::io;

/// A 3D grid whose nodes lie on the intersections of axis-aligned,
/// independently spaced coordinate lines.
#[derive(Clone, Debug, PartialEq)]
pub struct RectilinearGrid3<F: BFloat> {
    coords: Coords3<F>,
    shape: In3D<usize>,
}

impl<F: BFloat> RectilinearGrid3<F> {
    /// Creates a new grid from the node coordinates along each dimension.
    ///
    /// # Panics
    ///
    /// If any of the coordinate arrays is empty or not strictly increasing.
    pub fn from_coords(coords: Coords3<F>) -> Self {
        for dim in Dim3::slice() {
            let axis = &coords[dim];
            assert!(
                !axis.is_empty(),
                "Cannot create grid with size zero along any dimension."
            );
            assert!(
                axis.windows(2).all(|pair| pair[0] < pair[1]),
                "Grid coordinates must be strictly increasing along every dimension."
            );
        }
        let shape = coords.map(Vec::len);
        Self { coords, shape }
    }

    /// Creates a new grid where every axis spans the given bounds with
    /// node density concentrated towards zero by a cubic remapping.
    ///
    /// See [`cubically_remapped_coords`] for how the coordinates are computed.
    pub fn from_cubically_remapped_bounds(
        shape: In3D<usize>,
        lower_bound: F,
        upper_bound: F,
    ) -> io::Result<Self> {
        let x_coords = cubically_remapped_coords(shape[X], lower_bound, upper_bound)?;
        let y_coords = cubically_remapped_coords(shape[Y], lower_bound, upper_bound)?;
        let z_coords = cubically_remapped_coords(shape[Z], lower_bound, upper_bound)?;
        Ok(Self::from_coords(Coords3::new(x_coords, y_coords, z_coords)))
    }

    /// Returns the 3D shape of the grid.
    pub fn shape(&self) -> &In3D<usize> {
        &self.shape
    }

    /// Returns the total number of grid nodes.
    pub fn n_points(&self) -> usize {
        self.shape[X] * self.shape[Y] * self.shape[Z]
    }

    /// Returns a reference to the node coordinates.
    pub fn coords(&self) -> &Coords3<F> {
        &self.coords
    }

    /// Returns the node coordinates along the given dimension.
    pub fn axis(&self, dim: Dim3) -> &[F] {
        &self.coords[dim]
    }

    /// Returns the coordinates of the node with the given 3D index.
    pub fn point(&self, indices: &Idx3<usize>) -> In3D<F> {
        In3D::with_each_component(|dim| self.coords[dim][indices[dim]])
    }

    /// Returns the smallest coordinate along each dimension.
    pub fn lower_bounds(&self) -> In3D<F> {
        self.coords.map(|axis| axis[0])
    }

    /// Returns the largest coordinate along each dimension.
    pub fn upper_bounds(&self) -> In3D<F> {
        self.coords.map(|axis| axis[axis.len() - 1])
    }
}

/// Computes `n_values` evenly spaced values from `lower` to `upper`, inclusive.
///
/// The endpoints are reproduced exactly, and so is the midpoint of a
/// symmetric range sampled with an odd number of values.
pub fn linspace<F: BFloat>(n_values: usize, lower: F, upper: F) -> Vec<F> {
    if n_values == 1 {
        return vec![lower];
    }
    let n_intervals = num::from_usize::<F>(n_values - 1);
    let extent = upper - lower;
    (0..n_values)
        .map(|idx| lower + extent * (num::from_usize::<F>(idx) / n_intervals))
        .collect()
}

/// Computes `n_values` coordinates from `lower` to `upper` that are denser
/// towards zero.
///
/// Each evenly spaced value `t` is mapped to `t^3/s^2`, where `s` is the
/// largest magnitude of the two bounds. The mapping is monotonic and leaves
/// `±s` in place, so for the range `[-3, 3]` the coordinates are `t^3/9`.
///
/// # Errors
///
/// Returns an `InvalidInput` error if fewer than two values are requested,
/// if the bounds are non-finite or not increasing, or if the coordinates
/// cannot be kept distinct at the precision of `F`.
pub fn cubically_remapped_coords<F: BFloat>(
    n_values: usize,
    lower: F,
    upper: F,
) -> io::Result<Vec<F>> {
    if n_values < 2 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Number of axis samples must be at least 2, got {}", n_values),
        ));
    }
    if !(lower.is_finite() && upper.is_finite()) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "Axis bounds must be finite",
        ));
    }
    if lower >= upper {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Upper axis bound ({}) must be larger than lower axis bound ({})",
                upper, lower
            ),
        ));
    }
    let scale = F::max(lower.abs(), upper.abs());
    let scale_squared = scale * scale;
    let coords: Vec<F> = linspace(n_values, lower, upper)
        .into_iter()
        .map(|t| t * t * t / scale_squared)
        .collect();
    if !coords.windows(2).all(|pair| pair[0] < pair[1]) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "{} axis samples on [{}, {}] are too closely spaced to be distinct at this precision",
                n_values, lower, upper
            ),
        ));
    }
    Ok(coords)
}

/// Computes the 3D array indices corresponding to a given index into the flattened version of the array,
/// assuming the array is laid out in column-major order.
pub fn compute_3d_array_indices_from_flat_idx(shape: &In3D<usize>, idx: usize) -> Idx3<usize> {
    let i = idx % shape[X];
    let j = idx / shape[X] % shape[Y];
    let k = idx / (shape[X] * shape[Y]);
    Idx3::new(i, j, k)
}
