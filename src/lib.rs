//! The `pitchfork_mesh` crate samples the universal unfolding of the
//! pitchfork bifurcation on a rectilinear parameter grid and writes the
//! result as a VTK file for visualization in ParaView.

pub mod error;
pub mod field;
pub mod generation;
pub mod geometry;
pub mod grid;
pub mod io;
pub mod num;
pub mod unfolding;

#[cfg(feature = "cli")]
pub mod cli;
