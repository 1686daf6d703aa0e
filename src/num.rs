//! Utilities related to numbers.

use num;
use std::fmt;

/// Floating point marker trait for easier control over trait bounds.
pub trait BFloat:
    Sync
    + Send
    + num::Float
    + num::cast::FromPrimitive
    + num::cast::ToPrimitive
    + fmt::Debug
    + fmt::Display
    + fmt::LowerExp
{
}

impl BFloat for f32 {}
impl BFloat for f64 {}

/// Converts the given `f64` into the given float type.
///
/// Both implementors of `BFloat` can represent any `f64`
/// (possibly rounded), so the conversion cannot fail.
pub fn from_f64<F: BFloat>(value: f64) -> F {
    F::from_f64(value).unwrap_or_else(F::nan)
}

/// Converts the given index or count into the given float type.
pub fn from_usize<F: BFloat>(value: usize) -> F {
    F::from_usize(value).unwrap_or_else(F::nan)
}
