//! The universal unfolding of the pitchfork bifurcation.
//!
//! The dynamics are `dx/dt + G(x, lambda; alpha_1, alpha_2) = 0` with
//!
//! ```text
//! G(x, lambda; alpha_1, alpha_2) = x^3 + lambda*x + alpha_1*x^2 - alpha_2
//! ```
//!
//! where `lambda` is the main parameter and `alpha_1`, `alpha_2` are the
//! auxiliary (unfolding) parameters. Only `alpha_1` is sampled on the grid.
//! The constant `alpha_2` term shifts the zero level of `G`, so the viewer
//! reproduces it by animating the contour value of `G` (see
//! [`ALPHA_2_KEYFRAMES`]) instead of the grid gaining a fourth dimension.

use crate::{
    geometry::Dim3::{self, X, Y, Z},
    num::BFloat,
};

/// Grid dimension holding the auxiliary parameter `alpha_1`.
pub const AUXILIARY_PARAMETER_DIM: Dim3 = X;

/// Grid dimension holding the main bifurcation parameter `lambda`.
pub const MAIN_PARAMETER_DIM: Dim3 = Y;

/// Grid dimension holding the state variable `x`.
pub const STATE_DIM: Dim3 = Z;

/// Animation keyframes `(time, contour value of G)` realizing a sweep of
/// `alpha_2` from -3 to 3 in the viewer.
///
/// The schedule lingers around the values where the qualitative picture
/// changes, so each perturbed bifurcation diagram stays visible for a while.
pub const ALPHA_2_KEYFRAMES: [(f64, f64); 10] = [
    (0.0, -3.0),
    (0.1, -0.6),
    (0.2, -0.296),
    (0.3, -0.296),
    (0.45, 0.0),
    (0.55, 0.0),
    (0.7, 0.296),
    (0.8, 0.296),
    (0.9, 0.6),
    (1.0, 3.0),
];

/// A one-dimensional bifurcation problem `dx/dt + G(x, lambda; alpha) = 0`
/// with a single sampled auxiliary parameter.
pub trait BifurcationFunction<F: BFloat>: Sync {
    /// Evaluates `G` for the given state, main parameter and auxiliary parameter.
    fn value(&self, state: F, main_parameter: F, auxiliary_parameter: F) -> F;

    /// Evaluates the partial derivative of `G` with respect to the state.
    fn state_derivative(&self, state: F, main_parameter: F, auxiliary_parameter: F) -> F;
}

/// The pitchfork unfolding `G = x^3 + lambda*x + alpha*x^2`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PitchforkUnfolding;

impl<F: BFloat> BifurcationFunction<F> for PitchforkUnfolding {
    fn value(&self, x: F, lambda: F, alpha: F) -> F {
        x * x * x + lambda * x + alpha * x * x
    }

    fn state_derivative(&self, x: F, lambda: F, alpha: F) -> F {
        let two = F::one() + F::one();
        let three = two + F::one();
        three * x * x + lambda + two * alpha * x
    }
}

/// Local stability of a fixed point, given by the sign of `G_x`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stability {
    Unstable = -1,
    Bifurcating = 0,
    Stable = 1,
}

impl Stability {
    /// Classifies a fixed point from the value of `G_x` there.
    ///
    /// Since `dx/dt = -G`, a positive `G_x` means perturbations decay.
    /// Exactly zero is a bifurcation point. NaN is classified as bifurcating.
    pub fn from_state_derivative<F: BFloat>(state_derivative: F) -> Self {
        if state_derivative > F::zero() {
            Self::Stable
        } else if state_derivative < F::zero() {
            Self::Unstable
        } else {
            Self::Bifurcating
        }
    }

    /// Returns the sign value (-1, 0 or 1) representing the stability.
    pub fn value<F: BFloat>(self) -> F {
        match self {
            Self::Unstable => -F::one(),
            Self::Bifurcating => F::zero(),
            Self::Stable => F::one(),
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn pitchfork_unfolding_matches_closed_form() {
        let g = PitchforkUnfolding;
        for &(x, lambda, alpha) in &[
            (-3.0, -3.0, -3.0),
            (0.5, -0.25, 2.0),
            (1.7, 0.0, -0.3),
            (0.0, 0.0, 0.0),
        ] {
            let value: f64 = g.value(x, lambda, alpha);
            let derivative: f64 = g.state_derivative(x, lambda, alpha);
            assert!((value - (x * x * x + lambda * x + alpha * x * x)).abs() < 1e-12);
            assert!((derivative - (3.0 * x * x + lambda + 2.0 * alpha * x)).abs() < 1e-12);
        }
        assert_eq!(g.value(-3.0_f64, -3.0, -3.0), -45.0);
    }

    #[test]
    fn state_derivative_agrees_with_finite_difference() {
        let g = PitchforkUnfolding;
        let (x, lambda, alpha) = (0.7_f64, -1.2, 0.4);
        let h = 1e-6;
        let estimate = (g.value(x + h, lambda, alpha) - g.value(x - h, lambda, alpha)) / (2.0 * h);
        assert!((estimate - g.state_derivative(x, lambda, alpha)).abs() < 1e-6);
    }

    #[test]
    fn stability_of_zero_derivative_is_zero() {
        assert_eq!(
            Stability::from_state_derivative(0.0_f64),
            Stability::Bifurcating
        );
        assert_eq!(
            Stability::from_state_derivative(-0.0_f64),
            Stability::Bifurcating
        );
        assert_eq!(Stability::Bifurcating.value::<f64>(), 0.0);
        assert_eq!(
            Stability::from_state_derivative(1e-300_f64).value::<f64>(),
            1.0
        );
        assert_eq!(
            Stability::from_state_derivative(-2.5_f32).value::<f32>(),
            -1.0
        );
    }

    #[test]
    fn keyframes_sweep_symmetrically_over_unit_time() {
        assert_eq!(ALPHA_2_KEYFRAMES.first(), Some(&(0.0, -3.0)));
        assert_eq!(ALPHA_2_KEYFRAMES.last(), Some(&(1.0, 3.0)));
        assert!(ALPHA_2_KEYFRAMES
            .windows(2)
            .all(|pair| pair[0].0 < pair[1].0 && pair[0].1 <= pair[1].1));
        for (&(_, lower), &(_, upper)) in ALPHA_2_KEYFRAMES
            .iter()
            .zip(ALPHA_2_KEYFRAMES.iter().rev())
        {
            assert_eq!(lower, -upper);
        }
    }
}
