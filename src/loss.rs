//! Loss functions
//!
//! A loss scores the disagreement between the linear predictor `ŷ = xᵀβ` of an observation and
//! its response `y`. Algorithms only rely on the [`Loss`] capability, new losses can be added by
//! implementing the trait.
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use std::fmt::Debug;

use crate::error::{Result, SparseRegError};
use crate::Float;

/// Capability of a loss function
///
/// Implementations are pure and stateless. Inputs are assumed to be finite.
pub trait Loss<F: Float>: Debug + Send + Sync {
    /// Value of the loss for a linear predictor `yhat` and response `y`
    fn value(&self, yhat: F, y: F) -> F;

    /// Derivative of the loss with respect to the linear predictor `yhat`
    fn gradient(&self, yhat: F, y: F) -> F;

    /// Returns `Some(s)` if the loss is exactly `s * (y - yhat)^2`
    ///
    /// Closed-form solvers use this to decide whether they can handle the loss.
    fn quadratic_scale(&self) -> Option<F> {
        None
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
/// Scaled squared error `scale * (y - yhat)^2`
///
/// The default scale is `0.5`, which makes the gradient the plain residual.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquaredError<F> {
    scale: F,
}

impl<F: Float> SquaredError<F> {
    /// Create a squared error loss scaled by `scale`, which must be positive
    pub fn new(scale: F) -> Result<Self> {
        if !scale.is_finite() || scale <= F::zero() {
            return Err(SparseRegError::InvalidLossParameter(format!(
                "squared error scale should be positive, but is {}",
                scale
            )));
        }
        Ok(SquaredError { scale })
    }

    pub fn scale(&self) -> F {
        self.scale
    }
}

impl<F: Float> Default for SquaredError<F> {
    fn default() -> Self {
        SquaredError {
            scale: F::cast(0.5),
        }
    }
}

impl<F: Float> Loss<F> for SquaredError<F> {
    fn value(&self, yhat: F, y: F) -> F {
        let r = y - yhat;
        self.scale * r * r
    }

    fn gradient(&self, yhat: F, y: F) -> F {
        F::cast(2.) * self.scale * (yhat - y)
    }

    fn quadratic_scale(&self) -> Option<F> {
        Some(self.scale)
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
/// Absolute error `|y - yhat|`, the gradient at zero residual is taken as zero
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AbsoluteError;

impl<F: Float> Loss<F> for AbsoluteError {
    fn value(&self, yhat: F, y: F) -> F {
        (y - yhat).abs()
    }

    fn gradient(&self, yhat: F, y: F) -> F {
        let r = yhat - y;
        if r > F::zero() {
            F::one()
        } else if r < F::zero() {
            -F::one()
        } else {
            F::zero()
        }
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
/// Huber loss, quadratic for residuals within `delta` and linear outside
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Huber<F> {
    delta: F,
}

impl<F: Float> Huber<F> {
    pub fn new(delta: F) -> Result<Self> {
        if !delta.is_finite() || delta <= F::zero() {
            return Err(SparseRegError::InvalidLossParameter(format!(
                "huber delta should be positive, but is {}",
                delta
            )));
        }
        Ok(Huber { delta })
    }

    pub fn delta(&self) -> F {
        self.delta
    }
}

impl<F: Float> Default for Huber<F> {
    fn default() -> Self {
        Huber { delta: F::one() }
    }
}

impl<F: Float> Loss<F> for Huber<F> {
    fn value(&self, yhat: F, y: F) -> F {
        let r = (y - yhat).abs();
        if r <= self.delta {
            F::cast(0.5) * r * r
        } else {
            self.delta * (r - F::cast(0.5) * self.delta)
        }
    }

    fn gradient(&self, yhat: F, y: F) -> F {
        let r = yhat - y;
        r.max(-self.delta).min(self.delta)
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
/// Logistic margin loss `ln(1 + exp(-y * yhat))` for responses in `{-1, 1}`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LogitMargin;

impl<F: Float> Loss<F> for LogitMargin {
    fn value(&self, yhat: F, y: F) -> F {
        // ln(1 + exp(-m)) without overflow for large negative margins
        let m = y * yhat;
        if m > F::zero() {
            (-m).exp().ln_1p()
        } else {
            -m + m.exp().ln_1p()
        }
    }

    fn gradient(&self, yhat: F, y: F) -> F {
        let m = y * yhat;
        -y / (F::one() + m.exp())
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
/// Hinge loss `max(0, 1 - y * yhat)` for responses in `{-1, 1}`, with a subgradient at the
/// kink
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hinge;

impl<F: Float> Loss<F> for Hinge {
    fn value(&self, yhat: F, y: F) -> F {
        (F::one() - y * yhat).max(F::zero())
    }

    fn gradient(&self, yhat: F, y: F) -> F {
        if y * yhat < F::one() {
            -y
        } else {
            F::zero()
        }
    }
}
