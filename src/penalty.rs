//! Penalty functions
//!
//! Penalties are applied element-wise to the coefficients and scaled per coefficient by the
//! model's `lambda`. Non-smooth penalties are handled through their proximal operator.
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use std::fmt::Debug;

use crate::error::{Result, SparseRegError};
use crate::Float;

/// Capability of an element-wise penalty
///
/// Implementations are pure and stateless. Inputs are assumed to be finite.
pub trait Penalty<F: Float>: Debug + Send + Sync {
    /// Value of the penalty for a single coefficient
    fn value(&self, coef: F) -> F;

    /// Proximal operator `argmin_v (1 / 2 step) (v - coef)^2 + value(v)`
    ///
    /// Algorithms call it with the step already scaled by the coefficient's lambda.
    fn prox(&self, coef: F, step: F) -> F;

    /// Returns `Some(c)` if the penalty is exactly `c * coef^2`, `Some(0)` for no penalty
    ///
    /// Closed-form solvers use this to decide whether they can handle the penalty.
    fn quadratic_scale(&self) -> Option<F> {
        None
    }
}

/// Soft thresholding operator `sign(x) * max(|x| - t, 0)`
pub fn soft_threshold<F: Float>(x: F, t: F) -> F {
    if x > t {
        x - t
    } else if x < -t {
        x + t
    } else {
        F::zero()
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
/// Absence of a penalty, the proximal operator is the identity
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NoPenalty;

impl<F: Float> Penalty<F> for NoPenalty {
    fn value(&self, _coef: F) -> F {
        F::zero()
    }

    fn prox(&self, coef: F, _step: F) -> F {
        coef
    }

    fn quadratic_scale(&self) -> Option<F> {
        Some(F::zero())
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
/// Lasso penalty `|coef|`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct L1Penalty;

impl<F: Float> Penalty<F> for L1Penalty {
    fn value(&self, coef: F) -> F {
        coef.abs()
    }

    fn prox(&self, coef: F, step: F) -> F {
        soft_threshold(coef, step)
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
/// Ridge penalty `coef^2 / 2`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct L2Penalty;

impl<F: Float> Penalty<F> for L2Penalty {
    fn value(&self, coef: F) -> F {
        F::cast(0.5) * coef * coef
    }

    fn prox(&self, coef: F, step: F) -> F {
        coef / (F::one() + step)
    }

    fn quadratic_scale(&self) -> Option<F> {
        Some(F::cast(0.5))
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
/// Elastic net penalty `l1_ratio * |coef| + (1 - l1_ratio) * coef^2 / 2`
///
/// An `l1_ratio` of `1` is the lasso penalty, `0` the ridge penalty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElasticNetPenalty<F> {
    l1_ratio: F,
}

impl<F: Float> ElasticNetPenalty<F> {
    pub fn new(l1_ratio: F) -> Result<Self> {
        if !(F::zero()..=F::one()).contains(&l1_ratio) {
            return Err(SparseRegError::InvalidPenaltyParameter(format!(
                "l1 ratio should be in range [0, 1], but is {}",
                l1_ratio
            )));
        }
        Ok(ElasticNetPenalty { l1_ratio })
    }

    pub fn l1_ratio(&self) -> F {
        self.l1_ratio
    }
}

impl<F: Float> Default for ElasticNetPenalty<F> {
    fn default() -> Self {
        ElasticNetPenalty {
            l1_ratio: F::cast(0.5),
        }
    }
}

impl<F: Float> Penalty<F> for ElasticNetPenalty<F> {
    fn value(&self, coef: F) -> F {
        self.l1_ratio * coef.abs() + (F::one() - self.l1_ratio) * F::cast(0.5) * coef * coef
    }

    fn prox(&self, coef: F, step: F) -> F {
        soft_threshold(coef, self.l1_ratio * step)
            / (F::one() + (F::one() - self.l1_ratio) * step)
    }

    fn quadratic_scale(&self) -> Option<F> {
        if self.l1_ratio == F::zero() {
            Some(F::cast(0.5))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// brute force minimization of the proximal objective on a fine grid
    fn grid_prox<P: Penalty<f64>>(penalty: &P, coef: f64, step: f64) -> f64 {
        let objective = |v: f64| (v - coef).powi(2) / (2. * step) + penalty.value(v);
        (-40_000..=40_000)
            .map(|i| i as f64 * 1e-4)
            .fold((f64::INFINITY, 0.), |(best, arg), v| {
                let o = objective(v);
                if o < best {
                    (o, v)
                } else {
                    (best, arg)
                }
            })
            .1
    }

    #[test]
    fn prox_minimizes_proximal_objective() {
        let elastic = ElasticNetPenalty::new(0.3).unwrap();
        for &(coef, step) in &[(1.3, 0.5), (-0.2, 0.7), (2.5, 1.1), (-3.0, 0.25)] {
            assert_abs_diff_eq!(
                L1Penalty.prox(coef, step),
                grid_prox(&L1Penalty, coef, step),
                epsilon = 1e-3
            );
            assert_abs_diff_eq!(
                L2Penalty.prox(coef, step),
                grid_prox(&L2Penalty, coef, step),
                epsilon = 1e-3
            );
            assert_abs_diff_eq!(
                elastic.prox(coef, step),
                grid_prox(&elastic, coef, step),
                epsilon = 1e-3
            );
        }
    }

    #[test]
    fn no_penalty_prox_is_identity() {
        assert_abs_diff_eq!(NoPenalty.prox(0.75f64, 10.), 0.75);
        assert_abs_diff_eq!(NoPenalty.value(0.75f64), 0.);
        assert_eq!(<NoPenalty as Penalty<f64>>::quadratic_scale(&NoPenalty), Some(0.));
    }

    #[test]
    fn soft_threshold_shrinks_to_zero() {
        assert_abs_diff_eq!(soft_threshold(0.4f64, 0.5), 0.);
        assert_abs_diff_eq!(soft_threshold(-0.9f64, 0.5), -0.4);
        assert_abs_diff_eq!(soft_threshold(2.0f64, 0.5), 1.5);
    }

    #[test]
    fn quadratic_capability() {
        assert_eq!(<L2Penalty as Penalty<f64>>::quadratic_scale(&L2Penalty), Some(0.5));
        assert_eq!(<L1Penalty as Penalty<f64>>::quadratic_scale(&L1Penalty), None);
        assert_eq!(ElasticNetPenalty::new(0.0f64).unwrap().quadratic_scale(), Some(0.5));
        assert!(ElasticNetPenalty::new(1.5f64).is_err());
    }
}
