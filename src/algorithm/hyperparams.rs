#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{Result, SparseRegError};
use crate::{Float, ParamGuard};

use super::check_step_size;

pub(crate) const PROX_GRAD: u8 = 0;
pub(crate) const FISTA: u8 = 1;
pub(crate) const GRADIENT_DESCENT: u8 = 2;

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct StepValidParamsBase<F, const KIND: u8> {
    step_size: F,
}

/// A verified hyper-parameter set ready for the construction of a proximal gradient algorithm
///
/// See [`ProxGradParams`](crate::algorithm::ProxGradParams) for more information.
pub type ProxGradValidParams<F> = StepValidParamsBase<F, PROX_GRAD>;

/// A verified hyper-parameter set ready for the construction of an accelerated proximal
/// gradient algorithm
///
/// See [`FistaParams`](crate::algorithm::FistaParams) for more information.
pub type FistaValidParams<F> = StepValidParamsBase<F, FISTA>;

/// A verified hyper-parameter set ready for the construction of a gradient descent algorithm
///
/// See [`GradientDescentParams`](crate::algorithm::GradientDescentParams) for more information.
pub type GradientDescentValidParams<F> = StepValidParamsBase<F, GRADIENT_DESCENT>;

impl<F: Float, const KIND: u8> StepValidParamsBase<F, KIND> {
    pub fn step_size(&self) -> F {
        self.step_size
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct StepParamsBase<F, const KIND: u8>(StepValidParamsBase<F, KIND>);

/// A hyper-parameter set for the proximal gradient algorithm
///
/// # Parameters
/// | Name | Default | Purpose | Range |
/// | :--- | :--- | :---| :--- |
/// | [step_size](Self::step_size) | `1.0` | Step of the gradient update | `(0, inf)` |
///
/// # Errors
///
/// Returns [`InvalidStepSize`](SparseRegError::InvalidStepSize) if the step size is not
/// positive and finite.
///
/// # Example
///
/// ```rust
/// use sparsereg::algorithm::{BuildAlgorithm, ProxGrad};
/// use sparsereg::{Model, Observations};
/// use ndarray::array;
///
/// let obs = Observations::new(array![[1.0, 0.0], [0.0, 1.0]], array![3.0, 2.0])?;
/// let model = Model::new(2);
///
/// let algorithm = ProxGrad::params().step_size(0.5).build(&model, &obs)?;
/// # Ok::<(), sparsereg::SparseRegError>(())
/// ```
pub type ProxGradParams<F> = StepParamsBase<F, PROX_GRAD>;

/// A hyper-parameter set for the accelerated proximal gradient algorithm
///
/// Shares the parameters of [`ProxGradParams`].
pub type FistaParams<F> = StepParamsBase<F, FISTA>;

/// A hyper-parameter set for plain gradient descent
///
/// Shares the parameters of [`ProxGradParams`].
pub type GradientDescentParams<F> = StepParamsBase<F, GRADIENT_DESCENT>;

impl<F: Float, const KIND: u8> Default for StepParamsBase<F, KIND> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float, const KIND: u8> StepParamsBase<F, KIND> {
    pub fn new() -> Self {
        Self(StepValidParamsBase {
            step_size: F::one(),
        })
    }

    /// Set the step size of the gradient update.
    ///
    /// Defaults to `1.0` if not set
    pub fn step_size(mut self, step_size: F) -> Self {
        self.0.step_size = step_size;
        self
    }
}

impl<F: Float, const KIND: u8> ParamGuard for StepParamsBase<F, KIND> {
    type Checked = StepValidParamsBase<F, KIND>;
    type Error = SparseRegError;

    /// Validate the hyper parameters
    fn check_ref(&self) -> Result<&Self::Checked> {
        check_step_size(self.0.step_size)?;
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_size_is_validated() {
        assert!(ProxGradParams::<f64>::new().check().is_ok());
        assert!(matches!(
            FistaParams::new().step_size(0.0f64).check(),
            Err(SparseRegError::InvalidStepSize(_))
        ));
        assert!(GradientDescentParams::new()
            .step_size(f64::INFINITY)
            .check()
            .is_err());
        assert_eq!(ProxGradParams::new().step_size(0.25f32).check_unwrap().step_size(), 0.25);
    }
}
