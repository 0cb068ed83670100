#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use ndarray::{Array1, ArrayView1, Zip};

use crate::error::{Result, SparseRegError};
use crate::{Float, Model, Observations, ParamGuard};

use super::{check_shape, check_step_size, Algorithm, BuildAlgorithm, GradientBuffers};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
/// A verified hyper-parameter set ready for the construction of an [`AdaptiveProxGrad`]
///
/// See [`AdaptiveProxGradParams`] for more information.
#[derive(Clone, Debug, PartialEq)]
pub struct AdaptiveProxGradValidParams<F> {
    initial_step_size: F,
    divisor: F,
}

impl<F: Float> AdaptiveProxGradValidParams<F> {
    pub fn initial_step_size(&self) -> F {
        self.initial_step_size
    }

    pub fn divisor(&self) -> F {
        self.divisor
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
/// A hyper-parameter set for the coordinate-adaptive proximal gradient algorithm
///
/// # Parameters
/// | Name | Default | Purpose | Range |
/// | :--- | :--- | :---| :--- |
/// | [initial_step_size](Self::initial_step_size) | `1.0` | Step of every coordinate before any sign flip | `(0, inf)` |
/// | [divisor](Self::divisor) | `2.0` | Shrinkage of a coordinate's step when its sign flips | `(1, inf)` |
///
/// # Errors
///
/// Returns [`InvalidStepSize`](SparseRegError::InvalidStepSize) if the initial step size is not
/// positive and finite and [`InvalidDivisor`](SparseRegError::InvalidDivisor) if the divisor
/// is not larger than one.
#[derive(Clone, Debug, PartialEq)]
pub struct AdaptiveProxGradParams<F>(AdaptiveProxGradValidParams<F>);

impl<F: Float> Default for AdaptiveProxGradParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> AdaptiveProxGradParams<F> {
    pub fn new() -> Self {
        Self(AdaptiveProxGradValidParams {
            initial_step_size: F::one(),
            divisor: F::cast(2.),
        })
    }

    /// Set the step size every coordinate starts with.
    ///
    /// Defaults to `1.0` if not set
    pub fn initial_step_size(mut self, initial_step_size: F) -> Self {
        self.0.initial_step_size = initial_step_size;
        self
    }

    /// Set the divisor applied to a coordinate's step whenever its sign flips.
    ///
    /// Defaults to `2.0` if not set
    pub fn divisor(mut self, divisor: F) -> Self {
        self.0.divisor = divisor;
        self
    }
}

impl<F: Float> ParamGuard for AdaptiveProxGradParams<F> {
    type Checked = AdaptiveProxGradValidParams<F>;
    type Error = SparseRegError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        check_step_size(self.0.initial_step_size)?;
        if !self.0.divisor.is_finite() || self.0.divisor <= F::one() {
            Err(SparseRegError::InvalidDivisor(
                self.0.divisor.to_f32().unwrap_or(f32::NAN),
            ))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// Proximal gradient method with one step size per coefficient
///
/// All coordinates start with the same step. Whenever the sign of a coefficient flips
/// between two updates its step is divided by the configured divisor, so coefficients
/// oscillating around zero settle independently of the others. A coefficient hitting exactly
/// zero keeps the sign it had before for the comparison.
///
/// The per-coordinate steps make this algorithm incompatible with
/// [`LineSearch`](crate::algorithm::LineSearch).
#[derive(Debug, Clone)]
pub struct AdaptiveProxGrad<F> {
    divisor: F,
    step_sizes: Array1<F>,
    signs: Array1<F>,
    buffers: GradientBuffers<F>,
}

impl<F: Float> AdaptiveProxGrad<F> {
    /// Create default hyperparameters
    pub fn params() -> AdaptiveProxGradParams<F> {
        AdaptiveProxGradParams::new()
    }

    pub fn new(model: &Model<F>, observations: &Observations<F>) -> Result<Self> {
        Self::params().build(model, observations)
    }

    /// Current step size of every coordinate
    pub fn step_sizes(&self) -> ArrayView1<F> {
        self.step_sizes.view()
    }
}

impl<F: Float> BuildAlgorithm<F> for AdaptiveProxGradValidParams<F> {
    type Algorithm = AdaptiveProxGrad<F>;

    fn build(
        &self,
        model: &Model<F>,
        observations: &Observations<F>,
    ) -> Result<AdaptiveProxGrad<F>> {
        model.check_observations(observations)?;
        let nfeatures = model.nfeatures();
        Ok(AdaptiveProxGrad {
            divisor: self.divisor(),
            step_sizes: Array1::from_elem(nfeatures, self.initial_step_size()),
            signs: model.coef().mapv(sign),
            buffers: GradientBuffers::new(observations.nobservations(), nfeatures),
        })
    }
}

fn sign<F: Float>(x: F) -> F {
    if x > F::zero() {
        F::one()
    } else if x < F::zero() {
        -F::one()
    } else {
        F::zero()
    }
}

impl<F: Float> Algorithm<F> for AdaptiveProxGrad<F> {
    fn name(&self) -> &'static str {
        "AdaptiveProxGrad"
    }

    fn shape(&self) -> (usize, usize) {
        self.buffers.shape()
    }

    fn update(&mut self, model: &mut Model<F>, observations: &Observations<F>) -> Result<()> {
        check_shape(self.name(), self.shape(), model, observations)?;
        self.buffers.compute(model, observations, model.coef());

        let divisor = self.divisor;
        let penalty = model.penalty();
        Zip::from(&mut self.buffers.candidate)
            .and(model.coef())
            .and(&self.buffers.gradient)
            .and(model.lambda())
            .and(&mut self.step_sizes)
            .and(&mut self.signs)
            .for_each(|c, b, g, l, step, previous| {
                *c = penalty.prox(*b - *step * *g, *step * *l);
                let current = sign(*c);
                if current * *previous < F::zero() {
                    *step /= divisor;
                }
                if current != F::zero() {
                    *previous = current;
                }
            });

        model.coef_mut().assign(&self.buffers.candidate);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{L1Penalty, NoPenalty};
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn divisor_is_validated() {
        assert!(AdaptiveProxGradParams::<f64>::new().check().is_ok());
        assert!(matches!(
            AdaptiveProxGradParams::new().divisor(1.0f64).check(),
            Err(SparseRegError::InvalidDivisor(_))
        ));
        assert!(matches!(
            AdaptiveProxGradParams::new().initial_step_size(-1.0f64).check(),
            Err(SparseRegError::InvalidStepSize(_))
        ));
    }

    #[test]
    fn sign_flip_shrinks_only_that_coordinate() {
        // identity design, n = 2: gradient is (coef - y) / 2, a step of 4 overshoots
        let obs = Observations::new(array![[1., 0.], [0., 1.]], array![1., 1.]).unwrap();
        let mut model = Model::new(2)
            .with_penalty(NoPenalty)
            .with_coef(array![2., 0.5])
            .unwrap();
        let mut alg = AdaptiveProxGrad::params()
            .initial_step_size(4.)
            .divisor(4.)
            .build(&model, &obs)
            .unwrap();

        alg.update(&mut model, &obs).unwrap();
        // 2 - 4 * 0.5 = 0 keeps the sign, 0.5 - 4 * -0.25 = 1.5 keeps the sign
        assert_abs_diff_eq!(model.coef(), array![0., 1.5]);
        assert_abs_diff_eq!(alg.step_sizes(), array![4., 4.]);

        alg.update(&mut model, &obs).unwrap();
        // 0 + 4 * 0.5 = 2 keeps the sign, 1.5 - 4 * 0.25 = 0.5
        assert_abs_diff_eq!(model.coef(), array![2., 0.5]);

        let mut model = Model::new(2)
            .with_penalty(NoPenalty)
            .with_coef(array![3., 0.5])
            .unwrap();
        let mut alg = AdaptiveProxGrad::params()
            .initial_step_size(4.)
            .divisor(4.)
            .build(&model, &obs)
            .unwrap();
        alg.update(&mut model, &obs).unwrap();
        // 3 - 4 * 1 = -1 flips the first coordinate only
        assert_abs_diff_eq!(model.coef(), array![-1., 1.5]);
        assert_abs_diff_eq!(alg.step_sizes(), array![1., 4.]);
    }

    #[test]
    fn converges_on_lasso() {
        let obs = Observations::new(
            array![[1., 0.2], [0.1, 1.], [0.9, 0.3], [0.2, 0.8]],
            array![2., -1., 1.8, -0.7],
        )
        .unwrap();
        let mut model = Model::new(2)
            .with_penalty(L1Penalty)
            .with_uniform_lambda(0.05)
            .unwrap();
        let mut alg = AdaptiveProxGrad::params()
            .initial_step_size(0.5)
            .build(&model, &obs)
            .unwrap();

        let mut previous = model.coef().to_owned();
        for _ in 0..2000 {
            alg.update(&mut model, &obs).unwrap();
            let delta = (&model.coef() - &previous).mapv(f64::abs).sum();
            previous.assign(&model.coef());
            if delta < 1e-12 {
                break;
            }
        }
        assert!(model.coef()[0] > 1.);
        assert!(model.coef()[1] < -0.5);
    }
}
