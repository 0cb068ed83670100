use ndarray::{Array1, ArrayView1, Zip};

use crate::error::Result;
use crate::{Float, Model, Observations};

use super::hyperparams::{FistaParams, FistaValidParams};
use super::{check_shape, Algorithm, BuildAlgorithm, GradientBuffers, Stepped};

/// Accelerated proximal gradient method (FISTA)
///
/// The gradient step is taken from an extrapolated point instead of the current
/// coefficients. After every update the momentum coefficient and extrapolation are advanced
/// by
///
/// ```ignore
/// t_next = (1 + sqrt(1 + 4 t^2)) / 2
/// z = coef_next + (t - 1) / t_next * (coef_next - coef)
/// ```
///
/// The momentum starts at `t = 1` with the extrapolated point at the model's coefficients
/// and is only reset by constructing a new instance.
///
/// See also:
/// * [A Fast Iterative Shrinkage-Thresholding Algorithm for Linear Inverse
/// Problems](https://doi.org/10.1137/080716542)
#[derive(Debug, Clone)]
pub struct Fista<F> {
    step_size: F,
    momentum: F,
    extrapolated: Array1<F>,
    buffers: GradientBuffers<F>,
}

impl<F: Float> Fista<F> {
    /// Create default hyperparameters
    pub fn params() -> FistaParams<F> {
        FistaParams::new()
    }

    /// Accelerated proximal gradient with the default step size of `1.0`
    pub fn new(model: &Model<F>, observations: &Observations<F>) -> Result<Self> {
        Self::params().build(model, observations)
    }

    /// Current momentum coefficient `t`
    pub fn momentum(&self) -> F {
        self.momentum
    }
}

impl<F: Float> BuildAlgorithm<F> for FistaValidParams<F> {
    type Algorithm = Fista<F>;

    fn build(&self, model: &Model<F>, observations: &Observations<F>) -> Result<Fista<F>> {
        model.check_observations(observations)?;
        Ok(Fista {
            step_size: self.step_size(),
            momentum: F::one(),
            extrapolated: model.coef().to_owned(),
            buffers: GradientBuffers::new(observations.nobservations(), model.nfeatures()),
        })
    }
}

impl<F: Float> Algorithm<F> for Fista<F> {
    fn name(&self) -> &'static str {
        "Fista"
    }

    fn shape(&self) -> (usize, usize) {
        self.buffers.shape()
    }

    fn update(&mut self, model: &mut Model<F>, observations: &Observations<F>) -> Result<()> {
        check_shape(self.name(), self.shape(), model, observations)?;
        self.advance(model, observations);
        Ok(())
    }
}

impl<F: Float> Stepped<F> for Fista<F> {
    fn step_size(&self) -> F {
        self.step_size
    }

    fn set_step_size(&mut self, step_size: F) {
        self.step_size = step_size;
    }

    fn prepare(&mut self, model: &Model<F>, observations: &Observations<F>) {
        self.buffers
            .compute(model, observations, self.extrapolated.view());
    }

    fn base_point<'a>(&'a self, _model: &'a Model<F>) -> ArrayView1<'a, F> {
        self.extrapolated.view()
    }

    fn propose(&mut self, model: &Model<F>, step_size: F) {
        self.buffers
            .prox_step(model, self.extrapolated.view(), step_size);
    }

    fn candidate(&self) -> ArrayView1<F> {
        self.buffers.candidate()
    }

    fn commit(&mut self, model: &mut Model<F>) {
        let t = self.momentum;
        let t_next = (F::one() + (F::one() + F::cast(4.) * t * t).sqrt()) / F::cast(2.);
        let ratio = (t - F::one()) / t_next;

        let candidate = self.buffers.candidate();
        Zip::from(&mut self.extrapolated)
            .and(&candidate)
            .and(model.coef())
            .for_each(|z, new, old| *z = *new + ratio * (*new - *old));

        model.coef_mut().assign(&candidate);
        self.momentum = t_next;
    }
}
