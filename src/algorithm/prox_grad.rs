use ndarray::ArrayView1;

use crate::error::Result;
use crate::{Float, Model, Observations};

use super::hyperparams::{ProxGradParams, ProxGradValidParams};
use super::{check_shape, Algorithm, BuildAlgorithm, GradientBuffers, Stepped};

/// Proximal gradient method with a fixed step size
///
/// Every update takes a gradient step on the smooth loss and applies the proximal operator of
/// the penalty, scaled by each coefficient's lambda:
///
/// ```ignore
/// coef_j <- prox(coef_j - step * grad_j, step * lambda_j)
/// ```
///
/// Works for any loss and any penalty. For a loss with `L`-Lipschitz gradient a step size
/// below `1 / L` decreases the objective monotonically.
#[derive(Debug, Clone)]
pub struct ProxGrad<F> {
    step_size: F,
    buffers: GradientBuffers<F>,
}

impl<F: Float> ProxGrad<F> {
    /// Create default hyperparameters
    pub fn params() -> ProxGradParams<F> {
        ProxGradParams::new()
    }

    /// Proximal gradient with the default step size of `1.0`
    pub fn new(model: &Model<F>, observations: &Observations<F>) -> Result<Self> {
        Self::params().build(model, observations)
    }
}

impl<F: Float> BuildAlgorithm<F> for ProxGradValidParams<F> {
    type Algorithm = ProxGrad<F>;

    fn build(&self, model: &Model<F>, observations: &Observations<F>) -> Result<ProxGrad<F>> {
        model.check_observations(observations)?;
        Ok(ProxGrad {
            step_size: self.step_size(),
            buffers: GradientBuffers::new(observations.nobservations(), model.nfeatures()),
        })
    }
}

impl<F: Float> Algorithm<F> for ProxGrad<F> {
    fn name(&self) -> &'static str {
        "ProxGrad"
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

impl<F: Float> Stepped<F> for ProxGrad<F> {
    fn step_size(&self) -> F {
        self.step_size
    }

    fn set_step_size(&mut self, step_size: F) {
        self.step_size = step_size;
    }

    fn prepare(&mut self, model: &Model<F>, observations: &Observations<F>) {
        self.buffers.compute(model, observations, model.coef());
    }

    fn base_point<'a>(&'a self, model: &'a Model<F>) -> ArrayView1<'a, F> {
        model.coef()
    }

    fn propose(&mut self, model: &Model<F>, step_size: F) {
        self.buffers.prox_step(model, model.coef(), step_size);
    }

    fn candidate(&self) -> ArrayView1<F> {
        self.buffers.candidate()
    }

    fn commit(&mut self, model: &mut Model<F>) {
        model.coef_mut().assign(&self.buffers.candidate());
    }
}
