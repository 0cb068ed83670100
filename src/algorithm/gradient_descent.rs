use ndarray::ArrayView1;

use crate::error::Result;
use crate::{Float, Model, Observations};

use super::hyperparams::{GradientDescentParams, GradientDescentValidParams};
use super::{check_shape, Algorithm, BuildAlgorithm, GradientBuffers, Stepped};

/// Plain gradient descent on the loss with a fixed step size
///
/// No proximal step is applied, so the penalty and lambda of the model are ignored. Use it
/// when neither sparsity nor shrinkage is required.
#[derive(Debug, Clone)]
pub struct GradientDescent<F> {
    step_size: F,
    buffers: GradientBuffers<F>,
}

impl<F: Float> GradientDescent<F> {
    /// Create default hyperparameters
    pub fn params() -> GradientDescentParams<F> {
        GradientDescentParams::new()
    }

    /// Gradient descent with the default step size of `1.0`
    pub fn new(model: &Model<F>, observations: &Observations<F>) -> Result<Self> {
        Self::params().build(model, observations)
    }
}

impl<F: Float> BuildAlgorithm<F> for GradientDescentValidParams<F> {
    type Algorithm = GradientDescent<F>;

    fn build(
        &self,
        model: &Model<F>,
        observations: &Observations<F>,
    ) -> Result<GradientDescent<F>> {
        model.check_observations(observations)?;
        Ok(GradientDescent {
            step_size: self.step_size(),
            buffers: GradientBuffers::new(observations.nobservations(), model.nfeatures()),
        })
    }
}

impl<F: Float> Algorithm<F> for GradientDescent<F> {
    fn name(&self) -> &'static str {
        "GradientDescent"
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

impl<F: Float> Stepped<F> for GradientDescent<F> {
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
        self.buffers.gradient_step(model.coef(), step_size);
    }

    fn candidate(&self) -> ArrayView1<F> {
        self.buffers.candidate()
    }

    fn commit(&mut self, model: &mut Model<F>) {
        model.coef_mut().assign(&self.buffers.candidate());
    }

    fn penalized(&self) -> bool {
        false
    }
}
