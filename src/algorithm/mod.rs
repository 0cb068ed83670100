//! Algorithms minimizing the objective of a [`Model`]
//!
//! Every algorithm is constructed against a model and a set of observations, so that its
//! working buffers have the right size, and afterwards only mutates the model's coefficients
//! through [`Algorithm::update`]. Iterative algorithms are driven by a
//! [`Strategy`](crate::Strategy), closed-form solvers finish in a single update.
use ndarray::{Array1, ArrayView1, Zip};

use crate::error::{Result, SparseRegError};
use crate::{Float, Model, Observations};

mod adaptive;
mod cholesky;
mod closed_form;
mod fista;
mod gradient_descent;
mod hyperparams;
mod line_search;
mod prox_grad;
mod sweep;

pub use adaptive::{AdaptiveProxGrad, AdaptiveProxGradParams, AdaptiveProxGradValidParams};
pub use cholesky::Cholesky;
pub use fista::Fista;
pub use gradient_descent::GradientDescent;
pub use hyperparams::{
    FistaParams, FistaValidParams, GradientDescentParams, GradientDescentValidParams,
    ProxGradParams, ProxGradValidParams, StepParamsBase, StepValidParamsBase,
};
pub use line_search::{LineSearch, LineSearchParams, LineSearchValidParams};
pub use prox_grad::ProxGrad;
pub use sweep::Sweep;

/// An algorithm updating the coefficients of a model
pub trait Algorithm<F: Float> {
    /// Short name used in diagnostics and errors
    fn name(&self) -> &'static str;

    /// Number of observations and coefficients the working buffers were sized for
    fn shape(&self) -> (usize, usize);

    /// Perform a single update of the model coefficients
    ///
    /// Fails before touching the model if the shapes of model and observations differ from
    /// the ones the algorithm was constructed with.
    fn update(&mut self, model: &mut Model<F>, observations: &Observations<F>) -> Result<()>;

    /// Closed-form algorithms compute the exact minimizer in one update
    fn is_closed_form(&self) -> bool {
        false
    }
}

impl<F: Float, A: Algorithm<F> + ?Sized> Algorithm<F> for Box<A> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn shape(&self) -> (usize, usize) {
        (**self).shape()
    }

    fn update(&mut self, model: &mut Model<F>, observations: &Observations<F>) -> Result<()> {
        (**self).update(model, observations)
    }

    fn is_closed_form(&self) -> bool {
        (**self).is_closed_form()
    }
}

impl<'a, F: Float, A: Algorithm<F> + ?Sized> Algorithm<F> for &'a mut A {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn shape(&self) -> (usize, usize) {
        (**self).shape()
    }

    fn update(&mut self, model: &mut Model<F>, observations: &Observations<F>) -> Result<()> {
        (**self).update(model, observations)
    }

    fn is_closed_form(&self) -> bool {
        (**self).is_closed_form()
    }
}

/// Construct an algorithm from a set of hyperparameters
pub trait BuildAlgorithm<F: Float> {
    type Algorithm: Algorithm<F>;

    fn build(&self, model: &Model<F>, observations: &Observations<F>)
        -> Result<Self::Algorithm>;
}

/// An iterative algorithm whose update is a (proximal) gradient step with a single step size
///
/// Implementing this trait makes an algorithm eligible for [`LineSearch`]. An update is split
/// into computing the gradient at the base point, proposing a candidate for a step size and
/// committing the candidate to the model.
pub trait Stepped<F: Float>: Algorithm<F> {
    fn step_size(&self) -> F;

    fn set_step_size(&mut self, step_size: F);

    /// Compute the loss gradient at the base point of the next update
    fn prepare(&mut self, model: &Model<F>, observations: &Observations<F>);

    /// The point the gradient step starts from
    fn base_point<'a>(&'a self, model: &'a Model<F>) -> ArrayView1<'a, F>;

    /// Compute the candidate coefficients for `step_size` from the prepared gradient
    fn propose(&mut self, model: &Model<F>, step_size: F);

    /// The last proposed candidate
    fn candidate(&self) -> ArrayView1<F>;

    /// Write the last proposed candidate into the model
    fn commit(&mut self, model: &mut Model<F>);

    /// Whether the penalty is part of the objective this algorithm descends
    fn penalized(&self) -> bool {
        true
    }

    /// Prepare, propose with the current step size and commit
    fn advance(&mut self, model: &mut Model<F>, observations: &Observations<F>) {
        self.prepare(model, observations);
        let step_size = self.step_size();
        self.propose(model, step_size);
        self.commit(model);
    }
}

/// Fails if model or observations do not have the shape an algorithm was sized for
pub(crate) fn check_shape<F: Float>(
    name: &str,
    shape: (usize, usize),
    model: &Model<F>,
    observations: &Observations<F>,
) -> Result<()> {
    model.check_observations(observations)?;
    let (nobservations, nfeatures) = shape;
    if model.nfeatures() != nfeatures {
        return Err(SparseRegError::mismatch(
            &format!("{} was built for a different number of coefficients", name),
            nfeatures,
            model.nfeatures(),
        ));
    }
    if observations.nobservations() != nobservations {
        return Err(SparseRegError::mismatch(
            &format!("{} was built for a different number of observations", name),
            nobservations,
            observations.nobservations(),
        ));
    }
    Ok(())
}

/// Buffers shared by all gradient based algorithms
#[derive(Debug, Clone)]
pub(crate) struct GradientBuffers<F> {
    /// linear predictor, then weighted loss derivative, one entry per observation
    eta: Array1<F>,
    gradient: Array1<F>,
    candidate: Array1<F>,
}

impl<F: Float> GradientBuffers<F> {
    pub(crate) fn new(nobservations: usize, nfeatures: usize) -> Self {
        GradientBuffers {
            eta: Array1::zeros(nobservations),
            gradient: Array1::zeros(nfeatures),
            candidate: Array1::zeros(nfeatures),
        }
    }

    pub(crate) fn shape(&self) -> (usize, usize) {
        (self.eta.len(), self.gradient.len())
    }

    /// Evaluate the loss gradient at `coef`
    pub(crate) fn compute(
        &mut self,
        model: &Model<F>,
        observations: &Observations<F>,
        coef: ArrayView1<F>,
    ) {
        model.loss_gradient_at(observations, coef, &mut self.eta, &mut self.gradient);
    }

    pub(crate) fn candidate(&self) -> ArrayView1<F> {
        self.candidate.view()
    }

    /// Candidate `prox(base - step * gradient, step * lambda)`
    pub(crate) fn prox_step(&mut self, model: &Model<F>, base: ArrayView1<F>, step_size: F) {
        let penalty = model.penalty();
        Zip::from(&mut self.candidate)
            .and(&base)
            .and(&self.gradient)
            .and(model.lambda())
            .for_each(|c, b, g, l| *c = penalty.prox(*b - step_size * *g, step_size * *l));
    }

    /// Candidate `base - step * gradient`, ignoring the penalty
    pub(crate) fn gradient_step(&mut self, base: ArrayView1<F>, step_size: F) {
        Zip::from(&mut self.candidate)
            .and(&base)
            .and(&self.gradient)
            .for_each(|c, b, g| *c = *b - step_size * *g);
    }
}

/// Validated step size
pub(crate) fn check_step_size<F: Float>(step_size: F) -> Result<()> {
    if !step_size.is_finite() || step_size <= F::zero() {
        Err(SparseRegError::InvalidStepSize(
            step_size.to_f32().unwrap_or(f32::NAN),
        ))
    } else {
        Ok(())
    }
}
