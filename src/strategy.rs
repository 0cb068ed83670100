//! Driving an algorithm until a termination condition holds
//!
//! A [`Strategy`] owns an [`Algorithm`] together with an ordered list of termination conditions
//! and hooks. Every call to [`Strategy::learn`] starts from a clean state, so the same strategy
//! can be reused for several fits of the same shape.
use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use ndarray::{Array1, ArrayView1, Zip};

use crate::algorithm::{check_shape, Algorithm};
use crate::error::{Result, SparseRegError};
use crate::{Float, Model, Observations};

/// Terminal state of a learning run
///
/// Reaching the iteration cap or the time limit is a regular outcome and no error.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Converged,
    MaxIterReached,
    TimedOut,
}

/// Summary of a finished learning run
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Learned {
    pub status: Status,
    /// Number of algorithm updates performed
    pub iterations: usize,
    pub elapsed: Duration,
}

/// A condition deciding when a learning run ends
pub trait Termination<F: Float> {
    /// Validate the condition's parameters, called before anything is run
    fn check(&self) -> Result<()> {
        Ok(())
    }

    /// Reset all internal state at the beginning of a run
    fn init(&mut self, model: &Model<F>);

    /// Whether the run should stop after `iteration` updates
    fn finished(&mut self, model: &Model<F>, iteration: usize) -> bool;

    /// The terminal state reported when this condition ends a run
    fn status(&self) -> Status;
}

/// Stop once a fixed number of updates was performed
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaxIter(pub usize);

impl<F: Float> Termination<F> for MaxIter {
    fn check(&self) -> Result<()> {
        if self.0 == 0 {
            Err(SparseRegError::InvalidMaxIterations)
        } else {
            Ok(())
        }
    }

    fn init(&mut self, _model: &Model<F>) {}

    fn finished(&mut self, _model: &Model<F>, iteration: usize) -> bool {
        iteration >= self.0
    }

    fn status(&self) -> Status {
        Status::MaxIterReached
    }
}

/// Stop once the wall-clock time since the start of the run exceeds a limit
///
/// The limit is only checked between updates, a single long update is never interrupted.
#[derive(Clone, Debug)]
pub struct TimeLimit {
    limit: Duration,
    start: Instant,
}

impl TimeLimit {
    pub fn new(limit: Duration) -> Self {
        TimeLimit {
            limit,
            start: Instant::now(),
        }
    }
}

impl<F: Float> Termination<F> for TimeLimit {
    fn init(&mut self, _model: &Model<F>) {
        self.start = Instant::now();
    }

    fn finished(&mut self, _model: &Model<F>, _iteration: usize) -> bool {
        self.start.elapsed() > self.limit
    }

    fn status(&self) -> Status {
        Status::TimedOut
    }
}

type Metric<'a, F> = Box<dyn Fn(ArrayView1<F>, ArrayView1<F>) -> F + 'a>;

/// Stop once the change of the coefficients between two updates falls below a tolerance
///
/// The change is measured by `metric(previous, current)`, which defaults to the euclidean norm
/// of the difference.
pub struct Converged<'a, F> {
    tolerance: F,
    metric: Metric<'a, F>,
    previous: Array1<F>,
}

impl<'a, F: Float> Converged<'a, F> {
    pub fn new(tolerance: F) -> Self {
        Self::with_metric(tolerance, euclidean_distance)
    }

    pub fn with_metric<M>(tolerance: F, metric: M) -> Self
    where
        M: Fn(ArrayView1<F>, ArrayView1<F>) -> F + 'a,
    {
        Converged {
            tolerance,
            metric: Box::new(metric),
            previous: Array1::zeros(0),
        }
    }
}

impl<'a, F: Float> std::fmt::Debug for Converged<'a, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converged")
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

fn euclidean_distance<F: Float>(previous: ArrayView1<F>, current: ArrayView1<F>) -> F {
    Zip::from(&previous)
        .and(&current)
        .fold(F::zero(), |acc, a, b| acc + (*a - *b) * (*a - *b))
        .sqrt()
}

impl<'a, F: Float> Termination<F> for Converged<'a, F> {
    fn check(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance <= F::zero() {
            Err(SparseRegError::InvalidTolerance(
                self.tolerance.to_f32().unwrap_or(f32::NAN),
            ))
        } else {
            Ok(())
        }
    }

    fn init(&mut self, model: &Model<F>) {
        self.previous = model.coef().to_owned();
    }

    fn finished(&mut self, model: &Model<F>, _iteration: usize) -> bool {
        let change = (self.metric)(self.previous.view(), model.coef());
        self.previous.assign(&model.coef());
        change < self.tolerance
    }

    fn status(&self) -> Status {
        Status::Converged
    }
}

/// Observer of a learning run
///
/// Hooks only see the model, they cannot alter the course of a run.
pub trait Hook<F: Float> {
    fn init(&mut self, _model: &Model<F>) {}

    /// Called before update number `iteration`, counting from one
    fn pre_iteration(&mut self, _model: &Model<F>, _iteration: usize) {}

    /// Called after update number `iteration`, counting from one
    fn post_iteration(&mut self, _model: &Model<F>, _iteration: usize) {}
}

impl<F: Float, H: Hook<F> + ?Sized> Hook<F> for &mut H {
    fn init(&mut self, model: &Model<F>) {
        (**self).init(model)
    }

    fn pre_iteration(&mut self, model: &Model<F>, iteration: usize) {
        (**self).pre_iteration(model, iteration)
    }

    fn post_iteration(&mut self, model: &Model<F>, iteration: usize) {
        (**self).post_iteration(model, iteration)
    }
}

/// Record a value computed from the model every `every` updates
///
/// Pass the tracer by mutable reference to keep access to the trace after the run:
///
/// ```rust
/// use sparsereg::algorithm::ProxGrad;
/// use sparsereg::{Model, Observations, Strategy, Tracer};
/// use ndarray::array;
///
/// let obs = Observations::new(array![[1.0, 0.0], [0.0, 1.0]], array![1.0, -1.0])?;
/// let mut model = Model::new(2);
/// let mut tracer = Tracer::new(1, |model: &Model<f64>| model.objective(&obs));
///
/// Strategy::new(ProxGrad::new(&model, &obs)?)
///     .max_iter(10)
///     .hook(&mut tracer)
///     .learn(&mut model, &obs)?;
///
/// assert_eq!(tracer.values().len(), 10);
/// # Ok::<(), sparsereg::SparseRegError>(())
/// ```
pub struct Tracer<'a, F: Float, T> {
    every: usize,
    record: Box<dyn FnMut(&Model<F>) -> T + 'a>,
    values: Vec<(usize, T)>,
}

impl<'a, F: Float, T> Tracer<'a, F, T> {
    /// A tracer recording `record(model)` after every `every` updates, an interval of zero is
    /// treated as one
    pub fn new<R>(every: usize, record: R) -> Self
    where
        R: FnMut(&Model<F>) -> T + 'a,
    {
        Tracer {
            every: every.max(1),
            record: Box::new(record),
            values: Vec::new(),
        }
    }

    /// Recorded values together with the iteration they were recorded at
    pub fn values(&self) -> &[(usize, T)] {
        &self.values
    }

    pub fn into_values(self) -> Vec<(usize, T)> {
        self.values
    }
}

impl<'a, F: Float, T> Hook<F> for Tracer<'a, F, T> {
    fn init(&mut self, _model: &Model<F>) {
        self.values.clear();
    }

    fn post_iteration(&mut self, model: &Model<F>, iteration: usize) {
        if iteration % self.every == 0 {
            let value = (self.record)(model);
            self.values.push((iteration, value));
        }
    }
}

/// Log the iteration number and coefficient change on the `info` level
#[derive(Debug, Clone)]
pub struct Verbose<F> {
    previous: Array1<F>,
}

impl<F: Float> Verbose<F> {
    pub fn new() -> Self {
        Verbose {
            previous: Array1::zeros(0),
        }
    }
}

impl<F: Float> Default for Verbose<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> Hook<F> for Verbose<F> {
    fn init(&mut self, model: &Model<F>) {
        self.previous = model.coef().to_owned();
    }

    fn post_iteration(&mut self, model: &Model<F>, iteration: usize) {
        let change = euclidean_distance(self.previous.view(), model.coef());
        self.previous.assign(&model.coef());
        log::info!("iteration {}: coefficient change {}", iteration, change);
    }
}

/// Update cap used when no termination condition was registered
pub const DEFAULT_MAX_ITER: usize = 1000;
/// Tolerance on the coefficient change used when no termination condition was registered
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Controller running an algorithm until a termination condition holds
///
/// Conditions are evaluated after every update in the order they were registered and the first
/// one that holds decides the reported [`Status`]. Without any registered condition the run
/// stops after [`DEFAULT_MAX_ITER`] updates or once the coefficients change by less than
/// [`DEFAULT_TOLERANCE`]. Closed-form algorithms are updated once and reported as converged.
///
/// ```rust
/// use std::time::Duration;
/// use sparsereg::algorithm::{Fista, LineSearch};
/// use sparsereg::{L1Penalty, Model, Observations, Status, Strategy};
/// use ndarray::array;
///
/// let obs = Observations::new(
///     array![[1.0, 0.1], [0.2, 1.0], [0.9, 0.4], [0.1, 0.8]],
///     array![1.0, -1.0, 0.8, -0.7],
/// )?;
/// let mut model = Model::new(2)
///     .with_penalty(L1Penalty)
///     .with_uniform_lambda(0.01)?;
///
/// let learned = Strategy::new(LineSearch::new(Fista::new(&model, &obs)?))
///     .max_iter(5000)
///     .time_limit(Duration::from_secs(10))
///     .converged(1e-10)
///     .learn(&mut model, &obs)?;
///
/// assert_eq!(learned.status, Status::Converged);
/// # Ok::<(), sparsereg::SparseRegError>(())
/// ```
pub struct Strategy<'a, F: Float, A> {
    algorithm: A,
    conditions: Vec<Box<dyn Termination<F> + 'a>>,
    hooks: Vec<Box<dyn Hook<F> + 'a>>,
}

impl<'a, F: Float, A: Algorithm<F>> Strategy<'a, F, A> {
    pub fn new(algorithm: A) -> Self {
        Strategy {
            algorithm,
            conditions: Vec::new(),
            hooks: Vec::new(),
        }
    }

    /// Stop after `max_iter` updates, which must be positive
    pub fn max_iter(self, max_iter: usize) -> Self {
        self.until(MaxIter(max_iter))
    }

    /// Stop once the run took longer than `limit`
    pub fn time_limit(self, limit: Duration) -> Self {
        self.until(TimeLimit::new(limit))
    }

    /// Stop once the euclidean norm of the coefficient change is below `tolerance`
    pub fn converged(self, tolerance: F) -> Self {
        self.until(Converged::new(tolerance))
    }

    /// Stop once `metric(previous, current)` is below `tolerance`
    pub fn converged_with<M>(self, tolerance: F, metric: M) -> Self
    where
        M: Fn(ArrayView1<F>, ArrayView1<F>) -> F + 'a,
    {
        self.until(Converged::with_metric(tolerance, metric))
    }

    /// Register an arbitrary termination condition
    pub fn until<T: Termination<F> + 'a>(mut self, condition: T) -> Self {
        self.conditions.push(Box::new(condition));
        self
    }

    /// Register a hook
    pub fn hook<H: Hook<F> + 'a>(mut self, hook: H) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn algorithm(&self) -> &A {
        &self.algorithm
    }

    pub fn into_algorithm(self) -> A {
        self.algorithm
    }

    /// Run the algorithm on the model until a termination condition holds
    ///
    /// # Errors
    ///
    /// Fails before any update if model, observations and algorithm disagree in shape or a
    /// condition has invalid parameters. Errors of an update are passed on, the model then keeps
    /// the coefficients of the last successful update.
    pub fn learn(
        &mut self,
        model: &mut Model<F>,
        observations: &Observations<F>,
    ) -> Result<Learned> {
        check_shape(
            self.algorithm.name(),
            self.algorithm.shape(),
            model,
            observations,
        )?;
        for condition in &self.conditions {
            condition.check()?;
        }

        let start = Instant::now();
        for hook in self.hooks.iter_mut() {
            hook.init(model);
        }

        if self.algorithm.is_closed_form() {
            Self::step(
                &mut self.algorithm,
                &mut self.hooks,
                model,
                observations,
                1,
            )?;
            log::debug!("{}: solved in closed form", self.algorithm.name());
            return Ok(Learned {
                status: Status::Converged,
                iterations: 1,
                elapsed: start.elapsed(),
            });
        }

        let mut defaults: Vec<Box<dyn Termination<F> + 'a>>;
        let conditions = if self.conditions.is_empty() {
            defaults = Vec::with_capacity(2);
            defaults.push(Box::new(MaxIter(DEFAULT_MAX_ITER)));
            defaults.push(Box::new(Converged::new(F::cast(DEFAULT_TOLERANCE))));
            &mut defaults
        } else {
            &mut self.conditions
        };
        for condition in conditions.iter_mut() {
            condition.init(model);
        }

        let mut iteration = 0;
        loop {
            iteration += 1;
            Self::step(
                &mut self.algorithm,
                &mut self.hooks,
                model,
                observations,
                iteration,
            )?;

            if let Some(status) = conditions.iter_mut().find_map(|condition| {
                if condition.finished(model, iteration) {
                    Some(condition.status())
                } else {
                    None
                }
            }) {
                log::debug!(
                    "{}: {:?} after {} iterations",
                    self.algorithm.name(),
                    status,
                    iteration
                );
                return Ok(Learned {
                    status,
                    iterations: iteration,
                    elapsed: start.elapsed(),
                });
            }
        }
    }

    fn step(
        algorithm: &mut A,
        hooks: &mut [Box<dyn Hook<F> + 'a>],
        model: &mut Model<F>,
        observations: &Observations<F>,
        iteration: usize,
    ) -> Result<()> {
        for hook in hooks.iter_mut() {
            hook.pre_iteration(model, iteration);
        }
        algorithm.update(model, observations)?;
        for hook in hooks.iter_mut() {
            hook.post_iteration(model, iteration);
        }
        log::debug!("{}: finished iteration {}", algorithm.name(), iteration);
        Ok(())
    }
}
