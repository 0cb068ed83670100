#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use ndarray::{Array1, Zip};

use crate::error::{Result, SparseRegError};
use crate::{Float, Model, Observations, ParamGuard};

use super::{check_shape, Algorithm, Stepped};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
/// A verified hyper-parameter set for a backtracking line search
///
/// See [`LineSearchParams`] for more information.
#[derive(Clone, Debug, PartialEq)]
pub struct LineSearchValidParams<F> {
    contraction: F,
    armijo: F,
    max_backtracks: usize,
}

impl<F: Float> LineSearchValidParams<F> {
    pub fn contraction(&self) -> F {
        self.contraction
    }

    pub fn armijo(&self) -> F {
        self.armijo
    }

    pub fn max_backtracks(&self) -> usize {
        self.max_backtracks
    }

    /// Wrap an algorithm with a line search using these parameters
    pub fn wrap<A: Stepped<F>>(&self, algorithm: A) -> LineSearch<F, A> {
        let (nobservations, _) = algorithm.shape();
        LineSearch {
            params: self.clone(),
            predictor: Array1::zeros(nobservations),
            backtracks: 0,
            algorithm,
        }
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
/// A hyper-parameter set for a backtracking line search
///
/// A candidate `z+` computed from the base point `z` with step `t` is accepted once
///
/// ```ignore
/// objective(z+) <= objective(z) - armijo * ||z - z+||^2 / t
/// ```
///
/// otherwise the step is multiplied by `contraction` and a new candidate is computed. Without
/// a penalty the bound reduces to the Armijo condition `armijo * t * ||grad||^2`.
///
/// # Parameters
/// | Name | Default | Purpose | Range |
/// | :--- | :--- | :---| :--- |
/// | [contraction](Self::contraction) | `0.5` | Shrinkage of the step after a rejected candidate | `(0, 1)` |
/// | [armijo](Self::armijo) | `1e-4` | Sufficient decrease constant | `(0, 1)` |
/// | [max_backtracks](Self::max_backtracks) | `30` | Rejected candidates before the last one is accepted anyway | `[0, inf)` |
///
/// # Errors
///
/// Returns [`InvalidContraction`](SparseRegError::InvalidContraction) or
/// [`InvalidArmijo`](SparseRegError::InvalidArmijo) if the respective constant is outside of
/// the unit interval.
#[derive(Clone, Debug, PartialEq)]
pub struct LineSearchParams<F>(LineSearchValidParams<F>);

impl<F: Float> Default for LineSearchParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> LineSearchParams<F> {
    pub fn new() -> Self {
        Self(LineSearchValidParams {
            contraction: F::cast(0.5),
            armijo: F::cast(1e-4),
            max_backtracks: 30,
        })
    }

    /// Set the factor the step size is multiplied with after a rejected candidate.
    ///
    /// Defaults to `0.5` if not set
    pub fn contraction(mut self, contraction: F) -> Self {
        self.0.contraction = contraction;
        self
    }

    /// Set the sufficient decrease constant.
    ///
    /// Defaults to `1e-4` if not set
    pub fn armijo(mut self, armijo: F) -> Self {
        self.0.armijo = armijo;
        self
    }

    /// Set the number of rejected candidates after which the last candidate is accepted
    /// unconditionally.
    ///
    /// Defaults to `30` if not set
    pub fn max_backtracks(mut self, max_backtracks: usize) -> Self {
        self.0.max_backtracks = max_backtracks;
        self
    }

    /// Check the parameters and wrap an algorithm
    pub fn wrap<A: Stepped<F>>(&self, algorithm: A) -> Result<LineSearch<F, A>> {
        Ok(self.check_ref()?.wrap(algorithm))
    }
}

impl<F: Float> ParamGuard for LineSearchParams<F> {
    type Checked = LineSearchValidParams<F>;
    type Error = SparseRegError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let unit = |x: F| x.is_finite() && x > F::zero() && x < F::one();
        if !unit(self.0.contraction) {
            Err(SparseRegError::InvalidContraction(
                self.0.contraction.to_f32().unwrap_or(f32::NAN),
            ))
        } else if !unit(self.0.armijo) {
            Err(SparseRegError::InvalidArmijo(
                self.0.armijo.to_f32().unwrap_or(f32::NAN),
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

/// Backtracking line search around an algorithm with a single step size
///
/// The wrapped algorithm is owned by the line search. Every update starts from the step size
/// accepted in the previous update, so the step never grows again.
///
/// ```rust
/// use sparsereg::algorithm::{Algorithm, Fista, LineSearch};
/// use sparsereg::{Model, Observations};
/// use ndarray::array;
///
/// let obs = Observations::new(array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]], array![3.0, 2.0, 5.0])?;
/// let mut model = Model::new(2);
///
/// let mut algorithm = LineSearch::new(Fista::new(&model, &obs)?);
/// algorithm.update(&mut model, &obs)?;
/// # Ok::<(), sparsereg::SparseRegError>(())
/// ```
#[derive(Debug, Clone)]
pub struct LineSearch<F, A> {
    params: LineSearchValidParams<F>,
    /// scratch space for objective evaluations, one entry per observation
    predictor: Array1<F>,
    backtracks: usize,
    algorithm: A,
}

impl<F: Float, A: Stepped<F>> LineSearch<F, A> {
    /// Wrap an algorithm with the default line search parameters
    pub fn new(algorithm: A) -> Self {
        LineSearchParams::new().check_unwrap().wrap(algorithm)
    }

    /// The wrapped algorithm
    pub fn inner(&self) -> &A {
        &self.algorithm
    }

    /// Unwrap the wrapped algorithm
    pub fn into_inner(self) -> A {
        self.algorithm
    }

    /// Number of rejected candidates in the last update
    pub fn backtracks(&self) -> usize {
        self.backtracks
    }
}

impl<F: Float, A: Stepped<F>> Algorithm<F> for LineSearch<F, A> {
    fn name(&self) -> &'static str {
        self.algorithm.name()
    }

    fn shape(&self) -> (usize, usize) {
        self.algorithm.shape()
    }

    fn update(&mut self, model: &mut Model<F>, observations: &Observations<F>) -> Result<()> {
        check_shape(self.name(), self.shape(), model, observations)?;

        let penalized = self.algorithm.penalized();
        self.algorithm.prepare(model, observations);
        let base_value = model.objective_at(
            observations,
            self.algorithm.base_point(model),
            &mut self.predictor,
            penalized,
        );

        let mut step_size = self.algorithm.step_size();
        self.backtracks = 0;
        loop {
            self.algorithm.propose(model, step_size);

            let candidate = self.algorithm.candidate();
            let distance = Zip::from(&self.algorithm.base_point(model))
                .and(&candidate)
                .fold(F::zero(), |acc, b, c| acc + (*b - *c) * (*b - *c));
            let value = model.objective_at(observations, candidate, &mut self.predictor, penalized);

            if value <= base_value - self.params.armijo * distance / step_size {
                break;
            }
            if self.backtracks == self.params.max_backtracks {
                log::warn!(
                    "{}: no sufficient decrease after {} backtracks, accepting step size {}",
                    self.algorithm.name(),
                    self.backtracks,
                    step_size
                );
                break;
            }
            step_size *= self.params.contraction;
            self.backtracks += 1;
        }

        log::debug!(
            "{}: accepted step size {} after {} backtracks",
            self.algorithm.name(),
            step_size,
            self.backtracks
        );
        self.algorithm.set_step_size(step_size);
        self.algorithm.commit(model);
        Ok(())
    }
}
