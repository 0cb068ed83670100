//! `sparsereg` fits regularized linear models with pluggable losses, penalties and solvers.
//!
//! A [`Model`] describes the objective
//!
//! ```ignore
//! 1 / n * sum_i w_i * loss(x_i^T coef, y_i) + sum_j lambda_j * penalty(coef_j)
//! ```
//!
//! over a set of [`Observations`]. Any [`Loss`] can be combined with any [`Penalty`], the
//! coefficients are then found by one of the algorithms in [`algorithm`]:
//!
//! * proximal gradient with a fixed step size, [`ProxGrad`](algorithm::ProxGrad)
//! * accelerated proximal gradient, [`Fista`](algorithm::Fista)
//! * proximal gradient with one step per coefficient, [`AdaptiveProxGrad`](algorithm::AdaptiveProxGrad)
//! * plain gradient descent, [`GradientDescent`](algorithm::GradientDescent)
//! * closed-form least squares and ridge regression, [`Sweep`](algorithm::Sweep) and
//!   [`Cholesky`](algorithm::Cholesky)
//!
//! Algorithms with a single step size can be wrapped in a backtracking
//! [`LineSearch`](algorithm::LineSearch). Iterative algorithms are driven by a [`Strategy`],
//! which decides when to stop and calls hooks along the way.
//!
//! ## Example
//!
//! ```rust
//! use sparsereg::{L1Penalty, Model, Observations, Status};
//! use ndarray::array;
//!
//! let obs = Observations::new(
//!     array![[1.0, 0.1, 0.5], [0.2, 1.0, -0.3], [0.9, 0.3, -0.6], [0.1, 0.8, 0.4]],
//!     array![2.0, -1.0, 1.8, -0.7],
//! )?;
//!
//! let mut model = Model::new(3)
//!     .with_penalty(L1Penalty)
//!     .with_uniform_lambda(0.1)?;
//! let learned = model.fit(&obs)?;
//!
//! assert_eq!(learned.status, Status::Converged);
//! println!("coefficients {}", model.coef());
//! # Ok::<(), sparsereg::SparseRegError>(())
//! ```

pub mod algorithm;
pub mod error;
mod float;
pub mod loss;
mod model;
mod observations;
mod param_guard;
pub mod penalty;
mod strategy;

pub use error::{Result, SparseRegError};
pub use float::Float;
pub use loss::{AbsoluteError, Hinge, Huber, LogitMargin, Loss, SquaredError};
pub use model::Model;
pub use observations::Observations;
pub use param_guard::ParamGuard;
pub use penalty::{ElasticNetPenalty, L1Penalty, L2Penalty, NoPenalty, Penalty};
pub use strategy::{
    Converged, Hook, Learned, MaxIter, Status, Strategy, Termination, TimeLimit, Tracer, Verbose,
    DEFAULT_MAX_ITER, DEFAULT_TOLERANCE,
};

use algorithm::{LineSearch, ProxGrad};

/// Fit a model with the default algorithm
///
/// Runs a line-searched [`ProxGrad`] until the coefficients change by less than
/// [`DEFAULT_TOLERANCE`] or [`DEFAULT_MAX_ITER`] updates were performed. The coefficients of the
/// model are used as the starting point and overwritten with the result.
pub fn fit<F: Float>(model: &mut Model<F>, observations: &Observations<F>) -> Result<Learned> {
    let algorithm = LineSearch::new(ProxGrad::new(model, observations)?);
    Strategy::new(algorithm).learn(model, observations)
}
