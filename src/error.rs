//! Error types in sparsereg
//!
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SparseRegError>;

/// An error when building observations, configuring an algorithm or fitting a model
///
/// Reaching the iteration cap or the time limit is not an error, see
/// [`Status`](crate::Status) for the terminal states of a learning run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SparseRegError {
    /// Shapes of observations, model and algorithm buffers disagree, or weights are negative
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
    /// The observations contain no rows
    #[error("at least one observation is needed")]
    NotEnoughSamples,
    /// A closed-form solver was asked to handle a loss or penalty it cannot solve exactly
    #[error("{solver} only supports a scaled squared error loss with no or ridge penalty, got {loss} with {penalty}")]
    UnsupportedCombination {
        solver: &'static str,
        loss: String,
        penalty: String,
    },
    /// The regularized cross-product matrix is not positive definite
    #[error("{solver}: cross-product matrix is not positive definite (pivot {pivot} is {value:e}), add regularization or use an iterative algorithm")]
    NumericalDegeneracy {
        solver: &'static str,
        pivot: usize,
        value: f64,
    },
    /// The factorization backend failed for a reason other than a degenerate pivot
    #[error("linear algebra: {0}")]
    Linalg(String),
    #[error("step size should be positive and finite, but is {0}")]
    InvalidStepSize(f32),
    #[error("step divisor should be larger than 1, but is {0}")]
    InvalidDivisor(f32),
    #[error("regularization scale should be nonnegative and finite, but is {0}")]
    InvalidLambda(f32),
    #[error("tolerance should be positive and finite, but is {0}")]
    InvalidTolerance(f32),
    #[error("maximum number of iterations must be bigger than 0")]
    InvalidMaxIterations,
    #[error("contraction factor should be in range (0, 1), but is {0}")]
    InvalidContraction(f32),
    #[error("sufficient decrease constant should be in range (0, 1), but is {0}")]
    InvalidArmijo(f32),
    #[error("invalid loss parameter {0}")]
    InvalidLossParameter(String),
    #[error("invalid penalty parameter {0}")]
    InvalidPenaltyParameter(String),
}

#[cfg(not(feature = "blas"))]
impl From<linfa_linalg::LinalgError> for SparseRegError {
    fn from(err: linfa_linalg::LinalgError) -> Self {
        SparseRegError::Linalg(err.to_string())
    }
}

#[cfg(feature = "blas")]
impl From<ndarray_linalg::error::LinalgError> for SparseRegError {
    fn from(err: ndarray_linalg::error::LinalgError) -> Self {
        SparseRegError::Linalg(err.to_string())
    }
}

impl SparseRegError {
    pub(crate) fn mismatch(context: &str, expected: usize, found: usize) -> Self {
        SparseRegError::DimensionMismatch(format!(
            "{}: expected {}, found {}",
            context, expected, found
        ))
    }
}
