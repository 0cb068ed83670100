use crate::algorithm::BuildAlgorithm;
use crate::error::SparseRegError;
use crate::{Float, Model, Observations};

/// A set of hyperparameters whose values have not been checked for validity. A reference to the
/// checked hyperparameters can only be obtained after checking has completed. If
/// `BuildAlgorithm` has been implemented on the checked hyperparameters, it will also be
/// implemented on the unchecked hyperparameters with the checking step done automatically.
///
/// The hyperparameter validation done in `check_ref()` and `check()` should be identical.
pub trait ParamGuard {
    /// The checked hyperparameters
    type Checked;
    /// Error type resulting from failed hyperparameter checking
    type Error: std::error::Error;

    /// Checks the hyperparameters and returns a reference to the checked hyperparameters if
    /// successful
    fn check_ref(&self) -> Result<&Self::Checked, Self::Error>;

    /// Checks the hyperparameters and returns the checked hyperparameters if successful
    fn check(self) -> Result<Self::Checked, Self::Error>;

    /// Calls `check()` and unwraps the result
    fn check_unwrap(self) -> Self::Checked
    where
        Self: Sized,
    {
        self.check().unwrap()
    }
}

/// Performs checking step and calls `build` on the checked hyperparameters. If checking failed,
/// the checking error is converted to the original error type of `BuildAlgorithm` and returned.
impl<F, P> BuildAlgorithm<F> for P
where
    F: Float,
    P: ParamGuard,
    P::Checked: BuildAlgorithm<F>,
    SparseRegError: From<P::Error>,
{
    type Algorithm = <P::Checked as BuildAlgorithm<F>>::Algorithm;

    fn build(
        &self,
        model: &Model<F>,
        observations: &Observations<F>,
    ) -> crate::Result<Self::Algorithm> {
        let checked = self.check_ref()?;
        checked.build(model, observations)
    }
}
