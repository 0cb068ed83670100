//! Shared pieces of the closed-form solvers
//!
//! Both solvers minimize
//!
//! ```ignore
//! 1 / n * sum_i w_i * s * (y_i - x_i^T coef)^2 + sum_j lambda_j * c * coef_j^2
//! ```
//!
//! whose minimizer solves the normal equations
//!
//! ```ignore
//! (X^T W X + n * c / s * diag(lambda)) coef = X^T W y
//! ```
use ndarray::{ArrayViewMut1, ArrayViewMut2};

use crate::error::{Result, SparseRegError};
use crate::{Float, Model, Observations};

/// Factor `n * c / s` in front of `diag(lambda)` in the normal equations
///
/// Fails if the loss is not a scaled squared error or the penalty is neither absent nor a
/// scaled ridge penalty.
pub(crate) fn ridge_factor<F: Float>(
    solver: &'static str,
    model: &Model<F>,
    observations: &Observations<F>,
) -> Result<F> {
    match (
        model.loss().quadratic_scale(),
        model.penalty().quadratic_scale(),
    ) {
        (Some(s), Some(c)) if s > F::zero() => {
            Ok(F::cast(observations.nobservations()) * c / s)
        }
        _ => Err(SparseRegError::UnsupportedCombination {
            solver,
            loss: format!("{:?}", model.loss()),
            penalty: format!("{:?}", model.penalty()),
        }),
    }
}

/// Accumulate `X^T W X` into `gram`, `X^T W y` into `xty` and return `y^T W y`
///
/// Rows with zero weight are skipped. Only the upper triangle is accumulated and mirrored
/// afterwards.
pub(crate) fn cross_products<F: Float>(
    observations: &Observations<F>,
    mut gram: ArrayViewMut2<F>,
    mut xty: ArrayViewMut1<F>,
) -> F {
    let nfeatures = observations.nfeatures();
    gram.fill(F::zero());
    xty.fill(F::zero());

    let mut yty = F::zero();
    for (i, (row, y)) in observations
        .x()
        .outer_iter()
        .zip(observations.y().iter())
        .enumerate()
    {
        let w = observations.weight(i);
        if w == F::zero() {
            continue;
        }
        for j in 0..nfeatures {
            let wx = w * row[j];
            xty[j] += wx * *y;
            for k in j..nfeatures {
                gram[[j, k]] += wx * row[k];
            }
        }
        yty += w * *y * *y;
    }

    for j in 0..nfeatures {
        for k in 0..j {
            gram[[j, k]] = gram[[k, j]];
        }
    }

    yty
}

/// Smallest admissible pivot relative to the original diagonal entry
pub(crate) fn pivot_tolerance<F: Float>() -> F {
    F::epsilon().sqrt()
}

pub(crate) fn degeneracy<F: Float>(solver: &'static str, pivot: usize, value: F) -> SparseRegError {
    SparseRegError::NumericalDegeneracy {
        solver,
        pivot,
        value: value.to_f64().unwrap_or(f64::NAN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss::{AbsoluteError, SquaredError};
    use crate::{ElasticNetPenalty, L1Penalty, NoPenalty};
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1, Array2};

    #[test]
    fn ridge_factor_of_supported_models() {
        let obs = Observations::new(
            array![[1., 0.], [0., 1.], [1., 1.], [2., 0.]],
            array![1., 2., 3., 4.],
        )
        .unwrap();

        // default squared error 0.5 and ridge 0.5
        assert_abs_diff_eq!(ridge_factor("Test", &Model::new(2), &obs).unwrap(), 4.);
        let model = Model::new(2)
            .with_loss(SquaredError::new(2.).unwrap())
            .with_penalty(ElasticNetPenalty::new(0.).unwrap());
        assert_abs_diff_eq!(ridge_factor("Test", &model, &obs).unwrap(), 1.);
        let model = Model::new(2).with_penalty(NoPenalty);
        assert_abs_diff_eq!(ridge_factor("Test", &model, &obs).unwrap(), 0.);
    }

    #[test]
    fn unsupported_models_are_named() {
        let obs = Observations::new(array![[1.]], array![1.]).unwrap();
        let err = ridge_factor("Test", &Model::new(1).with_penalty(L1Penalty), &obs).unwrap_err();
        match err {
            SparseRegError::UnsupportedCombination { solver, penalty, .. } => {
                assert_eq!(solver, "Test");
                assert!(penalty.contains("L1Penalty"));
            }
            other => panic!("unexpected error {}", other),
        }

        let err = ridge_factor("Test", &Model::new(1).with_loss(AbsoluteError), &obs);
        assert!(matches!(
            err,
            Err(SparseRegError::UnsupportedCombination { .. })
        ));
    }

    #[test]
    fn cross_products_are_weighted() {
        let obs = Observations::with_weights(
            array![[1., 2.], [3., -1.], [5., 5.]],
            array![1., 2., 3.],
            array![2., 1., 0.],
        )
        .unwrap();
        let mut gram = Array2::zeros((2, 2));
        let mut xty = Array1::zeros(2);
        let yty = cross_products(&obs, gram.view_mut(), xty.view_mut());

        assert_abs_diff_eq!(gram, array![[11., 1.], [1., 9.]]);
        assert_abs_diff_eq!(xty, array![8., 2.]);
        assert_abs_diff_eq!(yty, 6.);
    }
}
