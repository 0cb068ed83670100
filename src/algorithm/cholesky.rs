use ndarray::{s, Array1, Array2, Axis};

#[cfg(not(feature = "blas"))]
use linfa_linalg::{
    cholesky::CholeskyInplace,
    triangular::{SolveTriangularInplace, UPLO},
};
#[cfg(feature = "blas")]
use ndarray_linalg::{cholesky::CholeskyInplace, Diag, SolveTriangularInplace, UPLO};

use crate::error::Result;
use crate::{Float, Model, Observations};

use super::closed_form::{cross_products, degeneracy, pivot_tolerance, ridge_factor};
use super::{check_shape, Algorithm};

/// Closed-form ridge and least squares solver based on the Cholesky factorization
///
/// Builds the regularized normal equations
///
/// ```ignore
/// (X^T W X + n * c / s * diag(lambda)) coef = X^T W y
/// ```
///
/// factors the left-hand side into `L L^T` and solves by forward and back substitution.
/// Supports the same models as [`Sweep`](crate::algorithm::Sweep) and agrees with it up to
/// rounding.
#[derive(Debug, Clone)]
pub struct Cholesky<F> {
    nobservations: usize,
    /// regularized normal equation matrix
    gram: Array2<F>,
    /// lower triangular factor of `gram`
    factor: Array2<F>,
    /// right-hand side, overwritten by the solution
    rhs: Array1<F>,
}

impl<F: Float> Cholesky<F> {
    pub fn new(model: &Model<F>, observations: &Observations<F>) -> Result<Self> {
        model.check_observations(observations)?;
        let nfeatures = model.nfeatures();
        Ok(Cholesky {
            nobservations: observations.nobservations(),
            gram: Array2::zeros((nfeatures, nfeatures)),
            factor: Array2::zeros((nfeatures, nfeatures)),
            rhs: Array1::zeros(nfeatures),
        })
    }

    /// Factor `gram` into `factor`
    ///
    /// A pivot `L_jj^2` not larger than the tolerance times the diagonal entry `A_jj` is
    /// degenerate. When the backend rejects the matrix, the degenerate pivot is located on
    /// the leading blocks.
    fn factorize(&mut self) -> Result<()> {
        self.factor.assign(&self.gram);
        if let Err(err) = factor_lower(&mut self.factor) {
            return match self.first_degenerate_pivot()? {
                Some((pivot, value)) => Err(degeneracy("Cholesky", pivot, value)),
                None => Err(err),
            };
        }

        let tolerance = pivot_tolerance::<F>();
        for (j, (l, a)) in self
            .factor
            .diag()
            .iter()
            .zip(self.gram.diag().iter())
            .enumerate()
        {
            let pivot = *l * *l;
            if !pivot.is_finite() || pivot <= tolerance * *a {
                return Err(degeneracy("Cholesky", j, pivot));
            }
        }
        Ok(())
    }

    /// Schur complement `A_jj - a_j^T A_{<j}^{-1} a_j` of every leading block until one is
    /// degenerate
    fn first_degenerate_pivot(&self) -> Result<Option<(usize, F)>> {
        let tolerance = pivot_tolerance::<F>();
        for j in 0..self.gram.nrows() {
            let mut column = self.gram.slice(s![..j, j]).to_owned();
            if j > 0 {
                let mut block = self.gram.slice(s![..j, ..j]).to_owned();
                factor_lower(&mut block)?;
                solve_lower(&block, &mut column, false)?;
            }
            let original = self.gram[[j, j]];
            let pivot = original - column.dot(&column);
            if !pivot.is_finite() || pivot <= tolerance * original {
                return Ok(Some((j, pivot)));
            }
        }
        Ok(None)
    }

    /// Solve `L L^T x = rhs` in place
    fn substitute(&mut self) -> Result<()> {
        solve_lower(&self.factor, &mut self.rhs, false)?;
        solve_lower(&self.factor, &mut self.rhs, true)
    }
}

/// Overwrite `a` with its lower triangular Cholesky factor
#[cfg(not(feature = "blas"))]
fn factor_lower<F: Float>(a: &mut Array2<F>) -> Result<()> {
    a.cholesky_inplace()?;
    Ok(())
}

#[cfg(feature = "blas")]
fn factor_lower<F: Float>(a: &mut Array2<F>) -> Result<()> {
    let mut lapack = a.mapv(|v| <F::Lapack as Float>::cast(v));
    lapack.cholesky_inplace(UPLO::Lower)?;
    a.zip_mut_with(&lapack, |v, l| *v = F::cast(*l));
    Ok(())
}

/// Solve `L z = b`, or `L^T z = b` if `transposed`, overwriting `b`
#[cfg(not(feature = "blas"))]
fn solve_lower<F: Float>(l: &Array2<F>, b: &mut Array1<F>, transposed: bool) -> Result<()> {
    let mut b = b.view_mut().insert_axis(Axis(1));
    if transposed {
        l.t().solve_triangular_inplace(&mut b, UPLO::Upper)?;
    } else {
        l.solve_triangular_inplace(&mut b, UPLO::Lower)?;
    }
    Ok(())
}

#[cfg(feature = "blas")]
fn solve_lower<F: Float>(l: &Array2<F>, b: &mut Array1<F>, transposed: bool) -> Result<()> {
    let l = l.mapv(|v| <F::Lapack as Float>::cast(v));
    let mut rhs = b
        .mapv(|v| <F::Lapack as Float>::cast(v))
        .insert_axis(Axis(1));
    if transposed {
        l.t()
            .solve_triangular_inplace(UPLO::Upper, Diag::NonUnit, &mut rhs)?;
    } else {
        l.solve_triangular_inplace(UPLO::Lower, Diag::NonUnit, &mut rhs)?;
    }
    b.zip_mut_with(&rhs.column(0), |v, z| *v = F::cast(*z));
    Ok(())
}

impl<F: Float> Algorithm<F> for Cholesky<F> {
    fn name(&self) -> &'static str {
        "Cholesky"
    }

    fn shape(&self) -> (usize, usize) {
        (self.nobservations, self.rhs.len())
    }

    fn update(&mut self, model: &mut Model<F>, observations: &Observations<F>) -> Result<()> {
        check_shape(self.name(), self.shape(), model, observations)?;
        let factor = ridge_factor(self.name(), model, observations)?;

        cross_products(observations, self.gram.view_mut(), self.rhs.view_mut());
        for (j, lambda) in model.lambda().iter().enumerate() {
            self.gram[[j, j]] += factor * *lambda;
        }

        self.factorize()?;
        self.substitute()?;
        model.coef_mut().assign(&self.rhs);
        Ok(())
    }

    fn is_closed_form(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::Sweep;
    use crate::{L1Penalty, NoPenalty, SparseRegError};
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn observations() -> Observations<f64> {
        Observations::new(
            array![
                [1., 0.5, -1.],
                [1., 1.5, 0.3],
                [1., -0.2, 2.],
                [1., 2.2, 0.1],
                [1., 0.9, -0.4],
                [1., -1.1, 1.2]
            ],
            array![0.7, 2.1, -0.5, 3.3, 1.4, -1.9],
        )
        .unwrap()
    }

    #[test]
    fn agrees_with_sweep_on_ridge() {
        let obs = observations();
        for &lambda in &[0., 1e-3, 0.1, 1., 10.] {
            let mut by_cholesky = Model::new(3).with_uniform_lambda(lambda).unwrap();
            let mut by_sweep = Model::new(3).with_uniform_lambda(lambda).unwrap();

            Cholesky::new(&by_cholesky, &obs)
                .unwrap()
                .update(&mut by_cholesky, &obs)
                .unwrap();
            Sweep::new(&by_sweep, &obs)
                .unwrap()
                .update(&mut by_sweep, &obs)
                .unwrap();

            assert_abs_diff_eq!(by_cholesky.coef(), by_sweep.coef(), epsilon = 1e-10);
        }
    }

    #[test]
    fn solution_is_a_stationary_point() {
        let obs = observations();
        let mut model = Model::new(3).with_lambda(array![0.5, 0.1, 2.]).unwrap();
        Cholesky::new(&model, &obs)
            .unwrap()
            .update(&mut model, &obs)
            .unwrap();

        let mut buffer = Array1::zeros(6);
        let mut gradient = Array1::zeros(3);
        model.loss_gradient_at(&obs, model.coef(), &mut buffer, &mut gradient);
        // gradient of 0.5 * lambda * coef^2 is lambda * coef
        let total = gradient + &model.lambda() * &model.coef();
        assert_abs_diff_eq!(total, Array1::zeros(3), epsilon = 1e-12);
    }

    #[test]
    fn weights_act_like_repeated_rows() {
        let weighted = Observations::with_weights(
            array![[1., 0.], [1., 1.], [1., 2.]],
            array![0., 2., 3.],
            array![1., 2., 0.],
        )
        .unwrap();
        let repeated =
            Observations::new(array![[1., 0.], [1., 1.], [1., 1.]], array![0., 2., 2.]).unwrap();

        let mut a = Model::new(2).with_penalty(NoPenalty);
        let mut b = Model::new(2).with_penalty(NoPenalty);
        Cholesky::new(&a, &weighted)
            .unwrap()
            .update(&mut a, &weighted)
            .unwrap();
        Cholesky::new(&b, &repeated)
            .unwrap()
            .update(&mut b, &repeated)
            .unwrap();
        assert_abs_diff_eq!(a.coef(), b.coef(), epsilon = 1e-12);
        assert_abs_diff_eq!(a.coef(), array![0., 2.], epsilon = 1e-12);
    }

    #[test]
    fn duplicate_columns_are_degenerate() {
        let obs = Observations::new(
            array![[1., 1., 0.], [2., 2., 1.], [3., 3., 0.], [4., 4., 1.]],
            array![1., 2., 3., 4.],
        )
        .unwrap();
        let mut model = Model::new(3).with_penalty(NoPenalty);
        let mut alg = Cholesky::new(&model, &obs).unwrap();

        match alg.update(&mut model, &obs) {
            Err(SparseRegError::NumericalDegeneracy { solver, pivot, .. }) => {
                assert_eq!(solver, "Cholesky");
                assert_eq!(pivot, 1);
            }
            other => panic!("expected a degenerate pivot, got {:?}", other),
        }
        assert_abs_diff_eq!(model.coef(), array![0., 0., 0.]);

        // regularization makes the system solvable again
        let mut model = Model::new(3).with_uniform_lambda(0.1).unwrap();
        assert!(alg.update(&mut model, &obs).is_ok());
    }

    #[test]
    fn nearly_collinear_columns_are_degenerate() {
        let obs = Observations::new(
            array![[1., 1.], [2., 2.], [3., 3.], [4., 4. + 1e-12]],
            array![1., 2., 3., 4.],
        )
        .unwrap();
        let mut model = Model::new(2).with_penalty(NoPenalty);
        let mut alg = Cholesky::new(&model, &obs).unwrap();
        assert!(matches!(
            alg.update(&mut model, &obs),
            Err(SparseRegError::NumericalDegeneracy { pivot: 1, .. })
        ));
    }

    #[test]
    fn zero_column_without_ridge_is_degenerate() {
        let obs = Observations::new(
            array![[0., 1.], [0., 2.], [0., 3.]],
            array![1., 2., 3.],
        )
        .unwrap();
        let mut model = Model::new(2).with_penalty(NoPenalty);
        let mut alg = Cholesky::new(&model, &obs).unwrap();
        assert!(matches!(
            alg.update(&mut model, &obs),
            Err(SparseRegError::NumericalDegeneracy { pivot: 0, .. })
        ));
    }

    #[test]
    fn rejects_lasso() {
        let obs = observations();
        let mut model = Model::new(3).with_penalty(L1Penalty);
        let mut alg = Cholesky::new(&model, &obs).unwrap();
        assert!(matches!(
            alg.update(&mut model, &obs),
            Err(SparseRegError::UnsupportedCombination {
                solver: "Cholesky",
                ..
            })
        ));
    }
}
