use ndarray::{s, Array1, Array2};

use crate::error::Result;
use crate::{Float, Model, Observations};

use super::closed_form::{cross_products, degeneracy, pivot_tolerance, ridge_factor};
use super::{check_shape, Algorithm};

/// Closed-form ridge and least squares solver based on the sweep operator
///
/// The augmented cross-product matrix
///
/// ```ignore
/// | X^T W X + R   X^T W y |
/// | y^T W X       y^T W y |
/// ```
///
/// with the ridge diagonal `R = n * c / s * diag(lambda)` is swept on every coefficient pivot.
/// Afterwards the last column holds the coefficients and the corner holds the residual sum of
/// squares. A single update solves the problem exactly, driving the solver through a
/// [`Strategy`](crate::Strategy) reports convergence after one iteration.
///
/// Only models with a scaled squared error loss and either no penalty or a scaled ridge penalty
/// are supported.
///
/// See also:
/// * [A Tutorial on the SWEEP Operator](https://doi.org/10.2307/2683825)
#[derive(Debug, Clone)]
pub struct Sweep<F> {
    nobservations: usize,
    /// augmented `(p + 1) x (p + 1)` cross-product matrix, swept in place
    augmented: Array2<F>,
    /// regularized diagonal before sweeping
    diagonal: Array1<F>,
    rss: F,
}

impl<F: Float> Sweep<F> {
    pub fn new(model: &Model<F>, observations: &Observations<F>) -> Result<Self> {
        model.check_observations(observations)?;
        let nfeatures = model.nfeatures();
        Ok(Sweep {
            nobservations: observations.nobservations(),
            augmented: Array2::zeros((nfeatures + 1, nfeatures + 1)),
            diagonal: Array1::zeros(nfeatures),
            rss: F::zero(),
        })
    }

    /// Residual sum of squares `y^T W y - y^T W X coef` of the last successful update
    ///
    /// Without regularization this is the weighted sum of squared residuals of the fitted
    /// coefficients.
    pub fn rss(&self) -> F {
        self.rss
    }

    fn sweep(&mut self, pivot: usize) -> Result<()> {
        let d = self.augmented[[pivot, pivot]];
        if !d.is_finite() || d <= pivot_tolerance::<F>() * self.diagonal[pivot] {
            return Err(degeneracy(self.name(), pivot, d));
        }

        let a = &mut self.augmented;
        let size = a.nrows();
        a.row_mut(pivot).mapv_inplace(|v| v / d);
        for i in (0..size).filter(|i| *i != pivot) {
            let b = a[[i, pivot]];
            for j in 0..size {
                let delta = b * a[[pivot, j]];
                a[[i, j]] -= delta;
            }
            a[[i, pivot]] = -b / d;
        }
        a[[pivot, pivot]] = F::one() / d;

        Ok(())
    }
}

impl<F: Float> Algorithm<F> for Sweep<F> {
    fn name(&self) -> &'static str {
        "Sweep"
    }

    fn shape(&self) -> (usize, usize) {
        (self.nobservations, self.diagonal.len())
    }

    fn update(&mut self, model: &mut Model<F>, observations: &Observations<F>) -> Result<()> {
        check_shape(self.name(), self.shape(), model, observations)?;
        let factor = ridge_factor(self.name(), model, observations)?;

        let p = model.nfeatures();
        let (gram, mut last) = self
            .augmented
            .multi_slice_mut((s![..p, ..p], s![.., p]));
        let yty = cross_products(observations, gram, last.slice_mut(s![..p]));
        last[p] = yty;
        for j in 0..p {
            self.augmented[[p, j]] = self.augmented[[j, p]];
        }

        for (j, lambda) in model.lambda().iter().enumerate() {
            self.augmented[[j, j]] += factor * *lambda;
            self.diagonal[j] = self.augmented[[j, j]];
        }

        for pivot in 0..p {
            self.sweep(pivot)?;
        }

        self.rss = self.augmented[[p, p]];
        model
            .coef_mut()
            .assign(&self.augmented.slice(s![..p, p]));
        Ok(())
    }

    fn is_closed_form(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{L1Penalty, NoPenalty, SparseRegError};
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn recovers_exact_least_squares() {
        // y = 1 + 2 x without noise
        let obs = Observations::new(
            array![[1., 0.], [1., 1.], [1., 2.], [1., 3.]],
            array![1., 3., 5., 7.],
        )
        .unwrap();
        let mut model = Model::new(2).with_penalty(NoPenalty);
        let mut alg = Sweep::new(&model, &obs).unwrap();

        alg.update(&mut model, &obs).unwrap();
        assert_abs_diff_eq!(model.coef(), array![1., 2.], epsilon = 1e-10);
        assert_abs_diff_eq!(alg.rss(), 0., epsilon = 1e-10);
        assert!(alg.is_closed_form());
    }

    #[test]
    fn rss_of_noisy_fit() {
        // the mean is the least squares fit of an intercept
        let obs = Observations::new(array![[1.], [1.], [1.]], array![1., 2., 6.]).unwrap();
        let mut model = Model::new(1).with_penalty(NoPenalty);
        let mut alg = Sweep::new(&model, &obs).unwrap();

        alg.update(&mut model, &obs).unwrap();
        assert_abs_diff_eq!(model.coef()[0], 3., epsilon = 1e-12);
        assert_abs_diff_eq!(alg.rss(), 4. + 1. + 9., epsilon = 1e-10);
    }

    #[test]
    fn ridge_on_orthogonal_design() {
        // X^T X = 2 I, n = 2, default loss and penalty give the factor n = 2
        let obs = Observations::new(array![[1., 1.], [1., -1.]], array![2., 0.]).unwrap();
        let mut model = Model::new(2).with_uniform_lambda(1.).unwrap();
        let mut alg = Sweep::new(&model, &obs).unwrap();

        alg.update(&mut model, &obs).unwrap();
        // (2 + 2) coef = X^T y = [2, 2]
        assert_abs_diff_eq!(model.coef(), array![0.5, 0.5], epsilon = 1e-12);
    }

    #[test]
    fn failures_leave_the_model_untouched() {
        let obs = Observations::new(array![[1., 1.], [2., 2.], [3., 3.]], array![1., 2., 3.])
            .unwrap();

        let mut model = Model::new(2)
            .with_penalty(NoPenalty)
            .with_coef(array![0.25, -0.25])
            .unwrap();
        let mut alg = Sweep::new(&model, &obs).unwrap();
        match alg.update(&mut model, &obs) {
            Err(SparseRegError::NumericalDegeneracy { solver, pivot, .. }) => {
                assert_eq!(solver, "Sweep");
                assert_eq!(pivot, 1);
            }
            other => panic!("expected a degenerate pivot, got {:?}", other),
        }
        assert_abs_diff_eq!(model.coef(), array![0.25, -0.25]);

        let mut model = Model::new(2).with_penalty(L1Penalty);
        assert!(matches!(
            alg.update(&mut model, &obs),
            Err(SparseRegError::UnsupportedCombination { .. })
        ));
    }
}
