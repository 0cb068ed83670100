//! The objective model
use ndarray::{Array1, ArrayBase, ArrayView1, Data, Ix1, Ix2, Zip};

use crate::error::{Result, SparseRegError};
use crate::loss::{Loss, SquaredError};
use crate::penalty::{L2Penalty, Penalty};
use crate::{Float, Learned, Observations};

/// A regularized linear model
///
/// Holds everything needed to describe the objective
///
/// ```ignore
/// 1 / n * sum_i w_i * loss(x_i^T coef, y_i) + sum_j lambda_j * penalty(coef_j)
/// ```
///
/// together with the current coefficients. Constructing a model does not solve anything, the
/// coefficients are overwritten in place by an algorithm, see [`fit`](crate::fit) and
/// [`Strategy`](crate::Strategy).
///
/// # Defaults
/// | Name | Default |
/// | :--- | :--- |
/// | loss | `0.5 * (y - yhat)^2` |
/// | penalty | `0.5 * coef^2` |
/// | lambda | `0.1` for every coefficient |
/// | coef | zeros |
///
/// # Example
///
/// ```rust
/// use sparsereg::{Model, L1Penalty};
///
/// let model = Model::<f64>::new(5)
///     .with_penalty(L1Penalty)
///     .with_uniform_lambda(0.05)?;
///
/// assert_eq!(model.nfeatures(), 5);
/// # Ok::<(), sparsereg::SparseRegError>(())
/// ```
#[derive(Debug)]
pub struct Model<F: Float> {
    coef: Array1<F>,
    lambda: Array1<F>,
    loss: Box<dyn Loss<F>>,
    penalty: Box<dyn Penalty<F>>,
}

impl<F: Float> Model<F> {
    /// Create a model for `nfeatures` coefficients with the default loss, penalty and lambda
    pub fn new(nfeatures: usize) -> Self {
        Model {
            coef: Array1::zeros(nfeatures),
            lambda: Array1::from_elem(nfeatures, F::cast(0.1)),
            loss: Box::new(SquaredError::default()),
            penalty: Box::new(L2Penalty),
        }
    }

    /// Replace the loss function
    pub fn with_loss<L: Loss<F> + 'static>(mut self, loss: L) -> Self {
        self.loss = Box::new(loss);
        self
    }

    /// Replace the penalty function
    pub fn with_penalty<P: Penalty<F> + 'static>(mut self, penalty: P) -> Self {
        self.penalty = Box::new(penalty);
        self
    }

    /// Set one regularization scale per coefficient
    ///
    /// Every entry must be nonnegative and the length must match the number of coefficients.
    pub fn with_lambda<D: Data<Elem = F>>(mut self, lambda: ArrayBase<D, Ix1>) -> Result<Self> {
        if lambda.len() != self.coef.len() {
            return Err(SparseRegError::mismatch(
                "length of lambda",
                self.coef.len(),
                lambda.len(),
            ));
        }
        if let Some(l) = lambda.iter().find(|l| !l.is_finite() || **l < F::zero()) {
            return Err(SparseRegError::InvalidLambda(l.to_f32().unwrap_or(f32::NAN)));
        }
        self.lambda = lambda.to_owned();
        Ok(self)
    }

    /// Use the same regularization scale for every coefficient
    pub fn with_uniform_lambda(self, lambda: F) -> Result<Self> {
        let n = self.coef.len();
        self.with_lambda(Array1::from_elem(n, lambda))
    }

    /// Start from the given coefficients instead of zeros
    pub fn with_coef<D: Data<Elem = F>>(mut self, coef: ArrayBase<D, Ix1>) -> Result<Self> {
        if coef.len() != self.coef.len() {
            return Err(SparseRegError::mismatch(
                "length of the coefficients",
                self.coef.len(),
                coef.len(),
            ));
        }
        self.coef = coef.to_owned();
        Ok(self)
    }

    /// Number of coefficients
    pub fn nfeatures(&self) -> usize {
        self.coef.len()
    }

    /// Current coefficients
    pub fn coef(&self) -> ArrayView1<F> {
        self.coef.view()
    }

    pub fn lambda(&self) -> ArrayView1<F> {
        self.lambda.view()
    }

    pub fn loss(&self) -> &dyn Loss<F> {
        self.loss.as_ref()
    }

    pub fn penalty(&self) -> &dyn Penalty<F> {
        self.penalty.as_ref()
    }

    pub(crate) fn coef_mut(&mut self) -> &mut Array1<F> {
        &mut self.coef
    }

    /// Fit the model with the default algorithm, see [`fit`](crate::fit)
    pub fn fit(&mut self, observations: &Observations<F>) -> Result<Learned> {
        crate::fit(self, observations)
    }

    /// Fails if the observations have a different number of columns than the model has
    /// coefficients
    pub fn check_observations(&self, observations: &Observations<F>) -> Result<()> {
        if observations.nfeatures() != self.nfeatures() {
            return Err(SparseRegError::mismatch(
                "number of columns of the observations",
                self.nfeatures(),
                observations.nfeatures(),
            ));
        }
        Ok(())
    }

    /// Linear predictor `x coef` for every row of `x`
    pub fn predict<D: Data<Elem = F>>(&self, x: &ArrayBase<D, Ix2>) -> Array1<F> {
        assert_eq!(
            x.ncols(),
            self.nfeatures(),
            "Number of data features must match the number of coefficients of the model."
        );
        x.dot(&self.coef)
    }

    /// Weighted average loss of the current coefficients
    pub fn loss_value(&self, observations: &Observations<F>) -> F {
        let mut buffer = Array1::zeros(observations.nobservations());
        self.loss_value_at(observations, self.coef.view(), &mut buffer)
    }

    /// Value of the full penalized objective for the current coefficients
    pub fn objective(&self, observations: &Observations<F>) -> F {
        let mut buffer = Array1::zeros(observations.nobservations());
        self.objective_at(observations, self.coef.view(), &mut buffer, true)
    }

    /// Penalty term `sum_j lambda_j * penalty(coef_j)` for arbitrary coefficients
    pub(crate) fn penalty_value_at(&self, coef: ArrayView1<F>) -> F {
        Zip::from(&coef)
            .and(&self.lambda)
            .fold(F::zero(), |acc, c, l| acc + *l * self.penalty.value(*c))
    }

    /// Weighted average loss for arbitrary coefficients, `buffer` receives the linear
    /// predictors and must have one entry per observation
    pub(crate) fn loss_value_at(
        &self,
        observations: &Observations<F>,
        coef: ArrayView1<F>,
        buffer: &mut Array1<F>,
    ) -> F {
        linear_predictor(observations, coef, buffer);
        let total = match observations.weights() {
            Some(w) => Zip::from(&*buffer)
                .and(observations.y())
                .and(w)
                .fold(F::zero(), |acc, yhat, y, w| {
                    acc + *w * self.loss.value(*yhat, *y)
                }),
            None => Zip::from(&*buffer)
                .and(observations.y())
                .fold(F::zero(), |acc, yhat, y| acc + self.loss.value(*yhat, *y)),
        };
        total / F::cast(observations.nobservations())
    }

    /// Objective for arbitrary coefficients, the penalty term is skipped if `penalized` is false
    pub(crate) fn objective_at(
        &self,
        observations: &Observations<F>,
        coef: ArrayView1<F>,
        buffer: &mut Array1<F>,
        penalized: bool,
    ) -> F {
        let loss = self.loss_value_at(observations, coef, buffer);
        if penalized {
            loss + self.penalty_value_at(coef)
        } else {
            loss
        }
    }

    /// Gradient of the weighted average loss `1 / n * X^T diag(w) loss'(X coef, y)`
    ///
    /// `buffer` has one entry per observation, `gradient` one per coefficient. Neither is
    /// reallocated.
    pub(crate) fn loss_gradient_at(
        &self,
        observations: &Observations<F>,
        coef: ArrayView1<F>,
        buffer: &mut Array1<F>,
        gradient: &mut Array1<F>,
    ) {
        linear_predictor(observations, coef, buffer);
        match observations.weights() {
            Some(w) => Zip::from(&mut *buffer)
                .and(observations.y())
                .and(w)
                .for_each(|eta, y, w| *eta = *w * self.loss.gradient(*eta, *y)),
            None => Zip::from(&mut *buffer)
                .and(observations.y())
                .for_each(|eta, y| *eta = self.loss.gradient(*eta, *y)),
        }

        let scale = F::one() / F::cast(observations.nobservations());
        ndarray::linalg::general_mat_vec_mul(
            scale,
            &observations.x().t(),
            &*buffer,
            F::zero(),
            gradient,
        );
    }
}

fn linear_predictor<F: Float>(
    observations: &Observations<F>,
    coef: ArrayView1<F>,
    buffer: &mut Array1<F>,
) {
    ndarray::linalg::general_mat_vec_mul(F::one(), &observations.x(), &coef, F::zero(), buffer);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{L1Penalty, NoPenalty};
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn defaults() {
        let model = Model::<f64>::new(3);
        assert_abs_diff_eq!(model.coef(), array![0., 0., 0.]);
        assert_abs_diff_eq!(model.lambda(), array![0.1, 0.1, 0.1]);
        assert_eq!(model.loss().quadratic_scale(), Some(0.5));
        assert_eq!(model.penalty().quadratic_scale(), Some(0.5));
    }

    #[test]
    fn lambda_is_validated() {
        assert!(matches!(
            Model::<f64>::new(2).with_lambda(array![0.1]),
            Err(SparseRegError::DimensionMismatch(_))
        ));
        assert!(matches!(
            Model::<f64>::new(2).with_lambda(array![0.1, -1.]),
            Err(SparseRegError::InvalidLambda(_))
        ));
    }

    #[test]
    fn objective_of_known_coefficients() {
        let obs = Observations::with_weights(
            array![[1., 0.], [0., 1.], [1., 1.]],
            array![1., 2., 0.],
            array![1., 1., 2.],
        )
        .unwrap();
        let model = Model::new(2)
            .with_penalty(L1Penalty)
            .with_lambda(array![0.5, 1.])
            .unwrap()
            .with_coef(array![1., -1.])
            .unwrap();

        // residuals 0, 3, 0 -> 0.5 * 9 / 3, penalty 0.5 + 1
        assert_abs_diff_eq!(model.loss_value(&obs), 1.5);
        assert_abs_diff_eq!(model.objective(&obs), 3.0);
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let obs = Observations::with_weights(
            array![[1., 2.], [0.5, -1.], [3., 0.2], [-1., 1.]],
            array![0.3, -1., 2., 0.],
            array![1., 0.5, 2., 1.],
        )
        .unwrap();
        let model = Model::new(2).with_penalty(NoPenalty);
        let coef = array![0.4, -0.7];

        let mut buffer = Array1::zeros(4);
        let mut gradient = Array1::zeros(2);
        model.loss_gradient_at(&obs, coef.view(), &mut buffer, &mut gradient);

        let h = 1e-6;
        for j in 0..2 {
            let mut up = coef.clone();
            let mut down = coef.clone();
            up[j] += h;
            down[j] -= h;
            let numeric = (model.loss_value_at(&obs, up.view(), &mut buffer)
                - model.loss_value_at(&obs, down.view(), &mut buffer))
                / (2. * h);
            assert_abs_diff_eq!(gradient[j], numeric, epsilon = 1e-6);
        }
    }

    #[test]
    #[should_panic]
    fn predict_checks_columns() {
        Model::<f64>::new(2).predict(&array![[1., 2., 3.]]);
    }
}
