//! Utility functions for randomly generating observations

use ndarray::{Array, Array1, Array2};
use ndarray_rand::{
    rand::Rng,
    rand_distr::{StandardNormal, Uniform},
    RandomExt,
};
use sparsereg::Observations;

/// A coefficient vector of length `nfeatures` whose first `nonzero` entries have a magnitude in
/// `[1, 3)` and a random sign, all others are zero.
pub fn sparse_coefficients(nfeatures: usize, nonzero: usize, rng: &mut impl Rng) -> Array1<f64> {
    let magnitudes = Uniform::new(1., 3.);
    Array1::from_shape_fn(nfeatures, |j| {
        if j < nonzero {
            let sign = if rng.gen_bool(0.5) { 1. } else { -1. };
            sign * rng.sample(magnitudes)
        } else {
            0.
        }
    })
}

/// Standard normal design of shape `(nobservations, nfeatures)`
pub fn design(nobservations: usize, nfeatures: usize, rng: &mut impl Rng) -> Array2<f64> {
    Array::random_using((nobservations, nfeatures), StandardNormal, rng)
}

/// Linear regression problem `y = X coef + noise * e` with standard normal `X` and `e`
///
/// Returns the observations together with the coefficients they were generated from, see
/// [`sparse_coefficients`] for the shape of the coefficients.
///
/// # Panics
///
/// If `nobservations` is zero.
pub fn linear_regression(
    nobservations: usize,
    nfeatures: usize,
    nonzero: usize,
    noise: f64,
    rng: &mut impl Rng,
) -> (Observations<f64>, Array1<f64>) {
    let x = design(nobservations, nfeatures, rng);
    let coef = sparse_coefficients(nfeatures, nonzero, rng);
    let errors: Array1<f64> = Array::random_using(nobservations, StandardNormal, rng);
    let y = x.dot(&coef) + errors * noise;

    (Observations::new(x, y).unwrap(), coef)
}

/// Binary classification problem with labels `sign(X coef)` in `{-1, 1}`
///
/// The coefficients are drawn standard normal, labels of a zero predictor are `1`.
///
/// # Panics
///
/// If `nobservations` is zero.
pub fn binary_margin(
    nobservations: usize,
    nfeatures: usize,
    rng: &mut impl Rng,
) -> (Observations<f64>, Array1<f64>) {
    let x = design(nobservations, nfeatures, rng);
    let coef: Array1<f64> = Array::random_using(nfeatures, StandardNormal, rng);
    let y = x
        .dot(&coef)
        .mapv(|eta| if eta < 0. { -1. } else { 1. });

    (Observations::new(x, y).unwrap(), coef)
}
