//! Observations
//!
//! An immutable set of rows a model is fitted against: the design matrix, the response and
//! optional per-row weights.
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, ArrayView2, Data, Ix1, Ix2};

use crate::error::{Result, SparseRegError};
use crate::Float;

/// Design matrix `x` with shape `(n_observations, n_features)`, response `y` and optional
/// nonnegative weights `w`
///
/// Missing weights are treated as unit weights. Once constructed the observations are never
/// modified, so a single set can be shared between fits of different models.
///
/// ```rust
/// use sparsereg::Observations;
/// use ndarray::array;
///
/// let obs = Observations::new(array![[1., 0.], [0., 1.], [1., 1.]], array![1., 2., 3.])?;
/// assert_eq!(obs.nobservations(), 3);
/// assert_eq!(obs.nfeatures(), 2);
///
/// // a response of the wrong length is rejected
/// assert!(Observations::new(array![[1., 0.], [0., 1.]], array![1.]).is_err());
/// # Ok::<(), sparsereg::SparseRegError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Observations<F> {
    x: Array2<F>,
    y: Array1<F>,
    w: Option<Array1<F>>,
}

impl<F: Float> Observations<F> {
    /// Create observations with unit weights
    pub fn new<D1, D2>(x: ArrayBase<D1, Ix2>, y: ArrayBase<D2, Ix1>) -> Result<Self>
    where
        D1: Data<Elem = F>,
        D2: Data<Elem = F>,
    {
        Self::validate(&x, &y, None)?;

        Ok(Observations {
            x: x.to_owned(),
            y: y.to_owned(),
            w: None,
        })
    }

    /// Create weighted observations
    ///
    /// The weights must have one nonnegative entry per row of `x`.
    pub fn with_weights<D1, D2, D3>(
        x: ArrayBase<D1, Ix2>,
        y: ArrayBase<D2, Ix1>,
        w: ArrayBase<D3, Ix1>,
    ) -> Result<Self>
    where
        D1: Data<Elem = F>,
        D2: Data<Elem = F>,
        D3: Data<Elem = F>,
    {
        Self::validate(&x, &y, Some(w.view()))?;

        Ok(Observations {
            x: x.to_owned(),
            y: y.to_owned(),
            w: Some(w.to_owned()),
        })
    }

    fn validate<D1, D2>(
        x: &ArrayBase<D1, Ix2>,
        y: &ArrayBase<D2, Ix1>,
        w: Option<ArrayView1<F>>,
    ) -> Result<()>
    where
        D1: Data<Elem = F>,
        D2: Data<Elem = F>,
    {
        if x.nrows() != y.len() {
            return Err(SparseRegError::mismatch(
                "length of the response",
                x.nrows(),
                y.len(),
            ));
        }

        if let Some(w) = w {
            if w.len() != x.nrows() {
                return Err(SparseRegError::mismatch(
                    "length of the weights",
                    x.nrows(),
                    w.len(),
                ));
            }
            if let Some(idx) = w.iter().position(|w| *w < F::zero()) {
                return Err(SparseRegError::DimensionMismatch(format!(
                    "weights must be nonnegative, but weight {} is {}",
                    idx, w[idx]
                )));
            }
        }

        if x.nrows() == 0 {
            return Err(SparseRegError::NotEnoughSamples);
        }

        Ok(())
    }

    /// Number of rows
    pub fn nobservations(&self) -> usize {
        self.x.nrows()
    }

    /// Number of columns of the design matrix
    pub fn nfeatures(&self) -> usize {
        self.x.ncols()
    }

    /// Design matrix with one row per observation
    pub fn x(&self) -> ArrayView2<F> {
        self.x.view()
    }

    /// Response vector
    pub fn y(&self) -> ArrayView1<F> {
        self.y.view()
    }

    /// Observation weights, `None` if every row has unit weight
    pub fn weights(&self) -> Option<ArrayView1<F>> {
        self.w.as_ref().map(|w| w.view())
    }

    /// Weight of the observation in row `idx`
    pub fn weight(&self, idx: usize) -> F {
        match &self.w {
            Some(w) => w[idx],
            None => F::one(),
        }
    }
}
