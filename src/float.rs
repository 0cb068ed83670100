use ndarray::{NdFloat, ScalarOperand};
#[cfg(feature = "blas")]
use ndarray_linalg::{Lapack, Scalar};
use num_traits::{AsPrimitive, FromPrimitive, NumAssignOps, NumCast};

use std::cmp::PartialOrd;
use std::fmt;
use std::iter::Sum;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

/// Floating point numbers
///
/// This trait bound multiplexes to the most common assumption of floating point number and
/// implement them for 32bit and 64bit floating points. Observations, coefficients and
/// regularization scales of a model are all expressed in the same float type.
pub trait Float:
    FromPrimitive
    + num_traits::Float
    + NdFloat
    + PartialOrd
    + Sync
    + Send
    + Default
    + fmt::Display
    + fmt::Debug
    + Sum
    + NumAssignOps
    + AsPrimitive<usize>
    + for<'a> AddAssign<&'a Self>
    + for<'a> MulAssign<&'a Self>
    + for<'a> SubAssign<&'a Self>
    + for<'a> DivAssign<&'a Self>
    + num_traits::MulAdd<Output = Self>
    + ScalarOperand
    + approx::AbsDiffEq<Epsilon = Self>
{
    /// The same float with the bounds needed by the LAPACK backed factorizations
    #[cfg(feature = "blas")]
    type Lapack: Float + Scalar + Lapack;
    #[cfg(not(feature = "blas"))]
    type Lapack: Float;

    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).unwrap()
    }
}

impl Float for f32 {
    type Lapack = f32;
}

impl Float for f64 {
    type Lapack = f64;
}
