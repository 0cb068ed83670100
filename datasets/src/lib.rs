//! `sparsereg-datasets` provides synthetic observations ready to be used in tests, benchmarks and
//! examples of [`sparsereg`](https://docs.rs/sparsereg).
//!
//! ## Current State
//!
//! Currently the following generators are provided behind the `generate` feature:
//!
//! * `linear_regression` : gaussian design with a sparse coefficient vector and gaussian noise
//! * `binary_margin` : gaussian design with `-1`/`+1` labels from the sign of a linear predictor
//!
//! ## Using a generator
//!
//! Add the crate with the feature enabled:
//! ```ignore
//! sparsereg-datasets = { version = "0.1.0", features = ["generate"] }
//! ```
//! and then use it in your example or tests as
//! ```ignore
//! let mut rng = Xoshiro256Plus::seed_from_u64(42);
//! let (observations, coef) = sparsereg_datasets::generate::linear_regression(1000, 10, 3, 0.1, &mut rng);
//! ```

#[cfg(feature = "generate")]
pub mod generate;
