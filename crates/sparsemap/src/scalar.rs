//! Scalar trait for tensor element types.

use std::fmt::Debug;

/// Complex double-precision scalar.
#[allow(non_camel_case_types)]
pub type c64 = num_complex::Complex64;

/// Trait for element types that can be sparsified.
///
/// Elements must be shareable across the worker threads that populate
/// output tiles, hence the `Send + Sync` bounds.
pub trait Scalar: Copy + Debug + Default + PartialEq + Send + Sync + 'static {
    /// Returns the additive identity (zero).
    fn zero() -> Self {
        Self::default()
    }

    /// Returns the multiplicative identity (one).
    fn one() -> Self;

    /// Squared magnitude `|x|^2`.
    fn abs_sqr(self) -> f64;
}

impl Scalar for f64 {
    fn one() -> Self {
        1.0
    }

    fn abs_sqr(self) -> f64 {
        self * self
    }
}

impl Scalar for f32 {
    fn one() -> Self {
        1.0
    }

    fn abs_sqr(self) -> f64 {
        f64::from(self) * f64::from(self)
    }
}

impl Scalar for c64 {
    fn one() -> Self {
        c64::new(1.0, 0.0)
    }

    fn abs_sqr(self) -> f64 {
        self.norm_sqr()
    }
}
