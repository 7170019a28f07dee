//! Dense N-dimensional tensor.
//!
//! `DenseTensor` is the inner block type of a
//! [`TensorOfTensors`](crate::TensorOfTensors) and the tile type of a
//! [`TiledTensor`](crate::TiledTensor). Data is row-major.

use crate::error::{Result, SparsityError};
use crate::index::{Index, IndexRange};
use crate::scalar::Scalar;
use crate::strides::{cartesian_to_linear, compute_strides};

/// An owned dense tensor.
///
/// # Example
///
/// ```
/// use sparsemap::DenseTensor;
///
/// let mut t: DenseTensor<f64> = DenseTensor::zeros(&[2, 3]);
/// t.set(&[0, 1], 5.0).unwrap();
/// assert_eq!(t.get(&[0, 1]), Some(&5.0));
/// assert_eq!(t.get(&[2, 0]), None);
///
/// // Row-major: [0, 1] is the second element
/// let t2 = DenseTensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
/// assert_eq!(t2.get(&[0, 1]), Some(&2.0));
/// assert_eq!(t2.get(&[1, 0]), Some(&4.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DenseTensor<ElT: Scalar> {
    data: Vec<ElT>,
    shape: Vec<usize>,
    strides: Vec<usize>,
}

impl<ElT: Scalar> DenseTensor<ElT> {
    /// Create a zero-initialized tensor.
    ///
    /// A rank-0 tensor holds a single element.
    pub fn zeros(shape: &[usize]) -> Self {
        let len: usize = shape.iter().product();
        Self {
            data: vec![ElT::zero(); len],
            shape: shape.to_vec(),
            strides: compute_strides(shape),
        }
    }

    /// Create a tensor from row-major data.
    ///
    /// # Errors
    ///
    /// Returns `SparsityError::ShapeMismatch` if data length doesn't match shape.
    pub fn from_vec(data: Vec<ElT>, shape: &[usize]) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(SparsityError::ShapeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            shape: shape.to_vec(),
            strides: compute_strides(shape),
        })
    }

    /// Create a tensor by evaluating `f` at every index.
    pub fn from_fn<F>(shape: &[usize], mut f: F) -> Self
    where
        F: FnMut(&Index) -> ElT,
    {
        let data = IndexRange::from_shape(shape).map(|idx| f(&idx)).collect();
        Self {
            data,
            shape: shape.to_vec(),
            strides: compute_strides(shape),
        }
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get the rank (number of dimensions).
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Get total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn data(&self) -> &[ElT] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [ElT] {
        &mut self.data
    }

    fn offset(&self, indices: &[usize]) -> Option<usize> {
        if indices.len() != self.ndim() || indices.iter().zip(&self.shape).any(|(i, d)| i >= d) {
            return None;
        }
        Some(cartesian_to_linear(indices, &self.strides))
    }

    /// Element at `indices`, or `None` if out of bounds or of wrong rank.
    pub fn get(&self, indices: &[usize]) -> Option<&ElT> {
        self.offset(indices).map(|i| &self.data[i])
    }

    pub fn get_mut(&mut self, indices: &[usize]) -> Option<&mut ElT> {
        self.offset(indices).map(move |i| &mut self.data[i])
    }

    /// Set element at `indices`.
    ///
    /// # Errors
    ///
    /// `RankMismatch` for a wrong number of indices, `ElementOutOfRange` for
    /// an index beyond its dimension.
    pub fn set(&mut self, indices: &[usize], value: ElT) -> Result<()> {
        if indices.len() != self.ndim() {
            return Err(SparsityError::RankMismatch {
                expected: self.ndim(),
                actual: indices.len(),
            });
        }
        for (mode, (&idx, &dim)) in indices.iter().zip(&self.shape).enumerate() {
            if idx >= dim {
                return Err(SparsityError::ElementOutOfRange {
                    mode,
                    element: idx,
                    extent: dim,
                });
            }
        }
        let linear = cartesian_to_linear(indices, &self.strides);
        self.data[linear] = value;
        Ok(())
    }

    pub fn fill(&mut self, value: ElT) {
        self.data.fill(value);
    }

    /// Iterate over `(index, value)` pairs in row-major order.
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Index, ElT)> + '_ {
        IndexRange::from_shape(&self.shape).zip(self.data.iter().copied())
    }

    /// Squared Frobenius norm, `sum(|x|^2)`.
    pub fn norm_sqr(&self) -> f64 {
        self.data.iter().map(|&x| x.abs_sqr()).sum()
    }

    /// Frobenius norm.
    pub fn norm(&self) -> f64 {
        self.norm_sqr().sqrt()
    }
}
