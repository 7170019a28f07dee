//! Stride computation utilities.
//!
//! Dense blocks are stored in row-major (C) order so that the last mode is
//! contiguous and linear order agrees with lexicographic [`Index`](crate::Index)
//! order.

/// Compute row-major strides from shape.
///
/// For shape `[d0, d1, d2]`, returns strides `[d1*d2, d2, 1]`.
///
/// # Examples
///
/// ```
/// use sparsemap::strides::compute_strides;
///
/// assert_eq!(compute_strides(&[3, 4, 5]), vec![20, 5, 1]);
/// assert_eq!(compute_strides(&[2, 3]), vec![3, 1]);
/// assert_eq!(compute_strides(&[5]), vec![1]);
/// assert_eq!(compute_strides(&[]), Vec::<usize>::new());
/// ```
pub fn compute_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![0; shape.len()];
    let mut stride = 1;
    for (s, &dim) in strides.iter_mut().zip(shape).rev() {
        *s = stride;
        stride *= dim;
    }
    strides
}

/// Convert cartesian indices to a linear offset.
#[inline]
pub fn cartesian_to_linear(indices: &[usize], strides: &[usize]) -> usize {
    indices
        .iter()
        .zip(strides.iter())
        .map(|(&idx, &stride)| idx * stride)
        .sum()
}

/// Convert a linear offset to cartesian indices in row-major order.
pub fn linear_to_cartesian(mut linear: usize, shape: &[usize]) -> Vec<usize> {
    let mut indices = vec![0; shape.len()];
    for (idx, &dim) in indices.iter_mut().zip(shape).rev() {
        *idx = linear % dim;
        linear /= dim;
    }
    indices
}
