//! TiledTensor - in-memory tiled dense tensor.
//!
//! Stores only non-zero tiles, each as a [`DenseTensor`]. Absent tiles are
//! structurally zero. This is the reference [`DenseTensorSource`] used to
//! feed the sparsification engine.

use std::collections::BTreeMap;

use crate::error::{Result, SparsityError};
use crate::index::Index;
use crate::scalar::Scalar;
use crate::source::DenseTensorSource;
use crate::tensor::DenseTensor;
use crate::tiling::Tiling;

/// A tiled tensor storing only its non-zero tiles.
///
/// # Example
///
/// ```
/// use sparsemap::{DenseTensor, Index, TiledTensor, Tiling};
///
/// let dense = DenseTensor::from_fn(&[4, 4], |idx| if idx[0] < 2 { 1.0 } else { 0.0 });
/// let tiling = Tiling::uniform(&[4, 4], 2).unwrap();
/// let tiled = TiledTensor::from_dense(&dense, tiling).unwrap();
///
/// assert_eq!(tiled.nnz_tiles(), 2);
/// assert!(tiled.tile(&Index::new(&[0, 1])).is_some());
/// assert!(tiled.tile(&Index::new(&[1, 0])).is_none());
/// assert_eq!(tiled.to_dense(), dense);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct TiledTensor<ElT: Scalar> {
    tiling: Tiling,
    tiles: BTreeMap<Index, DenseTensor<ElT>>,
}

impl<ElT: Scalar> TiledTensor<ElT> {
    /// An all-zero tensor over `tiling`.
    pub fn zeros(tiling: Tiling) -> Self {
        Self {
            tiling,
            tiles: BTreeMap::new(),
        }
    }

    /// Split a dense tensor into tiles, dropping tiles whose norm is zero.
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` if the dense shape differs from the tiling's extents.
    pub fn from_dense(dense: &DenseTensor<ElT>, tiling: Tiling) -> Result<Self> {
        let extents = tiling.extents();
        if dense.shape() != extents.as_slice() {
            return Err(SparsityError::ShapeMismatch {
                expected: extents.iter().product(),
                actual: dense.len(),
            });
        }

        let mut tiled = Self::zeros(tiling);
        for tile in tiled.tiling.tiles() {
            let lower = tiled.tiling.tile_lower(&tile)?;
            let shape = tiled.tiling.tile_shape(&tile)?;
            let block = DenseTensor::from_fn(&shape, |local| {
                let global: Vec<usize> = local.iter().zip(&lower).map(|(l, o)| l + o).collect();
                dense.get(&global).copied().unwrap_or_default()
            });
            if block.norm_sqr() > 0.0 {
                tiled.tiles.insert(tile, block);
            }
        }
        Ok(tiled)
    }

    #[inline]
    pub fn tiling(&self) -> &Tiling {
        &self.tiling
    }

    /// Dense shape of the whole tensor.
    pub fn shape(&self) -> Vec<usize> {
        self.tiling.extents()
    }

    /// Number of stored (non-zero) tiles.
    #[inline]
    pub fn nnz_tiles(&self) -> usize {
        self.tiles.len()
    }

    /// Stored data of `tile`, or `None` if the tile is zero.
    pub fn tile(&self, tile: &Index) -> Option<&DenseTensor<ElT>> {
        self.tiles.get(tile)
    }

    /// Iterate over stored tiles in ascending tile order.
    pub fn iter_tiles(&self) -> impl Iterator<Item = (&Index, &DenseTensor<ElT>)> {
        self.tiles.iter()
    }

    /// Store `data` as tile `tile`, replacing any previous contents.
    ///
    /// # Errors
    ///
    /// `TileOutOfRange`/`RankMismatch` for an invalid tile, `ShapeMismatch`
    /// if `data` does not have the tile's shape.
    pub fn insert_tile(&mut self, tile: Index, data: DenseTensor<ElT>) -> Result<()> {
        let shape = self.tiling.tile_shape(&tile)?;
        if data.shape() != shape.as_slice() {
            return Err(SparsityError::ShapeMismatch {
                expected: shape.iter().product(),
                actual: data.len(),
            });
        }
        self.tiles.insert(tile, data);
        Ok(())
    }

    /// Element at `element`; zero inside absent tiles.
    ///
    /// # Errors
    ///
    /// `RankMismatch` or `ElementOutOfRange` if `element` is not inside the
    /// tensor.
    pub fn get(&self, element: &Index) -> Result<ElT> {
        let tile = self.tiling.tile_of(element)?;
        let Some(block) = self.tiles.get(&tile) else {
            return Ok(ElT::zero());
        };
        let lower = self.tiling.tile_lower(&tile)?;
        let local: Vec<usize> = element.iter().zip(&lower).map(|(e, o)| e - o).collect();
        Ok(block.get(&local).copied().unwrap_or_default())
    }

    /// Assemble the full dense tensor, filling zeros for absent tiles.
    pub fn to_dense(&self) -> DenseTensor<ElT> {
        let mut dense = DenseTensor::zeros(&self.shape());
        for (tile, block) in &self.tiles {
            // Stored tiles were validated against the tiling on insertion.
            let Ok(lower) = self.tiling.tile_lower(tile) else {
                continue;
            };
            for (local, value) in block.indexed_iter() {
                let global: Vec<usize> = local.iter().zip(&lower).map(|(l, o)| l + o).collect();
                if let Some(slot) = dense.get_mut(&global) {
                    *slot = value;
                }
            }
        }
        dense
    }

    /// Frobenius norm of the whole tensor.
    pub fn norm(&self) -> f64 {
        self.tiles
            .values()
            .map(DenseTensor::norm_sqr)
            .sum::<f64>()
            .sqrt()
    }
}

impl<ElT: Scalar> DenseTensorSource<ElT> for TiledTensor<ElT> {
    fn tiling(&self) -> &Tiling {
        &self.tiling
    }

    fn is_zero(&self, tile: &Index) -> bool {
        !self.tiles.contains_key(tile)
    }

    fn fetch(&self, tile: &Index) -> Result<Vec<(Index, ElT)>> {
        let lower = self.tiling.tile_lower(tile)?;
        let Some(block) = self.tiles.get(tile) else {
            return Ok(Vec::new());
        };
        Ok(block
            .indexed_iter()
            .map(|(local, value)| {
                let global = Index::collect_from(local.iter().zip(&lower).map(|(l, o)| l + o));
                (global, value)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::scalar::c64;
    use crate::tiling::ModeTiling;
    use approx::assert_relative_eq;

    fn test_tiling() -> Tiling {
        Tiling::new(vec![
            ModeTiling::from_tile_sizes(&[2, 3]).unwrap(),
            ModeTiling::from_tile_sizes(&[4, 5]).unwrap(),
        ])
    }

    #[test]
    fn test_from_dense_drops_zero_tiles() {
        let mut dense: DenseTensor<f64> = DenseTensor::zeros(&[5, 9]);
        dense.set(&[0, 0], 1.0).unwrap();
        dense.set(&[4, 8], 2.0).unwrap();
        let tiled = TiledTensor::from_dense(&dense, test_tiling()).unwrap();

        assert_eq!(tiled.nnz_tiles(), 2);
        assert!(!tiled.is_zero(&Index::new(&[0, 0])));
        assert!(tiled.is_zero(&Index::new(&[0, 1])));
        assert_eq!(tiled.tile(&Index::new(&[1, 1])).unwrap().shape(), &[3, 5]);
        assert_eq!(tiled.to_dense(), dense);
    }

    #[test]
    fn test_from_dense_shape_mismatch() {
        let dense: DenseTensor<f64> = DenseTensor::zeros(&[5, 8]);
        let err = TiledTensor::from_dense(&dense, test_tiling()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
    }

    #[test]
    fn test_get() {
        let mut tiled: TiledTensor<f64> = TiledTensor::zeros(test_tiling());
        let block = DenseTensor::from_fn(&[3, 5], |idx| (idx[0] * 5 + idx[1]) as f64);
        tiled.insert_tile(Index::new(&[1, 1]), block).unwrap();

        assert_eq!(tiled.get(&Index::new(&[2, 4])).unwrap(), 0.0);
        assert_eq!(tiled.get(&Index::new(&[3, 6])).unwrap(), 7.0);
        assert_eq!(tiled.get(&Index::new(&[0, 0])).unwrap(), 0.0);
        assert!(tiled.get(&Index::new(&[5, 0])).is_err());
    }

    #[test]
    fn test_insert_tile_shape_mismatch() {
        let mut tiled: TiledTensor<f64> = TiledTensor::zeros(test_tiling());
        let err = tiled
            .insert_tile(Index::new(&[0, 0]), DenseTensor::zeros(&[2, 5]))
            .unwrap_err();
        assert!(matches!(err, SparsityError::ShapeMismatch { .. }));
        assert!(tiled.insert_tile(Index::new(&[2, 0]), DenseTensor::zeros(&[1, 1])).is_err());
    }

    #[test]
    fn test_fetch() {
        let mut tiled: TiledTensor<f64> = TiledTensor::zeros(test_tiling());
        let block = DenseTensor::from_fn(&[2, 5], |idx| (idx[1] + 1) as f64);
        tiled.insert_tile(Index::new(&[0, 1]), block).unwrap();

        let values = tiled.fetch(&Index::new(&[0, 1])).unwrap();
        assert_eq!(values.len(), 10);
        assert_eq!(values[0], (Index::new(&[0, 4]), 1.0));
        assert_eq!(values[9], (Index::new(&[1, 8]), 5.0));
        assert!(tiled.fetch(&Index::new(&[1, 0])).unwrap().is_empty());
        assert!(tiled.fetch(&Index::new(&[0, 2])).is_err());
        assert_eq!(tiled.locate(&Index::new(&[3, 4])).unwrap(), Index::new(&[1, 1]));
    }

    #[test]
    fn test_norm_complex() {
        let tiling = Tiling::uniform(&[2], 1).unwrap();
        let dense =
            DenseTensor::from_vec(vec![c64::new(3.0, 0.0), c64::new(0.0, 4.0)], &[2]).unwrap();
        let tiled = TiledTensor::from_dense(&dense, tiling).unwrap();
        assert_relative_eq!(tiled.norm(), 5.0, epsilon = 1e-12);
    }
}
