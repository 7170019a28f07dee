//! TensorOfTensors - nested output of the sparsification engine.
//!
//! The outer tensor is tiled. Each non-zero outer tile maps every outer
//! element that has a sub-block to a dense inner tensor whose shape is the
//! compressed extents of that element's domain. Outer tiles that hold no
//! sub-blocks, or only zero-valued ones, are not stored.

use std::collections::BTreeMap;

use crate::index::Index;
use crate::scalar::Scalar;
use crate::tensor::DenseTensor;
use crate::tiling::Tiling;

/// One populated outer tile: inner blocks keyed by outer element.
#[derive(Clone, Debug, PartialEq)]
pub struct ToTTile<ElT: Scalar> {
    tile: Index,
    inner: BTreeMap<Index, DenseTensor<ElT>>,
    norm: f64,
}

impl<ElT: Scalar> ToTTile<ElT> {
    /// Assemble a tile from its inner blocks and compute its norm.
    pub fn from_blocks(tile: Index, inner: BTreeMap<Index, DenseTensor<ElT>>) -> Self {
        let norm = inner
            .values()
            .map(DenseTensor::norm_sqr)
            .sum::<f64>()
            .sqrt();
        Self { tile, inner, norm }
    }

    /// Outer tile index.
    #[inline]
    pub fn tile(&self) -> &Index {
        &self.tile
    }

    /// Frobenius norm over all inner blocks.
    #[inline]
    pub fn norm(&self) -> f64 {
        self.norm
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Inner block of outer element `element`.
    pub fn get(&self, element: &Index) -> Option<&DenseTensor<ElT>> {
        self.inner.get(element)
    }

    /// Iterate `(outer element, inner block)` in ascending element order.
    pub fn iter(&self) -> std::collections::btree_map::Iter<'_, Index, DenseTensor<ElT>> {
        self.inner.iter()
    }
}

/// A tiled tensor whose elements are dense tensors.
///
/// # Example
///
/// ```
/// use sparsemap::{
///     DenseTensor, Index, ModeInjection, SparseMap, TiledTensor, Tiling, from_sparse_map,
/// };
///
/// let data = DenseTensor::from_fn(&[4], |idx| (idx[0] + 1) as f64);
/// let source = TiledTensor::from_dense(&data, Tiling::uniform(&[4], 2).unwrap()).unwrap();
///
/// let esm = SparseMap::try_from_pairs([
///     (Index::new(&[0]), vec![Index::new(&[1]), Index::new(&[3])]),
/// ])
/// .unwrap();
/// let outer = Tiling::uniform(&[2], 1).unwrap();
///
/// let tot = from_sparse_map(&esm, &source, &outer, &ModeInjection::new()).unwrap();
/// assert_eq!(tot.nnz_tiles(), 1);
/// assert!(tot.is_tile_zero(&Index::new(&[1])));
/// let block = tot.get(&Index::new(&[0])).unwrap();
/// assert_eq!(block.data(), &[2.0, 4.0]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct TensorOfTensors<ElT: Scalar> {
    outer_tiling: Tiling,
    tiles: BTreeMap<Index, ToTTile<ElT>>,
}

impl<ElT: Scalar> TensorOfTensors<ElT> {
    /// An empty tensor-of-tensors over `outer_tiling`.
    pub fn new(outer_tiling: Tiling) -> Self {
        Self {
            outer_tiling,
            tiles: BTreeMap::new(),
        }
    }

    /// Build from populated tiles. Zero-norm tiles are dropped.
    pub fn from_tiles<I>(outer_tiling: Tiling, tiles: I) -> Self
    where
        I: IntoIterator<Item = ToTTile<ElT>>,
    {
        let tiles = tiles
            .into_iter()
            .filter(|t| t.norm() > 0.0)
            .map(|t| (t.tile.clone(), t))
            .collect();
        Self {
            outer_tiling,
            tiles,
        }
    }

    #[inline]
    pub fn outer_tiling(&self) -> &Tiling {
        &self.outer_tiling
    }

    /// Number of stored (non-zero) outer tiles.
    #[inline]
    pub fn nnz_tiles(&self) -> usize {
        self.tiles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn is_tile_zero(&self, tile: &Index) -> bool {
        !self.tiles.contains_key(tile)
    }

    pub fn tile(&self, tile: &Index) -> Option<&ToTTile<ElT>> {
        self.tiles.get(tile)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &ToTTile<ElT>> {
        self.tiles.values()
    }

    /// Inner block of outer element `element`, or `None` if the element has
    /// no sub-block, lies in a zero tile, or is outside the outer tiling.
    pub fn get(&self, element: &Index) -> Option<&DenseTensor<ElT>> {
        let tile = self.outer_tiling.tile_of(element).ok()?;
        self.tiles.get(&tile)?.get(element)
    }

    /// Total number of stored inner blocks.
    pub fn nnz_blocks(&self) -> usize {
        self.tiles.values().map(ToTTile::len).sum()
    }

    /// Frobenius norm of the whole nested tensor.
    pub fn norm(&self) -> f64 {
        self.tiles
            .values()
            .map(|t| t.norm() * t.norm())
            .sum::<f64>()
            .sqrt()
    }
}
