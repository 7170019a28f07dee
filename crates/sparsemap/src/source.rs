//! Read access to a tiled dense dataset.
//!
//! The sparsification engine never sees a concrete backend; it only needs
//! the narrow capability described by [`DenseTensorSource`]. Implementations
//! may be in-memory ([`TiledTensor`](crate::TiledTensor)) or backed by remote
//! storage, in which case `fetch` is where I/O happens.

use crate::error::Result;
use crate::index::Index;
use crate::scalar::Scalar;
use crate::tiling::Tiling;

/// A dense dataset partitioned into tiles, some of which may be zero.
///
/// Implementations are shared by every worker that populates output tiles,
/// so they must be `Sync`.
pub trait DenseTensorSource<ElT: Scalar>: Sync {
    /// Tiling of the dataset; its rank is the rank of the dataset.
    fn tiling(&self) -> &Tiling;

    /// Rank of the dataset.
    fn rank(&self) -> usize {
        self.tiling().rank()
    }

    /// Tile containing `element`.
    fn locate(&self, element: &Index) -> Result<Index> {
        self.tiling().tile_of(element)
    }

    /// True if `tile` is known to hold only zeros and need not be fetched.
    fn is_zero(&self, tile: &Index) -> bool;

    /// All `(element, value)` pairs of `tile`.
    fn fetch(&self, tile: &Index) -> Result<Vec<(Index, ElT)>>;
}
