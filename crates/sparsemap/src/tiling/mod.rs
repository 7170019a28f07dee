//! Tilings and tile/element conversion of sparse maps.
//!
//! # Overview
//!
//! Block-sparse backends store tensors tile by tile, while sparsity is
//! usually known per element. This module provides:
//!
//! - [`ModeTiling`] - gapless partition of one mode into tiles
//! - [`Tiling`] - one `ModeTiling` per mode
//! - conversion functions moving [`SparseMap`](crate::SparseMap) and
//!   [`Domain`](crate::Domain) contents between element and tile granularity
//!
//! # Example
//!
//! ```
//! use sparsemap::{Index, SparseMap, Tiling, tile_indices};
//!
//! let sm = SparseMap::try_from_pairs([
//!     (Index::new(&[0]), vec![Index::new(&[3])]),
//!     (Index::new(&[1]), vec![Index::new(&[0])]),
//! ])
//! .unwrap();
//!
//! let tiling = Tiling::uniform(&[4], 2).unwrap();
//! let tiled = tile_indices(&sm, &tiling, &tiling).unwrap();
//! assert_eq!(tiled.to_string(), "{(0): {(0), (1)}}");
//! ```

mod convert;
mod mode;

pub use convert::{
    tile_dependent_indices, tile_domain, tile_independent_indices, tile_indices,
    untile_dependent_indices, untile_domain, untile_independent_indices, untile_indices,
};
pub use mode::{ModeTiling, Tiling};
