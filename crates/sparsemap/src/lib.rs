//! sparsemap - sparsity maps over tensor indices
//!
//! This crate tracks which parts of a large multi-dimensional dataset are
//! significant and materializes only those parts as densely packed nested
//! blocks (a tensor-of-tensors), as needed by local-correlation methods.
//!
//! # Architecture
//!
//! ```text
//! Level 1: Index, Domain
//!     → fixed-rank coordinates and ordered sets of them
//!
//! Level 2: SparseMap
//!     → independent Index -> Domain, with set algebra
//!
//! Level 3: tiling
//!     → element <-> tile granularity conversion
//!
//! Level 4: sparsify
//!     → DenseTensorSource + SparseMap -> TensorOfTensors
//! ```
//!
//! # Example
//!
//! ```
//! use sparsemap::{Domain, Index, SparseMap};
//!
//! let mut sm = SparseMap::new();
//! sm.add_to_domain(Index::new(&[0]), Index::new(&[1])).unwrap();
//! sm.add_to_domain(Index::new(&[1]), Index::new(&[2])).unwrap();
//! sm.add_to_domain(Index::new(&[1]), Index::new(&[3])).unwrap();
//! assert_eq!(sm.to_string(), "{(0): {(1)}, (1): {(2), (3)}}");
//!
//! // Composition: i -> j -> k
//! let next = SparseMap::try_from_pairs([
//!     (Index::new(&[2]), vec![Index::new(&[7])]),
//!     (Index::new(&[3]), vec![Index::new(&[8])]),
//! ])
//! .unwrap();
//! let chained = sm.chain(&next).unwrap();
//! assert_eq!(chained.to_string(), "{(1): {(7), (8)}}");
//!
//! // Domain algebra
//! let a = Domain::singleton(Index::new(&[1]));
//! let b = Domain::singleton(Index::new(&[2]));
//! assert_eq!((&a * &b).to_string(), "{(1, 2)}");
//! ```

pub mod domain;
pub mod error;
pub mod index;
pub mod scalar;
pub mod source;
pub mod sparse_map;
pub mod sparsify;
pub mod strides;
pub mod tensor;
pub mod tensor_of_tensors;
pub mod tiled_tensor;
pub mod tiling;

pub use domain::{CompressedDomain, Domain};
pub use error::{ErrorKind, Result, SparsityError};
pub use index::{Index, IndexRange};
pub use scalar::{Scalar, c64};
pub use source::DenseTensorSource;
pub use sparse_map::SparseMap;
pub use sparsify::{
    ModeInjection, RayonExecutor, SequentialExecutor, SparsifyConfig, TileExecutor, TilePopulator,
    from_sparse_map, from_sparse_map_on, from_sparse_map_with,
};
pub use tensor::DenseTensor;
pub use tensor_of_tensors::{TensorOfTensors, ToTTile};
pub use tiled_tensor::TiledTensor;
pub use tiling::{
    ModeTiling, Tiling, tile_dependent_indices, tile_domain, tile_independent_indices,
    tile_indices, untile_dependent_indices, untile_domain, untile_independent_indices,
    untile_indices,
};
