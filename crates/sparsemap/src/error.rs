//! Error types for sparsemap.

use thiserror::Error;

/// Coarse classification of a [`SparsityError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Key, value or tiling rank is inconsistent with existing content.
    RankMismatch,
    /// Missing key, index outside a tiling, or offset outside `[0, size)`.
    OutOfRange,
    /// An argument that can never be valid (bad tiling, bad injection).
    InvalidArgument,
}

/// Errors that can occur in sparse map operations.
///
/// Every fallible operation validates its inputs before mutating anything,
/// so an `Err` always leaves the operands unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SparsityError {
    /// Rank of an index, domain or tiling disagrees with existing content.
    #[error("rank mismatch: expected rank {expected}, got rank {actual}")]
    RankMismatch { expected: usize, actual: usize },

    /// Index is not a key of the map (or not a member of the domain).
    #[error("index {index:?} not found")]
    IndexNotFound { index: Vec<usize> },

    /// Element coordinate lies outside the range covered by a tiling.
    #[error("element {element} is out of range for mode {mode} with extent {extent}")]
    ElementOutOfRange {
        mode: usize,
        element: usize,
        extent: usize,
    },

    /// Tile coordinate does not name a tile of the tiling.
    #[error("tile {tile} is out of range for mode {mode} with {ntiles} tiles")]
    TileOutOfRange {
        mode: usize,
        tile: usize,
        ntiles: usize,
    },

    /// An injected position falls outside the rank of the injected index.
    #[error("injection position {position} is out of range for rank {rank}")]
    InjectionOutOfRange { position: usize, rank: usize },

    /// Tile boundaries are not a gapless partition starting at zero.
    #[error("invalid tiling: {message}")]
    InvalidTiling { message: String },

    /// Mode-injection map references a mode outside the valid range.
    #[error("invalid mode injection: {message}")]
    InvalidInjection { message: String },

    /// Data length does not match the requested shape.
    #[error("shape mismatch: expected {expected} elements, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// A dedicated worker pool could not be created.
    #[error("thread pool: {message}")]
    ThreadPool { message: String },
}

impl SparsityError {
    /// Classify this error into the three-way taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RankMismatch { .. } => ErrorKind::RankMismatch,
            Self::IndexNotFound { .. }
            | Self::ElementOutOfRange { .. }
            | Self::TileOutOfRange { .. }
            | Self::InjectionOutOfRange { .. }
            | Self::ShapeMismatch { .. } => ErrorKind::OutOfRange,
            Self::InvalidTiling { .. }
            | Self::InvalidInjection { .. }
            | Self::ThreadPool { .. } => ErrorKind::InvalidArgument,
        }
    }

    pub(crate) fn rank_mismatch(expected: usize, actual: usize) -> Self {
        Self::RankMismatch { expected, actual }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SparsityError>;
