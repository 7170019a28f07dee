//! Sparsification: carving a dense dataset into a tensor-of-tensors.
//!
//! - [`from_sparse_map`] / [`from_sparse_map_with`] - entry points
//! - [`TilePopulator`] - builds one outer tile
//! - [`TileExecutor`] - schedules tiles ([`SequentialExecutor`], [`RayonExecutor`])
//! - [`SparsifyConfig`] - scheduling options

mod config;
mod engine;
mod executor;

pub use config::SparsifyConfig;
pub use engine::{
    ModeInjection, TilePopulator, from_sparse_map, from_sparse_map_on, from_sparse_map_with,
};
pub use executor::{RayonExecutor, SequentialExecutor, TileExecutor};
