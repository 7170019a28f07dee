//! Per-tile scheduling.
//!
//! Outer tiles are independent: each reads immutable inputs and produces
//! its own output. An executor runs a task once per tile and returns the
//! results in tile order, or the first error encountered.

use rayon::prelude::*;

use crate::error::{Result, SparsityError};
use crate::index::Index;

/// Runs a task once per tile.
pub trait TileExecutor {
    /// Run `task` for every tile and collect the results in input order.
    ///
    /// # Errors
    ///
    /// The first error returned by `task`. No partial result is returned.
    fn execute<R, F>(&self, tiles: Vec<Index>, task: F) -> Result<Vec<R>>
    where
        R: Send,
        F: Fn(&Index) -> Result<R> + Sync + Send;
}

/// Runs tasks in order on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialExecutor;

impl TileExecutor for SequentialExecutor {
    fn execute<R, F>(&self, tiles: Vec<Index>, task: F) -> Result<Vec<R>>
    where
        R: Send,
        F: Fn(&Index) -> Result<R> + Sync + Send,
    {
        tiles.iter().map(task).collect()
    }
}

/// Runs tasks on rayon's work-stealing pool.
#[derive(Debug, Default)]
pub struct RayonExecutor {
    pool: Option<rayon::ThreadPool>,
}

impl RayonExecutor {
    /// Executor on the global rayon pool.
    pub fn new() -> Self {
        Self { pool: None }
    }

    /// Executor on a dedicated pool of `num_threads` workers.
    ///
    /// # Errors
    ///
    /// `ThreadPool` if the pool cannot be built.
    pub fn with_threads(num_threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .map_err(|e| SparsityError::ThreadPool {
                message: e.to_string(),
            })?;
        Ok(Self { pool: Some(pool) })
    }

    /// Number of worker threads tasks will run on.
    pub fn num_threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }
}

impl TileExecutor for RayonExecutor {
    fn execute<R, F>(&self, tiles: Vec<Index>, task: F) -> Result<Vec<R>>
    where
        R: Send,
        F: Fn(&Index) -> Result<R> + Sync + Send,
    {
        let run = || tiles.par_iter().map(&task).collect::<Result<Vec<R>>>();
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }
}
