//! Configuration of the sparsification engine.

/// Scheduling options for [`from_sparse_map_with`](super::from_sparse_map_with).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparsifyConfig {
    /// Populate outer tiles on rayon workers (default: true)
    pub parallel: bool,

    /// Size of a dedicated worker pool (None = rayon's global pool)
    pub num_threads: Option<usize>,

    /// Fewer candidate tiles than this are populated sequentially (default: 4)
    pub min_parallel_tiles: usize,
}

impl Default for SparsifyConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            num_threads: None,
            min_parallel_tiles: 4,
        }
    }
}

impl SparsifyConfig {
    /// A configuration that never leaves the calling thread.
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    pub fn with_min_parallel_tiles(mut self, min_parallel_tiles: usize) -> Self {
        self.min_parallel_tiles = min_parallel_tiles;
        self
    }

    /// Whether `ntiles` candidate tiles should be populated in parallel.
    pub fn use_parallel(&self, ntiles: usize) -> bool {
        self.parallel && ntiles >= self.min_parallel_tiles.max(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = SparsifyConfig::default();
        assert!(config.parallel);
        assert_eq!(config.num_threads, None);
        assert!(!config.use_parallel(3));
        assert!(config.use_parallel(4));
    }

    #[test]
    fn test_builder() {
        let config = SparsifyConfig::default()
            .with_num_threads(2)
            .with_min_parallel_tiles(0);
        assert_eq!(config.num_threads, Some(2));
        assert!(!config.use_parallel(1));
        assert!(config.use_parallel(2));

        let config = SparsifyConfig::sequential();
        assert!(!config.use_parallel(1000));
        assert!(config.with_parallel(true).use_parallel(1000));
    }
}
