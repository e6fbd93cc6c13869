//! Worker pool that renders buckets in parallel.

use crate::bucket::Bucket;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

/// A dedicated rayon pool for tile work.
pub struct TileExecutor {
    pool: ThreadPool,
}

impl TileExecutor {
    /// Build a pool with `threads` workers, or one per core when `threads` is 0.
    pub fn new(threads: usize) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("spectra-tile-{i}"))
            .build()?;
        log::debug!("Tile executor started with {} threads", pool.current_num_threads());
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `job` on every bucket and collect the results in bucket order.
    pub fn run<T, F>(&self, buckets: &[Bucket], job: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&Bucket) -> T + Sync + Send,
    {
        self.pool.install(|| buckets.par_iter().map(job).collect())
    }
}

impl std::fmt::Debug for TileExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileExecutor").field("threads", &self.threads()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::generate_buckets;

    #[test]
    fn test_thread_count() {
        assert_eq!(TileExecutor::new(3).unwrap().threads(), 3);
        assert!(TileExecutor::new(0).unwrap().threads() >= 1);
    }

    #[test]
    fn test_run_preserves_order() {
        let executor = TileExecutor::new(4).unwrap();
        let buckets = generate_buckets(64, 64, 4, 4);
        let indices = executor.run(&buckets, |b| b.index);
        assert_eq!(indices, (0..16).collect::<Vec<_>>());
    }
}
