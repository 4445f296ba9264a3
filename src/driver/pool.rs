//! The thread-pool driver (§4.5): a fixed-size `rayon` pool relaxes the
//! interior one sweep at a time, one task per row band.
//!
//! `rayon::ThreadPoolBuilder` gives exactly the worker-pool contract the spec
//! asks for (a bounded number of concurrently running tasks over a shared
//! queue); `ThreadPool::scope` is the barrier that makes sweep `k+1` wait for
//! every band of sweep `k` before the buffers are swapped.

use tracing::debug;

use crate::error::GridError;
use crate::grid::region::partition_bands;
use crate::grid::Grid;
use crate::kernel::{sweep, OverLimitFlag};

use super::RelaxResult;

pub struct PoolDriver {
    pool: rayon::ThreadPool,
    chunk: usize,
}

impl PoolDriver {
    /// `threads` is the fixed worker-pool size (T ≥ 1); `chunk` is the number
    /// of interior rows per band (C ≥ 1).
    pub fn new(threads: usize, chunk: usize) -> Result<Self, GridError> {
        if threads == 0 {
            return Err(GridError::InvalidConfig("thread count must be at least 1".into()));
        }
        if chunk == 0 {
            return Err(GridError::InvalidConfig("chunk size must be at least 1".into()));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| GridError::InvalidConfig(format!("failed to build thread pool: {e}")))?;
        Ok(Self { pool, chunk })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Runs banded sweeps over `initial` until no band reports a change over
    /// `epsilon`.
    pub fn run(&self, initial: Grid, epsilon: f64) -> Result<RelaxResult, GridError> {
        let mut source = initial;
        let mut target = Grid::clone_with_edge(&source)?;
        let flag = OverLimitFlag::new();
        let mut sweeps: u64 = 0;

        loop {
            flag.clear();
            sweep_banded(Some(&self.pool), self.chunk, &source, &mut target, epsilon, &flag)?;
            std::mem::swap(&mut source, &mut target);
            sweeps += 1;
            debug!(sweep = sweeps, threads = self.threads(), chunk = self.chunk, "pool sweep complete");

            if !flag.is_set() {
                break;
            }
        }

        Ok(RelaxResult { grid: source, sweeps })
    }
}

/// Runs one sweep over `source`'s interior, banded into `chunk`-row pieces.
/// With `pool` absent the bands run one after another on the calling thread
/// (used by the distributed driver for single-threaded per-rank sweeps);
/// with `pool` present each band is a task dispatched to the pool and joined
/// at the end of the call, which is the barrier of §4.5 step 3.
pub(crate) fn sweep_banded(
    pool: Option<&rayon::ThreadPool>,
    chunk: usize,
    source: &Grid,
    target: &mut Grid,
    epsilon: f64,
    flag: &OverLimitFlag,
) -> Result<(), GridError> {
    let bands = partition_bands(source.width(), source.height(), chunk);
    let mut band_views = target.split_bands_mut(&bands);

    match pool {
        Some(pool) => {
            pool.scope(|s| {
                for (region, band) in bands.iter().copied().zip(band_views.iter_mut()) {
                    s.spawn(move |_| {
                        sweep(source, band, region, epsilon, flag)
                            .expect("a band produced by partition_bands always fits the grid");
                    });
                }
            });
            Ok(())
        }
        None => {
            for (region, band) in bands.iter().copied().zip(band_views.iter_mut()) {
                sweep(source, band, region, epsilon, flag)?;
            }
            Ok(())
        }
    }
}
