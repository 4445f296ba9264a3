//! The distributed driver (§4.6): row-band decomposition across ranks, each
//! rank an OS thread talking to its neighbors over the in-process
//! [`comm::ChannelCommunicator`].

use std::thread;

use tracing::debug;

use crate::error::GridError;
use crate::grid::{Grid, Region};
use crate::kernel::{sweep, OverLimitFlag};

use super::comm::ChannelCommunicator;
use super::pool::sweep_banded;
use super::RelaxResult;

pub struct DistributedDriver {
    ranks: usize,
    threads_per_rank: usize,
    chunk: usize,
}

impl DistributedDriver {
    /// `ranks` is the number of row-slabs (N); `threads_per_rank` and `chunk`
    /// let each rank delegate its local sweep to a thread-pool driver instead
    /// of sweeping serially (§4.6: "may internally use C5 per rank").
    pub fn new(ranks: usize, threads_per_rank: usize, chunk: usize) -> Result<Self, GridError> {
        if ranks == 0 {
            return Err(GridError::InvalidConfig("rank count must be at least 1".into()));
        }
        if threads_per_rank == 0 || chunk == 0 {
            return Err(GridError::InvalidConfig("threads per rank and chunk must be at least 1".into()));
        }
        Ok(Self {
            ranks,
            threads_per_rank,
            chunk,
        })
    }

    pub fn run(&self, initial: Grid, epsilon: f64) -> Result<RelaxResult, GridError> {
        let width = initial.width();
        let height = initial.height();
        let n = self.ranks;

        let owned_ranges: Vec<(usize, usize)> = (0..n).map(|r| (r * height / n, (r + 1) * height / n)).collect();

        let payload_per_rank: Vec<Vec<f64>> = owned_ranges
            .iter()
            .map(|&(start, end)| {
                let mut buf = Vec::with_capacity((end - start) * width);
                for y in start..end {
                    buf.extend_from_slice(initial.row(y));
                }
                buf
            })
            .collect();

        let comms = ChannelCommunicator::create_ring(n);
        let threads_per_rank = self.threads_per_rank;
        let chunk = self.chunk;

        let handles: Vec<_> = comms
            .into_iter()
            .enumerate()
            .map(|(rank, comm)| {
                let scatter_payload = if rank == 0 { Some(payload_per_rank.clone()) } else { None };
                let owned_rows = owned_ranges[rank].1 - owned_ranges[rank].0;
                thread::spawn(move || -> Result<RankOutput, GridError> {
                    run_rank(comm, scatter_payload, width, owned_rows, threads_per_rank, chunk, epsilon)
                })
            })
            .collect();

        let mut gathered_rows: Option<Vec<Vec<f64>>> = None;
        let mut sweeps: u64 = 0;
        for handle in handles {
            let output = handle
                .join()
                .map_err(|_| GridError::CommunicationFailed {
                    from: 0,
                    to: 0,
                    reason: "a rank thread panicked".into(),
                })??;
            sweeps = sweeps.max(output.sweeps);
            if let Some(rows) = output.gathered {
                gathered_rows = Some(rows);
            }
        }

        let gathered_rows = gathered_rows.expect("rank 0 always gathers the final grid");
        let mut result = Grid::create_empty(width, height)?;
        for (rank, slab) in gathered_rows.into_iter().enumerate() {
            let (start, _) = owned_ranges[rank];
            for (j, row_chunk) in slab.chunks(width).enumerate() {
                result.row_mut(start + j).copy_from_slice(row_chunk);
            }
        }

        Ok(RelaxResult { grid: result, sweeps })
    }
}

struct RankOutput {
    gathered: Option<Vec<Vec<f64>>>,
    sweeps: u64,
}

/// One rank's lifetime: scatter-receive, sweep/ghost-exchange until globally
/// converged, gather-send.
fn run_rank(
    comm: ChannelCommunicator,
    scatter_payload: Option<Vec<Vec<f64>>>,
    width: usize,
    owned_rows: usize,
    threads_per_rank: usize,
    chunk: usize,
    epsilon: f64,
) -> Result<RankOutput, GridError> {
    let rank = comm.rank();
    let n = comm.size();
    let has_upper = rank > 0;
    let has_lower = rank + 1 < n;
    let ghost_above = has_upper as usize;
    let ghost_below = has_lower as usize;
    let local_height = owned_rows + ghost_above + ghost_below;

    let owned_flat = comm.scatter_rows(0, scatter_payload)?;

    let mut source = Grid::create_empty(width, local_height)?;
    for (j, row_chunk) in owned_flat.chunks(width).enumerate() {
        source.row_mut(ghost_above + j).copy_from_slice(row_chunk);
    }
    let mut target = Grid::clone_with_edge(&source)?;

    let rank_pool = if threads_per_rank > 1 {
        Some(
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads_per_rank)
                .build()
                .map_err(|e| GridError::InvalidConfig(format!("failed to build per-rank thread pool: {e}")))?,
        )
    } else {
        None
    };

    // A rank whose single owned row is the true global boundary (possible
    // when `ranks` is close to the interior row count) has no interior rows
    // of its own to relax; `Region` rejects a zero-height band, so that rank
    // just skips the kernel call each sweep and only carries ghost rows.
    let interior_height = local_height.saturating_sub(2);
    let interior = Region::band(width, 1, interior_height);
    let flag = OverLimitFlag::new();
    let mut sweeps: u64 = 0;

    // Posts sends first, then receives: channels are unbounded so sends
    // never block, matching the "post non-blocking ops, then wait-all"
    // protocol of §4.6 without risking a send/recv ordering deadlock.
    let exchange_ghosts = |grid: &mut Grid| -> Result<(), GridError> {
        if has_upper {
            comm.send_row(rank - 1, grid.row(1).to_vec())?;
        }
        if has_lower {
            comm.send_row(rank + 1, grid.row(local_height - 2).to_vec())?;
        }
        if has_upper {
            let ghost = comm.recv_row(rank - 1)?;
            grid.row_mut(0).copy_from_slice(&ghost);
        }
        if has_lower {
            let ghost = comm.recv_row(rank + 1)?;
            grid.row_mut(local_height - 1).copy_from_slice(&ghost);
        }
        Ok(())
    };

    // Prime the ghost rows from the scattered owned data before the first
    // sweep. Without this, a neighbor whose own ghost comes from a *true
    // global edge row* (rather than another rank's relaxed interior) would
    // read a zeroed ghost on sweep 1 instead of the real boundary value,
    // diverging from the serial driver's trajectory.
    exchange_ghosts(&mut source)?;

    loop {
        flag.clear();
        if interior_height > 0 {
            match &rank_pool {
                Some(pool) => sweep_banded(Some(pool), chunk, &source, &mut target, epsilon, &flag)?,
                None => sweep(&source, &mut target, interior, epsilon, &flag)?,
            }
            std::mem::swap(&mut source, &mut target);
        }
        sweeps += 1;

        exchange_ghosts(&mut source)?;

        let global_over = comm.all_reduce_or(flag.is_set())?;
        debug!(rank, sweep = sweeps, global_over, "distributed sweep complete");
        if !global_over {
            break;
        }
    }

    let mut flat = Vec::with_capacity(owned_rows * width);
    for j in 0..owned_rows {
        flat.extend_from_slice(source.row(ghost_above + j));
    }
    let gathered = comm.gather_rows(0, flat)?;

    Ok(RankOutput { gathered, sweeps })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::serial;
    use crate::grid::{checksum, rng};

    #[test]
    fn single_rank_matches_serial() {
        let initial = rng::init_seeded(32, 32).unwrap();
        let distributed = DistributedDriver::new(1, 1, 8).unwrap().run(initial.clone(), 1e-4).unwrap();
        let serial_result = serial::run(initial, 1e-4).unwrap();
        assert_eq!(checksum::checksum_xor(&distributed.grid), checksum::checksum_xor(&serial_result.grid));
        assert_eq!(distributed.sweeps, serial_result.sweeps);
    }

    #[test]
    fn two_ranks_match_serial_checksum() {
        let initial = rng::init_seeded(64, 64).unwrap();
        let distributed = DistributedDriver::new(2, 1, 8).unwrap().run(initial.clone(), 1e-4).unwrap();
        let serial_result = serial::run(initial, 1e-4).unwrap();
        assert_eq!(checksum::checksum_xor(&distributed.grid), checksum::checksum_xor(&serial_result.grid));
    }

    #[test]
    fn four_ranks_preserve_boundary() {
        let initial = rng::init_seeded(40, 40).unwrap();
        let mut edge_before = Vec::new();
        for (x, y) in crate::grid::region::EdgeCursor::new(40, 40) {
            edge_before.push(initial.get(x, y));
        }
        let distributed = DistributedDriver::new(4, 1, 6).unwrap().run(initial, 1e-4).unwrap();
        let mut edge_after = Vec::new();
        for (x, y) in crate::grid::region::EdgeCursor::new(40, 40) {
            edge_after.push(distributed.grid.get(x, y));
        }
        assert_eq!(edge_before, edge_after);
    }

    #[test]
    fn rank_uses_pool_internally_matches_serial() {
        let initial = rng::init_seeded(48, 48).unwrap();
        let distributed = DistributedDriver::new(3, 2, 4).unwrap().run(initial.clone(), 1e-4).unwrap();
        let serial_result = serial::run(initial, 1e-4).unwrap();
        assert_eq!(checksum::checksum_xor(&distributed.grid), checksum::checksum_xor(&serial_result.grid));
    }

    #[test]
    fn boundary_rank_with_a_single_owned_edge_row_does_not_error() {
        // size=10, ranks=8: rank 0 and rank 7 each own exactly one logical
        // row, which for a boundary rank is the true grid edge (zero
        // interior rows of its own to relax).
        let initial = rng::init_seeded(10, 10).unwrap();
        let distributed = DistributedDriver::new(8, 1, 4).unwrap().run(initial.clone(), 1e-4).unwrap();
        let serial_result = serial::run(initial, 1e-4).unwrap();
        assert_eq!(checksum::checksum_xor(&distributed.grid), checksum::checksum_xor(&serial_result.grid));
    }

    #[test]
    fn rejects_zero_ranks_or_threads_or_chunk() {
        assert!(DistributedDriver::new(0, 1, 1).is_err());
        assert!(DistributedDriver::new(1, 0, 1).is_err());
        assert!(DistributedDriver::new(1, 1, 0).is_err());
    }
}
