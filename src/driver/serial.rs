//! The single-threaded driver (§4.4): the reference against which the
//! parallel and distributed drivers are checked for agreement (S3, S4, S6).

use tracing::debug;

use crate::error::GridError;
use crate::grid::{Grid, Region};
use crate::kernel::{sweep, OverLimitFlag};

use super::{DriverState, RelaxResult};

/// Runs sweeps over the full interior of `initial` until no cell changes by
/// more than `epsilon` in a sweep.
pub fn run(initial: Grid, epsilon: f64) -> Result<RelaxResult, GridError> {
    let mut state = DriverState::Init;
    let mut source = initial;
    let mut target = Grid::clone_with_edge(&source)?;
    let region = Region::full_interior(source.width(), source.height());
    let flag = OverLimitFlag::new();

    state = DriverState::Sweeping;
    let mut sweeps: u64 = 0;

    loop {
        flag.clear();
        sweep(&source, &mut target, region, epsilon, &flag)?;
        std::mem::swap(&mut source, &mut target);
        sweeps += 1;
        debug!(sweep = sweeps, "serial sweep complete");

        if !flag.is_set() {
            state = DriverState::Converged;
            break;
        }
    }

    debug_assert_eq!(state, DriverState::Converged);
    Ok(RelaxResult { grid: source, sweeps })
}
