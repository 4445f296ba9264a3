//! The stencil sweep kernel (§4.3): the 4-neighbor Jacobi average, shared by
//! every driver.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::GridError;
use crate::grid::{Grid, Region, WriteCell};

/// The shared over-limit flag (§3, §5): monotone set-on-first-true, cleared
/// once per sweep before any worker writes, read once after the barrier that
/// ends the sweep.
#[derive(Debug, Default)]
pub struct OverLimitFlag(AtomicBool);

impl OverLimitFlag {
    pub fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn mark(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Writes the 4-neighbor average of `source` into `target` for every cell of
/// `region`, setting `flag` if any cell changed by more than `epsilon`.
///
/// `region` must lie entirely within `source`'s interior: the kernel reads
/// one cell beyond each side of `region`, which is only guaranteed in bounds
/// when `region` excludes the outer edge.
pub fn sweep<T: WriteCell>(
    source: &Grid,
    target: &mut T,
    region: Region,
    epsilon: f64,
    flag: &OverLimitFlag,
) -> Result<(), GridError> {
    region.check_bounds(source.width(), source.height())?;

    for (x, y) in region.iter() {
        let new = (source.get(x - 1, y) + source.get(x + 1, y) + source.get(x, y - 1) + source.get(x, y + 1)) * 0.25;
        if (new - source.get(x, y)).abs() > epsilon {
            flag.mark();
        }
        target.write_cell(x, y, new);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::rng;

    #[test]
    fn sweep_writes_every_cell_of_region_exactly_once() {
        let source = rng::init_seeded(5, 5).unwrap();
        let mut target = Grid::clone_with_edge(&source).unwrap();
        let flag = OverLimitFlag::new();
        sweep(&source, &mut target, Region::full_interior(5, 5), 1e-9, &flag).unwrap();

        for y in 1..4 {
            for x in 1..4 {
                let expected =
                    (source.get(x - 1, y) + source.get(x + 1, y) + source.get(x, y - 1) + source.get(x, y + 1)) * 0.25;
                assert_eq!(target.get(x, y), expected);
            }
        }
    }

    #[test]
    fn sweep_never_touches_cells_outside_region() {
        let source = rng::init_seeded(7, 7).unwrap();
        let mut target = Grid::clone_with_edge(&source).unwrap();
        let flag = OverLimitFlag::new();
        let band = Region::band(7, 2, 1);
        sweep(&source, &mut target, band, 1e-9, &flag).unwrap();

        // Row 3..=5 interior cells were never written; they're still zero.
        for y in 3..6 {
            for x in 1..6 {
                assert_eq!(target.get(x, y), 0.0);
            }
        }
    }

    #[test]
    fn kernel_idempotent_at_fixed_point() {
        // A grid whose interior is already the harmonic mean of constant
        // edges (all-equal cells) must not raise the flag.
        let mut g = Grid::create_empty(5, 5).unwrap();
        for y in 0..5 {
            for x in 0..5 {
                g.set(x, y, 1.0);
            }
        }
        let mut target = Grid::clone_with_edge(&g).unwrap();
        let flag = OverLimitFlag::new();
        sweep(&g, &mut target, Region::full_interior(5, 5), 1e-6, &flag).unwrap();
        assert!(!flag.is_set());
    }

    #[test]
    fn rejects_region_that_does_not_fit_the_grid() {
        let source = rng::init_seeded(5, 5).unwrap();
        let mut target = Grid::clone_with_edge(&source).unwrap();
        let flag = OverLimitFlag::new();
        let too_wide = Region::new(1, 1, 10, 3);
        assert!(sweep(&source, &mut target, too_wide, 1e-9, &flag).is_err());
    }
}
