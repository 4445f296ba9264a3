//! End-to-end scenarios exercising the three drivers together through the
//! public API, rather than a single module in isolation.

use stencil_relax::driver::distributed::DistributedDriver;
use stencil_relax::driver::pool::PoolDriver;
use stencil_relax::driver::serial;
use stencil_relax::grid::{checksum, region::EdgeCursor, rng, Grid};

#[test]
fn smallest_grid_converges_in_two_sweeps_with_correct_mean() {
    let initial = rng::init_seeded(3, 3).unwrap();
    let mean = (initial.get(0, 1) + initial.get(2, 1) + initial.get(1, 0) + initial.get(1, 2)) * 0.25;

    let result = serial::run(initial, 1e-6).unwrap();
    assert_eq!(result.sweeps, 2);
    assert!((result.grid.get(1, 1) - mean).abs() < 1e-9);
}

#[test]
fn all_zero_five_by_five_converges_with_zero_checksums() {
    let initial = Grid::create_empty(5, 5).unwrap();
    let result = serial::run(initial, 1e-4).unwrap();
    assert_eq!(result.sweeps, 1);
    assert_eq!(checksum::checksum_xor(&result.grid), 0);
    assert_eq!(checksum::checksum_sum(&result.grid), 0);
}

#[test]
fn pool_matches_serial_on_a_realistic_grid() {
    let initial = rng::init_seeded(256, 256).unwrap();
    let pool_result = PoolDriver::new(4, 16).unwrap().run(initial.clone(), 1e-4).unwrap();
    let serial_result = serial::run(initial, 1e-4).unwrap();

    assert_eq!(pool_result.sweeps, serial_result.sweeps);
    assert_eq!(checksum::checksum_xor(&pool_result.grid), checksum::checksum_xor(&serial_result.grid));
    assert_eq!(checksum::checksum_sum(&pool_result.grid), checksum::checksum_sum(&serial_result.grid));
}

#[test]
fn distributed_two_ranks_matches_serial_on_a_realistic_grid() {
    let initial = rng::init_seeded(128, 128).unwrap();
    let distributed_result = DistributedDriver::new(2, 1, 8).unwrap().run(initial.clone(), 1e-4).unwrap();
    let serial_result = serial::run(initial, 1e-4).unwrap();

    assert_eq!(checksum::checksum_xor(&distributed_result.grid), checksum::checksum_xor(&serial_result.grid));
    assert_eq!(checksum::checksum_sum(&distributed_result.grid), checksum::checksum_sum(&serial_result.grid));
}

#[test]
fn four_ranks_ghost_exchange_keeps_the_interior_in_agreement_with_serial() {
    let initial = rng::init_seeded(64, 64).unwrap();
    let distributed_result = DistributedDriver::new(4, 1, 4).unwrap().run(initial.clone(), 1e-4).unwrap();
    let serial_result = serial::run(initial, 1e-4).unwrap();

    assert_eq!(distributed_result.sweeps, serial_result.sweeps);
    assert_eq!(checksum::checksum_xor(&distributed_result.grid), checksum::checksum_xor(&serial_result.grid));
}

#[test]
fn constant_edge_grid_reaches_the_same_fixed_point_on_every_driver() {
    let mut initial = Grid::create_empty(20, 20).unwrap();
    for (x, y) in EdgeCursor::new(20, 20) {
        initial.set(x, y, 1.0);
    }

    let serial_result = serial::run(initial.clone(), 1e-6).unwrap();
    let pool_result = PoolDriver::new(3, 5).unwrap().run(initial, 1e-6).unwrap();

    for y in 1..19 {
        for x in 1..19 {
            assert!((serial_result.grid.get(x, y) - 1.0).abs() < 1e-6);
        }
    }
    assert_eq!(checksum::checksum_xor(&serial_result.grid), checksum::checksum_xor(&pool_result.grid));
}
