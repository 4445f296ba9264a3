//! Bit-level checksums used only for external result validation (never by
//! the core relaxation itself).

use super::Grid;

/// XOR-folds every cell's 64-bit IEEE-754 bit pattern.
pub fn checksum_xor(g: &Grid) -> u64 {
    g.as_slice().iter().fold(0u64, |acc, v| acc ^ v.to_bits())
}

/// Wrapping-sum-folds every cell's 64-bit IEEE-754 bit pattern.
pub fn checksum_sum(g: &Grid) -> u64 {
    g.as_slice()
        .iter()
        .fold(0u64, |acc, v| acc.wrapping_add(v.to_bits()))
}
