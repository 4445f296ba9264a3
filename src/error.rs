//! Typed error hierarchy for the stencil relaxation engine.
//!
//! Library code returns [`GridError`] so callers can match on failure kind;
//! the CLI binary wraps these with `anyhow::Context` for user-facing messages.

use thiserror::Error;

/// Errors raised by the grid data model and the drivers built on top of it.
#[derive(Debug, Error)]
pub enum GridError {
    /// Aligned allocation of the backing storage was refused by the allocator.
    #[error("failed to allocate a {bytes}-byte, 64-byte aligned grid buffer")]
    AllocationFailed { bytes: usize },

    /// Two grids that were expected to share dimensions did not.
    #[error("dimension mismatch: expected {expected_w}x{expected_h}, got {actual_w}x{actual_h}")]
    DimensionMismatch {
        expected_w: usize,
        expected_h: usize,
        actual_w: usize,
        actual_h: usize,
    },

    /// A region or coordinate fell outside the bounds of its grid.
    #[error("region ({x}, {y}, {w}, {h}) is out of bounds for a {grid_w}x{grid_h} grid")]
    OutOfBounds {
        x: usize,
        y: usize,
        w: usize,
        h: usize,
        grid_w: usize,
        grid_h: usize,
    },

    /// The in-process communicator failed to deliver a message or collective.
    #[error("communication failed between rank {from} and rank {to}: {reason}")]
    CommunicationFailed {
        from: usize,
        to: usize,
        reason: String,
    },

    /// CLI or configuration arguments failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience alias used throughout the crate.
pub type GridResult<T> = Result<T, GridError>;
