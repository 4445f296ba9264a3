//! stencil-relax - a parallel and distributed Jacobi stencil relaxation engine.
//!
//! This library provides the data model of a bordered 2D grid, the
//! double-buffered 4-point Jacobi sweep kernel, and three drivers that run
//! sweeps to convergence: serial, thread-pool, and distributed (row-band
//! decomposition across in-process "ranks").
//!
//! # Example
//!
//! ```
//! use stencil_relax::driver::serial;
//! use stencil_relax::grid::rng;
//!
//! let initial = rng::init_seeded(16, 16).unwrap();
//! let result = serial::run(initial, 0.0001).unwrap();
//! println!("converged after {} sweeps", result.sweeps);
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod grid;
pub mod kernel;
pub mod output;

pub use config::{Config, Mode};
pub use error::{GridError, GridResult};
pub use grid::Grid;
pub use output::ResultRecord;
