//! Benchmark configuration and defaults (§3, §6).
//!
//! Mirrors the validate-then-run shape of a typical `clap` front end: a
//! plain, clonable `Config` is built from parsed arguments and checked once
//! before any driver starts, rather than trusting raw CLI input deep inside
//! the engine.

use std::str::FromStr;

use crate::error::GridError;

/// Which of the three execution strategies a run should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Serial,
    Pool,
    Distributed,
}

impl Mode {
    /// The two-digit code used in the `type` column of a CSV result record.
    /// The source's own CLI conflates `serial`/`pool` modes and leaves a
    /// `bmark_mpi` variant unwired (§9); this crate assigns one stable code
    /// per mode instead of replicating that mismatch.
    pub fn as_csv_code(&self) -> &'static str {
        match self {
            Mode::Serial => "00",
            Mode::Pool => "01",
            Mode::Distributed => "02",
        }
    }
}

impl FromStr for Mode {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" | "serial" => Ok(Mode::Serial),
            "1" | "pool" => Ok(Mode::Pool),
            "2" | "distributed" => Ok(Mode::Distributed),
            other => Err(GridError::InvalidConfig(format!(
                "unknown mode '{other}': expected serial, pool, or distributed"
            ))),
        }
    }
}

/// Configuration for a single benchmark run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Grid width and height (W = H = size).
    pub size: usize,
    /// Convergence threshold ε.
    pub precision: f64,
    /// Worker thread count for the pool driver, or per-rank thread count for
    /// the distributed driver.
    pub threads: usize,
    /// Rows per band.
    pub chunk: usize,
    /// Number of ranks for the distributed driver.
    pub ranks: usize,
    /// Which driver to run.
    pub mode: Mode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            size: 256,
            precision: 0.0001,
            threads: 1,
            chunk: 16,
            ranks: 1,
            mode: Mode::Serial,
        }
    }
}

impl Config {
    /// Validates all fields, returning `InvalidConfig` on the first
    /// violation rather than letting a driver panic on bad input.
    pub fn validate(&self) -> Result<(), GridError> {
        if self.size < 3 {
            return Err(GridError::InvalidConfig(format!(
                "size must be at least 3, got {}",
                self.size
            )));
        }
        if !(self.precision > 0.0) {
            return Err(GridError::InvalidConfig(format!(
                "precision must be a positive number, got {}",
                self.precision
            )));
        }
        if self.threads == 0 {
            return Err(GridError::InvalidConfig("threads must be at least 1".into()));
        }
        if self.chunk == 0 {
            return Err(GridError::InvalidConfig("chunk must be at least 1".into()));
        }
        if self.ranks == 0 {
            return Err(GridError::InvalidConfig("ranks must be at least 1".into()));
        }
        if self.mode == Mode::Distributed && self.ranks > self.size.saturating_sub(2).max(1) {
            return Err(GridError::InvalidConfig(format!(
                "{} ranks cannot own a share of a {}-row interior",
                self.ranks, self.size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_too_small_grid() {
        let mut config = Config::default();
        config.size = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_positive_precision() {
        let mut config = Config::default();
        config.precision = 0.0;
        assert!(config.validate().is_err());
        config.precision = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_threads_chunk_or_ranks() {
        let mut config = Config::default();
        config.threads = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.chunk = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.ranks = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn mode_parses_numeric_and_named_forms() {
        assert_eq!("0".parse::<Mode>().unwrap(), Mode::Serial);
        assert_eq!("serial".parse::<Mode>().unwrap(), Mode::Serial);
        assert_eq!("1".parse::<Mode>().unwrap(), Mode::Pool);
        assert_eq!("distributed".parse::<Mode>().unwrap(), Mode::Distributed);
        assert!("bogus".parse::<Mode>().is_err());
    }
}
