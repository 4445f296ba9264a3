//! CLI entry point for stencil-relax.
//!
//! Either runs one configured benchmark (`<threads> <size> <precision>
//! <type> <cut>`) or, with no arguments, a built-in sweep over thread counts
//! for a fixed grid size (§6).

use std::io::Write;
use std::time::Instant;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::info;

use stencil_relax::config::{Config, Mode};
use stencil_relax::driver::{distributed::DistributedDriver, pool::PoolDriver, serial};
use stencil_relax::grid::{checksum, rng};
use stencil_relax::output::{self, ResultRecord};

/// Parallel and distributed Jacobi stencil relaxation benchmark.
#[derive(Parser, Debug)]
#[command(name = "stencil-relax")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Worker thread count (pool mode) or rank count (distributed mode)
    threads: Option<usize>,

    /// Grid width and height
    size: Option<usize>,

    /// Convergence precision epsilon
    precision: Option<f64>,

    /// Mode: serial, pool, or distributed (also accepts 0, 1, 2)
    #[arg(value_name = "TYPE")]
    mode: Option<String>,

    /// Rows per band (pool and distributed modes)
    cut: Option<usize>,
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();
    bootstrap(args)
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

fn bootstrap(args: Args) -> Result<()> {
    match (args.threads, args.size, args.precision, args.mode, args.cut) {
        (Some(threads), Some(size), Some(precision), Some(mode_str), Some(cut)) => {
            let mode: Mode = mode_str.parse()?;
            let config = Config {
                size,
                precision,
                threads,
                chunk: cut,
                ranks: threads,
                mode,
            };
            config.validate()?;
            let record = run_single(&config)?;
            println!("{record}");
            Ok(())
        }
        (None, None, None, None, None) => run_builtin_sweep(),
        _ => bail!("For individual calculations use: <threads> <size> <precision> <type> <cut>"),
    }
}

/// Runs one benchmark to convergence and returns its CSV result record.
fn run_single(config: &Config) -> Result<ResultRecord> {
    let initial = rng::init_seeded(config.size, config.size)?;

    let start = Instant::now();
    let (final_grid, sweeps, threads_reported) = match config.mode {
        Mode::Serial => {
            let result = serial::run(initial, config.precision)?;
            (result.grid, result.sweeps, 1)
        }
        Mode::Pool => {
            let driver = PoolDriver::new(config.threads, config.chunk)?;
            let result = driver.run(initial, config.precision)?;
            (result.grid, result.sweeps, config.threads)
        }
        Mode::Distributed => {
            let driver = DistributedDriver::new(config.ranks, 1, config.chunk)?;
            let result = driver.run(initial, config.precision)?;
            (result.grid, result.sweeps, config.ranks)
        }
    };
    let seconds = start.elapsed().as_secs_f64();

    let xor_checksum = checksum::checksum_xor(&final_grid);
    let sum_checksum = checksum::checksum_sum(&final_grid);

    info!(
        mode = ?config.mode,
        size = config.size,
        sweeps,
        seconds,
        "run complete"
    );

    Ok(ResultRecord {
        loop_count: sweeps,
        mode: config.mode,
        size: config.size,
        threads: threads_reported,
        precision: config.precision,
        seconds,
        xor_checksum,
        sum_checksum,
    })
}

/// No arguments: sweep a fixed grid size over serial and a doubling series of
/// pool thread counts, matching the shape of the source's built-in benchmark.
fn run_builtin_sweep() -> Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    output::write_header(&mut handle)?;

    const SIZE: usize = 256;
    const PRECISION: f64 = 0.0001;

    let serial_config = Config {
        size: SIZE,
        precision: PRECISION,
        threads: 1,
        chunk: SIZE,
        ranks: 1,
        mode: Mode::Serial,
    };
    writeln!(handle, "{}", run_single(&serial_config)?)?;

    let max_threads = num_cpus::get() * 2;
    let mut threads = 1;
    while threads <= max_threads {
        let pool_config = Config {
            size: SIZE,
            precision: PRECISION,
            threads,
            chunk: 10,
            ranks: 1,
            mode: Mode::Pool,
        };
        writeln!(handle, "{}", run_single(&pool_config)?)?;
        threads *= 2;
    }

    Ok(())
}
