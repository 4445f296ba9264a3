//! CSV result records (§6): one line per benchmark run, emitted by the CLI
//! harness after a driver converges.

use std::fmt;

use crate::config::Mode;

/// One completed benchmark run, ready to be formatted as a CSV line.
#[derive(Debug, Clone)]
pub struct ResultRecord {
    pub loop_count: u64,
    pub mode: Mode,
    pub size: usize,
    pub threads: usize,
    pub precision: f64,
    pub seconds: f64,
    pub xor_checksum: u64,
    pub sum_checksum: u64,
}

impl fmt::Display for ResultRecord {
    /// `<loop_count>,<type>,<size>,<threads>,<precision>,<seconds>,<xor64_hex16>,<sum64_hex16>`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08},{:02},{:05},{:03},{:.6},{:.6},{:016x},{:016x}",
            self.loop_count,
            self.mode.as_csv_code(),
            self.size,
            self.threads,
            self.precision,
            self.seconds,
            self.xor_checksum,
            self.sum_checksum,
        )
    }
}

/// Writes the CSV header row understood by the result records above.
pub fn write_header<W: std::io::Write>(writer: &mut W) -> std::io::Result<()> {
    writeln!(writer, "loop_count,type,size,threads,precision,seconds,xor64,sum64")
}
