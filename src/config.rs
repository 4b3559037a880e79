use std::path::PathBuf;
use crate::error::{ErrorKind, FfsError};

/// Initial tape size when none is given.
pub const DEFAULT_CELLS: usize = 30_000;
/// Largest initial tape size accepted on the command line.
pub const MAX_CELLS_ARG: usize = 1_000_000;
/// Width of the window printed by `!` when none is given.
pub const DEFAULT_DEBUG_WIDTH: usize = 8;
/// Largest debug width accepted on the command line.
pub const MAX_DEBUG_WIDTH: usize = 1000;
/// Hard ceiling for elastic tape growth.
pub const MAX_TAPE_CELLS: usize = 1 << 20;
/// Largest `x<n>` repeat suffix. Each repeat becomes its own instruction.
pub const MAX_REPEAT: usize = 1_000_000;
/// Number of executed instructions after which a program is considered runaway.
pub const INSTRUCTION_LIMIT: u64 = 10_000_000;

/// Settings of a single compile-and-run invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Source file, or `None` to read standard input.
    pub file: Option<PathBuf>,
    pub cells: usize,
    pub debug_width: usize,
    pub elastic: bool,
    pub strict: bool,
    pub trace: bool
}

impl Default for Config {
    fn default() -> Self {
        Config {
            file: None,
            cells: DEFAULT_CELLS,
            debug_width: DEFAULT_DEBUG_WIDTH,
            elastic: false,
            strict: false,
            trace: false
        }
    }
}

impl Config {

    /// Checks that the numeric settings are within the ranges accepted on the command line.
    pub fn validate(&self) -> Result<(), FfsError> {
        check_range("--cells", self.cells as i64, 1, MAX_CELLS_ARG)?;
        check_range("--dbg", self.debug_width as i64, 1, MAX_DEBUG_WIDTH)?;
        Ok(())
    }

}

fn check_range(flag: &str, value: i64, min: usize, max: usize) -> Result<usize, FfsError> {
    if value < min as i64 || value > max as i64 {
        return Err(
            FfsError::argument(
                ErrorKind::OutOfRange,
                format!("Value {} for {} is out of range", value, flag)
            )
            .with_suggestion(format!("Use a value between {} and {}", min, max))
        );
    }
    Ok(value as usize)
}

/// Parses the numeric value of `flag` and checks it lies in `min..=max`.
pub fn parse_range_arg(flag: &str, value: &str, min: usize, max: usize) -> Result<usize, FfsError> {
    let parsed = value.trim().parse::<i64>().map_err(|_| {
        FfsError::argument(
            ErrorKind::InvalidArgumentValue,
            format!("Invalid value '{}' for {}", value, flag)
        )
        .with_suggestion(format!("{} expects an integer between {} and {}", flag, min, max))
    })?;
    check_range(flag, parsed, min, max)
}
