use std::cmp;
use std::ops::{Index, IndexMut};
use crate::config::DEFAULT_CELLS;
use crate::error::{ErrorKind, FfsError};

/// Zero-initialized byte memory of the virtual machine, growable up to a fixed ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: Vec<u8>,
    max_len: usize
}

impl Tape {

    /// Creates a tape of `len` cells that may grow up to `max_len` cells.
    /// A length of zero selects the default size.
    pub fn new(len: usize, max_len: usize) -> Tape {
        Tape {
            cells: vec![0; normalize(len)],
            max_len
        }
    }

    /// Shrinks or extends the tape to `len` zeroed cells, as if freshly created.
    pub fn reset(&mut self, len: usize) {
        self.cells.clear();
        self.cells.resize(normalize(len), 0);
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn cells(&self) -> &[u8] {
        &*self.cells
    }

    /// Doubles the tape, without exceeding the ceiling.
    /// Returns the new length, or a memory-limit error if no room could be gained.
    pub fn grow(&mut self) -> Result<usize, FfsError> {
        let len = self.cells.len();
        let new_len = cmp::min(cmp::max(len.saturating_mul(2), len + 1), self.max_len);
        if new_len <= len {
            return Err(
                FfsError::runtime(
                    ErrorKind::MemoryLimitExceeded,
                    format!("Tape cannot grow beyond {} cells", self.max_len)
                )
                .with_suggestion("Reduce the memory used by the program")
            );
        }

        debug!("Growing tape from {} to {} cells.", len, new_len);
        self.cells.resize(new_len, 0);
        Ok(new_len)
    }

}

fn normalize(len: usize) -> usize {
    if len == 0 { DEFAULT_CELLS } else { len }
}

impl Index<usize> for Tape {
    type Output = u8;

    fn index(&self, i: usize) -> &u8 {
        &self.cells[i]
    }
}

impl IndexMut<usize> for Tape {
    fn index_mut(&mut self, i: usize) -> &mut u8 {
        &mut self.cells[i]
    }
}
