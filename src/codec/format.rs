//! Packed calendar layout.
//!
//! File structure (no header, dimensions live in the companion index):
//! ```text
//! +---------------------------+
//! |  ROW 0   (row_bytes)      |  column c -> byte c / 8, bit c % 8 (LSB first)
//! +---------------------------+
//! |  ROW 1   (row_bytes)      |
//! +---------------------------+
//! |  ...                      |
//! +---------------------------+
//! |  ROW padded_row_count - 1 |  trailing rows pad the count to a multiple of 8
//! +---------------------------+
//! ```

use crate::{Error, Result};

/// Columns per byte, and the row padding granule.
pub const BITS_PER_BYTE: usize = 8;

/// Bytes occupied by one row of `column_count` columns.
pub const fn row_bytes(column_count: usize) -> usize {
    column_count.div_ceil(BITS_PER_BYTE)
}

/// Round `row_count` up to the next multiple of 8.
pub const fn padded_row_count(row_count: usize) -> usize {
    row_count + (BITS_PER_BYTE - row_count % BITS_PER_BYTE) % BITS_PER_BYTE
}

/// Location of a single cell inside the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitPosition {
    pub byte_offset: usize,
    pub bit: u8,
}

impl BitPosition {
    pub fn mask(&self) -> u8 {
        1 << self.bit
    }
}

/// Dimensions of a packed matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    padded_row_count: usize,
    column_count: usize,
}

impl Layout {
    pub fn new(padded_row_count: usize, column_count: usize) -> Self {
        Self {
            padded_row_count,
            column_count,
        }
    }

    pub fn padded_row_count(&self) -> usize {
        self.padded_row_count
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn row_bytes(&self) -> usize {
        row_bytes(self.column_count)
    }

    /// Exact artifact size for this layout.
    pub fn byte_len(&self) -> usize {
        self.padded_row_count * self.row_bytes()
    }

    /// Check an artifact length against this layout.
    pub fn check_len(&self, actual: usize) -> Result<()> {
        let expected = self.byte_len();
        if expected != actual {
            return Err(Error::DimensionMismatch {
                what: "artifact length",
                expected,
                actual,
            });
        }
        Ok(())
    }

    pub fn check_row(&self, row: usize) -> Result<()> {
        if row >= self.padded_row_count {
            return Err(Error::OutOfRange {
                axis: "row",
                index: row,
                limit: self.padded_row_count,
            });
        }
        Ok(())
    }

    pub fn check_column(&self, column: usize) -> Result<()> {
        if column >= self.column_count {
            return Err(Error::OutOfRange {
                axis: "column",
                index: column,
                limit: self.column_count,
            });
        }
        Ok(())
    }

    /// Byte of row `row` holding `column`.
    pub fn position(&self, row: usize, column: usize) -> Result<BitPosition> {
        self.check_row(row)?;
        self.check_column(column)?;
        Ok(BitPosition {
            byte_offset: row * self.row_bytes() + column / BITS_PER_BYTE,
            bit: (column % BITS_PER_BYTE) as u8,
        })
    }
}
