//! In-memory calendar matrix.

use crate::codec::padded_row_count;
use crate::{Error, Result};

/// Jurisdictions × weekdays boolean grid, row count padded to a multiple of 8.
///
/// Padding rows are allocated but never written by the builder; they stay
/// `false` and carry no meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarMatrix {
    cells: Vec<bool>,
    row_count: usize,
    column_count: usize,
}

impl CalendarMatrix {
    /// Allocate an all-`false` matrix for `row_count` real rows.
    pub fn new(row_count: usize, column_count: usize) -> Self {
        Self {
            cells: vec![false; padded_row_count(row_count) * column_count],
            row_count,
            column_count,
        }
    }

    /// Build from explicit rows; all rows must have the same length.
    pub fn from_rows(rows: &[Vec<bool>]) -> Result<Self> {
        let column_count = rows.first().map(Vec::len).unwrap_or(0);
        let mut matrix = Self::new(rows.len(), column_count);
        for (r, row) in rows.iter().enumerate() {
            if row.len() != column_count {
                return Err(Error::DimensionMismatch {
                    what: "matrix row width",
                    expected: column_count,
                    actual: row.len(),
                });
            }
            matrix.row_mut(r).copy_from_slice(row);
        }
        Ok(matrix)
    }

    /// Real (addressable) rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Rows including padding.
    pub fn padded_row_count(&self) -> usize {
        padded_row_count(self.row_count)
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn get(&self, row: usize, column: usize) -> Option<bool> {
        if row >= self.padded_row_count() || column >= self.column_count {
            return None;
        }
        Some(self.cells[row * self.column_count + column])
    }

    pub fn set(&mut self, row: usize, column: usize, value: bool) -> Result<()> {
        if row >= self.row_count {
            return Err(Error::OutOfRange {
                axis: "row",
                index: row,
                limit: self.row_count,
            });
        }
        if column >= self.column_count {
            return Err(Error::OutOfRange {
                axis: "column",
                index: column,
                limit: self.column_count,
            });
        }
        self.cells[row * self.column_count + column] = value;
        Ok(())
    }

    /// One row, padding rows included.
    pub fn row(&self, row: usize) -> &[bool] {
        let start = row * self.column_count;
        &self.cells[start..start + self.column_count]
    }

    fn row_mut(&mut self, row: usize) -> &mut [bool] {
        let start = row * self.column_count;
        &mut self.cells[start..start + self.column_count]
    }

    /// All rows in order, padding rows included.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        (0..self.padded_row_count()).map(move |r| self.row(r))
    }

    /// Cells of the real rows as one contiguous slice, for row-wise partitioning.
    pub(crate) fn real_cells_mut(&mut self) -> &mut [bool] {
        let end = self.row_count * self.column_count;
        &mut self.cells[..end]
    }
}
