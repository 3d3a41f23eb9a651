//! Packed calendar reader with memory-mapping support.

use memmap2::Mmap;
use std::fs::File;
use std::ops::{Deref, Range};
use std::path::Path;

use super::format::*;
use crate::Result;

enum Storage {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Deref for Storage {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Storage::Mapped(mmap) => mmap,
            Storage::Owned(data) => data,
        }
    }
}

/// Read-only view of a packed calendar.
///
/// Point queries touch exactly one byte; nothing is decoded up front.
pub struct PackedReader {
    data: Storage,
    layout: Layout,
}

impl PackedReader {
    /// Memory-map an artifact file.
    ///
    /// The file length is checked against `layout` before mapping.
    pub fn open(path: &Path, layout: Layout) -> Result<Self> {
        let file = File::open(path)?;
        layout.check_len(file.metadata()?.len() as usize)?;

        if layout.byte_len() == 0 {
            return Ok(Self {
                data: Storage::Owned(Vec::new()),
                layout,
            });
        }

        let mmap = unsafe { Mmap::map(&file)? };
        layout.check_len(mmap.len())?;

        Ok(Self {
            data: Storage::Mapped(mmap),
            layout,
        })
    }

    /// Wrap artifact bytes already in memory.
    pub fn from_bytes(data: Vec<u8>, layout: Layout) -> Result<Self> {
        layout.check_len(data.len())?;
        Ok(Self {
            data: Storage::Owned(data),
            layout,
        })
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Raw artifact bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Read the flag at (`row`, `column`).
    pub fn get(&self, row: usize, column: usize) -> Result<bool> {
        let pos = self.layout.position(row, column)?;
        Ok(self.data[pos.byte_offset] & pos.mask() != 0)
    }

    /// Lazily decode a whole row.
    pub fn row(&self, row: usize) -> Result<RowBits<'_>> {
        self.row_range(row, 0..self.layout.column_count())
    }

    /// Lazily decode `columns` of one row.
    pub fn row_range(&self, row: usize, columns: Range<usize>) -> Result<RowBits<'_>> {
        self.layout.check_row(row)?;
        if columns.start < columns.end {
            self.layout.check_column(columns.end - 1)?;
        }

        let row_len = self.layout.row_bytes();
        let start = row * row_len;
        Ok(RowBits {
            bytes: &self.data[start..start + row_len],
            next: columns.start,
            end: columns.end.max(columns.start),
        })
    }
}

/// Iterator over the flags of one row.
pub struct RowBits<'a> {
    bytes: &'a [u8],
    next: usize,
    end: usize,
}

impl RowBits<'_> {
    /// Column of the next flag to be yielded.
    pub fn column(&self) -> usize {
        self.next
    }
}

impl Iterator for RowBits<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.next >= self.end {
            return None;
        }
        let column = self.next;
        self.next += 1;
        let byte = self.bytes[column / BITS_PER_BYTE];
        Some(byte & (1 << (column % BITS_PER_BYTE)) != 0)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RowBits<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::writer::pack;
    use crate::matrix::CalendarMatrix;
    use crate::Error;
    use std::io::Write;

    fn toy() -> (CalendarMatrix, PackedReader) {
        let matrix = CalendarMatrix::from_rows(&[
            vec![true, false, false, true, false],
            vec![false, false, false, false, true],
        ])
        .unwrap();
        let layout = Layout::new(matrix.padded_row_count(), matrix.column_count());
        let reader = PackedReader::from_bytes(pack(&matrix), layout).unwrap();
        (matrix, reader)
    }

    #[test]
    fn test_point_query() {
        let (_, reader) = toy();
        assert!(reader.get(0, 3).unwrap());
        assert!(reader.get(0, 0).unwrap());
        assert!(!reader.get(0, 1).unwrap());
        assert!(reader.get(1, 4).unwrap());
        assert!(!reader.get(1, 3).unwrap());
    }

    #[test]
    fn test_matches_matrix_everywhere() {
        let rows: Vec<Vec<bool>> = (0..11)
            .map(|r| (0..37).map(|c| (r * 7 + c * 3) % 5 == 0).collect())
            .collect();
        let matrix = CalendarMatrix::from_rows(&rows).unwrap();
        let layout = Layout::new(matrix.padded_row_count(), matrix.column_count());
        let reader = PackedReader::from_bytes(pack(&matrix), layout).unwrap();

        for (r, row) in rows.iter().enumerate() {
            for (c, &expected) in row.iter().enumerate() {
                assert_eq!(reader.get(r, c).unwrap(), expected);
            }
            let decoded: Vec<bool> = reader.row(r).unwrap().collect();
            assert_eq!(&decoded, row);
        }
    }

    #[test]
    fn test_out_of_range() {
        let (matrix, reader) = toy();
        let padded = matrix.padded_row_count();
        assert!(matches!(
            reader.get(padded, 0),
            Err(Error::OutOfRange { axis: "row", .. })
        ));
        assert!(matches!(
            reader.get(0, 5),
            Err(Error::OutOfRange { axis: "column", .. })
        ));
        assert!(reader.row(padded).is_err());
        assert!(reader.row_range(0, 2..6).is_err());
    }

    #[test]
    fn test_row_range() {
        let (_, reader) = toy();
        let bits = reader.row_range(0, 2..5).unwrap();
        assert_eq!(bits.len(), 3);
        assert_eq!(bits.column(), 2);
        assert_eq!(bits.collect::<Vec<_>>(), vec![false, true, false]);
        assert_eq!(reader.row_range(0, 3..3).unwrap().count(), 0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let layout = Layout::new(8, 5);
        assert!(matches!(
            PackedReader::from_bytes(vec![0; 9], layout),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_open_mmap() {
        let (_, owned) = toy();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(owned.as_bytes()).unwrap();
        file.flush().unwrap();

        let reader = PackedReader::open(file.path(), owned.layout()).unwrap();
        assert!(reader.get(0, 3).unwrap());
        assert!(reader.get(1, 4).unwrap());

        let wrong = Layout::new(16, 5);
        assert!(matches!(
            PackedReader::open(file.path(), wrong),
            Err(Error::DimensionMismatch { .. })
        ));
    }
}
