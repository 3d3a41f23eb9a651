//! Bit-packed calendar codec.
//!
//! Rows are written consecutively, each occupying `ceil(column_count / 8)`
//! bytes with the lowest column in the least-significant bit. The artifact has
//! no header; its dimensions are carried by the jurisdiction index and must be
//! supplied to the reader.

pub mod format;
pub mod reader;
pub mod writer;

pub use format::*;
pub use reader::{PackedReader, RowBits};
pub use writer::{checksum, pack, ArtifactPaths, ArtifactWriter};
