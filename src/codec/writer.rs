//! Packed calendar writer.

use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

use super::format::*;
use crate::index::JurisdictionIndex;
use crate::matrix::CalendarMatrix;
use crate::Result;

/// Pack a matrix row-major, 8 columns per byte, lowest column in the LSB.
pub fn pack(matrix: &CalendarMatrix) -> Vec<u8> {
    let layout = Layout::new(matrix.padded_row_count(), matrix.column_count());
    let row_len = layout.row_bytes();
    let mut output = vec![0u8; layout.byte_len()];

    for (row, out) in matrix.rows().zip(output.chunks_exact_mut(row_len.max(1))) {
        for (group, byte) in row.chunks(BITS_PER_BYTE).zip(out.iter_mut()) {
            *byte = pack_byte(group);
        }
    }

    output
}

/// Pack up to 8 flags into one byte, flag `i` at bit `i`.
pub fn pack_byte(flags: &[bool]) -> u8 {
    flags
        .iter()
        .take(BITS_PER_BYTE)
        .enumerate()
        .fold(0u8, |acc, (bit, &set)| acc | ((set as u8) << bit))
}

/// Hex SHA-256 of an artifact.
pub fn checksum(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Where a published artifact pair landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub artifact: PathBuf,
    pub index: PathBuf,
}

/// Publishes an artifact and its index together.
///
/// Both files are staged as temporaries in the target directory and only
/// renamed into place once both are fully written. The index is renamed last.
pub struct ArtifactWriter {
    dir: PathBuf,
    artifact_name: String,
    index_name: String,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>, artifact_name: &str, index_name: &str) -> Self {
        Self {
            dir: dir.into(),
            artifact_name: artifact_name.to_string(),
            index_name: index_name.to_string(),
        }
    }

    /// Write both files. Fails without touching existing files if the index
    /// does not describe `artifact`.
    pub fn publish(&self, artifact: &[u8], index: &JurisdictionIndex) -> Result<ArtifactPaths> {
        index.layout().check_len(artifact.len())?;
        let index_yaml = index.to_yaml()?;

        fs::create_dir_all(&self.dir)?;

        let mut artifact_tmp = NamedTempFile::new_in(&self.dir)?;
        artifact_tmp.write_all(artifact)?;
        artifact_tmp.as_file().sync_all()?;

        let mut index_tmp = NamedTempFile::new_in(&self.dir)?;
        index_tmp.write_all(index_yaml.as_bytes())?;
        index_tmp.as_file().sync_all()?;

        let paths = ArtifactPaths {
            artifact: self.dir.join(&self.artifact_name),
            index: self.dir.join(&self.index_name),
        };

        // Atomic renames
        artifact_tmp
            .persist(&paths.artifact)
            .map_err(|e| e.error)?;
        index_tmp.persist(&paths.index).map_err(|e| e.error)?;

        log::info!(
            "Published {:?} ({} bytes) and {:?}",
            paths.artifact,
            artifact.len(),
            paths.index
        );

        Ok(paths)
    }
}
