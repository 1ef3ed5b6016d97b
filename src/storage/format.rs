// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! On-disk layout of a trajectory table.
//!
//! A table is a directory:
//!
//! ```text
//! <table>/tracks.dat   header + fixed-width rows
//! <table>/frame.idx    (frame, first_row, row_count) runs
//! <table>/track.idx    (track_id, row) pairs sorted by track then row
//! ```
//!
//! Rows are six little-endian 32-bit columns:
//! `[frame u32, track_id u32, x f32, y f32, intensity f32, shape f32]`.
//! Positions are stored in single precision to keep large tables small.
//!
//! The data file header records how many rows are committed. Space past the
//! committed rows may be pre-allocated and must be ignored by readers.

use std::path::{Path, PathBuf};

use crate::errors::StorageError;
use crate::linking::LinkedPoint;

pub const DATA_FILENAME: &str = "tracks.dat";
pub const FRAME_INDEX_FILENAME: &str = "frame.idx";
pub const TRACK_INDEX_FILENAME: &str = "track.idx";

pub const DATA_MAGIC: &[u8; 8] = b"BTRKTBL1";
pub const FRAME_INDEX_MAGIC: &[u8; 8] = b"BTRKFIDX";
pub const TRACK_INDEX_MAGIC: &[u8; 8] = b"BTRKPIDX";

pub const FORMAT_VERSION: u32 = 1;
pub const COLUMN_COUNT: u32 = 6;
pub const HEADER_LEN: u64 = 32;
pub const ROW_LEN: u64 = 4 * COLUMN_COUNT as u64;

/// Byte offset of the committed row count within the header.
pub const ROW_COUNT_OFFSET: u64 = 16;

/// One persisted row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub frame: u32,
    pub track_id: u32,
    pub x: f32,
    pub y: f32,
    pub intensity: f32,
    pub shape: f32,
}

impl TrackPoint {
    pub fn from_linked(frame: u32, linked: &LinkedPoint) -> Self {
        Self {
            frame,
            track_id: linked.track_id,
            x: linked.point.x as f32,
            y: linked.point.y as f32,
            intensity: linked.point.intensity as f32,
            shape: linked.point.shape as f32,
        }
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.frame.to_le_bytes());
        out.extend_from_slice(&self.track_id.to_le_bytes());
        out.extend_from_slice(&self.x.to_le_bytes());
        out.extend_from_slice(&self.y.to_le_bytes());
        out.extend_from_slice(&self.intensity.to_le_bytes());
        out.extend_from_slice(&self.shape.to_le_bytes());
    }

    /// Decode one row from exactly [`ROW_LEN`] bytes.
    pub fn decode(bytes: &[u8]) -> Self {
        let word = |i: usize| [bytes[4 * i], bytes[4 * i + 1], bytes[4 * i + 2], bytes[4 * i + 3]];
        Self {
            frame: u32::from_le_bytes(word(0)),
            track_id: u32::from_le_bytes(word(1)),
            x: f32::from_le_bytes(word(2)),
            y: f32::from_le_bytes(word(3)),
            intensity: f32::from_le_bytes(word(4)),
            shape: f32::from_le_bytes(word(5)),
        }
    }
}

/// Decode a buffer holding a whole number of rows.
pub fn decode_rows(bytes: &[u8]) -> Vec<TrackPoint> {
    bytes
        .chunks_exact(ROW_LEN as usize)
        .map(TrackPoint::decode)
        .collect()
}

/// The fixed 32-byte data file header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Header {
    pub rows: u64,
    pub expected_rows: u64,
}

impl Header {
    pub fn encode(&self) -> [u8; HEADER_LEN as usize] {
        let mut out = [0u8; HEADER_LEN as usize];
        out[0..8].copy_from_slice(DATA_MAGIC);
        out[8..12].copy_from_slice(&FORMAT_VERSION.to_le_bytes());
        out[12..16].copy_from_slice(&COLUMN_COUNT.to_le_bytes());
        out[16..24].copy_from_slice(&self.rows.to_le_bytes());
        out[24..32].copy_from_slice(&self.expected_rows.to_le_bytes());
        out
    }

    pub fn decode(bytes: &[u8], path: &Path) -> Result<Self, StorageError> {
        let corrupt = |reason: String| StorageError::Corrupt {
            path: path.to_path_buf(),
            reason,
        };
        if bytes.len() < HEADER_LEN as usize {
            return Err(corrupt(format!("header is {} bytes", bytes.len())));
        }
        if &bytes[0..8] != DATA_MAGIC {
            return Err(corrupt("bad magic".into()));
        }
        let u32_at = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        let u64_at = |i: usize| {
            let mut b = [0u8; 8];
            b.copy_from_slice(&bytes[i..i + 8]);
            u64::from_le_bytes(b)
        };

        let version = u32_at(8);
        if version != FORMAT_VERSION {
            return Err(corrupt(format!("unsupported format version {}", version)));
        }
        let columns = u32_at(12);
        if columns != COLUMN_COUNT {
            return Err(corrupt(format!("expected {} columns, found {}", COLUMN_COUNT, columns)));
        }

        Ok(Self {
            rows: u64_at(16),
            expected_rows: u64_at(24),
        })
    }
}

pub fn data_path(table: &Path) -> PathBuf {
    table.join(DATA_FILENAME)
}

pub fn frame_index_path(table: &Path) -> PathBuf {
    table.join(FRAME_INDEX_FILENAME)
}

pub fn track_index_path(table: &Path) -> PathBuf {
    table.join(TRACK_INDEX_FILENAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_rejects_foreign_files() {
        let path = Path::new("table");
        assert!(matches!(
            Header::decode(b"not a table at all, definitely not", path),
            Err(StorageError::Corrupt { .. })
        ));
        assert!(matches!(Header::decode(b"short", path), Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn test_header_layout() {
        let header = Header { rows: 7, expected_rows: 100 };
        let bytes = header.encode();
        assert_eq!(&bytes[0..8], DATA_MAGIC);
        assert_eq!(bytes[ROW_COUNT_OFFSET as usize], 7);
        assert_eq!(Header::decode(&bytes, Path::new("t")).unwrap(), header);
    }

    #[test]
    fn test_row_is_fixed_width() {
        let mut buf = Vec::new();
        TrackPoint {
            frame: 3,
            track_id: 9,
            x: 1.5,
            y: -2.25,
            intensity: 10.0,
            shape: 0.5,
        }
        .encode(&mut buf);
        assert_eq!(buf.len() as u64, ROW_LEN);
        assert_eq!(decode_rows(&buf)[0].y, -2.25);
    }
}
