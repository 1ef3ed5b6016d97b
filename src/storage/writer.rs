// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::errors::StorageError;
use crate::linking::LinkedPoint;
use crate::observability::messages::storage::{
    IndicesRebuilt, TableCreated, TableFinalized, TableLeftUnindexed,
};
use crate::observability::messages::StructuredLog;
use crate::storage::format::{data_path, Header, TrackPoint, HEADER_LEN, ROW_COUNT_OFFSET, ROW_LEN};
use crate::storage::index::{remove_indices, write_indices, TrackEntry};
use crate::storage::reader::read_committed;

/// Sizes reported after indices are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSummary {
    pub rows: u64,
    pub frames: usize,
    pub tracks: usize,
}

/// Single writer for one trajectory table.
///
/// Frames are appended in strictly increasing order. After each append the
/// rows are synced and then the committed row count in the header is advanced
/// and synced, so a reader or a crash never sees a partial frame. Dropping the
/// writer without [`finalize`](Self::finalize) closes the file and leaves an
/// unindexed table behind.
#[derive(Debug)]
pub struct TableWriter {
    path: PathBuf,
    data: File,
    rows: u64,
    last_frame: Option<u32>,
    buf: Vec<u8>,
    finalized: bool,
}

impl TableWriter {
    /// Claim `path` and pre-allocate room for `expected_rows` rows.
    ///
    /// The table directory is created exclusively, so this fails with
    /// [`StorageError::AlreadyExists`] if anything is already at `path`.
    pub fn create(path: &Path, expected_rows: u64) -> Result<Self, StorageError> {
        match fs::create_dir(path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        }

        let mut data = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(data_path(path))?;
        data.write_all(&Header { rows: 0, expected_rows }.encode())?;
        data.set_len(HEADER_LEN + expected_rows * ROW_LEN)?;
        data.sync_all()?;

        TableCreated { path, expected_rows }.log();

        Ok(Self {
            path: path.to_path_buf(),
            data,
            rows: 0,
            last_frame: None,
            buf: Vec::new(),
            finalized: false,
        })
    }

    /// Append one frame's linked points and make them durable.
    pub fn append_frame(&mut self, frame: u32, points: &[LinkedPoint]) -> Result<(), StorageError> {
        if let Some(previous) = self.last_frame {
            if frame <= previous {
                return Err(StorageError::FrameOrder { frame, previous });
            }
        }
        self.last_frame = Some(frame);
        if points.is_empty() {
            return Ok(());
        }

        self.buf.clear();
        for linked in points {
            TrackPoint::from_linked(frame, linked).encode(&mut self.buf);
        }

        self.data
            .seek(SeekFrom::Start(HEADER_LEN + self.rows * ROW_LEN))?;
        self.data.write_all(&self.buf)?;
        self.data.sync_data()?;

        let rows = self.rows + points.len() as u64;
        self.data.seek(SeekFrom::Start(ROW_COUNT_OFFSET))?;
        self.data.write_all(&rows.to_le_bytes())?;
        self.data.sync_data()?;
        self.rows = rows;

        Ok(())
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn last_frame(&self) -> Option<u32> {
        self.last_frame
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drop the unused pre-allocation and build both indices.
    pub fn finalize(mut self) -> Result<IndexSummary, StorageError> {
        self.data.set_len(HEADER_LEN + self.rows * ROW_LEN)?;
        self.data.sync_all()?;

        let (_, rows) = read_committed(&self.path)?;
        let summary = index_table(&self.path, &rows)?;
        self.finalized = true;

        TableFinalized {
            path: &self.path,
            rows: summary.rows,
            frames: summary.frames,
        }
        .log();
        Ok(summary)
    }
}

impl Drop for TableWriter {
    fn drop(&mut self) {
        if !self.finalized {
            TableLeftUnindexed {
                path: &self.path,
                rows: self.rows,
            }
            .log();
        }
    }
}

/// Recreate both indices of an existing table from its committed rows.
///
/// Used to recover a table whose run stopped before finalization. Rows past
/// the committed count are ignored and left in place.
pub fn rebuild_indices<P: AsRef<Path>>(path: P) -> Result<IndexSummary, StorageError> {
    let path = path.as_ref();
    let (_, rows) = read_committed(path)?;
    remove_indices(path)?;
    let summary = index_table(path, &rows)?;

    IndicesRebuilt {
        path,
        rows: summary.rows,
        frames: summary.frames,
        tracks: summary.tracks,
    }
    .log();
    Ok(summary)
}

fn index_table(path: &Path, rows: &[TrackPoint]) -> Result<IndexSummary, StorageError> {
    let (runs, entries) = write_indices(path, rows)?;
    Ok(IndexSummary {
        rows: rows.len() as u64,
        frames: runs.len(),
        tracks: distinct_tracks(&entries),
    })
}

fn distinct_tracks(entries: &[TrackEntry]) -> usize {
    let mut count = 0;
    let mut previous = None;
    for entry in entries {
        if previous != Some(entry.track_id) {
            count += 1;
            previous = Some(entry.track_id);
        }
    }
    count
}
