// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Secondary indices over the committed rows of a table.
//!
//! Both index files start with an 8-byte magic and a little-endian `u64`
//! entry count. They are derived data: [`write_indices`] recreates them from
//! the rows alone, and each is written to a temporary name and renamed into
//! place so a reader sees either the old file, the new file, or none.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::errors::StorageError;
use crate::storage::format::{
    frame_index_path, track_index_path, TrackPoint, FRAME_INDEX_MAGIC, TRACK_INDEX_MAGIC,
};

const INDEX_HEADER_LEN: usize = 16;
const FRAME_RUN_LEN: usize = 20;
const TRACK_ENTRY_LEN: usize = 12;

/// A contiguous block of rows belonging to one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRun {
    pub frame: u32,
    pub first_row: u64,
    pub row_count: u64,
}

/// One row of one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TrackEntry {
    pub track_id: u32,
    pub row: u64,
}

/// Group frame-ordered rows into runs.
pub fn frame_runs(rows: &[TrackPoint]) -> Vec<FrameRun> {
    let mut runs: Vec<FrameRun> = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        match runs.last_mut() {
            Some(run) if run.frame == row.frame => run.row_count += 1,
            _ => runs.push(FrameRun {
                frame: row.frame,
                first_row: i as u64,
                row_count: 1,
            }),
        }
    }
    runs
}

/// Row numbers of every track, sorted by track then row.
pub fn track_entries(rows: &[TrackPoint]) -> Vec<TrackEntry> {
    let mut entries: Vec<TrackEntry> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| TrackEntry {
            track_id: row.track_id,
            row: i as u64,
        })
        .collect();
    entries.sort_unstable();
    entries
}

/// Write both indices for `rows` into `table`.
pub fn write_indices(
    table: &Path,
    rows: &[TrackPoint],
) -> Result<(Vec<FrameRun>, Vec<TrackEntry>), StorageError> {
    let runs = frame_runs(rows);
    let entries = track_entries(rows);

    let mut buf = index_header(FRAME_INDEX_MAGIC, runs.len());
    for run in &runs {
        buf.extend_from_slice(&run.frame.to_le_bytes());
        buf.extend_from_slice(&run.first_row.to_le_bytes());
        buf.extend_from_slice(&run.row_count.to_le_bytes());
    }
    write_replacing(&frame_index_path(table), &buf)?;

    let mut buf = index_header(TRACK_INDEX_MAGIC, entries.len());
    for entry in &entries {
        buf.extend_from_slice(&entry.track_id.to_le_bytes());
        buf.extend_from_slice(&entry.row.to_le_bytes());
    }
    write_replacing(&track_index_path(table), &buf)?;

    Ok((runs, entries))
}

/// Remove both indices, marking the table as possibly incomplete.
pub fn remove_indices(table: &Path) -> Result<(), StorageError> {
    for path in [frame_index_path(table), track_index_path(table)] {
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// The frame index, or `None` when the table has not been indexed.
pub fn read_frame_index(table: &Path) -> Result<Option<Vec<FrameRun>>, StorageError> {
    let path = frame_index_path(table);
    let Some(body) = read_index(&path, FRAME_INDEX_MAGIC, FRAME_RUN_LEN)? else {
        return Ok(None);
    };
    Ok(Some(
        body.chunks_exact(FRAME_RUN_LEN)
            .map(|c| FrameRun {
                frame: u32_at(c, 0),
                first_row: u64_at(c, 4),
                row_count: u64_at(c, 12),
            })
            .collect(),
    ))
}

/// The track index, or `None` when the table has not been indexed.
pub fn read_track_index(table: &Path) -> Result<Option<Vec<TrackEntry>>, StorageError> {
    let path = track_index_path(table);
    let Some(body) = read_index(&path, TRACK_INDEX_MAGIC, TRACK_ENTRY_LEN)? else {
        return Ok(None);
    };
    Ok(Some(
        body.chunks_exact(TRACK_ENTRY_LEN)
            .map(|c| TrackEntry {
                track_id: u32_at(c, 0),
                row: u64_at(c, 4),
            })
            .collect(),
    ))
}

fn index_header(magic: &[u8; 8], entries: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(INDEX_HEADER_LEN);
    buf.extend_from_slice(magic);
    buf.extend_from_slice(&(entries as u64).to_le_bytes());
    buf
}

fn read_index(path: &Path, magic: &[u8; 8], entry_len: usize) -> Result<Option<Vec<u8>>, StorageError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let corrupt = |reason: String| StorageError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };

    if bytes.len() < INDEX_HEADER_LEN || &bytes[0..8] != magic {
        return Err(corrupt("bad index header".into()));
    }
    let entries = u64_at(&bytes, 8);
    let body = &bytes[INDEX_HEADER_LEN..];
    let declared = usize::try_from(entries)
        .ok()
        .and_then(|n| n.checked_mul(entry_len));
    if declared != Some(body.len()) {
        return Err(corrupt(format!(
            "index declares {} entries but holds {} bytes",
            entries,
            body.len()
        )));
    }
    Ok(Some(body.to_vec()))
}

fn write_replacing(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    let mut file = File::create(&tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(&tmp, path)?;
    Ok(())
}

fn u32_at(bytes: &[u8], i: usize) -> u32 {
    u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]])
}

fn u64_at(bytes: &[u8], i: usize) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&bytes[i..i + 8]);
    u64::from_le_bytes(b)
}
