// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised by the trajectory table.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// Nothing exists at the location: the run never happened.
    #[error("No trajectory table at {0}")]
    NotFound(PathBuf),

    /// Something exists but cannot be read as a table: the run happened and broke.
    #[error("Trajectory table {path} appears to be corrupted: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Trajectory table {0} already exists")]
    AlreadyExists(PathBuf),

    #[error("Frame {0} not found")]
    FrameNotFound(u32),

    #[error("Frame {requested} is outside available data ({first}..={last})")]
    OutOfRange { requested: f64, first: u32, last: u32 },

    #[error("Trajectory table {0} has no rows")]
    EmptyTable(PathBuf),

    #[error("Frames must be appended in increasing order: got {frame} after {previous}")]
    FrameOrder { frame: u32, previous: u32 },

    #[error("Trajectory table I/O error: {0}")]
    Io(#[from] std::io::Error),
}
