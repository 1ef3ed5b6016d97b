// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for trajectory table lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Table creation and pre-allocation
//! * Finalization and index building
//! * Tables abandoned before finalization
//! * Index recovery and unindexed reads

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::path::Path;
use tracing::Span;

/// A new table directory was claimed and pre-allocated.
///
/// # Log Level
/// `info!` - Important operational event
pub struct TableCreated<'a> {
    pub path: &'a Path,
    pub expected_rows: u64,
}

impl Display for TableCreated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Created trajectory table {} with room for {} rows",
            self.path.display(),
            self.expected_rows
        )
    }
}

impl StructuredLog for TableCreated<'_> {
    fn log(&self) {
        tracing::info!(
            path = %self.path.display(),
            expected_rows = self.expected_rows,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "table_created",
            span_name = name,
            path = %self.path.display(),
            expected_rows = self.expected_rows,
        )
    }
}

/// A table was truncated to its committed rows and indexed.
///
/// # Log Level
/// `info!` - Important operational event
pub struct TableFinalized<'a> {
    pub path: &'a Path,
    pub rows: u64,
    pub frames: usize,
}

impl Display for TableFinalized<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Finalized trajectory table {}: {} rows in {} frames",
            self.path.display(),
            self.rows,
            self.frames
        )
    }
}

impl StructuredLog for TableFinalized<'_> {
    fn log(&self) {
        tracing::info!(
            path = %self.path.display(),
            rows = self.rows,
            frames = self.frames,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "table_finalized",
            span_name = name,
            path = %self.path.display(),
            rows = self.rows,
        )
    }
}

/// A writer was dropped without finalizing. The table stays on disk without indices.
///
/// # Log Level
/// `warn!` - The table must be treated as possibly incomplete
pub struct TableLeftUnindexed<'a> {
    pub path: &'a Path,
    pub rows: u64,
}

impl Display for TableLeftUnindexed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Trajectory table {} left unindexed with {} committed rows; run `reindex` to recover it",
            self.path.display(),
            self.rows
        )
    }
}

impl StructuredLog for TableLeftUnindexed<'_> {
    fn log(&self) {
        tracing::warn!(
            path = %self.path.display(),
            rows = self.rows,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "table_left_unindexed",
            span_name = name,
            path = %self.path.display(),
            rows = self.rows,
        )
    }
}

/// Indices were rebuilt from the committed rows of an existing table.
///
/// # Log Level
/// `info!` - Important operational event
pub struct IndicesRebuilt<'a> {
    pub path: &'a Path,
    pub rows: u64,
    pub frames: usize,
    pub tracks: usize,
}

impl Display for IndicesRebuilt<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Rebuilt indices for {}: {} rows, {} frames, {} tracks",
            self.path.display(),
            self.rows,
            self.frames,
            self.tracks
        )
    }
}

impl StructuredLog for IndicesRebuilt<'_> {
    fn log(&self) {
        tracing::info!(
            path = %self.path.display(),
            rows = self.rows,
            frames = self.frames,
            tracks = self.tracks,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "indices_rebuilt",
            span_name = name,
            path = %self.path.display(),
        )
    }
}

/// A reader opened a table that has no indices and will scan committed rows.
///
/// # Log Level
/// `debug!` - Expected while a run is still in progress
pub struct ScanningUnindexedTable<'a> {
    pub path: &'a Path,
    pub rows: u64,
}

impl Display for ScanningUnindexedTable<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Trajectory table {} has no indices; scanning {} committed rows",
            self.path.display(),
            self.rows
        )
    }
}

impl StructuredLog for ScanningUnindexedTable<'_> {
    fn log(&self) {
        tracing::debug!(
            path = %self.path.display(),
            rows = self.rows,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "scanning_unindexed_table",
            span_name = name,
            path = %self.path.display(),
        )
    }
}
