// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Status board: one row per work unit, built from status records.
//!
//! Liveness is inferred here and nowhere else. A unit whose record has not
//! been rewritten for longer than [`heartbeat_timeout`] is shown as `DEAD`;
//! nothing is killed.

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use crate::config::consts::{HEARTBEAT_FRAME_FACTOR, HEARTBEAT_MIN_SECONDS};
use crate::observability::messages::orchestrator::{StatusUnreadable, WorkerPresumedDead};
use crate::observability::messages::StructuredLog;
use crate::orchestrator::WorkUnit;
use crate::status::{format_td, read_status, RunState, StatusSnapshot};

/// Column names, in the order [`StatusRow::cells`] returns them.
pub const COLUMNS: [&str; 10] = [
    "location",
    "process_id",
    "total_frames",
    "most_recent_frame",
    "seconds_per_frame",
    "elapsed_time",
    "time_left",
    "state",
    "has_output",
    "time_since_update",
];

/// What the board believes a unit is doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitState {
    /// Never started, or only a stale record from a cleared run
    Waiting,
    /// As written by the worker
    Reported(RunState),
    /// Missed its heartbeat
    Dead,
    /// Output exists but there is no status record
    Unaccounted,
    /// A state this crate does not write, shown verbatim
    Unrecognized(String),
    /// The record exists but could not be parsed
    Unreadable,
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitState::Waiting => f.write_str("waiting"),
            UnitState::Reported(state) => f.write_str(state.as_str()),
            UnitState::Dead => f.write_str("DEAD"),
            UnitState::Unaccounted => f.write_str("??"),
            UnitState::Unrecognized(state) => f.write_str(state),
            UnitState::Unreadable => f.write_str("unreadable"),
        }
    }
}

/// Seconds without an update after which a running unit is presumed dead.
pub fn heartbeat_timeout(seconds_per_frame: Option<f64>) -> f64 {
    let per_frame = seconds_per_frame.filter(|s| s.is_finite()).unwrap_or(0.0);
    (per_frame * HEARTBEAT_FRAME_FACTOR).max(HEARTBEAT_MIN_SECONDS)
}

/// Classify a unit from its status record, whether its output exists, and
/// how long ago the record was last written.
///
/// A `done` record never goes stale; it only falls back to `waiting` when the
/// output it describes is gone.
pub fn classify(
    record: Option<&StatusSnapshot>,
    has_output: bool,
    since_update: Option<Duration>,
) -> UnitState {
    let Some(record) = record else {
        return if has_output {
            UnitState::Unaccounted
        } else {
            UnitState::Waiting
        };
    };

    if record.is_done() {
        return if has_output {
            UnitState::Reported(RunState::Done)
        } else {
            UnitState::Waiting
        };
    }

    if let Some(since) = since_update {
        if since.as_secs_f64() > heartbeat_timeout(record.seconds_per_frame) {
            return UnitState::Dead;
        }
    }

    match record.run_state() {
        Some(state) => UnitState::Reported(state),
        None => UnitState::Unrecognized(record.state.clone().unwrap_or_default()),
    }
}

/// One line of the status board.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusRow {
    pub location: PathBuf,
    pub process_id: Option<u32>,
    pub total_frames: Option<u64>,
    pub most_recent_frame: Option<u32>,
    pub seconds_per_frame: Option<f64>,
    pub elapsed_time: Option<String>,
    pub time_left: Option<String>,
    pub state: UnitState,
    pub has_output: bool,
    pub time_since_update: Option<Duration>,
}

impl StatusRow {
    fn blank(unit: &WorkUnit, state: UnitState, has_output: bool) -> Self {
        Self {
            location: unit.location.clone(),
            process_id: None,
            total_frames: None,
            most_recent_frame: None,
            seconds_per_frame: None,
            elapsed_time: None,
            time_left: None,
            state,
            has_output,
            time_since_update: None,
        }
    }

    /// Build the row for `unit` as of `now`.
    pub fn read(unit: &WorkUnit, now: SystemTime) -> Self {
        let has_output = unit.has_output();
        let record = match read_status(&unit.status) {
            Ok(record) => record,
            Err(e) => {
                StatusUnreadable {
                    location: &unit.location,
                    error: &e,
                }
                .log();
                return Self::blank(unit, UnitState::Unreadable, has_output);
            }
        };

        let Some(record) = record else {
            return Self::blank(unit, classify(None, has_output, None), has_output);
        };

        // A record written "in the future" (clock skew) counts as fresh.
        let since_update = record
            .modified
            .map(|modified| now.duration_since(modified).unwrap_or_default());
        let state = classify(Some(&record), has_output, since_update);
        if let (UnitState::Dead, Some(since)) = (&state, since_update) {
            WorkerPresumedDead {
                location: &unit.location,
                seconds_since_update: since.as_secs_f64(),
                threshold_seconds: heartbeat_timeout(record.seconds_per_frame),
            }
            .log();
        }

        Self {
            location: unit.location.clone(),
            process_id: record.process_id,
            total_frames: record.total_frames,
            most_recent_frame: record.most_recent_frame,
            seconds_per_frame: record.seconds_per_frame,
            elapsed_time: record.elapsed_time,
            time_left: record.time_left,
            state,
            has_output,
            time_since_update: since_update,
        }
    }

    /// Cell text for each of [`COLUMNS`]; missing data renders blank.
    pub fn cells(&self) -> [String; 10] {
        fn opt<T: ToString>(value: &Option<T>) -> String {
            value.as_ref().map(ToString::to_string).unwrap_or_default()
        }

        [
            self.location.display().to_string(),
            opt(&self.process_id),
            opt(&self.total_frames),
            opt(&self.most_recent_frame),
            self.seconds_per_frame
                .map(|s| format!("{:.2}", s))
                .unwrap_or_default(),
            opt(&self.elapsed_time),
            opt(&self.time_left),
            self.state.to_string(),
            if self.has_output { "yes".to_string() } else { String::new() },
            self.time_since_update.map(format_td).unwrap_or_default(),
        ]
    }
}

/// One row per unit, in unit order. Never fails; unreadable data shows as blanks.
pub fn status_board(units: &[WorkUnit], now: SystemTime) -> Vec<StatusRow> {
    units.iter().map(|unit| StatusRow::read(unit, now)).collect()
}

/// Plain-text table with a header line and left-aligned columns.
pub fn render_board(rows: &[StatusRow]) -> String {
    let cells: Vec<[String; 10]> = rows.iter().map(StatusRow::cells).collect();
    let mut widths = COLUMNS.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |row: &[String]| {
        row.iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let header: Vec<String> = COLUMNS.iter().map(|c| c.to_string()).collect();
    let mut out = line(header.as_slice());
    for row in &cells {
        out.push('\n');
        out.push_str(&line(row.as_slice()));
    }
    out
}
