// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::StatusError;

/// Lifecycle states a run writes into its status record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Starting,
    Working,
    Finishing,
    Done,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Starting => "starting",
            RunState::Working => "working",
            RunState::Finishing => "finishing",
            RunState::Done => "done",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status record as read back by an observer.
///
/// Every field is optional: records from older runs, other tools, or a run
/// that has only just started may lack any of them. Unknown fields are kept
/// in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub total_frames: Option<u64>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    #[serde(default)]
    pub process_id: Option<u32>,
    #[serde(default)]
    pub started: Option<String>,
    #[serde(default)]
    pub most_recent_frame: Option<u32>,
    #[serde(default)]
    pub most_recent_image: Option<PathBuf>,
    #[serde(default)]
    pub particle_count: Option<u64>,
    #[serde(default)]
    pub seconds_per_frame: Option<f64>,
    #[serde(default)]
    pub elapsed_time: Option<String>,
    #[serde(default)]
    pub time_left: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,

    /// Modification time of the record file; not part of the record itself.
    #[serde(skip)]
    pub modified: Option<SystemTime>,
}

impl StatusSnapshot {
    pub fn run_state(&self) -> Option<RunState> {
        match self.state.as_deref()? {
            "starting" => Some(RunState::Starting),
            "working" => Some(RunState::Working),
            "finishing" => Some(RunState::Finishing),
            "done" => Some(RunState::Done),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.run_state() == Some(RunState::Done)
    }
}

/// Read the status record at `path`. A record that does not exist yet is `Ok(None)`.
pub fn read_status<P: AsRef<Path>>(path: P) -> Result<Option<StatusSnapshot>, StatusError> {
    let path = path.as_ref();
    let read_err = |source| StatusError::Read {
        path: path.to_path_buf(),
        source,
    };

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(read_err(e)),
    };
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok();

    let mut snapshot: StatusSnapshot = serde_json::from_slice(&bytes)?;
    snapshot.modified = modified;
    Ok(Some(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_record_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_status(dir.path().join("status.json")).unwrap(), None);
    }

    #[test]
    fn test_sparse_and_foreign_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        fs::write(&path, r#"{"state": "working", "time_left": null, "host": "node7"}"#).unwrap();

        let snapshot = read_status(&path).unwrap().unwrap();
        assert_eq!(snapshot.run_state(), Some(RunState::Working));
        assert_eq!(snapshot.time_left, None);
        assert_eq!(snapshot.seconds_per_frame, None);
        assert_eq!(snapshot.extra["host"], "node7");
        assert!(snapshot.modified.is_some());
    }

    #[test]
    fn test_unknown_state_is_kept_verbatim() {
        let snapshot: StatusSnapshot = serde_json::from_str(r#"{"state": "paused"}"#).unwrap();
        assert_eq!(snapshot.state.as_deref(), Some("paused"));
        assert_eq!(snapshot.run_state(), None);
        assert!(!snapshot.is_done());
    }

    #[test]
    fn test_malformed_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        fs::write(&path, "{\"state\": ").unwrap();
        assert!(matches!(read_status(&path), Err(StatusError::Json(_))));
    }
}
