// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::StatusError;

/// Single-writer JSON status record for one run.
///
/// Fields given at creation are written with every update. Each update is
/// written to `<path>._tmp` and renamed over the record, so readers see either
/// the previous record or the new one, never a partial write.
#[derive(Debug, Clone)]
pub struct StatusFile {
    path: PathBuf,
    persistent: Map<String, Value>,
}

impl StatusFile {
    pub fn new<P, T>(path: P, persistent: &T) -> Result<Self, StatusError>
    where
        P: Into<PathBuf>,
        T: Serialize + ?Sized,
    {
        Ok(Self {
            path: path.into(),
            persistent: to_fields(persistent)?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the record with the persistent fields overlaid by `fields`.
    pub fn update<T: Serialize + ?Sized>(&self, fields: &T) -> Result<(), StatusError> {
        let mut record = self.persistent.clone();
        record.extend(to_fields(fields)?);
        let body = serde_json::to_vec_pretty(&Value::Object(record))?;

        let tmp = self.tmp_path();
        let write_err = |source| StatusError::Write {
            path: self.path.clone(),
            source,
        };
        fs::write(&tmp, body).map_err(write_err)?;

        // Windows refuses to rename over an existing file.
        if cfg!(windows) {
            match fs::remove_file(&self.path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(write_err(e)),
            }
        }

        fs::rename(&tmp, &self.path).map_err(write_err)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push("._tmp");
        PathBuf::from(name)
    }
}

fn to_fields<T: Serialize + ?Sized>(value: &T) -> Result<Map<String, Value>, StatusError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(StatusError::Json(<serde_json::Error as serde::ser::Error>::custom(
            format!("status fields must be a map, got {}", other),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_merges_persistent_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.json");
        let file = StatusFile::new(&path, &json!({"process_id": 42, "state": "initial"})).unwrap();

        file.update(&json!({"state": "working", "most_recent_frame": 3})).unwrap();
        let record: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(record["process_id"], 42);
        assert_eq!(record["state"], "working");
        assert_eq!(record["most_recent_frame"], 3);

        // Later updates start again from the persistent fields only.
        file.update(&json!({"state": "done"})).unwrap();
        let record: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(record["state"], "done");
        assert!(record.get("most_recent_frame").is_none());
        assert!(!file.tmp_path().exists());
    }

    #[test]
    fn test_non_map_fields_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            StatusFile::new(dir.path().join("s.json"), &json!([1, 2])),
            Err(StatusError::Json(_))
        ));
    }

    #[test]
    fn test_unwritable_location() {
        let dir = tempfile::tempdir().unwrap();
        let file = StatusFile::new(dir.path().join("missing/s.json"), &json!({})).unwrap();
        assert!(matches!(file.update(&json!({})), Err(StatusError::Write { .. })));
    }
}
