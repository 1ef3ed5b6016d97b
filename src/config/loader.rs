// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::consts::{
    DEFAULT_PARAMS_FILENAME, DEFAULT_STATUS_FILENAME, DEFAULT_TRACKS_FILENAME,
    DEFAULT_WINDOW_FILENAME,
};
use crate::config::{validate_fleet_config, TrackingParams};
use crate::errors::ConfigError;

/// Configuration for a fleet of tracking jobs.
///
/// Every work unit is a directory holding one movie's frames. Outputs, status
/// records, parameters and windows are located inside that directory using the
/// file names configured here, so units never share a writable location.
///
/// # Fields
/// * `units` - Work unit directories; relative paths are resolved against the config file
/// * `tracks_filename` - Trajectory table name inside each unit
/// * `status_filename` - Status record name inside each unit
/// * `params_filename` - Per-unit tracking parameters, used when `quickparams` is absent
/// * `window_filename` - Per-unit window file
/// * `frames_pattern` - Glob selecting each unit's images, relative to the unit
/// * `quickparams` - Tracking parameters shared by every unit (optional)
/// * `select_frames` - Explicit 1-based frame selection (optional)
/// * `max_concurrency` - Upper bound on simultaneously running jobs (optional)
///
/// # Example
/// ```yaml
/// units:
///   - movies/run01
///   - movies/run02
/// frames_pattern: "*.png"
/// max_concurrency: 4
/// quickparams:
///   featsize: 3
///   threshold: 0.1
///   maxdisp: 4
///   memory: 1
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FleetConfig {
    pub units: Vec<PathBuf>,
    #[serde(default = "default_tracks_filename")]
    pub tracks_filename: String,
    #[serde(default = "default_status_filename")]
    pub status_filename: String,
    #[serde(default = "default_params_filename")]
    pub params_filename: String,
    #[serde(default = "default_window_filename")]
    pub window_filename: String,
    #[serde(default)]
    pub frames_pattern: Option<String>,
    #[serde(default)]
    pub quickparams: Option<TrackingParams>,
    #[serde(default)]
    pub select_frames: Option<Vec<u32>>,
    #[serde(default)]
    pub max_concurrency: Option<usize>,
}

fn default_tracks_filename() -> String {
    DEFAULT_TRACKS_FILENAME.to_string()
}

fn default_status_filename() -> String {
    DEFAULT_STATUS_FILENAME.to_string()
}

fn default_params_filename() -> String {
    DEFAULT_PARAMS_FILENAME.to_string()
}

fn default_window_filename() -> String {
    DEFAULT_WINDOW_FILENAME.to_string()
}

impl FleetConfig {
    /// A fleet over `units` with every other setting at its default.
    pub fn new(units: Vec<PathBuf>) -> Self {
        Self {
            units,
            tracks_filename: default_tracks_filename(),
            status_filename: default_status_filename(),
            params_filename: default_params_filename(),
            window_filename: default_window_filename(),
            frames_pattern: None,
            quickparams: None,
            select_frames: None,
            max_concurrency: None,
        }
    }

    /// Concurrency limit, falling back to the number of available cores.
    pub fn concurrency(&self) -> usize {
        self.max_concurrency
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(4)
            })
            .max(1)
    }

    pub fn output_path(&self, unit: &Path) -> PathBuf {
        unit.join(&self.tracks_filename)
    }

    pub fn status_path(&self, unit: &Path) -> PathBuf {
        unit.join(&self.status_filename)
    }

    pub fn params_path(&self, unit: &Path) -> PathBuf {
        unit.join(&self.params_filename)
    }

    pub fn window_path(&self, unit: &Path) -> PathBuf {
        unit.join(&self.window_filename)
    }

    fn resolve_units(&mut self, base: &Path) {
        for unit in &mut self.units {
            if unit.is_relative() {
                *unit = base.join(&*unit);
            }
        }
    }
}

/// Load a fleet config from a YAML file. Relative unit paths are resolved
/// against the directory containing the file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FleetConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut cfg: FleetConfig =
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    cfg.resolve_units(base);
    Ok(cfg)
}

/// Load a fleet config and reject it unless every validation check passes.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<FleetConfig, ConfigError> {
    let cfg = load_config(path)?;
    validate_fleet_config(&cfg).map_err(ConfigError::Validation)?;
    Ok(cfg)
}

/// Read a per-unit tracking parameters file.
pub fn load_params<P: AsRef<Path>>(path: P) -> Result<TrackingParams, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let params: TrackingParams =
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let errors = params.validate();
    if errors.is_empty() {
        Ok(params)
    } else {
        Err(ConfigError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_config() {
        let yaml = r#"
units:
  - /data/run01
  - /data/run02
frames_pattern: "*.png"
quickparams:
  featsize: 4
  maxdisp: 3
"#;

        let cfg: FleetConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.units.len(), 2);
        assert_eq!(cfg.tracks_filename, "bigtracks.trk");
        assert_eq!(cfg.status_filename, "trackingstatus.json");
        assert_eq!(cfg.quickparams.as_ref().unwrap().featsize, 4);
        assert_eq!(
            cfg.output_path(&cfg.units[0]),
            PathBuf::from("/data/run01/bigtracks.trk")
        );
    }

    #[test]
    fn test_relative_units_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleet.yaml");
        fs::write(&path, "units: [a, /abs/b]\n").unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.units[0], dir.path().join("a"));
        assert_eq!(cfg.units[1], PathBuf::from("/abs/b"));
    }

    #[test]
    fn test_load_and_validate_rejects_empty_fleet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleet.yaml");
        fs::write(&path, "units: []\n").unwrap();

        let err = load_and_validate_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("no work units"));
    }

    #[test]
    fn test_missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_config(dir.path().join("nope.yaml")),
            Err(ConfigError::Read { .. })
        ));

        let path = dir.path().join("bad.yaml");
        fs::write(&path, "units: {not: [a list").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_load_params_validates_ranges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bigtracking.yaml");
        fs::write(&path, "maxdisp: -2\n").unwrap();

        assert!(matches!(load_params(&path), Err(ConfigError::Validation(_))));
    }
}
