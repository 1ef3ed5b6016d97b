// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Spatial and temporal limits for a tracking run.
//!
//! Window files are written ImageJ-style: coordinates count from 1, and `-1`
//! (or an absent key) means "no limit" / "last frame". [`WindowSpec::interpret`]
//! converts that into a 0-based [`Window`].

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::errors::ConfigError;

/// A window as written in `window.yaml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct WindowSpec {
    pub xmin: Option<f64>,
    pub xmax: Option<f64>,
    pub ymin: Option<f64>,
    pub ymax: Option<f64>,
    pub firstframe: Option<u32>,
    pub lastframe: Option<i64>,
}

/// An interpreted window in 0-based pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub firstframe: u32,
    /// `None` means through the last available frame
    pub lastframe: Option<u32>,
}

impl Default for Window {
    fn default() -> Self {
        WindowSpec::default().interpret()
    }
}

impl WindowSpec {
    /// Fill in missing or special values.
    pub fn interpret(&self) -> Window {
        let upper = |v: Option<f64>| match v {
            Some(v) if v >= 0.0 => v - 1.0,
            _ => f64::INFINITY,
        };

        Window {
            xmin: self.xmin.unwrap_or(1.0) - 1.0,
            xmax: upper(self.xmax),
            ymin: self.ymin.unwrap_or(1.0) - 1.0,
            ymax: upper(self.ymax),
            firstframe: self.firstframe.unwrap_or(1).max(1),
            lastframe: match self.lastframe {
                Some(last) if last > 0 => Some(last as u32),
                _ => None,
            },
        }
    }
}

impl Window {
    /// Strict containment; points on the border are outside.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x > self.xmin && x < self.xmax && y > self.ymin && y < self.ymax
    }

    /// 1-based frame numbers selected by this window out of `image_count` images.
    ///
    /// An explicit `lastframe` is taken as written, even past the last image;
    /// the caller validates the selection against the images it has.
    pub fn frame_selection(&self, image_count: usize) -> Vec<u32> {
        let last = self
            .lastframe
            .unwrap_or_else(|| u32::try_from(image_count).unwrap_or(u32::MAX));
        (self.firstframe..=last).collect()
    }
}

/// Read a window file. A missing file means an unbounded window.
pub fn load_window<P: AsRef<Path>>(path: P) -> Result<Window, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Window::default());
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(Window::default());
    }
    let spec: WindowSpec = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(spec.interpret())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_window_is_unbounded() {
        let window = Window::default();
        assert_eq!(window.xmin, 0.0);
        assert!(window.xmax.is_infinite());
        assert!(window.contains(10.0, 10.0));
        assert!(!window.contains(0.0, 10.0)); // border excluded
        assert_eq!(window.frame_selection(4), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_imagej_coordinates_are_shifted() {
        let spec: WindowSpec = serde_yaml::from_str(
            "xmin: 11\nxmax: 51\nymax: -1\nfirstframe: 3\nlastframe: 5",
        )
        .unwrap();
        let window = spec.interpret();

        assert_eq!(window.xmin, 10.0);
        assert_eq!(window.xmax, 50.0);
        assert!(window.ymax.is_infinite());
        assert!(window.contains(30.0, 1000.0));
        assert!(!window.contains(50.0, 5.0));
        assert_eq!(window.frame_selection(10), vec![3, 4, 5]);
    }

    #[test]
    fn test_explicit_lastframe_is_not_clamped() {
        let window = WindowSpec {
            lastframe: Some(20),
            ..Default::default()
        }
        .interpret();
        assert_eq!(window.frame_selection(3), (1..=20).collect::<Vec<u32>>());

        let open_ended = WindowSpec {
            firstframe: Some(2),
            lastframe: Some(-1),
            ..Default::default()
        }
        .interpret();
        assert_eq!(open_ended.frame_selection(3), vec![2, 3]);
    }

    #[test]
    fn test_missing_window_file() {
        let dir = tempfile::tempdir().unwrap();
        let window = load_window(dir.path().join("window.yaml")).unwrap();
        assert_eq!(window, Window::default());
    }
}
