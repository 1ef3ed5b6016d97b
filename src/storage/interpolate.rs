// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use crate::errors::StorageError;
use crate::storage::{TrackPoint, TrackTable};

/// A track position at a possibly fractional frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolatedPoint {
    pub frame: f64,
    pub track_id: u32,
    pub x: f64,
    pub y: f64,
    pub intensity: f64,
    pub shape: f64,
}

impl From<TrackPoint> for InterpolatedPoint {
    fn from(row: TrackPoint) -> Self {
        Self {
            frame: row.frame as f64,
            track_id: row.track_id,
            x: row.x as f64,
            y: row.y as f64,
            intensity: row.intensity as f64,
            shape: row.shape as f64,
        }
    }
}

impl TrackTable {
    /// Positions at frame `frame`, which need not be an integer.
    ///
    /// Integer frames return the stored rows (empty if the frame has none).
    /// Otherwise x and y are interpolated linearly between the two bracketing
    /// frames for every track present in both; intensity and shape come from
    /// the earlier frame. Fractional frames outside the stored range fail with
    /// [`StorageError::OutOfRange`].
    pub fn interpolate(&self, frame: f64) -> Result<Vec<InterpolatedPoint>, StorageError> {
        if frame.fract() == 0.0 && frame >= 0.0 && frame <= u32::MAX as f64 {
            return Ok(self
                .get_frame(frame as u32)?
                .into_iter()
                .map(InterpolatedPoint::from)
                .collect());
        }

        let first = self.first_frame()?;
        let last = self.max_frame()?;
        if !(frame > first as f64 && frame < last as f64) {
            return Err(StorageError::OutOfRange {
                requested: frame,
                first,
                last,
            });
        }

        let f0 = frame.floor() as u32;
        let f1 = frame.ceil() as u32;
        let t = frame - f0 as f64;

        let after: HashMap<u32, TrackPoint> = self
            .get_frame(f1)?
            .into_iter()
            .map(|row| (row.track_id, row))
            .collect();

        Ok(self
            .get_frame(f0)?
            .into_iter()
            .filter_map(|p0| {
                let p1 = after.get(&p0.track_id)?;
                let lerp = |a: f32, b: f32| a as f64 + t * (b as f64 - a as f64);
                Some(InterpolatedPoint {
                    frame,
                    track_id: p0.track_id,
                    x: lerp(p0.x, p1.x),
                    y: lerp(p0.y, p1.y),
                    intensity: p0.intensity as f64,
                    shape: p0.shape as f64,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Point;
    use crate::linking::LinkedPoint;
    use crate::storage::TableWriter;

    fn linked(track_id: u32, x: f64, y: f64) -> LinkedPoint {
        LinkedPoint {
            track_id,
            point: Point::new(x, y, 5.0, 1.0),
        }
    }

    fn table(dir: &tempfile::TempDir) -> TrackTable {
        let path = dir.path().join("t.trk");
        let mut writer = TableWriter::create(&path, 0).unwrap();
        writer
            .append_frame(1, &[linked(0, 0.0, 0.0), linked(1, 10.0, 10.0)])
            .unwrap();
        writer
            .append_frame(2, &[linked(0, 2.0, 4.0), linked(2, 50.0, 50.0)])
            .unwrap();
        writer.append_frame(3, &[linked(0, 3.0, 4.0)]).unwrap();
        writer.finalize().unwrap();
        TrackTable::open(&path).unwrap()
    }

    #[test]
    fn test_fractional_frame_interpolates_shared_tracks() {
        let dir = tempfile::tempdir().unwrap();
        let points = table(&dir).interpolate(1.25).unwrap();

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].track_id, 0);
        assert_eq!(points[0].frame, 1.25);
        assert!((points[0].x - 0.5).abs() < 1e-6);
        assert!((points[0].y - 1.0).abs() < 1e-6);
        assert_eq!(points[0].intensity, 5.0);
    }

    #[test]
    fn test_integer_frame_returns_stored_rows() {
        let dir = tempfile::tempdir().unwrap();
        let table = table(&dir);

        let points = table.interpolate(2.0).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].track_id, 2);
        assert!(table.interpolate(7.0).unwrap().is_empty());
    }

    #[test]
    fn test_fractional_frame_outside_data_is_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let table = table(&dir);

        for frame in [0.5, 3.5, -1.5] {
            match table.interpolate(frame) {
                Err(StorageError::OutOfRange { first, last, .. }) => {
                    assert_eq!((first, last), (1, 3));
                }
                other => panic!("expected OutOfRange for {}, got {:?}", frame, other),
            }
        }
    }
}
