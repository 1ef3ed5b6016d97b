// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-frame feature extraction.
//!
//! A frame goes through a fixed sequence of steps:
//!
//! ```text
//! image file → FrameImage → detector → shape cutoff → window crop → merge/dedup
//! ```
//!
//! The detector is a named strategy (see [`FeatureDetector`]); everything after
//! it is shared by all detectors.

pub mod basic;
mod frame_image;
mod merge;

use std::path::PathBuf;

pub use frame_image::FrameImage;
pub use basic::BasicDetector;
pub use merge::merge_groups;

use crate::config::{TrackingParams, Window};
use crate::traits::FeatureDetector;

/// One detected feature. Scoped to a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Subpixel column
    pub x: f64,
    /// Subpixel row
    pub y: f64,
    /// Integrated brightness
    pub intensity: f64,
    /// Squared radius of gyration
    pub shape: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, intensity: f64, shape: f64) -> Self {
        Self { x, y, intensity, shape }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// The point set for one frame together with the frame's own metadata.
///
/// This single record travels through the linking engine, so frame numbers
/// and image names never have to be re-aligned by position afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameFeatures {
    /// 1-based frame number
    pub frame: u32,
    /// Source image
    pub image: PathBuf,
    pub points: Vec<Point>,
}

/// Apply the standard cuts, cropping and merging to raw detector output.
pub fn postprocess(points: Vec<Point>, params: &TrackingParams, window: Option<&Window>) -> Vec<Point> {
    let maxrg = params.maxrg();
    let kept: Vec<Point> = points
        .into_iter()
        .filter(|p| p.shape <= maxrg)
        .filter(|p| window.map_or(true, |w| w.contains(p.x, p.y)))
        .collect();

    merge_groups(&kept, params.merge_cutoff)
}

/// Detect features in one image and postprocess them.
pub fn extract_features(
    detector: &dyn FeatureDetector,
    image: &FrameImage,
    params: &TrackingParams,
    window: Option<&Window>,
) -> Result<Vec<Point>, String> {
    let raw = detector.detect(image, params)?;
    Ok(postprocess(raw, params, window))
}
