// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Synthetic movies shared by the pipeline and orchestrator tests.

use std::path::{Path, PathBuf};

use ::image::{GrayImage, Luma};

/// Three well-separated blobs in a 64x64 frame.
pub const CENTERS: [(f64, f64); 3] = [(16.0, 16.0), (40.0, 20.0), (24.0, 44.0)];

/// Write `frames` 64x64 PNGs named `frame_NNNN.png`, each with a bright
/// Gaussian blob at every center. Returns the paths in frame order.
pub fn write_movie(dir: &Path, frames: usize, centers: &[(f64, f64)]) -> Vec<PathBuf> {
    let mut img = GrayImage::new(64, 64);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let v: f64 = centers
            .iter()
            .map(|&(cx, cy)| {
                let d2 = (x as f64 - cx).powi(2) + (y as f64 - cy).powi(2);
                200.0 * (-d2 / (2.0 * 1.5 * 1.5)).exp()
            })
            .sum();
        *pixel = Luma([v.min(255.0) as u8]);
    }

    (1..=frames)
        .map(|n| {
            let path = dir.join(format!("frame_{:04}.png", n));
            img.save(&path).unwrap();
            path
        })
        .collect()
}
