// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in band-pass / subpixel-centroid detector.
//!
//! 1. Band-pass: Gaussian smoothing at `bphigh` minus a boxcar background of
//!    half-width `bplow`, clipped at zero.
//! 2. Peaks: pixels above `threshold` that are the maximum within `featsize`,
//!    at least `featsize` away from the image border.
//! 3. Refinement: intensity-weighted centroid over a disk of radius `featsize`,
//!    which also yields the integrated intensity and squared radius of gyration.

use crate::config::TrackingParams;
use crate::features::{FrameImage, Point};
use crate::traits::FeatureDetector;

/// The default detector, registered as `basic`.
#[derive(Debug, Default)]
pub struct BasicDetector;

impl BasicDetector {
    pub fn new() -> Self {
        Self
    }
}

impl FeatureDetector for BasicDetector {
    fn detect(&self, image: &FrameImage, params: &TrackingParams) -> Result<Vec<Point>, String> {
        let featsize = params.featsize as usize;
        if image.width() <= 2 * featsize || image.height() <= 2 * featsize {
            return Err(format!(
                "image of {}x{} pixels is too small for featsize {}",
                image.width(),
                image.height(),
                featsize
            ));
        }

        let filtered = band_pass(image, params.bplow() as usize, params.bphigh);
        let peaks = local_maxima(&filtered, featsize, params.threshold as f32);

        Ok(peaks
            .into_iter()
            .filter_map(|(x, y)| centroid(&filtered, x, y, featsize))
            .collect())
    }

    fn name(&self) -> &'static str {
        "basic"
    }
}

/// Edge-clamped separable convolution along rows then columns.
fn convolve_separable(image: &FrameImage, kernel: &[f32]) -> FrameImage {
    let (w, h) = (image.width(), image.height());
    let r = (kernel.len() / 2) as isize;
    let clamp = |v: isize, n: usize| v.clamp(0, n as isize - 1) as usize;

    let mut rows = vec![0.0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            rows[y * w + x] = kernel
                .iter()
                .enumerate()
                .map(|(k, &c)| c * image.get(clamp(x as isize + k as isize - r, w), y))
                .sum();
        }
    }

    let mut out = vec![0.0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            out[y * w + x] = kernel
                .iter()
                .enumerate()
                .map(|(k, &c)| c * rows[clamp(y as isize + k as isize - r, h) * w + x])
                .sum();
        }
    }

    FrameImage::from_raw(w, h, out).unwrap_or_else(|| image.clone())
}

fn gaussian_kernel(sigma: f64) -> Vec<f32> {
    let radius = (3.0 * sigma).ceil().max(1.0) as isize;
    let raw: Vec<f64> = (-radius..=radius)
        .map(|i| (-(i * i) as f64 / (2.0 * sigma * sigma)).exp())
        .collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|v| (v / total) as f32).collect()
}

fn band_pass(image: &FrameImage, bplow: usize, bphigh: f64) -> FrameImage {
    let smoothed = convolve_separable(image, &gaussian_kernel(bphigh));
    let width = 2 * bplow + 1;
    let background = convolve_separable(image, &vec![1.0 / width as f32; width]);

    let data = smoothed
        .pixels()
        .iter()
        .zip(background.pixels())
        .map(|(s, b)| (s - b).max(0.0))
        .collect();
    FrameImage::from_raw(image.width(), image.height(), data).unwrap_or_else(|| image.clone())
}

/// Pixels that dominate a disk of radius `featsize`. Plateaus keep their first pixel in raster order.
fn local_maxima(image: &FrameImage, featsize: usize, threshold: f32) -> Vec<(usize, usize)> {
    let (w, h) = (image.width(), image.height());
    let r = featsize as isize;
    let mut peaks = Vec::new();

    for y in featsize..h - featsize {
        for x in featsize..w - featsize {
            let v = image.get(x, y);
            if v <= threshold {
                continue;
            }
            let mut is_peak = true;
            'disk: for dy in -r..=r {
                for dx in -r..=r {
                    if (dx == 0 && dy == 0) || dx * dx + dy * dy > r * r {
                        continue;
                    }
                    let (nx, ny) = (x as isize + dx, y as isize + dy);
                    if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                        continue;
                    }
                    let n = image.get(nx as usize, ny as usize);
                    let earlier = (dy, dx) < (0, 0);
                    if n > v || (n == v && earlier) {
                        is_peak = false;
                        break 'disk;
                    }
                }
            }
            if is_peak {
                peaks.push((x, y));
            }
        }
    }

    peaks
}

fn centroid(image: &FrameImage, x0: usize, y0: usize, featsize: usize) -> Option<Point> {
    let r = featsize as isize;
    let (mut mass, mut mx, mut my, mut m2) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);

    for dy in -r..=r {
        for dx in -r..=r {
            let d2 = dx * dx + dy * dy;
            if d2 > r * r {
                continue;
            }
            let v = image.get((x0 as isize + dx) as usize, (y0 as isize + dy) as usize) as f64;
            mass += v;
            mx += v * dx as f64;
            my += v * dy as f64;
            m2 += v * d2 as f64;
        }
    }

    (mass > 0.0).then(|| Point {
        x: x0 as f64 + mx / mass,
        y: y0 as f64 + my / mass,
        intensity: mass,
        shape: m2 / mass,
    })
}
