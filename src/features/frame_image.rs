// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::Path;

use ::image::DynamicImage;

use crate::config::TrackingParams;
use crate::errors::PipelineError;

/// A grayscale image normalized to `[0, 1]`, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameImage {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl FrameImage {
    /// Wrap row-major pixel values. Returns `None` if the sizes disagree.
    pub fn from_raw(width: usize, height: usize, data: Vec<f32>) -> Option<Self> {
        (data.len() == width * height).then_some(Self { width, height, data })
    }

    /// Load an image file and normalize it.
    ///
    /// The maximum gray value comes from `params.maxgray` when set, otherwise it is
    /// guessed from the pixel type. With `params.bright` set the image is
    /// inverted, which turns dark features on a light background into bright ones.
    pub fn load(path: &Path, params: &TrackingParams) -> Result<Self, PipelineError> {
        let decoded = ::image::open(path).map_err(|source| PipelineError::Image {
            path: path.to_path_buf(),
            source,
        })?;

        let (width, height) = (decoded.width() as usize, decoded.height() as usize);
        let (raw, guessed_max): (Vec<f32>, f32) = match &decoded {
            DynamicImage::ImageLuma8(buf) => {
                (buf.as_raw().iter().map(|&v| v as f32).collect(), u8::MAX as f32)
            }
            DynamicImage::ImageLuma16(buf) => {
                (buf.as_raw().iter().map(|&v| v as f32).collect(), u16::MAX as f32)
            }
            DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
                (decoded.to_luma32f().into_raw(), 1.0)
            }
            DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageRgb8(_)
            | DynamicImage::ImageRgba8(_)
            | DynamicImage::ImageLumaA16(_)
            | DynamicImage::ImageRgb16(_)
            | DynamicImage::ImageRgba16(_) => (
                decoded.to_luma16().as_raw().iter().map(|&v| v as f32).collect(),
                u16::MAX as f32,
            ),
            _ => return Err(PipelineError::UnknownGrayScale(path.to_path_buf())),
        };

        let maxgray = params.maxgray.map(|m| m as f32).unwrap_or(guessed_max);
        let mut image = Self {
            width,
            height,
            data: raw.into_iter().map(|v| v / maxgray).collect(),
        };
        if params.bright {
            image.invert();
        }
        Ok(image)
    }

    /// Replace every value `v` with `1 - v`.
    pub fn invert(&mut self) {
        for v in &mut self.data {
            *v = 1.0 - *v;
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixel at column `x`, row `y`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    pub fn pixels(&self) -> &[f32] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{GrayImage, Luma};

    #[test]
    fn test_load_normalizes_without_inverting_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let mut img = GrayImage::from_pixel(4, 3, Luma([0u8]));
        img.put_pixel(1, 2, Luma([255u8]));
        img.save(&path).unwrap();

        let params = TrackingParams::with_search_range(1.0);
        let frame = FrameImage::load(&path, &params).unwrap();

        assert_eq!((frame.width(), frame.height()), (4, 3));
        assert_eq!(frame.get(1, 2), 1.0);
        assert_eq!(frame.get(0, 0), 0.0);
    }

    #[test]
    fn test_bright_flag_inverts_dark_features() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let mut img = GrayImage::from_pixel(4, 3, Luma([255u8]));
        img.put_pixel(1, 2, Luma([0u8]));
        img.save(&path).unwrap();

        let mut params = TrackingParams::with_search_range(1.0);
        params.bright = true;
        let frame = FrameImage::load(&path, &params).unwrap();

        assert_eq!(frame.get(1, 2), 1.0);
        assert_eq!(frame.get(0, 0), 0.0);
    }

    #[test]
    fn test_load_respects_maxgray() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        GrayImage::from_pixel(2, 2, Luma([100u8])).save(&path).unwrap();

        let mut params = TrackingParams::with_search_range(1.0);
        params.maxgray = Some(200.0);
        let frame = FrameImage::load(&path, &params).unwrap();

        assert!((frame.get(1, 1) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_missing_image_is_an_error() {
        let params = TrackingParams::with_search_range(1.0);
        let err = FrameImage::load(Path::new("/nonexistent/frame.png"), &params).unwrap_err();
        assert!(matches!(err, PipelineError::Image { .. }));
    }

    #[test]
    fn test_from_raw_checks_size() {
        assert!(FrameImage::from_raw(2, 2, vec![0.0; 3]).is_none());
        assert!(FrameImage::from_raw(2, 2, vec![0.0; 4]).is_some());
    }
}
