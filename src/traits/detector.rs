use crate::config::TrackingParams;
use crate::features::{FrameImage, Point};

/// A named feature-detection strategy.
///
/// Detectors turn one normalized image into candidate points. Shape cutoff,
/// window cropping and merge/dedup are applied afterwards by
/// [`extract_features`](crate::features::extract_features), so a detector only
/// has to find peaks.
pub trait FeatureDetector: Send + Sync {
    fn detect(&self, image: &FrameImage, params: &TrackingParams) -> Result<Vec<Point>, String>;

    fn name(&self) -> &'static str;
}
