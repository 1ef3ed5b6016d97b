// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::collections::HashMap;

use crate::config::consts::DEFAULT_DETECTOR;
use crate::errors::ValidationError;

/// Parameters for one tracking run: feature detection plus linking.
///
/// # Fields
/// * `detector` - Name of the feature detector, resolved through the [`DetectorRegistry`](crate::config::DetectorRegistry)
/// * `featsize` - Expected feature radius in pixels
/// * `bphigh` - Smoothing scale, in pixels, applied before peak finding
/// * `bplow` - Background half-width in pixels (defaults to `featsize`)
/// * `threshold` - Minimum band-passed intensity for a peak
/// * `maxrg` - Cutoff on the shape diagnostic (squared radius of gyration)
/// * `merge_cutoff` - Features closer than this are merged; `<= 0` disables merging
/// * `bright` - Invert each image before detection (set for dark features on a light background)
/// * `maxgray` - Maximum gray value of the images; guessed from the pixel type when absent
/// * `search_range` - Linking search radius (`maxdisp` is accepted as an alias)
/// * `memory` - Frames a track may go undetected before it is abandoned
/// * `options` - Free-form values for custom detectors
///
/// # Example
/// ```yaml
/// detector: basic
/// featsize: 3
/// bphigh: 0.7
/// threshold: 0.1
/// merge_cutoff: 2.0
/// maxdisp: 4.0
/// memory: 2
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TrackingParams {
    #[serde(default = "default_detector")]
    pub detector: String,
    #[serde(default = "default_featsize")]
    pub featsize: u32,
    #[serde(default = "default_bphigh")]
    pub bphigh: f64,
    #[serde(default)]
    pub bplow: Option<u32>,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub maxrg: Option<f64>,
    #[serde(default = "default_merge_cutoff")]
    pub merge_cutoff: f64,
    #[serde(default)]
    pub bright: bool,
    #[serde(default)]
    pub maxgray: Option<f64>,
    #[serde(alias = "maxdisp")]
    pub search_range: f64,
    #[serde(default)]
    pub memory: u32,
    #[serde(default)]
    pub options: HashMap<String, serde_yaml::Value>,
}

fn default_detector() -> String {
    DEFAULT_DETECTOR.to_string()
}

fn default_featsize() -> u32 {
    3
}

fn default_bphigh() -> f64 {
    0.7
}

fn default_threshold() -> f64 {
    1e-15
}

fn default_merge_cutoff() -> f64 {
    -1.0
}

impl TrackingParams {
    /// Parameters with every optional field at its default.
    pub fn with_search_range(search_range: f64) -> Self {
        Self {
            detector: default_detector(),
            featsize: default_featsize(),
            bphigh: default_bphigh(),
            bplow: None,
            threshold: default_threshold(),
            maxrg: None,
            merge_cutoff: default_merge_cutoff(),
            bright: false,
            maxgray: None,
            search_range,
            memory: 0,
            options: HashMap::new(),
        }
    }

    /// Background half-width, falling back to the feature size.
    pub fn bplow(&self) -> u32 {
        self.bplow.unwrap_or(self.featsize)
    }

    /// Shape cutoff; unbounded when not configured.
    pub fn maxrg(&self) -> f64 {
        self.maxrg.unwrap_or(f64::INFINITY)
    }

    /// Check ranges that serde cannot express.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !(self.search_range.is_finite() && self.search_range > 0.0) {
            errors.push(ValidationError::InvalidParameter {
                name: "search_range",
                reason: format!("must be a positive number, got {}", self.search_range),
            });
        }
        if self.featsize == 0 {
            errors.push(ValidationError::InvalidParameter {
                name: "featsize",
                reason: "must be at least 1".into(),
            });
        }
        if !(self.bphigh > 0.0) {
            errors.push(ValidationError::InvalidParameter {
                name: "bphigh",
                reason: format!("must be positive, got {}", self.bphigh),
            });
        }
        if let Some(maxgray) = self.maxgray {
            if !(maxgray > 0.0) {
                errors.push(ValidationError::InvalidParameter {
                    name: "maxgray",
                    reason: format!("must be positive, got {}", maxgray),
                });
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_maxdisp_alias() {
        let params: TrackingParams = serde_yaml::from_str("maxdisp: 3.5").unwrap();

        assert_eq!(params.search_range, 3.5);
        assert_eq!(params.detector, "basic");
        assert_eq!(params.featsize, 3);
        assert_eq!(params.bplow(), 3);
        assert_eq!(params.memory, 0);
        assert!(params.maxrg().is_infinite());
        assert!(params.merge_cutoff <= 0.0);
        assert!(params.validate().is_empty());
    }

    #[test]
    fn test_missing_search_range_is_rejected() {
        let result: Result<TrackingParams, _> = serde_yaml::from_str("featsize: 4");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let mut params = TrackingParams::with_search_range(0.0);
        params.featsize = 0;

        let errors = params.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].to_string().contains("search_range"));
        assert!(errors[1].to_string().contains("featsize"));
    }

    #[test]
    fn test_custom_detector_options() {
        let yaml = r#"
detector: donuts
search_range: 5
options:
  lg_radius: 6.5
  lg_weight: 0.3
"#;
        let params: TrackingParams = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(params.detector, "donuts");
        assert_eq!(params.options.len(), 2);
        assert!(params.options.contains_key("lg_radius"));
    }
}
