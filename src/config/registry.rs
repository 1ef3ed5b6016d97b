// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::ConfigError;
use crate::features::BasicDetector;
use crate::traits::FeatureDetector;

/// Resolves detector names from tracking parameters into strategy objects.
///
/// Built once by the caller and shared read-only by every job, so resolving a
/// name never touches global state.
#[derive(Clone, Default)]
pub struct DetectorRegistry {
    detectors: HashMap<String, Arc<dyn FeatureDetector>>,
}

impl DetectorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in detectors.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(BasicDetector::new()));
        registry
    }

    /// Add a detector under its own name, replacing any detector of that name.
    pub fn register(&mut self, detector: Arc<dyn FeatureDetector>) {
        self.detectors.insert(detector.name().to_string(), detector);
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn FeatureDetector>, ConfigError> {
        self.detectors
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownDetector {
                name: name.to_string(),
                available: self.names(),
            })
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.detectors.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for DetectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorRegistry")
            .field("detectors", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackingParams;
    use crate::features::{FrameImage, Point};

    struct FixedDetector;

    impl FeatureDetector for FixedDetector {
        fn detect(&self, _image: &FrameImage, _params: &TrackingParams) -> Result<Vec<Point>, String> {
            Ok(vec![Point::new(1.0, 2.0, 3.0, 4.0)])
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    #[test]
    fn test_builtins() {
        let registry = DetectorRegistry::with_builtins();
        assert_eq!(registry.names(), vec!["basic"]);
        assert_eq!(registry.resolve("basic").unwrap().name(), "basic");
    }

    #[test]
    fn test_unknown_detector_lists_alternatives() {
        let mut registry = DetectorRegistry::with_builtins();
        registry.register(Arc::new(FixedDetector));

        match registry.resolve("donuts") {
            Err(ConfigError::UnknownDetector { name, available }) => {
                assert_eq!(name, "donuts");
                assert_eq!(available, vec!["basic", "fixed"]);
            }
            other => panic!("expected UnknownDetector, got {:?}", other.map(|d| d.name())),
        }
    }
}
