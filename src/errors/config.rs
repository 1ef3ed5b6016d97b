// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Problems found while validating a fleet configuration.
///
/// Validation collects every problem instead of stopping at the first one,
/// so these are reported together through [`ConfigError::Validation`].
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The fleet lists no work units
    NoUnits,
    /// Two work units point at the same directory
    DuplicateUnit {
        /// The repeated directory
        location: PathBuf,
    },
    /// A tracking parameter is outside its allowed range
    InvalidParameter {
        /// Parameter name as written in the config file
        name: &'static str,
        /// Why the value was rejected
        reason: String,
    },
    /// The output and status file names collide
    ConflictingFilenames {
        /// The shared file name
        filename: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NoUnits => write!(f, "Fleet configuration lists no work units"),
            ValidationError::DuplicateUnit { location } => {
                write!(f, "Work unit '{}' is listed more than once", location.display())
            }
            ValidationError::InvalidParameter { name, reason } => {
                write!(f, "Invalid tracking parameter '{}': {}", name, reason)
            }
            ValidationError::ConflictingFilenames { filename } => {
                write!(
                    f,
                    "Tracks and status files cannot share the name '{}'",
                    filename
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Configuration errors. All of these are raised before any output is written.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Configuration validation failed:\n{}", join_lines(.0))]
    Validation(Vec<ValidationError>),

    #[error("Unknown detector '{name}'. Available detectors: {}", .available.join(", "))]
    UnknownDetector { name: String, available: Vec<String> },

    #[error("Missing tracking parameters for {0}: no quickparams and no params file")]
    MissingParameters(PathBuf),

    #[error("Invalid frames pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("No image files match '{0}'")]
    NoFrames(String),

    #[error("No frames pattern configured for {0}")]
    MissingFramesPattern(PathBuf),
}

fn join_lines(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
