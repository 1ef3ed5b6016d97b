// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors that end a link-and-persist run.
//!
//! Every variant is fatal to the run that raised it. There is no
//! skip-and-continue: a single bad frame aborts the whole run.

use std::path::PathBuf;

use thiserror::Error;

use super::{ConfigError, StatusError, StorageError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Output {0} already exists")]
    DestinationExists(PathBuf),

    #[error("Selected frame {frame} is out of range: {available} images available (frames count from 1)")]
    FrameSelectionOutOfRange { frame: u32, available: usize },

    #[error("Frame selection must be strictly increasing: {frame} follows {previous}")]
    FrameSelectionOrder { frame: u32, previous: u32 },

    #[error("No frames selected")]
    EmptySelection,

    #[error("Unable to load image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Cannot guess max gray value of {0}; set 'maxgray'")]
    UnknownGrayScale(PathBuf),

    #[error("Feature detection failed in frame {frame}: {reason}")]
    Detection { frame: u32, reason: String },

    #[error("Linking failed in frame {frame}: {reason}")]
    Linking { frame: u32, reason: String },

    #[error("Run aborted before frame {frame}")]
    Aborted { frame: u32 },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Status(#[from] StatusError),
}
