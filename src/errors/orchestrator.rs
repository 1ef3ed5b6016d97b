// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use thiserror::Error;

use super::{ConfigError, PipelineError};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("No work unit with index {0}")]
    UnknownUnit(usize),

    #[error("Work unit {0} has not been submitted")]
    NotSubmitted(usize),

    #[error("Unable to clear previous output {path}: {source}")]
    ClearOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unit {0} was aborted before it started")]
    Cancelled(usize),

    #[error("Worker for unit {unit} did not finish: {reason}")]
    Join { unit: usize, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
