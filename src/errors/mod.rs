// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod orchestrator;
mod pipeline;
mod status;
mod storage;

pub use config::{ConfigError, ValidationError};
pub use orchestrator::OrchestratorError;
pub use pipeline::PipelineError;
pub use status::StatusError;
pub use storage::StorageError;
