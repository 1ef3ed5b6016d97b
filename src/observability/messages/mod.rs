// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! # Organization
//!
//! * `storage` - Table creation, finalization and index recovery
//! * `pipeline` - Run start, per-frame progress, completion and failure
//! * `orchestrator` - Job dispatch, abort, output clearing and liveness
//!
//! # Usage Pattern
//!
//! ```rust
//! use bigtracks::observability::messages::pipeline::FrameLinked;
//!
//! let msg = FrameLinked {
//!     frame: 12,
//!     points: 48,
//!     seconds_per_frame: Some(0.8),
//! };
//!
//! tracing::debug!("{}", msg);
//! ```

pub mod orchestrator;
pub mod pipeline;
pub mod storage;

use tracing::Span;

/// An event that knows its own log level and structured fields.
pub trait StructuredLog {
    /// Emit the event at its level.
    fn log(&self);

    /// A span carrying the same fields, for work that follows the event.
    fn span(&self, name: &str) -> Span;
}
