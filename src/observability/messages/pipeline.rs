// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for link-and-persist runs.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::path::Path;
use tracing::Span;

/// A run passed its preconditions and is about to read frames.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use bigtracks::observability::messages::pipeline::PipelineStarted;
/// use std::path::Path;
///
/// let msg = PipelineStarted {
///     output: Path::new("run01/bigtracks.trk"),
///     frames: 500,
///     detector: "basic",
///     linker: "nearest_neighbor",
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct PipelineStarted<'a> {
    pub output: &'a Path,
    pub frames: usize,
    pub detector: &'a str,
    pub linker: &'a str,
}

impl Display for PipelineStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Tracking {} frames into {} (detector={}, linker={})",
            self.frames,
            self.output.display(),
            self.detector,
            self.linker
        )
    }
}

impl StructuredLog for PipelineStarted<'_> {
    fn log(&self) {
        tracing::info!(
            output = %self.output.display(),
            frames = self.frames,
            detector = self.detector,
            linker = self.linker,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "pipeline",
            span_name = name,
            output = %self.output.display(),
            frames = self.frames,
        )
    }
}

/// One frame was linked and committed.
///
/// # Log Level
/// `debug!` - Per-frame detail
pub struct FrameLinked {
    pub frame: u32,
    pub points: usize,
    pub seconds_per_frame: Option<f64>,
}

impl Display for FrameLinked {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.seconds_per_frame {
            Some(spf) => write!(
                f,
                "Frame {}: {} points ({:.2} s/frame)",
                self.frame, self.points, spf
            ),
            None => write!(f, "Frame {}: {} points", self.frame, self.points),
        }
    }
}

impl StructuredLog for FrameLinked {
    fn log(&self) {
        tracing::debug!(
            frame = self.frame,
            points = self.points,
            seconds_per_frame = ?self.seconds_per_frame,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "frame",
            span_name = name,
            frame = self.frame,
            points = self.points,
        )
    }
}

/// A run finished and its table is query-ready.
///
/// # Log Level
/// `info!` - Important operational event
pub struct PipelineCompleted<'a> {
    pub output: &'a Path,
    pub frames: usize,
    pub rows: u64,
    pub duration: std::time::Duration,
}

impl Display for PipelineCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Finished {}: {} rows from {} frames in {:?}",
            self.output.display(),
            self.rows,
            self.frames,
            self.duration
        )
    }
}

impl StructuredLog for PipelineCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            output = %self.output.display(),
            frames = self.frames,
            rows = self.rows,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "pipeline_completed",
            span_name = name,
            output = %self.output.display(),
            duration = ?self.duration,
        )
    }
}

/// A run stopped with an error.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct PipelineFailed<'a> {
    pub output: &'a Path,
    pub error: &'a dyn std::error::Error,
}

impl Display for PipelineFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Tracking into {} failed: {}", self.output.display(), self.error)
    }
}

impl StructuredLog for PipelineFailed<'_> {
    fn log(&self) {
        tracing::error!(
            output = %self.output.display(),
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "pipeline_failed",
            span_name = name,
            output = %self.output.display(),
            error = %self.error,
        )
    }
}
