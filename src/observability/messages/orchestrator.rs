// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for fleet orchestration events.
//!
//! This module contains message types for logging events related to:
//! * Job dispatch and completion
//! * Advisory aborts
//! * Clearing output left by earlier runs
//! * Workers presumed dead by the heartbeat check
//! * Status records that cannot be read

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::path::Path;
use tracing::Span;

/// A job was handed to a dispatcher.
///
/// # Log Level
/// `info!` - Important operational event
pub struct JobSubmitted<'a> {
    pub unit: usize,
    pub location: &'a Path,
    pub dispatcher: &'a str,
}

impl Display for JobSubmitted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Submitted unit {} ({}) to {} dispatcher",
            self.unit,
            self.location.display(),
            self.dispatcher
        )
    }
}

impl StructuredLog for JobSubmitted<'_> {
    fn log(&self) {
        tracing::info!(
            unit = self.unit,
            location = %self.location.display(),
            dispatcher = self.dispatcher,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "job",
            span_name = name,
            unit = self.unit,
            location = %self.location.display(),
        )
    }
}

/// A job finished, successfully or not.
///
/// # Log Level
/// `info!` on success, `error!` on failure
pub struct JobFinished<'a> {
    pub unit: usize,
    pub location: &'a Path,
    pub error: Option<&'a dyn std::error::Error>,
}

impl Display for JobFinished<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.error {
            None => write!(f, "Unit {} ({}) finished", self.unit, self.location.display()),
            Some(e) => write!(
                f,
                "Unit {} ({}) failed: {}",
                self.unit,
                self.location.display(),
                e
            ),
        }
    }
}

impl StructuredLog for JobFinished<'_> {
    fn log(&self) {
        match self.error {
            None => tracing::info!(
                unit = self.unit,
                location = %self.location.display(),
                "{}", self
            ),
            Some(e) => tracing::error!(
                unit = self.unit,
                location = %self.location.display(),
                error = %e,
                "{}", self
            ),
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "job_finished",
            span_name = name,
            unit = self.unit,
            failed = self.error.is_some(),
        )
    }
}

/// Cancellation was requested for a job.
///
/// # Log Level
/// `warn!` - The unit's artifacts must be treated as possibly partial
pub struct JobAbortRequested<'a> {
    pub unit: usize,
    pub location: &'a Path,
}

impl Display for JobAbortRequested<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Abort requested for unit {} ({})",
            self.unit,
            self.location.display()
        )
    }
}

impl StructuredLog for JobAbortRequested<'_> {
    fn log(&self) {
        tracing::warn!(
            unit = self.unit,
            location = %self.location.display(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "job_abort",
            span_name = name,
            unit = self.unit,
        )
    }
}

/// An artifact from a previous run was removed before resubmission.
///
/// # Log Level
/// `info!` - Important operational event
pub struct OutputCleared<'a> {
    pub path: &'a Path,
}

impl Display for OutputCleared<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Removed previous output {}", self.path.display())
    }
}

impl StructuredLog for OutputCleared<'_> {
    fn log(&self) {
        tracing::info!(path = %self.path.display(), "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("output_cleared", span_name = name, path = %self.path.display())
    }
}

/// A unit's status record has gone stale.
///
/// # Log Level
/// `warn!` - Advisory; nothing is killed
pub struct WorkerPresumedDead<'a> {
    pub location: &'a Path,
    pub seconds_since_update: f64,
    pub threshold_seconds: f64,
}

impl Display for WorkerPresumedDead<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "No status update from {} for {:.0} s (limit {:.0} s); presumed dead",
            self.location.display(),
            self.seconds_since_update,
            self.threshold_seconds
        )
    }
}

impl StructuredLog for WorkerPresumedDead<'_> {
    fn log(&self) {
        tracing::warn!(
            location = %self.location.display(),
            seconds_since_update = self.seconds_since_update,
            threshold_seconds = self.threshold_seconds,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "worker_presumed_dead",
            span_name = name,
            location = %self.location.display(),
        )
    }
}

/// A unit's status record exists but could not be read.
///
/// # Log Level
/// `warn!` - The unit's row is shown with placeholders
pub struct StatusUnreadable<'a> {
    pub location: &'a Path,
    pub error: &'a dyn std::error::Error,
}

impl Display for StatusUnreadable<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Unable to read status record for {}: {}",
            self.location.display(),
            self.error
        )
    }
}

impl StructuredLog for StatusUnreadable<'_> {
    fn log(&self) {
        tracing::warn!(
            location = %self.location.display(),
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "status_unreadable",
            span_name = name,
            location = %self.location.display(),
        )
    }
}
