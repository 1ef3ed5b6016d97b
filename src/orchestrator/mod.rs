// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Fleet orchestration: one tracking pipeline per work unit.
//!
//! The orchestrator prepares a [`TrackingJob`] for a unit, hands it to a
//! [`Dispatcher`] and keeps the returned [`JobHandle`]. It never waits on a
//! job unless asked to ([`FleetOrchestrator::wait`]). Progress is observed
//! only through each unit's status record, via [`FleetOrchestrator::status_board`].
//!
//! Aborting is advisory. An aborted unit's table and status record may be
//! partial; clear them (`clear_output = true`) before resubmitting.

mod board;
mod dispatch;

#[cfg(test)]
mod integration_tests;

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{load_params, load_window, DetectorRegistry, FleetConfig};
use crate::errors::{ConfigError, OrchestratorError, PipelineError};
use crate::observability::messages::orchestrator::{JobAbortRequested, JobSubmitted, OutputCleared};
use crate::observability::messages::StructuredLog;
use crate::pipeline::{PipelineRequest, PipelineSummary};
use crate::traits::Dispatcher;

pub use board::{classify, heartbeat_timeout, render_board, status_board, StatusRow, UnitState, COLUMNS};
pub use dispatch::InProcessDispatcher;

/// One independently schedulable job and the locations it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkUnit {
    pub index: usize,
    pub location: PathBuf,
    pub output: PathBuf,
    pub status: PathBuf,
}

impl WorkUnit {
    /// Every unit listed in `config`, in order.
    pub fn from_config(config: &FleetConfig) -> Vec<WorkUnit> {
        config
            .units
            .iter()
            .enumerate()
            .map(|(index, location)| WorkUnit {
                index,
                location: location.clone(),
                output: config.output_path(location),
                status: config.status_path(location),
            })
            .collect()
    }

    pub fn has_output(&self) -> bool {
        self.output.exists()
    }

    /// Remove the trajectory table and status record left by an earlier run.
    pub fn clear_output(&self) -> Result<(), OrchestratorError> {
        remove_artifact(&self.output)?;
        remove_artifact(&self.status)
    }
}

fn remove_artifact(path: &Path) -> Result<(), OrchestratorError> {
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => Err(e),
    };
    result.map_err(|source| OrchestratorError::ClearOutput {
        path: path.to_path_buf(),
        source,
    })?;
    OutputCleared { path }.log();
    Ok(())
}

/// A fully resolved pipeline run for one unit.
#[derive(Clone)]
pub struct TrackingJob {
    pub unit: WorkUnit,
    pub request: PipelineRequest,
}

impl TrackingJob {
    /// Resolve parameters, detector, images and window for `unit`.
    ///
    /// Reads only; nothing is written, so a configuration error leaves the
    /// unit's directory untouched.
    pub fn prepare(
        config: &FleetConfig,
        unit: &WorkUnit,
        registry: &DetectorRegistry,
    ) -> Result<Self, ConfigError> {
        let params = match &config.quickparams {
            Some(params) => params.clone(),
            None => {
                let path = config.params_path(&unit.location);
                if !path.exists() {
                    return Err(ConfigError::MissingParameters(unit.location.clone()));
                }
                load_params(path)?
            }
        };
        let detector = registry.resolve(&params.detector)?;
        let images = find_images(config, &unit.location)?;
        let window = load_window(config.window_path(&unit.location))?;

        let mut request = PipelineRequest::new(images, &unit.output, params, detector)
            .with_window(window)
            .with_status(&unit.status);
        if let Some(frames) = &config.select_frames {
            request = request.with_selection(frames.clone());
        }

        Ok(Self {
            unit: unit.clone(),
            request,
        })
    }

    /// Run on the calling thread.
    pub fn run(&self, cancel: &CancellationToken) -> Result<PipelineSummary, PipelineError> {
        self.request.run(cancel)
    }
}

/// The unit's images, sorted by path.
fn find_images(config: &FleetConfig, location: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let pattern = config
        .frames_pattern
        .as_ref()
        .ok_or_else(|| ConfigError::MissingFramesPattern(location.to_path_buf()))?;
    let full = location.join(pattern).to_string_lossy().into_owned();

    let mut images: Vec<PathBuf> = glob::glob(&full)
        .map_err(|source| ConfigError::Pattern {
            pattern: full.clone(),
            source,
        })?
        .filter_map(Result::ok)
        .filter(|path| path.is_file())
        .collect();
    if images.is_empty() {
        return Err(ConfigError::NoFrames(full));
    }
    images.sort();
    Ok(images)
}

/// Handle on a dispatched job.
pub struct JobHandle {
    unit: usize,
    token: CancellationToken,
    task: JoinHandle<Result<PipelineSummary, OrchestratorError>>,
}

impl JobHandle {
    pub fn new(
        unit: usize,
        token: CancellationToken,
        task: JoinHandle<Result<PipelineSummary, OrchestratorError>>,
    ) -> Self {
        Self { unit, token, task }
    }

    pub fn unit(&self) -> usize {
        self.unit
    }

    /// Request cancellation. The job stops before its next frame.
    pub fn abort(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn join(self) -> Result<PipelineSummary, OrchestratorError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(OrchestratorError::Join {
                unit: self.unit,
                reason: e.to_string(),
            }),
        }
    }
}

/// Runs and monitors one pipeline per configured work unit.
pub struct FleetOrchestrator {
    config: FleetConfig,
    units: Vec<WorkUnit>,
    registry: Arc<DetectorRegistry>,
    dispatcher: Arc<dyn Dispatcher>,
    handles: HashMap<usize, JobHandle>,
}

impl FleetOrchestrator {
    pub fn new(
        config: FleetConfig,
        registry: Arc<DetectorRegistry>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        let units = WorkUnit::from_config(&config);
        Self {
            config,
            units,
            registry,
            dispatcher,
            handles: HashMap::new(),
        }
    }

    /// Built-in detectors, jobs run on this process's blocking pool.
    pub fn in_process(config: FleetConfig) -> Self {
        let dispatcher = Arc::new(InProcessDispatcher::new(config.concurrency()));
        Self::new(config, Arc::new(DetectorRegistry::with_builtins()), dispatcher)
    }

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    pub fn units(&self) -> &[WorkUnit] {
        &self.units
    }

    pub fn unit(&self, index: usize) -> Result<&WorkUnit, OrchestratorError> {
        self.units
            .get(index)
            .ok_or(OrchestratorError::UnknownUnit(index))
    }

    pub fn prepare(&self, index: usize) -> Result<TrackingJob, OrchestratorError> {
        let unit = self.unit(index)?;
        Ok(TrackingJob::prepare(&self.config, unit, &self.registry)?)
    }

    /// Dispatch unit `index`, optionally clearing its previous artifacts first.
    ///
    /// Returns once the job is handed off. A handle from an earlier submission
    /// of the same unit is replaced; that job keeps running.
    pub async fn submit(&mut self, index: usize, clear_output: bool) -> Result<(), OrchestratorError> {
        let job = self.prepare(index)?;
        if clear_output {
            job.unit.clear_output()?;
        }
        let location = job.unit.location.clone();

        let handle = self.dispatcher.dispatch(job).await?;
        JobSubmitted {
            unit: index,
            location: &location,
            dispatcher: self.dispatcher.name(),
        }
        .log();
        self.handles.insert(index, handle);
        Ok(())
    }

    /// Submit every unit. One unit's failure does not stop the others.
    pub async fn start_all(&mut self, clear_output: bool) -> Vec<Result<(), OrchestratorError>> {
        let mut results = Vec::with_capacity(self.units.len());
        for index in 0..self.units.len() {
            results.push(self.submit(index, clear_output).await);
        }
        results
    }

    /// Request cancellation of a submitted unit.
    pub fn abort(&self, index: usize) -> Result<(), OrchestratorError> {
        let unit = self.unit(index)?;
        let handle = self
            .handles
            .get(&index)
            .ok_or(OrchestratorError::NotSubmitted(index))?;
        JobAbortRequested {
            unit: index,
            location: &unit.location,
        }
        .log();
        handle.abort();
        Ok(())
    }

    /// Cancel every submitted unit.
    pub fn abort_all(&self) {
        for index in self.handles.keys() {
            if let Some(unit) = self.units.get(*index) {
                JobAbortRequested {
                    unit: *index,
                    location: &unit.location,
                }
                .log();
            }
        }
        for handle in self.handles.values() {
            handle.abort();
        }
    }

    /// Run unit `index` to completion on the calling thread, bypassing the dispatcher.
    pub fn run_inline(&self, index: usize, clear_output: bool) -> Result<PipelineSummary, OrchestratorError> {
        let job = self.prepare(index)?;
        if clear_output {
            job.unit.clear_output()?;
        }
        Ok(job.run(&CancellationToken::new())?)
    }

    /// Wait for a submitted unit to finish and forget its handle.
    pub async fn wait(&mut self, index: usize) -> Result<PipelineSummary, OrchestratorError> {
        self.unit(index)?;
        let handle = self
            .handles
            .remove(&index)
            .ok_or(OrchestratorError::NotSubmitted(index))?;
        handle.join().await
    }

    /// Wait for every submitted unit, in unit order.
    pub async fn wait_all(&mut self) -> Vec<(usize, Result<PipelineSummary, OrchestratorError>)> {
        let mut indices: Vec<usize> = self.handles.keys().copied().collect();
        indices.sort_unstable();
        let mut results = Vec::with_capacity(indices.len());
        for index in indices {
            results.push((index, self.wait(index).await));
        }
        results
    }

    /// Whether unit `index` has a dispatched job that has not finished.
    pub fn is_running(&self, index: usize) -> bool {
        self.handles
            .get(&index)
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn status_board(&self) -> Vec<StatusRow> {
        self.status_board_at(SystemTime::now())
    }

    /// The status board as it would read at `now`.
    pub fn status_board_at(&self, now: SystemTime) -> Vec<StatusRow> {
        status_board(&self.units, now)
    }
}
