// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::errors::OrchestratorError;
use crate::observability::messages::orchestrator::JobFinished;
use crate::observability::messages::StructuredLog;
use crate::orchestrator::{JobHandle, TrackingJob};
use crate::pipeline::PipelineSummary;
use crate::traits::Dispatcher;

/// Runs jobs on the tokio blocking pool of the current process.
///
/// At most `max_concurrency` pipelines run at once; further jobs wait for a
/// permit. A job cancelled while waiting never starts.
#[derive(Debug, Clone)]
pub struct InProcessDispatcher {
    semaphore: Arc<Semaphore>,
    max_concurrency: usize,
}

impl InProcessDispatcher {
    pub fn new(max_concurrency: usize) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }
}

#[async_trait]
impl Dispatcher for InProcessDispatcher {
    async fn dispatch(&self, job: TrackingJob) -> Result<JobHandle, OrchestratorError> {
        let unit = job.unit.index;
        let token = CancellationToken::new();
        let semaphore = self.semaphore.clone();
        let cancel = token.clone();

        let task = tokio::spawn(async move {
            let location = job.unit.location.clone();
            let result = run_job(job, semaphore, cancel).await;
            JobFinished {
                unit,
                location: &location,
                error: result.as_ref().err().map(|e| e as &dyn std::error::Error),
            }
            .log();
            result
        });

        Ok(JobHandle::new(unit, token, task))
    }

    fn name(&self) -> &'static str {
        "in_process"
    }
}

async fn run_job(
    job: TrackingJob,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
) -> Result<PipelineSummary, OrchestratorError> {
    let unit = job.unit.index;
    let _permit = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(OrchestratorError::Cancelled(unit)),
        permit = semaphore.acquire_owned() => permit.map_err(|e| OrchestratorError::Join {
            unit,
            reason: e.to_string(),
        })?,
    };

    let result = tokio::task::spawn_blocking(move || job.run(&cancel))
        .await
        .map_err(|e| OrchestratorError::Join {
            unit,
            reason: e.to_string(),
        })?;
    Ok(result?)
}
