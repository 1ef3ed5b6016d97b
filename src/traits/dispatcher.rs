use async_trait::async_trait;

use crate::errors::OrchestratorError;
use crate::orchestrator::{JobHandle, TrackingJob};

/// Runs tracking jobs somewhere: in this process, or on a worker pool.
///
/// Dispatch is fire-and-forget from the orchestrator's point of view; the
/// returned handle is only used to cancel or await the job.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, job: TrackingJob) -> Result<JobHandle, OrchestratorError>;

    fn name(&self) -> &'static str;
}
