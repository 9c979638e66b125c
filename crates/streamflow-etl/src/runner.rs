//! Dispatch wrapper that keeps at most one run of a pipeline in flight
//!
//! The pipeline can be run in the foreground, where the caller waits for its
//! turn, or spawned onto the runtime, where a busy pipeline is refused with
//! [`EtlError::AlreadyRunning`] instead of queueing.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, info_span, Instrument};

use crate::error::{EtlError, Result};
use crate::pipeline::{ContentPipeline, PipelineOutput};

#[derive(Clone)]
pub struct PipelineRunner {
    name: String,
    pipeline: Arc<ContentPipeline>,
    lock: Arc<Mutex<()>>,
}

impl PipelineRunner {
    pub fn new(name: impl Into<String>, pipeline: ContentPipeline) -> Self {
        Self {
            name: name.into(),
            pipeline: Arc::new(pipeline),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        self.lock.try_lock().is_err()
    }

    /// Wait for any in-flight run to finish, then run in the foreground
    pub async fn run_now(&self) -> Result<PipelineOutput> {
        let _guard = self.lock.lock().await;
        self.pipeline.run().await
    }

    /// Start a run in the background
    ///
    /// The lock is taken before this returns, so a second `spawn` issued
    /// straight after the first is refused.
    pub fn spawn(&self) -> Result<JoinHandle<Result<PipelineOutput>>> {
        let guard = self
            .lock
            .clone()
            .try_lock_owned()
            .map_err(|_| EtlError::AlreadyRunning(self.name.clone()))?;

        let pipeline = Arc::clone(&self.pipeline);
        let span = info_span!("background_run", pipeline = %self.name);
        info!(pipeline = %self.name, "Dispatching pipeline in background");

        Ok(tokio::spawn(
            async move {
                let _guard = guard;
                pipeline.run().await
            }
            .instrument(span),
        ))
    }
}
