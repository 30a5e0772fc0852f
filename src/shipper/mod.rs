//! Background shipping pipeline: intake queue, worker pool and batch dispatch

pub mod dispatcher;
pub mod queue;
pub mod stats;
pub mod transport;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

pub use dispatcher::{BatchDispatcher, DispatchOutcome, RetryPolicy};
pub use queue::{IntakeQueue, QueueFull};
pub use stats::{ShipperStats, StatsSnapshot};
pub use transport::{BatchRequest, HttpTransport, Transport};
pub use worker::{BatchPolicy, Worker, WorkerState};

/// Result of stopping the pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Workers that drained and returned within the join timeout
    pub stopped: usize,
    /// Workers left running (or that panicked); their batches may be lost
    pub abandoned: usize,
}

/// Fixed set of workers sharing one queue and one stop signal
pub struct WorkerPool {
    shutdown: CancellationToken,
    handles: Mutex<Vec<JoinHandle<WorkerState>>>,
    join_timeout: Duration,
}

impl WorkerPool {
    /// Spawn `count` workers on `runtime`
    pub fn spawn(
        runtime: &Handle,
        count: usize,
        queue: Arc<IntakeQueue>,
        dispatcher: Arc<BatchDispatcher>,
        policy: BatchPolicy,
        join_timeout: Duration,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let handles = (0..count)
            .map(|id| {
                let worker = Worker::new(
                    id,
                    Arc::clone(&queue),
                    Arc::clone(&dispatcher),
                    shutdown.clone(),
                    policy,
                );
                runtime.spawn(worker.run())
            })
            .collect();

        debug!(workers = count, "Worker pool started");

        Self {
            shutdown,
            handles: Mutex::new(handles),
            join_timeout,
        }
    }

    /// Raise the stop signal without waiting
    pub fn signal_stop(&self) {
        self.shutdown.cancel();
    }

    /// Raise the stop signal and wait for each worker to drain.
    ///
    /// Each worker gets its own join timeout. Only the first call waits on
    /// the workers; later calls return an empty report.
    pub async fn shutdown(&self) -> ShutdownReport {
        self.signal_stop();

        let handles = std::mem::take(&mut *self.handles.lock());
        let mut report = ShutdownReport::default();

        for (id, mut handle) in handles.into_iter().enumerate() {
            match tokio::time::timeout(self.join_timeout, &mut handle).await {
                Ok(Ok(_)) => report.stopped += 1,
                Ok(Err(e)) => {
                    error!(worker = id, "Worker terminated abnormally: {}", e);
                    report.abandoned += 1;
                }
                Err(_) => {
                    warn!(
                        worker = id,
                        timeout_ms = self.join_timeout.as_millis() as u64,
                        "Worker did not drain in time, abandoning it"
                    );
                    report.abandoned += 1;
                }
            }
        }

        debug!(stopped = report.stopped, abandoned = report.abandoned, "Worker pool shut down");
        report
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Detached workers still drain what is queued
        self.shutdown.cancel();
    }
}
