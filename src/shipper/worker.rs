//! Background worker: accumulate entries from the queue and flush them as batches

use crate::config::ClientConfig;
use crate::shipper::dispatcher::BatchDispatcher;
use crate::shipper::queue::IntakeQueue;
use crate::types::LogEntry;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// When a worker hands its batch to the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    /// Flush as soon as the batch holds this many entries
    pub max_batch_size: usize,
    /// Flush a non-empty batch once this much time has passed since the last flush
    pub flush_interval: Duration,
    /// Longest an idle worker waits on the queue before re-checking
    pub dequeue_timeout: Duration,
}

impl BatchPolicy {
    /// Policy taken from the client configuration
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            max_batch_size: config.batch_size,
            flush_interval: config.flush_interval(),
            dequeue_timeout: config.dequeue_timeout(),
        }
    }
}

/// Lifecycle of a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Consuming entries and flushing on size or interval
    Running,
    /// Stop requested; emptying the queue without waiting
    Draining,
    /// Queue and batch are empty; the task has returned
    Stopped,
}

/// One member of the worker pool
pub struct Worker {
    id: usize,
    queue: Arc<IntakeQueue>,
    dispatcher: Arc<BatchDispatcher>,
    shutdown: CancellationToken,
    policy: BatchPolicy,
    state: WorkerState,
}

impl Worker {
    /// Create a worker that has not started yet
    pub fn new(
        id: usize,
        queue: Arc<IntakeQueue>,
        dispatcher: Arc<BatchDispatcher>,
        shutdown: CancellationToken,
        policy: BatchPolicy,
    ) -> Self {
        Self {
            id,
            queue,
            dispatcher,
            shutdown,
            policy,
            state: WorkerState::Running,
        }
    }

    /// Run until the stop signal has been observed and everything is drained
    pub async fn run(mut self) -> WorkerState {
        debug!(worker = self.id, "Worker started");

        let mut batch: Vec<LogEntry> = Vec::with_capacity(self.policy.max_batch_size);
        let mut last_flush = Instant::now();

        loop {
            if self.state == WorkerState::Running && self.shutdown.is_cancelled() {
                debug!(worker = self.id, pending = batch.len(), "Worker draining");
                self.state = WorkerState::Draining;
            }

            let next = match self.state {
                WorkerState::Running => {
                    // Dropping the dequeue future on stop cannot lose an entry
                    tokio::select! {
                        entry = self.queue.dequeue(self.policy.dequeue_timeout) => entry,
                        _ = self.shutdown.cancelled() => None,
                    }
                }
                _ => self.queue.try_dequeue(),
            };

            if let Some(entry) = next {
                batch.push(entry);
            }

            if self.should_flush(&batch, last_flush) {
                trace!(worker = self.id, entries = batch.len(), "Flushing batch");
                self.dispatcher.dispatch(&batch).await;
                batch.clear();
                last_flush = Instant::now();
            }

            if self.state == WorkerState::Draining && batch.is_empty() && self.queue.is_empty() {
                self.state = WorkerState::Stopped;
                break;
            }
        }

        debug!(worker = self.id, "Worker stopped");
        self.state
    }

    fn should_flush(&self, batch: &[LogEntry], last_flush: Instant) -> bool {
        if batch.is_empty() {
            return false;
        }
        batch.len() >= self.policy.max_batch_size
            || last_flush.elapsed() >= self.policy.flush_interval
            || (self.state == WorkerState::Draining && self.queue.is_empty())
    }
}
