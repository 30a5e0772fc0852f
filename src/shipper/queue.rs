//! Bounded intake queue shared by the logging front-end and the workers

use crate::types::LogEntry;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{timeout_at, Instant};

/// Returned by [`IntakeQueue::try_enqueue`] when the queue is at capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFull;

impl fmt::Display for QueueFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "intake queue is full")
    }
}

impl std::error::Error for QueueFull {}

/// Fixed-capacity FIFO of entries awaiting shipment.
///
/// Enqueue never waits: producers run on arbitrary threads and must not be
/// stalled by the shipping pipeline. Consumers wait on a [`Notify`] with a
/// deadline so they can re-check flush and stop conditions while idle.
pub struct IntakeQueue {
    entries: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
    available: Notify,
}

impl IntakeQueue {
    /// Create an empty queue holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
            available: Notify::new(),
        }
    }

    /// Push an entry, dropping it if the queue is full
    pub fn try_enqueue(&self, entry: LogEntry) -> Result<(), QueueFull> {
        {
            let mut entries = self.entries.lock();
            if entries.len() >= self.capacity {
                return Err(QueueFull);
            }
            entries.push_back(entry);
        }
        self.available.notify_one();
        Ok(())
    }

    /// Pop the oldest entry without waiting
    pub fn try_dequeue(&self) -> Option<LogEntry> {
        self.entries.lock().pop_front()
    }

    /// Pop the oldest entry, waiting up to `wait` for one to arrive.
    ///
    /// Cancellation safe: entries are only removed under the lock, never
    /// across an await point.
    pub async fn dequeue(&self, wait: Duration) -> Option<LogEntry> {
        let deadline = Instant::now() + wait;
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            // Register before checking so a push between the check and the
            // await still wakes us.
            notified.as_mut().enable();

            if let Some(entry) = self.try_dequeue() {
                return Some(entry);
            }
            if timeout_at(deadline, notified).await.is_err() {
                return self.try_dequeue();
            }
        }
    }

    /// Number of entries currently queued
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the queue holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Maximum number of entries the queue holds
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl fmt::Debug for IntakeQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntakeQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
