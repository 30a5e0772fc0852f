//! Delivery counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by the front-end and the workers
#[derive(Debug, Default)]
pub struct ShipperStats {
    enqueued: AtomicU64,
    dropped: AtomicU64,
    delivered_entries: AtomicU64,
    delivered_batches: AtomicU64,
    rejected_batches: AtomicU64,
    exhausted_batches: AtomicU64,
    lost_entries: AtomicU64,
    retries: AtomicU64,
}

/// Point-in-time copy of [`ShipperStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Entries accepted by the intake queue
    pub enqueued: u64,
    /// Entries dropped because the queue was full
    pub dropped: u64,
    /// Entries acknowledged by the endpoint
    pub delivered_entries: u64,
    /// Batches acknowledged by the endpoint
    pub delivered_batches: u64,
    /// Batches refused with a 4xx status
    pub rejected_batches: u64,
    /// Batches given up on after the last attempt
    pub exhausted_batches: u64,
    /// Entries discarded with rejected or exhausted batches
    pub lost_entries: u64,
    /// Attempts beyond the first
    pub retries: u64,
}

impl ShipperStats {
    pub(crate) fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivered(&self, entries: usize) {
        self.delivered_batches.fetch_add(1, Ordering::Relaxed);
        self.delivered_entries.fetch_add(entries as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self, entries: usize) {
        self.rejected_batches.fetch_add(1, Ordering::Relaxed);
        self.lost_entries.fetch_add(entries as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_exhausted(&self, entries: usize) {
        self.exhausted_batches.fetch_add(1, Ordering::Relaxed);
        self.lost_entries.fetch_add(entries as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            delivered_entries: self.delivered_entries.load(Ordering::Relaxed),
            delivered_batches: self.delivered_batches.load(Ordering::Relaxed),
            rejected_batches: self.rejected_batches.load(Ordering::Relaxed),
            exhausted_batches: self.exhausted_batches.load(Ordering::Relaxed),
            lost_entries: self.lost_entries.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
        }
    }
}
