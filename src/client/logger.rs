//! logship client: the synchronous logging front-end and its lifecycle

use crate::config::ClientConfig;
use crate::shipper::{
    BatchDispatcher, BatchPolicy, HttpTransport, IntakeQueue, ShipperStats, ShutdownReport,
    StatsSnapshot, Transport, WorkerPool,
};
use crate::types::{LogData, LogEntry, LogLevel};
use crate::{LogShipError, Result};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// Non-blocking client that ships log entries to a collection endpoint.
///
/// Cloning is cheap and every clone feeds the same queue and worker pool.
/// Logging calls may be made from any thread and never block or fail.
#[derive(Clone)]
pub struct LogClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    service: String,
    queue: Arc<IntakeQueue>,
    stats: Arc<ShipperStats>,
    pool: WorkerPool,
    closed: AtomicBool,
    // Set once every worker has exited; nothing consumes the queue after this
    sealed: AtomicBool,
}

impl LogClient {
    /// Create a client with default settings for the given credentials
    pub fn new(api_key: &str, api_secret: &str) -> Result<Self> {
        Self::with_config(ClientConfig::new(api_key, api_secret))
    }

    /// Create a client with custom configuration, shipping over HTTP
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new()?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client that delivers batches through `transport`.
    ///
    /// Must be called from within a tokio runtime; the workers are spawned on it.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;

        let runtime = Handle::try_current().map_err(|e| {
            LogShipError::Runtime(format!("logship workers need a tokio runtime: {}", e))
        })?;

        let stats = Arc::new(ShipperStats::default());
        let queue = Arc::new(IntakeQueue::new(config.queue_capacity));
        let dispatcher = Arc::new(BatchDispatcher::new(&config, transport, Arc::clone(&stats))?);
        let pool = WorkerPool::spawn(
            &runtime,
            config.worker_count,
            Arc::clone(&queue),
            dispatcher,
            BatchPolicy::from_config(&config),
            config.join_timeout(),
        );

        debug!(
            service = %config.service,
            endpoint = %config.endpoint,
            "logship client started"
        );

        Ok(Self {
            inner: Arc::new(ClientInner {
                service: config.service,
                queue,
                stats,
                pool,
                closed: AtomicBool::new(false),
                sealed: AtomicBool::new(false),
            }),
        })
    }

    /// Log a message with specified level and no data
    pub fn log(&self, level: LogLevel, message: &str) {
        self.push(level, message, LogData::new());
    }

    /// Log a message with specified level and structured data
    pub fn log_with_data(&self, level: LogLevel, message: &str, data: LogData) {
        self.push(level, message, data);
    }

    /// Log a debug message
    pub fn debug<S: AsRef<str>>(&self, message: S) {
        self.log(LogLevel::Debug, message.as_ref())
    }

    /// Log a debug message with data
    pub fn debug_with_data<S: AsRef<str>>(&self, message: S, data: LogData) {
        self.log_with_data(LogLevel::Debug, message.as_ref(), data)
    }

    /// Log an info message
    pub fn info<S: AsRef<str>>(&self, message: S) {
        self.log(LogLevel::Info, message.as_ref())
    }

    /// Log an info message with data
    pub fn info_with_data<S: AsRef<str>>(&self, message: S, data: LogData) {
        self.log_with_data(LogLevel::Info, message.as_ref(), data)
    }

    /// Log a warning message
    pub fn warn<S: AsRef<str>>(&self, message: S) {
        self.log(LogLevel::Warn, message.as_ref())
    }

    /// Log a warning message with data
    pub fn warn_with_data<S: AsRef<str>>(&self, message: S, data: LogData) {
        self.log_with_data(LogLevel::Warn, message.as_ref(), data)
    }

    /// Log an error message
    pub fn error<S: AsRef<str>>(&self, message: S) {
        self.log(LogLevel::Error, message.as_ref())
    }

    /// Log an error message with data
    pub fn error_with_data<S: AsRef<str>>(&self, message: S, data: LogData) {
        self.log_with_data(LogLevel::Error, message.as_ref(), data)
    }

    /// Log a critical message
    pub fn critical<S: AsRef<str>>(&self, message: S) {
        self.log(LogLevel::Critical, message.as_ref())
    }

    /// Log a critical message with data
    pub fn critical_with_data<S: AsRef<str>>(&self, message: S, data: LogData) {
        self.log_with_data(LogLevel::Critical, message.as_ref(), data)
    }

    fn push(&self, level: LogLevel, message: &str, data: LogData) {
        if self.is_closed() {
            return;
        }

        let entry = LogEntry::new(level, self.inner.service.as_str(), message).with_data(data);
        self.enqueue(entry);
    }

    fn enqueue(&self, entry: LogEntry) {
        match self.inner.queue.try_enqueue(entry) {
            Ok(()) => {
                self.inner.stats.record_enqueued();
                // A call that raced `close` may land after the workers exited
                if self.inner.sealed.load(Ordering::SeqCst) {
                    self.discard_leftovers();
                }
            }
            Err(_) => {
                self.inner.stats.record_dropped();
                let _ = writeln!(std::io::stderr(), "logship: queue full, dropping log entry");
            }
        }
    }

    fn discard_leftovers(&self) {
        let mut discarded = 0usize;
        while self.inner.queue.try_dequeue().is_some() {
            self.inner.stats.record_dropped();
            discarded += 1;
        }
        if discarded > 0 {
            warn!(discarded, "Discarded entries enqueued after the workers stopped");
        }
    }

    /// Stop accepting entries, drain the queue and wait for the workers.
    ///
    /// Each worker gets the configured join timeout; workers that miss it are
    /// abandoned along with whatever batch they hold. A logging call that was
    /// already past its closed check when `close` began may still enqueue;
    /// once every worker has stopped, such entries are counted as dropped
    /// instead of sitting in the queue. Calling `close` again, from any clone,
    /// returns immediately.
    pub async fn close(&self) -> ShutdownReport {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return ShutdownReport::default();
        }
        debug!(pending = self.inner.queue.len(), "Closing logship client");
        let report = self.inner.pool.shutdown().await;

        // Abandoned workers keep draining on their own
        if report.abandoned == 0 {
            self.inner.sealed.store(true, Ordering::SeqCst);
            self.discard_leftovers();
        }
        report
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Service name stamped on every entry
    pub fn service(&self) -> &str {
        &self.inner.service
    }

    /// Entries currently waiting in the intake queue
    pub fn queue_len(&self) -> usize {
        self.inner.queue.len()
    }

    /// Delivery counters
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }
}
