//! logship client implementation

pub mod logger;

pub use crate::shipper::ShutdownReport;
pub use crate::types::{LogData, LogLevel};
pub use logger::LogClient;
