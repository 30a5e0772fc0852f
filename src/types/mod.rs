//! Core data types shared by the client and the shipper

pub mod log_entry;

pub use log_entry::{LogData, LogEntry, LogLevel};
