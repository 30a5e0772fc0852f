//! Configuration management for logship

pub mod settings;

pub use settings::{ClientConfig, DEFAULT_ENDPOINT, DEFAULT_SERVICE, ENV_PREFIX};
