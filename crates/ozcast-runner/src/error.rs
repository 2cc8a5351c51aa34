//! Error types for the batch runner.
//!
//! Uses `thiserror` for typed errors covering configuration, calibration
//! loading, member input, and task failures. A single member that fails
//! inference is not a runner error; it is logged and skipped.

use ozcast_core::{ConfigError, InferenceError};

/// Errors that can occur during a batch run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// A calibration could not be loaded or built.
    #[error("calibration error: {0}")]
    Calibration(#[from] ConfigError),

    /// A requested calibration version is not loaded.
    #[error("inference error: {0}")]
    Inference(#[from] InferenceError),

    /// Reading member input or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// An inference task panicked or was cancelled.
    #[error("task error: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// The concurrency limiter was closed while members were pending.
    #[error("concurrency limiter closed: {0}")]
    Limiter(#[from] tokio::sync::AcquireError),
}
