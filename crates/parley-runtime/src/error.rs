//! Runtime error types.

use parley_core::CoreError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by an adapter during its lifecycle.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// `run` was called before `connect`, or after `disconnect`.
    #[error("Adapter '{0}' is not connected")]
    NotConnected(String),

    /// Reading input or writing output failed.
    #[error("Adapter I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Registering the adapter's subscriptions failed.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Building the robot or applying a plugin failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An adapter failed.
    #[error("Adapter '{adapter}' failed: {source}")]
    Adapter {
        adapter: String,
        #[source]
        source: AdapterError,
    },

    /// An adapter task panicked or was aborted.
    #[error("Adapter task failed: {0}")]
    Task(String),

    /// A timer was scheduled outside of a tokio runtime.
    #[error("Timers require a running tokio runtime")]
    NoReactor,
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
