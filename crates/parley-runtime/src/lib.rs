//! Parley Runtime - Orchestration layer for the Parley chat-bot framework.
//!
//! This crate provides:
//! - Layered configuration (`ConfigLoader`, `ParleyConfig`)
//! - Logging setup (`logging::init_from_config`)
//! - The [`Adapter`] trait and a line-oriented [`ConsoleAdapter`]
//! - Delayed callbacks ([`Timers`])
//! - Runtime orchestration ([`ParleyRuntime`])
//!
//! ```rust,ignore
//! use parley_runtime::ParleyRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut runtime = ParleyRuntime::new()?;
//!     runtime.use_plugin(ping)?;
//!     runtime.with_console();
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod timers;

// Re-exports
pub use adapter::{Adapter, BoxedAdapter, ConsoleAdapter};
pub use config::{
    ConfigError, ConfigLoader, ConfigResult, ConsoleConfig, LoggingConfig, ParleyConfig,
    RobotConfig,
};
pub use error::{AdapterError, AdapterResult, RuntimeError, RuntimeResult};
pub use runtime::{ParleyRuntime, RuntimeBuilder};
pub use timers::{TimerHandle, Timers};

// Re-export the async plumbing adapters are written against
pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// Adapter-writing types plus the common logging macros.
pub mod prelude {
    pub use super::{
        Adapter, AdapterResult, CancellationToken, ConsoleAdapter, ParleyRuntime, RuntimeResult,
        Timers, async_trait,
    };
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
