//! Adapters connect a [`Robot`] to the outside world.
//!
//! An adapter feeds incoming lines to [`Robot::hear`] and delivers the
//! robot's output by subscribing to `say` / `reply` (and any other events it
//! cares about) when it connects.
//!
//! # Lifecycle
//!
//! ```text
//! connect ──▶ run (until EOF, error or cancellation) ──▶ disconnect
//! ```
//!
//! The runtime drives each adapter through this lifecycle on its own task.
//! `disconnect` is called even when `run` fails.
//!
//! # Example
//!
//! ```rust,ignore
//! struct Silent;
//!
//! #[async_trait]
//! impl Adapter for Silent {
//!     fn name(&self) -> &str { "silent" }
//!     async fn connect(&mut self, _robot: &Robot) -> AdapterResult<()> { Ok(()) }
//!     async fn run(&mut self, _robot: &Robot, shutdown: CancellationToken) -> AdapterResult<()> {
//!         shutdown.cancelled().await;
//!         Ok(())
//!     }
//! }
//! ```

pub mod console;

use async_trait::async_trait;
use parley_core::Robot;
use tokio_util::sync::CancellationToken;

use crate::error::AdapterResult;

pub use console::ConsoleAdapter;

/// A chat front-end driven by the runtime.
#[async_trait]
pub trait Adapter: Send {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Acquires resources and subscribes to the robot's output events.
    async fn connect(&mut self, robot: &Robot) -> AdapterResult<()>;

    /// Feeds input to the robot until the source ends or `shutdown` fires.
    async fn run(&mut self, robot: &Robot, shutdown: CancellationToken) -> AdapterResult<()>;

    /// Removes subscriptions and releases resources.
    async fn disconnect(&mut self, _robot: &Robot) -> AdapterResult<()> {
        Ok(())
    }
}

/// A boxed adapter trait object.
pub type BoxedAdapter = Box<dyn Adapter>;
