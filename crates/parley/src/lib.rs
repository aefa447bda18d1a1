//! # Parley
//!
//! A pluggable, event-driven chat-bot framework.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐ hear ┌───────────────┐      ┌───────────────────────────┐
//! │   Adapter   │─────▶│     Robot     │─────▶│ hear subscriptions        │
//! │  (console)  │      │               │─────▶│ mention subscriptions     │
//! └─────────────┘      └───────────────┘      └───────────────────────────┘
//!        ▲                     │ say / reply events
//!        └─────────────────────┘
//! ```
//!
//! - **Robot**: name, mention detection, subscriptions, services
//! - **Plugins**: functions applied to the robot that register handlers
//! - **Adapters**: feed lines in and write the robot's output back out
//! - **Runtime**: configuration, logging, timers and adapter lifecycle
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use parley::prelude::*;
//!
//! fn ping(robot: &Robot) -> CoreResult<()> {
//!     HelpBook::of(robot).help("ping", "Reply with pong");
//!     robot.on(EventKind::Mention, r"\bping\b", |ctx| ctx.robot().reply("pong", ctx.fields()))?;
//!     Ok(())
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut runtime = ParleyRuntime::new()?;
//!     runtime.use_plugin(HelpPlugin::new())?.use_plugin(ping)?;
//!     runtime.with_console();
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: load `parley.toml`
//! - `yaml-config`: load `parley.yaml`
//! - `json-log`: JSON log output

pub use parley_core as core;
pub use parley_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use parley::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use parley_runtime::{ConsoleAdapter, ParleyRuntime, Timers};

    // Robot, events and filters
    pub use parley_core::prelude::*;

    // Custom adapters
    pub use parley_runtime::{Adapter, AdapterResult, CancellationToken, async_trait};
}
