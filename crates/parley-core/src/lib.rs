//! # Parley Core
//!
//! The event-routing and mention-matching engine of the Parley chat-bot
//! framework.
//!
//! Adapters feed incoming lines to a [`Robot`] with [`Robot::hear`]. The
//! robot broadcasts a `hear` event and, if the line addresses it, a
//! `mention` event. Plugins subscribe to events with a [`Filter`] (regular
//! expression, context attributes, or both) and every matching handler runs,
//! in registration order.
//!
//! ```text
//! ┌─────────────┐ hear ┌───────────────────┐      ┌──────────────────────┐
//! │   Adapter   │─────▶│       Robot       │─────▶│ Subscription (hear)  │
//! │  (console)  │      │ MentionDetector   │─────▶│ Subscription (hear)  │
//! └─────────────┘      │ Registry          │─────▶│ Subscription (mention)│
//!        ▲             └───────────────────┘      └──────────────────────┘
//!        │  say / reply / error events                    │
//!        └────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use parley_core::prelude::*;
//!
//! let robot = Robot::builder().name("Robot").plugin(HelpPlugin::new()).build()?;
//!
//! robot.on(EventKind::Mention, r"\bping\b", |ctx| {
//!     ctx.robot().reply("pong", ctx.fields())
//! })?;
//!
//! robot.hear("@Robot ping", fields([("user", "alice")]));
//! ```
//!
//! Dispatch is synchronous: `hear` and `emit` return after every handler
//! has run.

pub mod context;
pub mod error;
pub mod event;
pub mod handler;
pub mod matcher;
pub mod mention;
pub mod output;
pub mod plugin;
pub mod registry;
pub mod robot;

pub use context::Context;
pub use error::{BoxError, CoreError, CoreResult};
pub use event::EventKind;
pub use handler::{BoxedHandler, HandlerResult, IntoHandlerResult, into_handler};
pub use matcher::{AttrFilter, Fields, Filter, IntoFilter, Matches, fields};
pub use mention::{
    DEFAULT_MENTION_TEMPLATE, MentionDetector, PatternFactory, pattern_factory, templated_factory,
};
pub use output::{EventOutput, OutputChannel};
pub use plugin::{HelpBook, HelpEntry, HelpPlugin, Plugin, named};
pub use registry::{
    DispatchReport, HandlerFailure, Subscription, SubscriptionId, SubscriptionRegistry,
};
pub use robot::{DEFAULT_NAME, Robot, RobotBuilder, WeakRobot};

/// Prelude for common imports.
pub mod prelude {
    pub use super::{
        AttrFilter, BoxError, Context, CoreError, CoreResult, EventKind, Fields, Filter,
        HandlerResult, HelpBook, HelpPlugin, OutputChannel, Plugin, Robot, SubscriptionId,
        fields, named,
    };
}
