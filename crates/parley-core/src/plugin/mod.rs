//! Plugins.
//!
//! A plugin is anything that can be applied to a [`Robot`]: usually a
//! function that registers subscriptions, provides services, or installs an
//! output channel.
//!
//! ```rust,ignore
//! fn ping(robot: &Robot) -> CoreResult<()> {
//!     robot.on(EventKind::Mention, r"\bping\b", |ctx| ctx.robot().say("pong", ctx.fields()))?;
//!     Ok(())
//! }
//!
//! robot.use_plugin(ping)?.use_plugin(HelpPlugin::new())?;
//! ```
//!
//! There is no sandboxing. A plugin sees the whole robot and anything it
//! replaces (output channel, services) stays replaced for later plugins.

pub mod builtin;

use std::borrow::Cow;

use crate::error::BoxError;
use crate::handler::IntoHandlerResult;
use crate::robot::Robot;

pub use builtin::{HelpBook, HelpEntry, HelpPlugin};

/// A unit of functionality applied to a robot.
pub trait Plugin {
    /// The name used in logs and errors.
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }

    /// Applies the plugin.
    fn apply(&self, robot: &Robot) -> Result<(), BoxError>;
}

impl<F, R> Plugin for F
where
    F: Fn(&Robot) -> R,
    R: IntoHandlerResult,
{
    fn apply(&self, robot: &Robot) -> Result<(), BoxError> {
        self(robot).into_handler_result()
    }
}

/// A plugin function with an explicit name.
pub struct Named<F> {
    name: String,
    f: F,
}

/// Gives a plugin function a readable name.
pub fn named<F, R>(name: impl Into<String>, f: F) -> Named<F>
where
    F: Fn(&Robot) -> R,
    R: IntoHandlerResult,
{
    Named {
        name: name.into(),
        f,
    }
}

impl<F, R> Plugin for Named<F>
where
    F: Fn(&Robot) -> R,
    R: IntoHandlerResult,
{
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn apply(&self, robot: &Robot) -> Result<(), BoxError> {
        (self.f)(robot).into_handler_result()
    }
}
