//! Handler functions.
//!
//! Any `Fn(&mut Context)` closure is a handler. It may return `()` or a
//! `Result<(), E>` for any error convertible into [`BoxError`]:
//!
//! ```rust,ignore
//! robot.on(EventKind::Mention, "ping", |ctx| ctx.robot().say("pong", ctx))?;
//!
//! robot.on(EventKind::Hear, "load (\\w+)", |ctx| -> HandlerResult {
//!     let name = ctx.capture(1).unwrap_or_default();
//!     std::fs::read_to_string(name)?;
//!     Ok(())
//! })?;
//! ```

use std::sync::Arc;

use crate::context::Context;
use crate::error::BoxError;

/// The outcome of a handler invocation.
pub type HandlerResult = Result<(), BoxError>;

/// A type-erased handler that can be stored in collections.
pub type BoxedHandler = Arc<dyn Fn(&mut Context) -> HandlerResult + Send + Sync>;

/// Conversion of a handler's return value into a [`HandlerResult`].
pub trait IntoHandlerResult {
    /// Performs the conversion.
    fn into_handler_result(self) -> HandlerResult;
}

impl IntoHandlerResult for () {
    fn into_handler_result(self) -> HandlerResult {
        Ok(())
    }
}

impl<E> IntoHandlerResult for Result<(), E>
where
    E: Into<BoxError>,
{
    fn into_handler_result(self) -> HandlerResult {
        self.map_err(Into::into)
    }
}

/// Erases a handler closure into a [`BoxedHandler`].
pub fn into_handler<F, R>(f: F) -> BoxedHandler
where
    F: Fn(&mut Context) -> R + Send + Sync + 'static,
    R: IntoHandlerResult,
{
    Arc::new(move |ctx: &mut Context| f(ctx).into_handler_result())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::Fields;
    use crate::robot::Robot;

    #[test]
    fn unit_and_result_handlers_erase() {
        let unit = into_handler(|_ctx: &mut Context| {});
        let failing = into_handler(|_ctx: &mut Context| -> Result<(), std::fmt::Error> {
            Err(std::fmt::Error)
        });

        let mut ctx = Context::new(Robot::new("Robot"), "x", Fields::new());
        assert!(unit(&mut ctx).is_ok());
        assert!(failing(&mut ctx).is_err());
    }
}
