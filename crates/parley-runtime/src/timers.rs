//! Delayed callbacks into the robot.
//!
//! ```rust,ignore
//! fn remind(robot: &Robot) -> CoreResult<()> {
//!     robot.on(EventKind::Mention, r"remind me", |ctx| -> HandlerResult {
//!         let fields = ctx.fields().clone();
//!         if let Some(timers) = Timers::of(ctx.robot()) {
//!             timers.after(Duration::from_secs(60), move |robot| {
//!                 let _ = robot.reply("time's up", &fields);
//!             })?;
//!         }
//!         Ok(())
//!     })?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use parley_core::{Robot, WeakRobot};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::{RuntimeError, RuntimeResult};

/// Schedules callbacks on the tokio runtime.
///
/// `Timers` is a cheap clonable handle. It holds the robot weakly, so it can
/// be stored in the robot's services. Cancelling the token passed to
/// [`Timers::new`] cancels every pending timer.
#[derive(Debug, Clone)]
pub struct Timers {
    robot: WeakRobot,
    token: CancellationToken,
}

/// A single pending timer.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    token: CancellationToken,
}

impl TimerHandle {
    /// Cancels the timer if it has not fired yet.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns `true` once the timer is cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Timers {
    /// Creates timers for `robot`, cancelled together with `token`.
    pub fn new(robot: &Robot, token: CancellationToken) -> Self {
        Self {
            robot: robot.downgrade(),
            token,
        }
    }

    /// Returns the timers provided to `robot`, if any.
    pub fn of(robot: &Robot) -> Option<Arc<Timers>> {
        robot.service::<Timers>()
    }

    /// Calls `f` with the robot once `delay` has elapsed.
    ///
    /// The callback is skipped if the timer is cancelled first or the robot
    /// has been dropped. Must be called from within a tokio runtime.
    pub fn after<F>(&self, delay: Duration, f: F) -> RuntimeResult<TimerHandle>
    where
        F: FnOnce(&Robot) + Send + 'static,
    {
        let handle = Handle::try_current().map_err(|_| RuntimeError::NoReactor)?;
        let token = self.token.child_token();
        let robot = self.robot.clone();

        let task_token = token.clone();
        handle.spawn(async move {
            tokio::select! {
                _ = task_token.cancelled() => trace!("Timer cancelled"),
                _ = tokio::time::sleep(delay) => match robot.upgrade() {
                    Some(robot) => f(&robot),
                    None => debug!("Robot dropped before timer fired"),
                },
            }
        });

        trace!(delay_ms = delay.as_millis() as u64, "Timer scheduled");
        Ok(TimerHandle { token })
    }

    /// Cancels every pending timer. Later calls to `after` are cancelled
    /// immediately.
    pub fn cancel_all(&self) {
        self.token.cancel();
    }

    /// Returns `true` once [`cancel_all`](Self::cancel_all) has run.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
