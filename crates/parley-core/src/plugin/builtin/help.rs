//! Help plugin.
//!
//! Provides a shared [`HelpBook`] service that other plugins write their
//! command documentation into, and answers `help` mentions with the whole
//! book.
//!
//! ```rust,ignore
//! robot.use_plugin(HelpPlugin::new())?;
//!
//! fn ping(robot: &Robot) -> CoreResult<()> {
//!     HelpBook::of(robot).help("ping", "Reply with pong");
//!     robot.on(EventKind::Mention, r"\bping\b", |ctx| ctx.robot().say("pong", ctx.fields()))?;
//!     Ok(())
//! }
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::BoxError;
use crate::event::EventKind;
use crate::plugin::Plugin;
use crate::robot::Robot;

/// The pattern a mention must match to trigger help.
pub const DEFAULT_HELP_PATTERN: &str = r"(?i)\bhelp\b";

/// One documented command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpEntry {
    /// How the command is invoked.
    pub command: String,
    /// What it does.
    pub description: String,
}

/// Registry of command documentation, shared through the robot's services.
#[derive(Debug, Default)]
pub struct HelpBook {
    entries: RwLock<Vec<HelpEntry>>,
}

impl HelpBook {
    /// Returns the robot's help book, providing an empty one if needed.
    pub fn of(robot: &Robot) -> Arc<HelpBook> {
        robot.service_or_provide(|| Arc::new(HelpBook::default()))
    }

    /// Documents a command.
    pub fn help(&self, command: impl Into<String>, description: impl Into<String>) {
        self.entries.write().push(HelpEntry {
            command: command.into(),
            description: description.into(),
        });
    }

    /// Returns all entries in registration order.
    pub fn entries(&self) -> Vec<HelpEntry> {
        self.entries.read().clone()
    }

    /// Returns `true` if nothing is documented.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Renders one line per entry, each starting with `prefix`.
    pub fn render(&self, prefix: &str) -> String {
        self.entries
            .read()
            .iter()
            .map(|e| format!("{prefix}{} - {}", e.command, e.description))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Answers `help` mentions with the rendered [`HelpBook`].
#[derive(Debug, Clone)]
pub struct HelpPlugin {
    pattern: String,
}

impl Default for HelpPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl HelpPlugin {
    /// Creates the plugin with [`DEFAULT_HELP_PATTERN`].
    pub fn new() -> Self {
        Self {
            pattern: DEFAULT_HELP_PATTERN.to_string(),
        }
    }

    /// Uses a different trigger pattern.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }
}

impl Plugin for HelpPlugin {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed("help")
    }

    fn apply(&self, robot: &Robot) -> Result<(), BoxError> {
        let book = HelpBook::of(robot);
        book.help("help", "Show this help");

        robot.on(EventKind::Mention, self.pattern.as_str(), move |ctx| {
            let prefix = ctx.robot().mention_prefix(None);
            debug!(entries = book.entries().len(), "Rendering help");
            ctx.robot().say(&book.render(&prefix), ctx.fields())
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::Fields;
    use parking_lot::Mutex;

    #[test]
    fn render_lists_entries_in_order() {
        let book = HelpBook::default();
        book.help("ping", "Reply with pong");
        book.help("flip <text>", "Flip text upside down");

        assert_eq!(
            book.render("@Robot "),
            "@Robot ping - Reply with pong\n@Robot flip <text> - Flip text upside down"
        );
    }

    #[test]
    fn help_mention_says_book() {
        let robot = Robot::new("Robot");
        robot.use_plugin(HelpPlugin::new()).unwrap();
        HelpBook::of(&robot).help("ping", "Reply with pong");

        let said = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&said);
        robot.on_any(EventKind::Say, move |ctx| {
            sink.lock().push(ctx.message().to_string());
        });

        robot.hear("help", Fields::new());
        assert!(said.lock().is_empty());

        robot.hear("@Robot help", Fields::new());
        assert_eq!(
            *said.lock(),
            vec!["@Robot help - Show this help\n@Robot ping - Reply with pong"]
        );
    }

    #[test]
    fn book_is_shared_across_lookups() {
        let robot = Robot::new("Robot");
        HelpBook::of(&robot).help("a", "first");
        assert_eq!(HelpBook::of(&robot).entries().len(), 1);
    }

    #[test]
    fn invalid_pattern_fails_plugin() {
        let robot = Robot::new("Robot");
        assert!(robot.use_plugin(HelpPlugin::new().pattern("(")).is_err());
    }
}
