//! The per-message context handed to handlers.
//!
//! One [`Context`] is created for every `hear`/`emit` call and shared by all
//! handlers of that call, so a field set by one handler is visible to the
//! handlers that run after it. [`Context::matches`] is the exception: it is
//! rewritten before each handler to the captures of that handler's own
//! filter.

use std::fmt;

use serde_json::Value;

use crate::matcher::{Fields, Matches};
use crate::robot::Robot;

/// The data bag threaded through matching and handler invocation.
pub struct Context {
    robot: Robot,
    message: String,
    matches: Matches,
    fields: Fields,
    command: Option<String>,
}

impl Context {
    /// Creates a context for `message` with caller-supplied fields.
    pub fn new(robot: Robot, message: impl Into<String>, fields: Fields) -> Self {
        Self {
            robot,
            message: message.into(),
            matches: Vec::new(),
            fields,
            command: None,
        }
    }

    /// Returns the robot this message was dispatched on.
    pub fn robot(&self) -> &Robot {
        &self.robot
    }

    /// Returns the original message text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the capture groups of the filter that selected the current
    /// handler. Group 0 is the full match.
    pub fn matches(&self) -> &[Option<String>] {
        &self.matches
    }

    /// Returns capture group `index`, if it participated in the match.
    pub fn capture(&self, index: usize) -> Option<&str> {
        self.matches.get(index).and_then(|m| m.as_deref())
    }

    /// Returns the message with the robot's address stripped.
    ///
    /// Only set while a `mention` event is being dispatched.
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    /// Returns the caller-supplied fields.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Returns the caller-supplied fields mutably.
    pub fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    /// Looks up a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Looks up a string field.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Sets a field, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    /// The `user` field, if present and a string.
    pub fn user(&self) -> Option<&str> {
        self.get_str("user")
    }

    /// The `room` field, if present and a string.
    pub fn room(&self) -> Option<&str> {
        self.get_str("room")
    }

    /// Consumes the context, returning its fields.
    pub fn into_fields(self) -> Fields {
        self.fields
    }

    pub(crate) fn set_matches(&mut self, matches: Matches) {
        self.matches = matches;
    }

    pub(crate) fn set_command(&mut self, command: Option<String>) {
        self.command = command;
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("robot", &self.robot.name())
            .field("message", &self.message)
            .field("matches", &self.matches)
            .field("fields", &self.fields)
            .field("command", &self.command)
            .finish()
    }
}
