//! Event kinds understood by the robot.
//!
//! The core itself only ever emits [`EventKind::Hear`], [`EventKind::Mention`]
//! and [`EventKind::Name`]. The remaining variants are the names adapters and
//! plugins conventionally agree on; anything else travels as
//! [`EventKind::Custom`].

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// The type of an event that subscriptions are keyed by.
///
/// Serializes as its wire name, so `"mention"` and `"reminder"` both
/// round-trip through configuration and JSON fields.
///
/// Equality and hashing go through the wire name as well:
/// `Custom("hear".into())` is the same kind as [`EventKind::Hear`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    /// Every line the robot receives.
    Hear,
    /// Lines that address the robot.
    Mention,
    /// The robot was renamed.
    Name,
    /// Outgoing text.
    Say,
    /// Outgoing text addressed to a user.
    Reply,
    /// Error notification.
    Error,
    /// Warning notification.
    Warn,
    /// Success notification.
    Success,
    /// Room topic change.
    Topic,
    /// Raw adapter data.
    Data,
    /// A user became known.
    User,
    /// A room became known.
    Room,
    /// A plugin-defined event name.
    Custom(String),
}

impl EventKind {
    /// Returns the wire name of this event kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Hear => "hear",
            Self::Mention => "mention",
            Self::Name => "name",
            Self::Say => "say",
            Self::Reply => "reply",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Success => "success",
            Self::Topic => "topic",
            Self::Data => "data",
            Self::User => "user",
            Self::Room => "room",
            Self::Custom(name) => name,
        }
    }

    /// Returns `true` for plugin-defined event names.
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl PartialEq for EventKind {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for EventKind {}

impl Hash for EventKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl From<&str> for EventKind {
    fn from(name: &str) -> Self {
        match name {
            "hear" => Self::Hear,
            "mention" => Self::Mention,
            "name" => Self::Name,
            "say" => Self::Say,
            "reply" => Self::Reply,
            "error" => Self::Error,
            "warn" => Self::Warn,
            "success" => Self::Success,
            "topic" => Self::Topic,
            "data" => Self::Data,
            "user" => Self::User,
            "room" => Self::Room,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for EventKind {
    fn from(name: String) -> Self {
        match Self::from(name.as_str()) {
            Self::Custom(_) => Self::Custom(name),
            known => known,
        }
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Custom(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_map_to_variants() {
        assert_eq!(EventKind::from("hear"), EventKind::Hear);
        assert_eq!(EventKind::from("mention"), EventKind::Mention);
        assert_eq!(EventKind::from("error"), EventKind::Error);
        assert_eq!(EventKind::from(String::from("room")), EventKind::Room);
    }

    #[test]
    fn unknown_names_are_custom() {
        let kind = EventKind::from("reminder");
        assert!(kind.is_custom());
        assert_eq!(kind.as_str(), "reminder");
        assert_eq!(kind.to_string(), "reminder");
    }

    #[test]
    fn custom_spelling_of_builtin_is_the_same_kind() {
        use std::collections::HashSet;

        assert_eq!(EventKind::Custom("hear".into()), EventKind::Hear);
        assert_ne!(EventKind::Custom("Hear".into()), EventKind::Hear);

        let kinds: HashSet<EventKind> =
            [EventKind::Mention, EventKind::Custom("mention".into())].into();
        assert_eq!(kinds.len(), 1);
    }

    #[test]
    fn serializes_as_wire_name() {
        let kinds: Vec<EventKind> = serde_json::from_str(r#"["say", "reminder"]"#).unwrap();
        assert_eq!(kinds, vec![EventKind::Say, EventKind::Custom("reminder".into())]);
        assert_eq!(
            serde_json::to_string(&EventKind::Mention).unwrap(),
            r#""mention""#
        );
    }
}
