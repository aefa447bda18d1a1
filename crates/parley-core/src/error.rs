//! Error types for the Parley core.

use thiserror::Error;

/// A type-erased error returned by handlers and plugins.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by the core engine.
///
/// Only registration-time and plugin-application failures surface here.
/// A filter that does not match is not an error, and handler failures are
/// reported through the `error` event instead.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A text filter could not be compiled into a regular expression.
    #[error("invalid filter pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern source.
        pattern: String,
        /// The underlying compile error.
        #[source]
        source: regex::Error,
    },

    /// A mention pattern factory produced a source that does not compile.
    #[error("invalid mention pattern '{pattern}': {source}")]
    InvalidMentionPattern {
        /// The generated pattern source.
        pattern: String,
        /// The underlying compile error.
        #[source]
        source: regex::Error,
    },

    /// The robot name is empty or only whitespace.
    #[error("invalid robot name {name:?}: a name must contain a non-space character")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// A plugin returned an error while being applied to the robot.
    #[error("plugin '{plugin}' failed to apply: {source}")]
    Plugin {
        /// The plugin name.
        plugin: String,
        /// The error returned by the plugin.
        #[source]
        source: BoxError,
    },
}

impl CoreError {
    pub(crate) fn invalid_pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            source,
        }
    }

    pub(crate) fn invalid_name(name: impl Into<String>) -> Self {
        Self::InvalidName { name: name.into() }
    }

    pub(crate) fn invalid_mention(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidMentionPattern {
            pattern: pattern.into(),
            source,
        }
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
