//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use parley_core::{DEFAULT_MENTION_TEMPLATE, DEFAULT_NAME, RobotBuilder, templated_factory};
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ParleyConfig {
    /// Robot identity and mention handling.
    #[serde(default)]
    pub robot: RobotConfig,

    /// Console adapter settings.
    #[serde(default)]
    pub console: ConsoleConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// =============================================================================
// Robot
// =============================================================================

/// Robot identity and mention handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotConfig {
    /// The robot's name.
    #[serde(default = "default_name")]
    pub name: String,

    /// Address prefix template; `%s` is replaced by the nickname.
    #[serde(default = "default_mention_template")]
    pub mention_template: String,

    /// Whether to install the built-in address patterns.
    #[serde(default = "default_true")]
    pub default_mentions: bool,

    /// Extra mention patterns; `{name}` is replaced by the escaped name.
    #[serde(default)]
    pub mention_patterns: Vec<String>,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            mention_template: default_mention_template(),
            default_mentions: true,
            mention_patterns: Vec::new(),
        }
    }
}

impl RobotConfig {
    /// Returns a robot builder preloaded with these settings.
    pub fn to_builder(&self) -> RobotBuilder {
        self.mention_patterns.iter().fold(
            RobotBuilder::new()
                .name(&self.name)
                .mention_template(&self.mention_template)
                .default_mentions(self.default_mentions),
            |builder, source| builder.mention_pattern(templated_factory(source.clone())),
        )
    }
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_mention_template() -> String {
    DEFAULT_MENTION_TEMPLATE.to_string()
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Console
// =============================================================================

/// Console adapter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// The `user` field attached to every line read.
    #[serde(default = "default_console_user")]
    pub user: String,

    /// The `room` field attached to every line read.
    #[serde(default = "default_console_room")]
    pub room: String,

    /// Prompt written before each read.
    #[serde(default)]
    pub prompt: Option<String>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            user: default_console_user(),
            room: default_console_room(),
            prompt: None,
        }
    }
}

fn default_console_user() -> String {
    "shell".to_string()
}

fn default_console_room() -> String {
    "console".to_string()
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the level as a filter directive string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature.
    #[cfg(feature = "json-log")]
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    /// Default, so log lines never interleave with console output on stdout.
    #[default]
    Stderr,
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Global level, overridden by `RUST_LOG`.
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file, required when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Per-module levels, e.g. `parley_core = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,

    #[serde(default)]
    pub thread_ids: bool,

    /// Include file names and line numbers.
    #[serde(default)]
    pub file_location: bool,

    #[serde(default)]
    pub span_events: SpanEventConfig,
}
