//! Configuration module for the Parley runtime.
//!
//! Layered loading with figment, the configuration schema, and validation.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    ConsoleConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, ParleyConfig, RobotConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
