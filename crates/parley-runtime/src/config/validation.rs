//! Configuration validation utilities.

use regex::RegexBuilder;

use super::error::{ConfigError, ConfigResult};
use super::schema::{ConsoleConfig, LogOutput, LoggingConfig, ParleyConfig, RobotConfig};

/// Validates the entire configuration.
///
/// Unknown log levels never get this far: they are rejected while the
/// configuration is extracted.
pub fn validate_config(config: &ParleyConfig) -> ConfigResult<()> {
    validate_robot_config(&config.robot)?;
    validate_console_config(&config.console)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validates robot identity and mention settings.
fn validate_robot_config(robot: &RobotConfig) -> ConfigResult<()> {
    if robot.name.trim().is_empty() {
        return Err(ConfigError::missing_field("robot.name"));
    }

    if !robot.mention_template.contains("%s") {
        return Err(ConfigError::validation(format!(
            "Mention template must contain '%s': {:?}",
            robot.mention_template
        )));
    }

    let escaped = regex::escape(&robot.name);
    for source in &robot.mention_patterns {
        if !source.contains("{name}") {
            return Err(ConfigError::validation(format!(
                "Mention pattern must contain '{{name}}': {source:?}"
            )));
        }
        RegexBuilder::new(&source.replace("{name}", &escaped))
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                ConfigError::validation(format!("Invalid mention pattern {source:?}: {e}"))
            })?;
    }

    Ok(())
}

/// Validates console adapter settings.
fn validate_console_config(console: &ConsoleConfig) -> ConfigResult<()> {
    if console.user.is_empty() {
        return Err(ConfigError::missing_field("console.user"));
    }
    if console.room.is_empty() {
        return Err(ConfigError::missing_field("console.room"));
    }
    Ok(())
}

/// Validates logging settings.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    if logging.filters.keys().any(|module| module.trim().is_empty()) {
        return Err(ConfigError::validation("Log filter module names cannot be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&ParleyConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_empty_name() {
        let mut config = ParleyConfig::default();
        config.robot.name = "  ".into();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { .. })
        ));
    }

    #[test]
    fn test_validate_template_without_placeholder() {
        let mut config = ParleyConfig::default();
        config.robot.mention_template = "@robot ".into();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_validate_mention_patterns() {
        let mut config = ParleyConfig::default();
        config.robot.mention_patterns = vec![r"^hey {name}\b".into()];
        assert!(validate_config(&config).is_ok());

        config.robot.mention_patterns = vec![r"^hey robot\b".into()];
        assert!(validate_config(&config).is_err());

        config.robot.mention_patterns = vec![r"^({name}".into()];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_name_is_escaped_in_patterns() {
        let mut config = ParleyConfig::default();
        config.robot.name = "r2(d2".into();
        config.robot.mention_patterns = vec![r"^{name}\b".into()];
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_file_output_needs_path() {
        let mut config = ParleyConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some("parley.log".into());
        assert!(validate_config(&config).is_ok());
    }
}
