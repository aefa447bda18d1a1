//! Installs the global `tracing` subscriber from a [`LoggingConfig`].
//!
//! Library code only emits events; the runtime calls [`init_from_config`]
//! once before the robot is built. `RUST_LOG`, when set, replaces the
//! configured level, and the per-module `filters` are layered on top of
//! whichever base wins.
//!
//! ```rust,ignore
//! use parley_runtime::{config::load_config, logging};
//!
//! let config = load_config()?;
//! logging::try_init_from_config(&config.logging)?;
//! ```

use std::ffi::OsStr;
use std::io;
use std::path::Path;

use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::{LogFormat, LogOutput, LoggingConfig, SpanEventConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Install the subscriber described by `config`.
///
/// A second call is a no-op; the first subscriber stays in place.
pub fn init_from_config(config: &LoggingConfig) {
    let _ = try_init_from_config(config);
}

/// Like [`init_from_config`], but reports an already-installed subscriber.
pub fn try_init_from_config(config: &LoggingConfig) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(fmt_layer(config))
        .with(env_filter(config))
        .try_init()
}

fn env_filter(config: &LoggingConfig) -> EnvFilter {
    let base = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));
    module_directives(config)
        .into_iter()
        .fold(base, |filter, directive| filter.add_directive(directive))
}

/// `module=level` directives for the configured filters, ordered by module.
fn module_directives(config: &LoggingConfig) -> Vec<Directive> {
    let mut filters: Vec<_> = config.filters.iter().collect();
    filters.sort_by(|a, b| a.0.cmp(b.0));
    filters
        .into_iter()
        .filter_map(|(module, level)| format!("{module}={}", level.as_str()).parse().ok())
        .collect()
}

fn span_events(config: &SpanEventConfig) -> FmtSpan {
    [
        (config.new, FmtSpan::NEW),
        (config.enter, FmtSpan::ENTER),
        (config.exit, FmtSpan::EXIT),
        (config.close, FmtSpan::CLOSE),
    ]
    .into_iter()
    .filter(|(enabled, _)| *enabled)
    .fold(FmtSpan::NONE, |acc, (_, span)| acc | span)
}

fn make_writer(config: &LoggingConfig) -> BoxMakeWriter {
    match (config.output, &config.file_path) {
        (LogOutput::Stdout, _) => BoxMakeWriter::new(io::stdout),
        (LogOutput::File, Some(path)) => {
            let dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file = path.file_name().unwrap_or_else(|| OsStr::new("parley.log"));
            BoxMakeWriter::new(tracing_appender::rolling::never(dir, file))
        }
        // validate_config rejects file output without a path
        _ => BoxMakeWriter::new(io::stderr),
    }
}

fn fmt_layer(config: &LoggingConfig) -> BoxedLayer {
    let layer = fmt::layer()
        .with_writer(make_writer(config))
        .with_span_events(span_events(&config.span_events))
        .with_thread_ids(config.thread_ids)
        .with_file(config.file_location)
        .with_line_number(config.file_location);

    match config.format {
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Full => layer.boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
        #[cfg(feature = "json-log")]
        LogFormat::Json => layer.json().boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn module_filters_become_ordered_directives() {
        let mut config = LoggingConfig::default();
        config.filters.insert("parley_runtime".into(), LogLevel::Info);
        config.filters.insert("parley_core".into(), LogLevel::Trace);

        let directives: Vec<String> = module_directives(&config)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(directives, vec!["parley_core=trace", "parley_runtime=info"]);
    }

    #[test]
    fn span_event_flags_combine() {
        let config = SpanEventConfig {
            new: true,
            close: true,
            ..Default::default()
        };
        assert_eq!(span_events(&config), FmtSpan::NEW | FmtSpan::CLOSE);
        assert_eq!(span_events(&SpanEventConfig::default()), FmtSpan::NONE);
    }

    #[test]
    fn second_install_is_reported() {
        let config = LoggingConfig::default();
        init_from_config(&config);
        assert!(try_init_from_config(&config).is_err());
    }
}
