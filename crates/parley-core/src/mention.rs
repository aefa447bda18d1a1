//! Mention detection.
//!
//! A [`MentionDetector`] decides whether a line is addressed to the robot.
//! It keeps an ordered list of pattern factories; each factory turns the
//! robot's (regex-escaped) name into a pattern source, compiled
//! case-insensitively. The default factories recognise:
//!
//! | Factory          | Matches              |
//! |------------------|----------------------|
//! | `^@?{name}\b`    | `@Robot help`        |
//! | `^{name}:`       | `Robot: help`        |
//! | `,\s*{name}$`    | `help me, Robot`     |
//!
//! Patterns are regenerated from their factories whenever the robot is
//! renamed. The list is append-only.

use std::fmt;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};

use crate::error::{CoreError, CoreResult};

/// The template used to address a user when none is configured.
pub const DEFAULT_MENTION_TEMPLATE: &str = "@%s ";

/// Builds a mention pattern source from the escaped robot name.
pub type PatternFactory = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Wraps a closure into a [`PatternFactory`].
pub fn pattern_factory<F>(f: F) -> PatternFactory
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Builds a factory from a source containing a `{name}` placeholder.
pub fn templated_factory(source: impl Into<String>) -> PatternFactory {
    let source = source.into();
    pattern_factory(move |name| source.replace("{name}", name))
}

/// Ordered set of address patterns derived from the robot's name.
#[derive(Clone)]
pub struct MentionDetector {
    template: String,
    factories: Vec<PatternFactory>,
    patterns: Vec<Regex>,
}

impl MentionDetector {
    /// Creates a detector with the default template and patterns.
    pub fn new(name: &str) -> CoreResult<Self> {
        let mut detector = Self::empty(DEFAULT_MENTION_TEMPLATE);
        for factory in Self::default_factories() {
            detector.add_pattern(name, factory)?;
        }
        Ok(detector)
    }

    /// Creates a detector without any patterns. Nothing is ever mentioned
    /// until a pattern is added.
    pub fn empty(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            factories: Vec::new(),
            patterns: Vec::new(),
        }
    }

    /// The built-in address pattern factories.
    pub fn default_factories() -> Vec<PatternFactory> {
        vec![
            pattern_factory(|name| format!(r"^@?{name}\b")),
            pattern_factory(|name| format!(r"^{name}:")),
            pattern_factory(|name| format!(r",\s*{name}$")),
        ]
    }

    /// Returns the address template.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Replaces the address template.
    pub fn set_template(&mut self, template: impl Into<String>) {
        self.template = template.into();
    }

    /// Appends a pattern factory and compiles it for `name`.
    pub fn add_pattern(&mut self, name: &str, factory: PatternFactory) -> CoreResult<()> {
        check_name(name)?;
        let pattern = compile(&factory, name)?;
        self.factories.push(factory);
        self.patterns.push(pattern);
        Ok(())
    }

    /// Recompiles every pattern for a new robot name.
    ///
    /// Either all patterns are replaced or, on error, none are.
    pub fn regenerate(&mut self, name: &str) -> CoreResult<()> {
        check_name(name)?;
        let patterns = self
            .factories
            .iter()
            .map(|factory| compile(factory, name))
            .collect::<CoreResult<Vec<_>>>()?;
        self.patterns = patterns;
        Ok(())
    }

    /// Returns the compiled patterns in registration order.
    pub fn patterns(&self) -> &[Regex] {
        &self.patterns
    }

    /// Returns `true` if any pattern matches `text`.
    pub fn is_mentioned(&self, text: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(text))
    }

    /// Returns the address span found by the first matching pattern.
    pub fn find<'t>(&self, text: &'t str) -> Option<regex::Match<'t>> {
        self.patterns.iter().find_map(|re| re.find(text))
    }

    /// Returns `text` with the address removed, or `None` if the robot is
    /// not mentioned.
    pub fn strip(&self, text: &str) -> Option<String> {
        let found = self.find(text)?;
        let rest = format!("{}{}", &text[..found.start()], &text[found.end()..]);
        Some(
            rest.trim_matches(|c: char| c.is_whitespace() || c == ':' || c == ',')
                .to_string(),
        )
    }

    /// Formats the template with `nickname`.
    pub fn prefix(&self, nickname: &str) -> String {
        self.template.replacen("%s", nickname, 1)
    }
}

/// A blank name turns `^@?{name}\b` into `^@?\b`, which matches almost
/// every line.
pub(crate) fn check_name(name: &str) -> CoreResult<()> {
    if name.trim().is_empty() {
        return Err(CoreError::invalid_name(name));
    }
    Ok(())
}

fn compile(factory: &PatternFactory, name: &str) -> CoreResult<Regex> {
    let source = factory(&regex::escape(name));
    RegexBuilder::new(&source)
        .case_insensitive(true)
        .build()
        .map_err(|e| CoreError::invalid_mention(source, e))
}

impl fmt::Debug for MentionDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MentionDetector")
            .field("template", &self.template)
            .field(
                "patterns",
                &self.patterns.iter().map(Regex::as_str).collect::<Vec<_>>(),
            )
            .finish()
    }
}
