//! Filters that decide whether a subscription fires for a message.
//!
//! A [`Filter`] combines an optional text pattern with an optional
//! [`AttrFilter`]. Both sides must pass independently; capture groups only
//! ever come from the text side.
//!
//! ```rust,ignore
//! use parley_core::{AttrFilter, Filter};
//!
//! // Text only
//! let yes = Filter::regex("yes")?;
//!
//! // Attributes only
//! let alice = Filter::attrs(AttrFilter::new().eq("user", "alice"));
//!
//! // Both
//! let both = Filter::regex("yes")?.with_attrs(AttrFilter::new().eq("user", "yes"));
//! ```
//!
//! Pattern compilation is kept apart from dispatch so that filters can be
//! tested on their own with [`Filter::check`].

use regex::Regex;
use serde_json::Value;

use crate::error::{CoreError, CoreResult};

/// Extra per-message fields carried by a context (`user`, `room`, ...).
pub type Fields = serde_json::Map<String, Value>;

/// Capture groups produced by a successful match. Index 0 is the full match;
/// groups that did not participate are `None`.
pub type Matches = Vec<Option<String>>;

/// Builds a [`Fields`] map from key/value pairs.
///
/// ```rust,ignore
/// let f = fields([("user", "alice"), ("room", "lobby")]);
/// ```
pub fn fields<I, K, V>(pairs: I) -> Fields
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

// =============================================================================
// AttrFilter
// =============================================================================

/// A predicate over context fields.
///
/// Matches iff every expected key is present in the context and its value is
/// strictly equal to the expected one. No coercion is performed: the string
/// `"1"` never equals the number `1`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttrFilter {
    expected: Fields,
}

impl AttrFilter {
    /// Creates an empty attribute filter, which matches every context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `key` to equal `value`.
    pub fn eq(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.expected.insert(key.into(), value.into());
        self
    }

    /// Returns `true` if every expected attribute is present and equal.
    pub fn matches(&self, fields: &Fields) -> bool {
        self.expected
            .iter()
            .all(|(key, expected)| fields.get(key) == Some(expected))
    }

    /// Returns the number of constrained keys.
    pub fn len(&self) -> usize {
        self.expected.len()
    }

    /// Returns `true` if no key is constrained.
    pub fn is_empty(&self) -> bool {
        self.expected.is_empty()
    }
}

impl From<Fields> for AttrFilter {
    fn from(expected: Fields) -> Self {
        Self { expected }
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for AttrFilter
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        Self {
            expected: fields(pairs),
        }
    }
}

// =============================================================================
// Filter
// =============================================================================

/// The predicate attached to a subscription.
///
/// A filter with no text pattern behaves like `.*` over the whole message:
/// it always passes the text side and yields the full message as group 0.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    text: Option<Regex>,
    attrs: Option<AttrFilter>,
}

impl Filter {
    /// A filter that matches every message.
    pub fn any() -> Self {
        Self::default()
    }

    /// Compiles `pattern` as a regular expression.
    ///
    /// Fails with [`CoreError::InvalidPattern`] if the source is malformed.
    pub fn regex(pattern: &str) -> CoreResult<Self> {
        let re = Regex::new(pattern).map_err(|e| CoreError::invalid_pattern(pattern, e))?;
        Ok(Self::from(re))
    }

    /// Matches `text` verbatim anywhere in the message.
    pub fn literal(text: &str) -> CoreResult<Self> {
        Self::regex(&regex::escape(text))
    }

    /// A filter that only checks context attributes.
    pub fn attrs(attrs: impl Into<AttrFilter>) -> Self {
        Self {
            text: None,
            attrs: Some(attrs.into()),
        }
    }

    /// Adds an attribute predicate to this filter.
    pub fn with_attrs(mut self, attrs: impl Into<AttrFilter>) -> Self {
        self.attrs = Some(attrs.into());
        self
    }

    /// Returns the text pattern, if any.
    pub fn text_pattern(&self) -> Option<&Regex> {
        self.text.as_ref()
    }

    /// Returns the attribute predicate, if any.
    pub fn attr_filter(&self) -> Option<&AttrFilter> {
        self.attrs.as_ref()
    }

    /// Tests `text` and `fields` against this filter.
    ///
    /// Returns the capture groups on success and `None` when either side
    /// fails. "No match" is an ordinary outcome, not an error.
    pub fn check(&self, text: &str, fields: &Fields) -> Option<Matches> {
        if let Some(attrs) = &self.attrs
            && !attrs.matches(fields)
        {
            return None;
        }

        match &self.text {
            Some(re) => {
                let caps = re.captures(text)?;
                Some(
                    caps.iter()
                        .map(|group| group.map(|m| m.as_str().to_string()))
                        .collect(),
                )
            }
            None => Some(vec![Some(text.to_string())]),
        }
    }
}

impl From<Regex> for Filter {
    fn from(re: Regex) -> Self {
        Self {
            text: Some(re),
            attrs: None,
        }
    }
}

impl From<AttrFilter> for Filter {
    fn from(attrs: AttrFilter) -> Self {
        Self::attrs(attrs)
    }
}

// =============================================================================
// IntoFilter
// =============================================================================

/// Conversion into a [`Filter`] at registration time.
///
/// String sources are compiled as regular expressions here, so a malformed
/// pattern fails the `on`/`once` call that supplied it.
pub trait IntoFilter {
    /// Performs the conversion.
    fn into_filter(self) -> CoreResult<Filter>;
}

impl IntoFilter for Filter {
    fn into_filter(self) -> CoreResult<Filter> {
        Ok(self)
    }
}

impl IntoFilter for Regex {
    fn into_filter(self) -> CoreResult<Filter> {
        Ok(Filter::from(self))
    }
}

impl IntoFilter for &Regex {
    fn into_filter(self) -> CoreResult<Filter> {
        Ok(Filter::from(self.clone()))
    }
}

impl IntoFilter for &str {
    fn into_filter(self) -> CoreResult<Filter> {
        Filter::regex(self)
    }
}

impl IntoFilter for String {
    fn into_filter(self) -> CoreResult<Filter> {
        Filter::regex(&self)
    }
}

impl IntoFilter for &String {
    fn into_filter(self) -> CoreResult<Filter> {
        Filter::regex(self)
    }
}

impl IntoFilter for AttrFilter {
    fn into_filter(self) -> CoreResult<Filter> {
        Ok(Filter::attrs(self))
    }
}

impl<T: IntoFilter> IntoFilter for (T, AttrFilter) {
    fn into_filter(self) -> CoreResult<Filter> {
        let (text, attrs) = self;
        Ok(text.into_filter()?.with_attrs(attrs))
    }
}
