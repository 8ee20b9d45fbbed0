//! Shared type definitions for the converter
//!
//! These types describe what an `@-moz-document` parameter list means,
//! independently of how it is rendered into the generated script.

use std::fmt;

use serde::Serialize;

// =============================================================================
// Matching Conditions
// =============================================================================

/// One matching-function call from an `@-moz-document` parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Condition {
    /// `domain(d)` - the host is `d` or a subdomain of it
    Domain(String),
    /// `url(u)` - the page URL is exactly `u`
    Url(String),
    /// `url-prefix(p)` - the page URL starts with `p`
    UrlPrefix(String),
    /// `regexp(r)` - the page URL matches the regular expression `r`
    Regexp(String),
}

impl Condition {
    /// Name of the matching function as written in CSS.
    pub fn function_name(&self) -> &'static str {
        match self {
            Self::Domain(_) => "domain",
            Self::Url(_) => "url",
            Self::UrlPrefix(_) => "url-prefix",
            Self::Regexp(_) => "regexp",
        }
    }

    pub fn argument(&self) -> &str {
        match self {
            Self::Domain(arg) | Self::Url(arg) | Self::UrlPrefix(arg) | Self::Regexp(arg) => arg,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.function_name(), self.argument())
    }
}

// =============================================================================
// Match Pattern Set
// =============================================================================

/// Candidate `@match` patterns for the whole document.
///
/// `Frozen` means no declarative restriction is safe: the script has to
/// run on every page and rely on its runtime checks alone. Once frozen the
/// set never opens again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "patterns", rename_all = "snake_case")]
pub enum MatchPatternSet {
    Open(Vec<String>),
    Frozen,
}

impl Default for MatchPatternSet {
    fn default() -> Self {
        Self::Open(Vec::new())
    }
}

impl MatchPatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pattern unless the set is frozen or already holds it.
    pub fn add(&mut self, pattern: impl Into<String>) {
        if let Self::Open(patterns) = self {
            let pattern = pattern.into();
            if !patterns.contains(&pattern) {
                patterns.push(pattern);
            }
        }
    }

    /// Drop every pattern and stop accepting new ones.
    /// Returns `true` if this call is the one that froze the set.
    pub fn freeze(&mut self) -> bool {
        let was_open = !self.is_frozen();
        *self = Self::Frozen;
        was_open
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self, Self::Frozen)
    }

    /// Patterns to write as `@match` lines. Empty when frozen.
    pub fn patterns(&self) -> &[String] {
        match self {
            Self::Open(patterns) => patterns,
            Self::Frozen => &[],
        }
    }

    /// Merge another set into this one. A frozen side freezes the result.
    pub fn absorb(&mut self, other: MatchPatternSet) {
        match other {
            Self::Frozen => {
                self.freeze();
            }
            Self::Open(patterns) => {
                for pattern in patterns {
                    self.add(pattern);
                }
            }
        }
    }
}

// =============================================================================
// Diagnostics
// =============================================================================

/// Non-fatal notes produced while translating conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A `regexp()` condition has no `@match` equivalent.
    RegexpCondition { pattern: String },
    /// A `url-prefix()` stops before the path, so no glob covers it safely.
    UrlPrefixWithoutPath { prefix: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegexpCondition { pattern } => write!(
                f,
                "regexp({pattern:?}) cannot be expressed as @match; the script will run on every page"
            ),
            Self::UrlPrefixWithoutPath { prefix } => write!(
                f,
                "url-prefix({prefix:?}) has no path separator after the host; the script will run on every page"
            ),
        }
    }
}
