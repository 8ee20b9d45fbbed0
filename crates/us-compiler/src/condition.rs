//! `@-moz-document` condition translation
//!
//! A parameter list such as `domain("a.com"), url-prefix("https://b.com/x")`
//! is a set of alternatives. Each call becomes one JavaScript check over the
//! `domain` and `url` variables of the generated script, and each call also
//! says something about the `@match` patterns the script may declare.
//!
//! The pattern set belongs to the whole document, not to one parameter
//! list: a single condition that cannot be expressed as a glob freezes it
//! for good. That state lives in `TranslationContext`, which the caller
//! threads through every parameter list of the document.

use log::{debug, warn};

use us_core::error::{ConvertError, Result};
use us_core::types::{Condition, Diagnostic, MatchPatternSet};

use crate::escape::{escape_domain, escape_js_string, escape_regex_source, unescape_argument};

/// Byte index from which a `url-prefix` path separator is searched,
/// i.e. just past `https://`.
const PATH_SEARCH_START: usize = 8;

// =============================================================================
// Translation State
// =============================================================================

/// Document-wide state shared by every parameter list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationContext {
    pub patterns: MatchPatternSet,
    pub diagnostics: Vec<Diagnostic>,
}

impl TranslationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the match-pattern effect of one condition.
    pub fn apply(&mut self, condition: &Condition) {
        match condition {
            Condition::Domain(domain) => {
                self.patterns.add(format!("*://{domain}/*"));
                self.patterns.add(format!("*://*.{domain}/*"));
            }
            Condition::Url(url) => {
                self.patterns.add(url.as_str());
            }
            Condition::UrlPrefix(prefix) => match path_separator(prefix) {
                Some(pos) => self.patterns.add(format!("{}/*", &prefix[..pos])),
                None => self.freeze(
                    condition,
                    Diagnostic::UrlPrefixWithoutPath {
                        prefix: prefix.clone(),
                    },
                ),
            },
            Condition::Regexp(pattern) => self.freeze(
                condition,
                Diagnostic::RegexpCondition {
                    pattern: pattern.clone(),
                },
            ),
        }
    }

    fn freeze(&mut self, condition: &Condition, diagnostic: Diagnostic) {
        if self.patterns.freeze() {
            warn!("{condition} disables @match directives for the whole document");
        }
        self.diagnostics.push(diagnostic);
    }
}

/// First `/` at or after the scheme and host boundary.
fn path_separator(prefix: &str) -> Option<usize> {
    prefix
        .char_indices()
        .find(|&(pos, ch)| pos >= PATH_SEARCH_START && ch == '/')
        .map(|(pos, _)| pos)
}

// =============================================================================
// Translation
// =============================================================================

/// Result of translating one parameter list on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub conditions: Vec<Condition>,
    /// One JavaScript boolean expression per condition, in source order.
    pub checks: Vec<String>,
    pub patterns: MatchPatternSet,
    pub diagnostics: Vec<Diagnostic>,
}

impl Translation {
    /// The combined runtime check: the alternatives joined with `||`.
    pub fn expression(&self) -> String {
        expression(&self.conditions)
    }
}

/// Runtime checks for `conditions` joined with `||`.
pub fn expression(conditions: &[Condition]) -> String {
    conditions
        .iter()
        .map(runtime_check)
        .collect::<Vec<_>>()
        .join(" || ")
}

/// Translate a parameter list starting from a fresh context.
pub fn translate(params: &str) -> Result<Translation> {
    let mut ctx = TranslationContext::new();
    let conditions = translate_with(params, &mut ctx)?;
    let checks = conditions.iter().map(runtime_check).collect();
    Ok(Translation {
        conditions,
        checks,
        patterns: ctx.patterns,
        diagnostics: ctx.diagnostics,
    })
}

/// Translate a parameter list, folding its pattern effects into `ctx`.
///
/// Nothing is applied to `ctx` unless the whole list parses.
pub fn translate_with(params: &str, ctx: &mut TranslationContext) -> Result<Vec<Condition>> {
    let conditions = parse_conditions(params)?;
    for condition in &conditions {
        debug!("condition {condition} -> {}", runtime_check(condition));
        ctx.apply(condition);
    }
    Ok(conditions)
}

/// JavaScript expression that is true when the page satisfies `condition`.
pub fn runtime_check(condition: &Condition) -> String {
    match condition {
        Condition::Domain(domain) => format!(
            "/(?:^|\\.){}$/.test(domain)",
            escape_regex_source(&escape_domain(domain))
        ),
        Condition::Url(url) => format!("url === \"{}\"", escape_js_string(url)),
        Condition::UrlPrefix(prefix) => {
            format!("url.indexOf(\"{}\") === 0", escape_js_string(prefix))
        }
        Condition::Regexp(pattern) => {
            format!("/^(?:{})$/.test(url)", escape_regex_source(pattern))
        }
    }
}

// =============================================================================
// Parameter List Parsing
// =============================================================================

/// Parse a comma-separated list of matching-function calls.
pub fn parse_conditions(params: &str) -> Result<Vec<Condition>> {
    let mut cursor = ParamCursor::new(params);
    let mut conditions = Vec::new();

    cursor.skip_whitespace();
    if cursor.at_end() {
        return Err(cursor.error("empty condition list"));
    }

    loop {
        conditions.push(cursor.parse_call()?);
        cursor.skip_whitespace();
        if cursor.at_end() {
            break;
        }
        if !cursor.eat(',') {
            return Err(cursor.error("expected ',' between conditions"));
        }
        cursor.skip_whitespace();
        if cursor.at_end() {
            return Err(cursor.error("trailing ','"));
        }
    }

    Ok(conditions)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Function {
    Domain,
    Url,
    UrlPrefix,
    Regexp,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "domain" => Some(Self::Domain),
            "url" => Some(Self::Url),
            "url-prefix" => Some(Self::UrlPrefix),
            "regexp" => Some(Self::Regexp),
            _ => None,
        }
    }

    fn with_argument(self, arg: String) -> Condition {
        match self {
            Self::Domain => Condition::Domain(arg),
            Self::Url => Condition::Url(arg),
            Self::UrlPrefix => Condition::UrlPrefix(arg),
            Self::Regexp => Condition::Regexp(arg),
        }
    }
}

struct ParamCursor<'a> {
    params: &'a str,
    pos: usize,
}

impl<'a> ParamCursor<'a> {
    fn new(params: &'a str) -> Self {
        Self { params, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.params[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.params.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn error(&self, reason: impl Into<String>) -> ConvertError {
        ConvertError::InvalidUserstyle {
            params: self.params.to_string(),
            offset: self.pos,
            reason: reason.into(),
        }
    }

    fn parse_call(&mut self) -> Result<Condition> {
        let rest = self.rest();
        let name_len = rest
            .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '-'))
            .unwrap_or(rest.len());
        let name = &rest[..name_len];
        if name.is_empty() {
            return Err(self.error("expected a matching function"));
        }

        let function = Function::from_name(name)
            .ok_or_else(|| self.error(format!("unknown matching function `{name}`")))?;
        self.pos += name_len;

        self.skip_whitespace();
        if !self.eat('(') {
            return Err(self.error(format!("expected '(' after `{name}`")));
        }
        self.skip_whitespace();

        let arg = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let len = self
                    .rest()
                    .find(quote)
                    .ok_or_else(|| self.error("unterminated quoted argument"))?;
                let arg = unescape_argument(&self.rest()[..len]);
                self.pos += len + 1;
                self.skip_whitespace();
                if !self.eat(')') {
                    return Err(self.error("missing closing parenthesis"));
                }
                arg
            }
            _ if function == Function::Regexp => {
                return Err(self.error("regexp() argument must be quoted"));
            }
            _ => {
                let len = self
                    .rest()
                    .find(')')
                    .ok_or_else(|| self.error("missing closing parenthesis"))?;
                let arg = self.rest()[..len].trim().to_string();
                self.pos += len + 1;
                arg
            }
        };

        Ok(function.with_argument(arg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_yields_host_and_subdomain_patterns() {
        let translation = translate("domain(\"example.com\")").unwrap();
        assert_eq!(
            translation.patterns,
            MatchPatternSet::Open(vec![
                "*://example.com/*".to_string(),
                "*://*.example.com/*".to_string(),
            ])
        );
        assert_eq!(
            translation.expression(),
            r"/(?:^|\.)example\.com$/.test(domain)"
        );
        assert!(translation.diagnostics.is_empty());
    }

    #[test]
    fn url_prefix_with_path_truncates_at_first_separator() {
        let translation = translate("url-prefix(\"https://example.com/path\")").unwrap();
        assert_eq!(translation.patterns.patterns(), &["https://example.com/*"]);
        assert_eq!(
            translation.expression(),
            "url.indexOf(\"https://example.com/path\") === 0"
        );
    }

    #[test]
    fn url_prefix_without_path_freezes() {
        let translation = translate("url-prefix(\"http://b.com\")").unwrap();
        assert!(translation.patterns.is_frozen());
        assert_eq!(
            translation.diagnostics,
            vec![Diagnostic::UrlPrefixWithoutPath {
                prefix: "http://b.com".to_string()
            }]
        );
    }

    #[test]
    fn url_is_an_exact_comparison() {
        let translation = translate("url(\"https://a.com/\")").unwrap();
        assert_eq!(translation.expression(), "url === \"https://a.com/\"");
        assert_eq!(translation.patterns.patterns(), &["https://a.com/"]);
    }

    #[test]
    fn regexp_freezes_and_escapes_slashes() {
        let translation = translate(r#"regexp("https?://a\\.com/.*")"#).unwrap();
        assert!(translation.patterns.is_frozen());
        assert_eq!(
            translation.expression(),
            r"/^(?:https?:\/\/a\.com\/.*)$/.test(url)"
        );
        assert_eq!(
            translation.conditions,
            vec![Condition::Regexp(r"https?://a\.com/.*".to_string())]
        );
    }

    #[test]
    fn alternatives_are_joined_with_or() {
        let translation = translate("domain(\"a.com\"), url-prefix(\"http://b.com\")").unwrap();
        assert_eq!(translation.checks.len(), 2);
        assert_eq!(
            translation.expression(),
            r#"/(?:^|\.)a\.com$/.test(domain) || url.indexOf("http://b.com") === 0"#
        );
        assert!(translation.patterns.is_frozen());
    }

    #[test]
    fn expression_of_parsed_conditions_matches_translation() {
        let params = "url(\"https://a.com/\"), domain(b.com)";
        let conditions = parse_conditions(params).unwrap();
        assert_eq!(
            expression(&conditions),
            r#"url === "https://a.com/" || /(?:^|\.)b\.com$/.test(domain)"#
        );
        assert_eq!(expression(&conditions), translate(params).unwrap().expression());
        assert_eq!(expression(&[]), "");
    }

    #[test]
    fn frozen_context_stays_frozen_for_later_lists() {
        let mut ctx = TranslationContext::new();
        translate_with("regexp(\".*\")", &mut ctx).unwrap();
        translate_with("domain(\"a.com\")", &mut ctx).unwrap();
        assert!(ctx.patterns.is_frozen());
        assert_eq!(ctx.diagnostics.len(), 1);
    }

    #[test]
    fn accepts_unquoted_and_single_quoted_arguments() {
        let conditions =
            parse_conditions("  domain( a.com ) ,URL-PREFIX('https://b.com/x'),url(https://c.com/)")
                .unwrap();
        assert_eq!(
            conditions,
            vec![
                Condition::Domain("a.com".to_string()),
                Condition::UrlPrefix("https://b.com/x".to_string()),
                Condition::Url("https://c.com/".to_string()),
            ]
        );
    }

    #[test]
    fn escapes_quotes_in_runtime_strings() {
        let check = runtime_check(&Condition::Url("https://a.com/?q=\"x\"".to_string()));
        assert_eq!(check, r#"url === "https://a.com/?q=\"x\"""#);
    }

    fn reason(params: &str) -> String {
        match parse_conditions(params) {
            Err(ConvertError::InvalidUserstyle { reason, .. }) => reason,
            other => panic!("expected InvalidUserstyle, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_function() {
        assert_eq!(reason("host(\"a.com\")"), "unknown matching function `host`");
    }

    #[test]
    fn rejects_missing_closing_parenthesis() {
        assert_eq!(reason("domain(a.com"), "missing closing parenthesis");
        assert_eq!(reason("domain(\"a.com\""), "missing closing parenthesis");
    }

    #[test]
    fn rejects_malformed_lists() {
        assert_eq!(reason("   "), "empty condition list");
        assert_eq!(reason("domain(a.com),"), "trailing ','");
        assert_eq!(reason("domain(a.com) url(b)"), "expected ',' between conditions");
        assert_eq!(reason("regexp(.*)"), "regexp() argument must be quoted");
        assert_eq!(reason("url(\"abc)"), "unterminated quoted argument");
    }

    #[test]
    fn failed_list_leaves_context_untouched() {
        let mut ctx = TranslationContext::new();
        assert!(translate_with("domain(a.com), bogus(x)", &mut ctx).is_err());
        assert_eq!(ctx, TranslationContext::new());
    }
}
