//! Userscript metadata
//!
//! The values written into the `// ==UserScript==` header. They come from
//! CLI flags, a JSON config file, or the wasm caller.

use serde::{Deserialize, Serialize};

pub const DEFAULT_NAMESPACE: &str = "userstyle";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScriptMetadata {
    pub name: Option<String>,
    pub namespace: String,
    pub author: Option<String>,
    pub homepage: Option<String>,
}

impl Default for ScriptMetadata {
    fn default() -> Self {
        Self {
            name: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
            author: None,
            homepage: None,
        }
    }
}

impl ScriptMetadata {
    /// Metadata from plain strings; empty strings mean "not set".
    pub fn new(name: &str, author: &str, homepage: &str) -> Self {
        Self {
            name: non_empty(name),
            author: non_empty(author),
            homepage: non_empty(homepage),
            ..Self::default()
        }
    }

    /// Overlay the fields that are set in `overrides`.
    pub fn merge(mut self, overrides: ScriptMetadata) -> Self {
        if overrides.name.is_some() {
            self.name = overrides.name;
        }
        if overrides.author.is_some() {
            self.author = overrides.author;
        }
        if overrides.homepage.is_some() {
            self.homepage = overrides.homepage;
        }
        if overrides.namespace != DEFAULT_NAMESPACE {
            self.namespace = overrides.namespace;
        }
        self
    }

    /// Header fields in output order, with unset or blank values left out.
    pub(crate) fn header_fields(&self) -> Vec<(&'static str, String)> {
        let namespace = sanitize(&self.namespace).unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        let mut fields = Vec::with_capacity(4);
        if let Some(name) = self.name.as_deref().and_then(sanitize) {
            fields.push(("name", name));
        }
        fields.push(("namespace", namespace));
        if let Some(author) = self.author.as_deref().and_then(sanitize) {
            fields.push(("author", author));
        }
        if let Some(homepage) = self.homepage.as_deref().and_then(sanitize) {
            fields.push(("homepage", homepage));
        }
        fields
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.trim().is_empty()).then(|| value.to_string())
}

/// Collapse line breaks so a value always stays on its header line.
fn sanitize(value: &str) -> Option<String> {
    let joined = value
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!joined.is_empty()).then_some(joined)
}
