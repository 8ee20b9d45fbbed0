//! Userstyle Converter Core Library
//!
//! This crate holds the pieces of the converter that do not know anything
//! about the generated script: the error taxonomy, the stylesheet model
//! produced by the CSS tokenizer, and the source index used to slice the
//! original text back out of the reported spans.
//!
//! # Modules
//!
//! - `error`: Error type shared by every stage of the conversion
//! - `source`: Forward-only (line, column) to byte offset resolution
//! - `stylesheet`: Top-level rule structure built on `cssparser`
//! - `types`: Matching conditions, match-pattern sets and diagnostics

pub mod error;
pub mod source;
pub mod stylesheet;
pub mod types;

// Re-export commonly used types
pub use error::{ConvertError, Result};
pub use source::SourceIndex;
pub use stylesheet::{parse_stylesheet, Node, NodeKind, Position, SourceSpan, StyleDocument};
pub use types::{Condition, Diagnostic, MatchPatternSet};
