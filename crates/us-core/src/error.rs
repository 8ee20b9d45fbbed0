//! Error taxonomy for the conversion pipeline.

/// Error type for every stage of a userstyle conversion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    /// The stylesheet could not be tokenized into rules.
    #[error("Invalid CSS at {line}:{column}: {message}")]
    InvalidCss {
        message: String,
        line: u32,
        column: u32,
    },
    /// An `@-moz-document` parameter list is outside the supported grammar.
    #[error("Invalid userstyle condition `{params}` at offset {offset}: {reason}")]
    InvalidUserstyle {
        params: String,
        offset: usize,
        reason: String,
    },
    /// The parser reported a position that is not inside the text.
    #[error("Source position {line}:{column} is outside the input text")]
    OutOfRangeSourceSpan { line: usize, column: usize },
    /// A position on an earlier line was requested after a later one.
    #[error("Source line {requested} requested after line {current} was resolved")]
    NonMonotonicSourceQuery { requested: usize, current: usize },
    #[error("Builder has already consumed a stylesheet")]
    AlreadyConsumed,
    #[error("Builder has not consumed a stylesheet yet")]
    NotReady,
    #[error("Userscript has already been built")]
    AlreadyBuilt,
}

pub type Result<T> = std::result::Result<T, ConvertError>;
