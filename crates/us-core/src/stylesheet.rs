//! Top-level stylesheet structure
//!
//! The converter copies rules verbatim, so it only needs to know where each
//! rule starts and ends, plus the name and prelude of at-rules. `cssparser`
//! does the tokenizing and block matching; this module records the rule
//! boundaries and reports them as 1-based (line, column) spans whose end
//! points at the last character of the rule.
//!
//! Only `@-moz-document` blocks are descended into. Every other block is
//! treated as opaque text.

use std::fmt;

use cssparser::{
    BasicParseErrorKind, ParseError, ParseErrorKind, Parser, ParserInput, SourceLocation,
    SourcePosition, Token,
};
use log::debug;

use crate::error::{ConvertError, Result};

pub const MOZ_DOCUMENT: &str = "-moz-document";
pub const NAMESPACE: &str = "namespace";

// =============================================================================
// Document Model
// =============================================================================

/// A 1-based position; `column` counts characters within the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Start and end of a node, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpan {
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// `selector { ... }`
    Rule,
    /// `@name prelude;` or `@name prelude { ... }`
    AtRule,
    /// `/* ... */`
    Comment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    /// At-keyword without the leading `@`.
    pub name: Option<String>,
    /// At-rule prelude, trimmed.
    pub params: Option<String>,
    /// Rules inside an `@-moz-document` block; empty for every other node.
    pub children: Vec<Node>,
    pub span: SourceSpan,
}

impl Node {
    /// Whether this is an at-rule with the given name (ASCII case-insensitive).
    pub fn is_at_rule(&self, name: &str) -> bool {
        self.kind == NodeKind::AtRule
            && self
                .name
                .as_deref()
                .is_some_and(|own| own.eq_ignore_ascii_case(name))
    }
}

/// Parsed stylesheet: top-level nodes in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleDocument {
    pub nodes: Vec<Node>,
}

// =============================================================================
// Parsing
// =============================================================================

/// Split a stylesheet into its top-level rules.
pub fn parse_stylesheet(text: &str) -> Result<StyleDocument> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let raw_nodes = parse_rule_list(&mut parser).map_err(invalid_css)?;

    let mut locator = Locator::new(text);
    let nodes: Vec<Node> = raw_nodes
        .into_iter()
        .map(|raw| raw.into_node(&mut locator))
        .collect();

    debug!("parsed stylesheet: {} top-level nodes", nodes.len());
    Ok(StyleDocument { nodes })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SyntaxIssue {
    StrayToken(char),
    UnexpectedSemicolon,
    MissingBlock,
    UnclosedBlock,
    BadString,
    BadUrl,
}

impl fmt::Display for SyntaxIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StrayToken(ch) => write!(f, "unexpected '{ch}'"),
            Self::UnexpectedSemicolon => write!(f, "unexpected ';' before rule block"),
            Self::MissingBlock => write!(f, "expected '{{' before end of input"),
            Self::UnclosedBlock => write!(f, "unclosed block"),
            Self::BadString => write!(f, "unterminated string"),
            Self::BadUrl => write!(f, "malformed url()"),
        }
    }
}

type ParseResult<'i, T> = std::result::Result<T, ParseError<'i, SyntaxIssue>>;

fn syntax_error<'i>(location: SourceLocation, issue: SyntaxIssue) -> ParseError<'i, SyntaxIssue> {
    ParseError {
        kind: ParseErrorKind::Custom(issue),
        location,
    }
}

fn invalid_css(error: ParseError<'_, SyntaxIssue>) -> ConvertError {
    let message = match error.kind {
        ParseErrorKind::Custom(issue) => issue.to_string(),
        ParseErrorKind::Basic(BasicParseErrorKind::UnexpectedToken(token)) => {
            format!("unexpected token {token:?}")
        }
        ParseErrorKind::Basic(BasicParseErrorKind::EndOfInput) => {
            "unexpected end of input".to_string()
        }
        ParseErrorKind::Basic(_) => "invalid rule".to_string(),
    };
    ConvertError::InvalidCss {
        message,
        line: error.location.line + 1,
        column: error.location.column,
    }
}

/// Node boundaries as byte offsets, end exclusive.
struct RawNode {
    kind: NodeKind,
    name: Option<String>,
    params: Option<String>,
    children: Vec<RawNode>,
    start: usize,
    end: usize,
}

impl RawNode {
    fn leaf(kind: NodeKind, start: SourcePosition, end: SourcePosition) -> Self {
        Self {
            kind,
            name: None,
            params: None,
            children: Vec::new(),
            start: start.byte_index(),
            end: end.byte_index(),
        }
    }

    fn into_node(self, locator: &mut Locator<'_>) -> Node {
        let start = locator.locate(self.start);
        let children = self
            .children
            .into_iter()
            .map(|child| child.into_node(locator))
            .collect();
        let end = locator.locate_last_char(self.end);
        Node {
            kind: self.kind,
            name: self.name,
            params: self.params,
            children,
            span: SourceSpan { start, end },
        }
    }
}

fn parse_rule_list<'i, 't>(parser: &mut Parser<'i, 't>) -> ParseResult<'i, Vec<RawNode>> {
    let mut nodes = Vec::new();

    loop {
        let start = parser.position();
        let location = parser.current_source_location();
        let token = match parser.next_including_whitespace_and_comments().cloned() {
            Ok(token) => token,
            Err(_) => break,
        };

        match token {
            Token::WhiteSpace(_) | Token::CDO | Token::CDC => {}
            Token::Comment(_) => {
                nodes.push(RawNode::leaf(NodeKind::Comment, start, parser.position()));
            }
            Token::AtKeyword(name) => {
                nodes.push(parse_at_rule(parser, start, name.to_string())?);
            }
            other => {
                nodes.push(parse_qualified_rule(parser, start, location, other)?);
            }
        }
    }

    Ok(nodes)
}

fn parse_at_rule<'i, 't>(
    parser: &mut Parser<'i, 't>,
    start: SourcePosition,
    name: String,
) -> ParseResult<'i, RawNode> {
    let prelude_start = parser.position();
    let mut last_end = prelude_start;

    loop {
        let before = parser.position();
        let location = parser.current_source_location();
        let token = match parser.next_including_whitespace_and_comments().cloned() {
            Ok(token) => token,
            Err(_) => {
                // Statement at-rule cut short by the end of input or block.
                let params = parser.slice(prelude_start..last_end).trim().to_string();
                return Ok(RawNode {
                    kind: NodeKind::AtRule,
                    name: Some(name),
                    params: Some(params),
                    children: Vec::new(),
                    start: start.byte_index(),
                    end: last_end.byte_index(),
                });
            }
        };

        match token {
            Token::Semicolon => {
                let params = parser.slice(prelude_start..before).trim().to_string();
                return Ok(RawNode {
                    kind: NodeKind::AtRule,
                    name: Some(name),
                    params: Some(params),
                    children: Vec::new(),
                    start: start.byte_index(),
                    end: parser.position().byte_index(),
                });
            }
            Token::CurlyBracketBlock => {
                let params = parser.slice(prelude_start..before).trim().to_string();
                let children = if name.eq_ignore_ascii_case(MOZ_DOCUMENT) {
                    parser.parse_nested_block(|nested| parse_rule_list(nested))?
                } else {
                    skip_block(parser)?;
                    Vec::new()
                };
                let end = parser.position();
                expect_closed(parser, start, end)?;
                return Ok(RawNode {
                    kind: NodeKind::AtRule,
                    name: Some(name),
                    params: Some(params),
                    children,
                    start: start.byte_index(),
                    end: end.byte_index(),
                });
            }
            Token::BadString(_) => return Err(syntax_error(location, SyntaxIssue::BadString)),
            Token::BadUrl(_) => return Err(syntax_error(location, SyntaxIssue::BadUrl)),
            Token::CloseCurlyBracket => {
                return Err(syntax_error(location, SyntaxIssue::StrayToken('}')))
            }
            Token::WhiteSpace(_) => {}
            _ => last_end = parser.position(),
        }
    }
}

fn parse_qualified_rule<'i, 't>(
    parser: &mut Parser<'i, 't>,
    start: SourcePosition,
    first_location: SourceLocation,
    first: Token<'i>,
) -> ParseResult<'i, RawNode> {
    let mut token = first;
    let mut location = first_location;

    loop {
        match token {
            Token::CurlyBracketBlock => {
                skip_block(parser)?;
                let end = parser.position();
                expect_closed(parser, start, end)?;
                return Ok(RawNode::leaf(NodeKind::Rule, start, end));
            }
            Token::Semicolon => {
                return Err(syntax_error(location, SyntaxIssue::UnexpectedSemicolon))
            }
            Token::BadString(_) => return Err(syntax_error(location, SyntaxIssue::BadString)),
            Token::BadUrl(_) => return Err(syntax_error(location, SyntaxIssue::BadUrl)),
            Token::CloseCurlyBracket => {
                return Err(syntax_error(location, SyntaxIssue::StrayToken('}')))
            }
            Token::CloseParenthesis => {
                return Err(syntax_error(location, SyntaxIssue::StrayToken(')')))
            }
            Token::CloseSquareBracket => {
                return Err(syntax_error(location, SyntaxIssue::StrayToken(']')))
            }
            _ => {}
        }

        location = parser.current_source_location();
        token = match parser.next_including_whitespace_and_comments().cloned() {
            Ok(next) => next,
            Err(_) => return Err(syntax_error(location, SyntaxIssue::MissingBlock)),
        };
    }
}

fn skip_block<'i, 't>(parser: &mut Parser<'i, 't>) -> ParseResult<'i, ()> {
    parser.parse_nested_block(|nested| {
        while nested.next_including_whitespace_and_comments().is_ok() {}
        Ok(())
    })
}

/// `cssparser` closes blocks left open at end of input; reject those.
fn expect_closed<'i, 't>(
    parser: &Parser<'i, 't>,
    start: SourcePosition,
    end: SourcePosition,
) -> ParseResult<'i, ()> {
    if parser.slice(start..end).ends_with('}') {
        Ok(())
    } else {
        Err(syntax_error(
            parser.current_source_location(),
            SyntaxIssue::UnclosedBlock,
        ))
    }
}

// =============================================================================
// Byte Offset to Line/Column
// =============================================================================

/// Forward scanner turning byte offsets into 1-based positions.
struct Locator<'a> {
    text: &'a str,
    line: usize,
    line_start: usize,
}

impl<'a> Locator<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            line: 1,
            line_start: 0,
        }
    }

    fn locate(&mut self, offset: usize) -> Position {
        if offset < self.line_start {
            self.line = 1;
            self.line_start = 0;
        }
        while let Some(pos) = self.text[self.line_start..offset].find('\n') {
            self.line_start += pos + 1;
            self.line += 1;
        }
        let column = self.text[self.line_start..offset].chars().count() + 1;
        Position::new(self.line, column)
    }

    /// Position of the last character before `end`.
    fn locate_last_char(&mut self, end: usize) -> Position {
        let last = self.text[..end]
            .chars()
            .next_back()
            .map_or(end, |ch| end - ch.len_utf8());
        self.locate(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: (usize, usize), end: (usize, usize)) -> SourceSpan {
        SourceSpan {
            start: Position::new(start.0, start.1),
            end: Position::new(end.0, end.1),
        }
    }

    #[test]
    fn splits_top_level_rules() {
        let doc = parse_stylesheet("a { color: red; }\nb{}").unwrap();
        assert_eq!(doc.nodes.len(), 2);
        assert_eq!(doc.nodes[0].kind, NodeKind::Rule);
        assert_eq!(doc.nodes[0].span, span((1, 1), (1, 17)));
        assert_eq!(doc.nodes[1].span, span((2, 1), (2, 3)));
    }

    #[test]
    fn rules_with_declarations_keep_full_spans() {
        let css = "body { color: red; margin: 0 }\n@-moz-document url-prefix(\"https://a.com/\") {\n  p { color: blue; }\n}";
        let doc = parse_stylesheet(css).unwrap();
        assert_eq!(doc.nodes.len(), 2);
        assert_eq!(doc.nodes[0].kind, NodeKind::Rule);
        assert_eq!(doc.nodes[0].span, span((1, 1), (1, 30)));

        let moz = &doc.nodes[1];
        assert_eq!(moz.span, span((2, 1), (4, 1)));
        assert_eq!(moz.children.len(), 1);
        assert_eq!(moz.children[0].kind, NodeKind::Rule);
        assert_eq!(moz.children[0].span, span((3, 3), (3, 20)));
    }

    #[test]
    fn records_at_rule_name_and_params() {
        let doc = parse_stylesheet("@namespace url(http://www.w3.org/1999/xhtml);\n").unwrap();
        let node = &doc.nodes[0];
        assert!(node.is_at_rule(NAMESPACE));
        assert_eq!(node.params.as_deref(), Some("url(http://www.w3.org/1999/xhtml)"));
        assert_eq!(node.span, span((1, 1), (1, 45)));
    }

    #[test]
    fn descends_into_moz_document_only() {
        let css = "@-moz-document domain(\"example.com\") {\n  a { top: 0; }\n  b {}\n}\n@media print { c {} }";
        let doc = parse_stylesheet(css).unwrap();
        assert_eq!(doc.nodes.len(), 2);

        let moz = &doc.nodes[0];
        assert!(moz.is_at_rule(MOZ_DOCUMENT));
        assert_eq!(moz.params.as_deref(), Some("domain(\"example.com\")"));
        assert_eq!(moz.children.len(), 2);
        assert_eq!(moz.children[0].span, span((2, 3), (2, 15)));
        assert_eq!(moz.children[1].span, span((3, 3), (3, 6)));
        assert_eq!(moz.span, span((1, 1), (4, 1)));

        let media = &doc.nodes[1];
        assert!(media.is_at_rule("media"));
        assert!(media.children.is_empty());
    }

    #[test]
    fn keeps_comments_as_nodes() {
        let doc = parse_stylesheet("/* header */\na {}").unwrap();
        assert_eq!(doc.nodes[0].kind, NodeKind::Comment);
        assert_eq!(doc.nodes[0].span, span((1, 1), (1, 12)));
        assert_eq!(doc.nodes[1].kind, NodeKind::Rule);
    }

    #[test]
    fn statement_at_rule_may_end_at_end_of_input() {
        let doc = parse_stylesheet("@import \"x.css\"  ").unwrap();
        assert_eq!(doc.nodes[0].params.as_deref(), Some("\"x.css\""));
        assert_eq!(doc.nodes[0].span, span((1, 1), (1, 15)));
    }

    #[test]
    fn columns_count_characters() {
        let doc = parse_stylesheet("/* é */ a {}").unwrap();
        assert_eq!(doc.nodes[1].span, span((1, 9), (1, 12)));
    }

    #[test]
    fn rejects_stray_closing_brace() {
        let err = parse_stylesheet("a {}\n}").unwrap_err();
        assert!(matches!(err, ConvertError::InvalidCss { line: 2, .. }));
    }

    #[test]
    fn rejects_rule_without_block() {
        let err = parse_stylesheet("a { top: 0 }\nb").unwrap_err();
        assert!(matches!(err, ConvertError::InvalidCss { .. }));
    }

    #[test]
    fn rejects_unclosed_block() {
        let err = parse_stylesheet("a { color: red;").unwrap_err();
        match err {
            ConvertError::InvalidCss { message, .. } => assert_eq!(message, "unclosed block"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_declaration_at_top_level() {
        assert!(parse_stylesheet("color: red;").is_err());
    }
}
