//! Userscript assembly
//!
//! `UserscriptBuilder` walks the top-level rules of one stylesheet and turns
//! them into statements that append CSS to an accumulator string. Rules
//! inside `@-moz-document` blocks are wrapped in the runtime check derived
//! from the block's conditions; everything else is appended unconditionally.
//! `build` then puts the metadata header, a fixed preamble, those statements
//! and the `GM_addStyle` call together.
//!
//! A builder is single-use: `Empty -> Consumed -> Built`.

use std::mem;

use log::debug;
use serde::Serialize;

use us_core::error::{ConvertError, Result};
use us_core::source::SourceIndex;
use us_core::stylesheet::{parse_stylesheet, Node, NodeKind, Position, MOZ_DOCUMENT, NAMESPACE};
use us_core::types::{Diagnostic, MatchPatternSet};

use crate::condition::{runtime_check, translate_with, TranslationContext};
use crate::emitter::{CodeEmitter, CSS_ACCUMULATOR, INDENT};
use crate::metadata::ScriptMetadata;

const HEADER_OPEN: &str = "// ==UserScript==";
const HEADER_CLOSE: &str = "// ==/UserScript==";
const HEADER_KEY_WIDTH: usize = 15;
const RUN_AT: &str = "document-start";
const STYLE_GRANT: &str = "GM_addStyle";

/// Converted script together with what went into its header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Userscript {
    pub text: String,
    pub match_patterns: MatchPatternSet,
    pub diagnostics: Vec<Diagnostic>,
}

impl Userscript {
    /// True when the script carries no `@match` lines and runs on every page.
    pub fn runs_everywhere(&self) -> bool {
        self.match_patterns.patterns().is_empty()
    }
}

#[derive(Debug, Default)]
enum BuilderState {
    #[default]
    Empty,
    Consumed(Program),
    Built,
    Failed,
}

#[derive(Debug)]
struct Program {
    statements: Vec<String>,
    patterns: MatchPatternSet,
    diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Default)]
pub struct UserscriptBuilder {
    state: BuilderState,
}

impl UserscriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate one stylesheet. Valid once, on a fresh builder.
    ///
    /// On error the builder is left unusable; nothing partial is kept.
    pub fn consume(&mut self, raw: &str) -> Result<()> {
        if !matches!(self.state, BuilderState::Empty) {
            return Err(ConvertError::AlreadyConsumed);
        }

        match compile_program(raw) {
            Ok(program) => {
                self.state = BuilderState::Consumed(program);
                Ok(())
            }
            Err(err) => {
                self.state = BuilderState::Failed;
                Err(err)
            }
        }
    }

    /// Assemble the final script. Valid once, after a successful `consume`.
    pub fn build(&mut self, metadata: &ScriptMetadata) -> Result<Userscript> {
        match mem::replace(&mut self.state, BuilderState::Built) {
            BuilderState::Consumed(program) => Ok(assemble(program, metadata)),
            BuilderState::Built => Err(ConvertError::AlreadyBuilt),
            other => {
                self.state = other;
                Err(ConvertError::NotReady)
            }
        }
    }
}

/// Run the whole `consume` / `build` cycle on one stylesheet.
pub fn convert_userstyle(raw: &str, metadata: &ScriptMetadata) -> Result<Userscript> {
    let mut builder = UserscriptBuilder::new();
    builder.consume(raw)?;
    builder.build(metadata)
}

// =============================================================================
// Traversal
// =============================================================================

/// How a top-level node is handled.
enum TopLevel<'a> {
    Namespace(&'a Node),
    MozDocument { params: &'a str, children: &'a [Node] },
    Other(&'a Node),
}

impl<'a> TopLevel<'a> {
    fn classify(node: &'a Node) -> Self {
        match node.kind {
            NodeKind::AtRule if node.is_at_rule(NAMESPACE) => Self::Namespace(node),
            NodeKind::AtRule if node.is_at_rule(MOZ_DOCUMENT) => Self::MozDocument {
                params: node.params.as_deref().unwrap_or_default(),
                children: &node.children,
            },
            _ => Self::Other(node),
        }
    }
}

fn compile_program(raw: &str) -> Result<Program> {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let document = parse_stylesheet(text)?;

    let mut index = SourceIndex::new(text);
    let mut ctx = TranslationContext::new();
    let mut emitter = CodeEmitter::new(1);

    for node in &document.nodes {
        match TopLevel::classify(node) {
            TopLevel::Namespace(node) => {
                debug!("namespace at line {}", node.span.start.line);
                emit_node(&mut emitter, &mut index, node)?;
            }
            TopLevel::MozDocument { params, children } => {
                debug!(
                    "@-moz-document at line {} with {} rules",
                    node.span.start.line,
                    children.len()
                );
                emit_moz_document(&mut emitter, &mut index, &mut ctx, params, children)?;
            }
            TopLevel::Other(node) => emit_node(&mut emitter, &mut index, node)?,
        }
    }

    Ok(Program {
        statements: emitter.into_statements(),
        patterns: ctx.patterns,
        diagnostics: ctx.diagnostics,
    })
}

fn emit_node(emitter: &mut CodeEmitter, index: &mut SourceIndex<'_>, node: &Node) -> Result<()> {
    let text = slice_source(index, node.span.start, node.span.end)?;
    emitter.emit_css(text);
    Ok(())
}

fn emit_moz_document(
    emitter: &mut CodeEmitter,
    index: &mut SourceIndex<'_>,
    ctx: &mut TranslationContext,
    params: &str,
    children: &[Node],
) -> Result<()> {
    let conditions = translate_with(params, ctx)?;

    emitter.emit("if (");
    emitter.indent();
    let last = conditions.len().saturating_sub(1);
    for (i, condition) in conditions.iter().enumerate() {
        let check = runtime_check(condition);
        if i < last {
            emitter.emit(format!("{check} ||"));
        } else {
            emitter.emit(check);
        }
    }
    emitter.outdent();
    emitter.emit(") {");
    emitter.indent();
    if let (Some(first), Some(last)) = (children.first(), children.last()) {
        let text = slice_source(index, first.span.start, last.span.end)?;
        emitter.emit_css(text);
    }
    emitter.outdent();
    emitter.emit("}");
    Ok(())
}

/// Slice between two 1-based parser positions, end included.
fn slice_source<'a>(
    index: &mut SourceIndex<'a>,
    start: Position,
    end: Position,
) -> Result<&'a str> {
    let (start_line, start_column) = zero_based(start)?;
    let (end_line, end_column) = zero_based(end)?;
    index.slice(start_line, start_column, end_line, end_column)
}

fn zero_based(position: Position) -> Result<(usize, usize)> {
    match (position.line.checked_sub(1), position.column.checked_sub(1)) {
        (Some(line), Some(column)) => Ok((line, column)),
        _ => Err(ConvertError::OutOfRangeSourceSpan {
            line: position.line,
            column: position.column,
        }),
    }
}

// =============================================================================
// Assembly
// =============================================================================

fn assemble(program: Program, metadata: &ScriptMetadata) -> Userscript {
    let mut lines: Vec<String> = Vec::with_capacity(program.statements.len() + 24);

    lines.push(HEADER_OPEN.to_string());
    for (key, value) in metadata.header_fields() {
        lines.push(header_line(key, &value));
    }
    lines.push(header_line("run-at", RUN_AT));
    lines.push(header_line("grant", STYLE_GRANT));
    for pattern in program.patterns.patterns() {
        lines.push(header_line("match", pattern));
    }
    lines.push(HEADER_CLOSE.to_string());

    lines.push("(function() {".to_string());
    lines.push(format!("{INDENT}var domain = window.location.hostname;"));
    lines.push(format!("{INDENT}var url = window.location.href;"));
    lines.push(format!("{INDENT}var {CSS_ACCUMULATOR} = '';"));

    lines.extend(program.statements);

    lines.push(format!("{INDENT}if ({CSS_ACCUMULATOR}.length > 0) {{"));
    lines.push(format!("{INDENT}{INDENT}{STYLE_GRANT}({CSS_ACCUMULATOR});"));
    lines.push(format!("{INDENT}}}"));
    lines.push("})();".to_string());

    let mut text = lines.join("\n");
    text.push('\n');

    Userscript {
        text,
        match_patterns: program.patterns,
        diagnostics: program.diagnostics,
    }
}

fn header_line(key: &str, value: &str) -> String {
    let key = format!("@{key}");
    format!("// {key:<width$}{value}", width = HEADER_KEY_WIDTH)
}
