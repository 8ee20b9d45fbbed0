//! Statement accumulation for the generated script body.

use crate::escape::escape_js_string;

pub const INDENT: &str = "    ";

/// Name of the string the generated script collects CSS into.
pub const CSS_ACCUMULATOR: &str = "cssText";

/// Collects indented statements; they are joined once, at build time.
#[derive(Debug, Clone, Default)]
pub struct CodeEmitter {
    statements: Vec<String>,
    indent_level: usize,
}

impl CodeEmitter {
    pub fn new(indent_level: usize) -> Self {
        Self {
            statements: Vec::new(),
            indent_level,
        }
    }

    pub fn emit(&mut self, text: impl AsRef<str>) {
        let mut line = INDENT.repeat(self.indent_level);
        line.push_str(text.as_ref());
        self.statements.push(line);
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn outdent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    /// Append verbatim CSS to the accumulator, one statement per non-blank line.
    ///
    /// Line terminators stay inside the string literals, so the accumulator
    /// ends up holding the original text minus its blank lines.
    pub fn emit_css(&mut self, css: &str) {
        for line in css.split_inclusive('\n') {
            if line.trim().is_empty() {
                continue;
            }
            self.emit(format!("{CSS_ACCUMULATOR} += \"{}\";", escape_js_string(line)));
        }
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn into_statements(self) -> Vec<String> {
        self.statements
    }
}
