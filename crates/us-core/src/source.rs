//! Source position resolution
//!
//! The CSS tokenizer reports rule boundaries as (line, column) pairs. The
//! converter copies rules into the output verbatim, so those pairs have to
//! be turned back into byte offsets. `SourceIndex` does that with a single
//! cursor that only moves forward through the text: resolving a position
//! costs the distance from the previous one, and the whole document is
//! indexed in linear time. Going back to an earlier line is not supported.

use crate::error::{ConvertError, Result};

/// Forward-only (line, column) to byte offset resolver over one text.
#[derive(Debug)]
pub struct SourceIndex<'a> {
    text: &'a str,
    /// Zero-based line the cursor sits on.
    current_line: usize,
    /// Byte offset of the first character of `current_line`.
    line_start: usize,
}

impl<'a> SourceIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            current_line: 0,
            line_start: 0,
        }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Resolve a zero-based (line, column) pair to a byte offset.
    ///
    /// Columns count characters, not bytes. A column equal to the line
    /// length resolves to the line terminator (or the end of the text).
    pub fn resolve(&mut self, line: usize, column: usize) -> Result<usize> {
        if line < self.current_line {
            return Err(ConvertError::NonMonotonicSourceQuery {
                requested: line,
                current: self.current_line,
            });
        }

        while self.current_line < line {
            match self.text[self.line_start..].find('\n') {
                Some(pos) => {
                    self.line_start += pos + 1;
                    self.current_line += 1;
                }
                None => return Err(ConvertError::OutOfRangeSourceSpan { line, column }),
            }
        }

        let line_text = self.current_line_text();
        if column == 0 {
            return Ok(self.line_start);
        }
        match line_text.char_indices().nth(column) {
            Some((offset, _)) => Ok(self.line_start + offset),
            None if line_text.chars().count() == column => Ok(self.line_start + line_text.len()),
            None => Err(ConvertError::OutOfRangeSourceSpan { line, column }),
        }
    }

    /// Slice the text between two zero-based positions, end character included.
    pub fn slice(
        &mut self,
        start_line: usize,
        start_column: usize,
        end_line: usize,
        end_column: usize,
    ) -> Result<&'a str> {
        let start = self.resolve(start_line, start_column)?;
        let end = self.resolve(end_line, end_column)?;
        let end = match self.text[end..].chars().next() {
            Some(ch) => end + ch.len_utf8(),
            None => end,
        };
        if start > end {
            return Err(ConvertError::OutOfRangeSourceSpan {
                line: start_line,
                column: start_column,
            });
        }
        Ok(&self.text[start..end])
    }

    fn current_line_text(&self) -> &'a str {
        let rest = &self.text[self.line_start..];
        match rest.find('\n') {
            Some(pos) => &rest[..pos],
            None => rest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_positions_on_successive_lines() {
        let text = "a {}\nb { color: red; }\nc {}";
        let mut index = SourceIndex::new(text);
        assert_eq!(index.resolve(0, 0).unwrap(), 0);
        assert_eq!(index.resolve(1, 2).unwrap(), 7);
        assert_eq!(index.resolve(2, 0).unwrap(), 23);
    }

    #[test]
    fn slice_includes_end_character() {
        let text = "a {}\nb { color: red; }\n";
        let mut index = SourceIndex::new(text);
        assert_eq!(index.slice(1, 0, 1, 16).unwrap(), "b { color: red; }");
    }

    #[test]
    fn slice_spans_multiple_lines() {
        let text = "x\ny {\n  top: 0;\n}\n";
        let mut index = SourceIndex::new(text);
        assert_eq!(index.slice(1, 0, 3, 0).unwrap(), "y {\n  top: 0;\n}");
    }

    #[test]
    fn same_line_can_be_resolved_repeatedly() {
        let text = "a{} b{}";
        let mut index = SourceIndex::new(text);
        assert_eq!(index.slice(0, 0, 0, 2).unwrap(), "a{}");
        assert_eq!(index.slice(0, 4, 0, 6).unwrap(), "b{}");
    }

    #[test]
    fn columns_count_characters() {
        let text = "/* é */ a {}";
        let mut index = SourceIndex::new(text);
        assert_eq!(index.slice(0, 8, 0, 11).unwrap(), "a {}");
    }

    #[test]
    fn multibyte_end_character_is_kept_whole() {
        let text = "ab→";
        let mut index = SourceIndex::new(text);
        assert_eq!(index.slice(0, 0, 0, 2).unwrap(), "ab→");
    }

    #[test]
    fn rejects_line_past_end() {
        let mut index = SourceIndex::new("a {}\n");
        assert_eq!(
            index.resolve(3, 0),
            Err(ConvertError::OutOfRangeSourceSpan { line: 3, column: 0 })
        );
    }

    #[test]
    fn rejects_column_past_end_of_line() {
        let mut index = SourceIndex::new("a {}\nb {}");
        assert!(matches!(
            index.resolve(0, 9),
            Err(ConvertError::OutOfRangeSourceSpan { .. })
        ));
    }

    #[test]
    fn rejects_backward_line_query() {
        let mut index = SourceIndex::new("a\nb\nc");
        index.resolve(2, 0).unwrap();
        assert_eq!(
            index.resolve(1, 0),
            Err(ConvertError::NonMonotonicSourceQuery { requested: 1, current: 2 })
        );
    }
}
