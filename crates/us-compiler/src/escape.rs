//! String escaping for generated JavaScript.

/// Escape text for use inside a double-quoted JavaScript string literal.
pub fn escape_js_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(ch),
        }
    }
    out
}

/// Drop the backslash from every `\x` pair in a quoted CSS argument.
pub fn unescape_argument(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some(escaped) => out.push(escaped),
                None => out.push(ch),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Escape the dots of a host name so it matches literally in a regex.
pub fn escape_domain(domain: &str) -> String {
    domain.replace('.', "\\.")
}

/// Escape every unescaped `/` so the source fits between `/` delimiters.
///
/// Existing escape sequences are copied untouched, `\/` included.
pub fn escape_regex_source(source: &str) -> String {
    let mut out = String::with_capacity(source.len() + 8);
    let mut chars = source.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                out.push(ch);
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '/' => out.push_str("\\/"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_js_string_specials() {
        assert_eq!(escape_js_string(r#"a "b" \c"#), r#"a \"b\" \\c"#);
        assert_eq!(escape_js_string("x\r\n"), "x\\r\\n");
        assert_eq!(escape_js_string("a\u{2028}b"), "a\\u2028b");
    }

    #[test]
    fn unescapes_backslash_pairs() {
        assert_eq!(unescape_argument(r"^https?://a\\.com/\\d+$"), r"^https?://a\.com/\d+$");
        assert_eq!(unescape_argument(r"\'x\'"), "'x'");
        assert_eq!(unescape_argument("trailing\\"), "trailing\\");
    }

    #[test]
    fn escapes_domain_dots() {
        assert_eq!(escape_domain("www.example.com"), r"www\.example\.com");
    }

    #[test]
    fn escapes_only_unescaped_slashes() {
        assert_eq!(escape_regex_source("https://a.com/x"), r"https:\/\/a.com\/x");
        assert_eq!(escape_regex_source(r"a\/b/c"), r"a\/b\/c");
        assert_eq!(escape_regex_source(r"a\\/b"), r"a\\\/b");
        assert_eq!(escape_regex_source(r"\d+\.html"), r"\d+\.html");
    }
}
