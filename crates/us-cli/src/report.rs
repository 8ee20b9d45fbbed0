use serde::Serialize;

use us_compiler::{expression, translate_with, TranslationContext};
use us_core::stylesheet::{parse_stylesheet, NodeKind, MOZ_DOCUMENT, NAMESPACE};
use us_core::types::{Diagnostic, MatchPatternSet};
use us_core::ConvertError;

#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub rules: usize,
    pub at_rules: usize,
    pub comments: usize,
    pub namespaces: usize,
    pub documents: Vec<DocumentBlock>,
    pub match_patterns: MatchPatternSet,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentBlock {
    pub line: usize,
    pub params: String,
    pub expression: String,
    pub rules: usize,
}

pub fn inspect(css: &str) -> Result<InspectReport, ConvertError> {
    let css = css.strip_prefix('\u{feff}').unwrap_or(css);
    let document = parse_stylesheet(css)?;
    let mut ctx = TranslationContext::new();

    let mut report = InspectReport {
        rules: 0,
        at_rules: 0,
        comments: 0,
        namespaces: 0,
        documents: Vec::new(),
        match_patterns: MatchPatternSet::new(),
        diagnostics: Vec::new(),
    };

    for node in &document.nodes {
        match node.kind {
            NodeKind::Rule => report.rules += 1,
            NodeKind::Comment => report.comments += 1,
            NodeKind::AtRule => report.at_rules += 1,
        }
        if node.is_at_rule(NAMESPACE) {
            report.namespaces += 1;
        } else if node.is_at_rule(MOZ_DOCUMENT) {
            let params = node.params.clone().unwrap_or_default();
            let conditions = translate_with(&params, &mut ctx)?;
            report.documents.push(DocumentBlock {
                line: node.span.start.line,
                params,
                expression: expression(&conditions),
                rules: node
                    .children
                    .iter()
                    .filter(|child| child.kind != NodeKind::Comment)
                    .count(),
            });
        }
    }

    report.match_patterns = ctx.patterns;
    report.diagnostics = ctx.diagnostics;
    Ok(report)
}

pub fn print_report(input: &str, report: &InspectReport) {
    println!("Userstyle: {}", input);
    println!("  Rules:       {}", report.rules);
    println!(
        "  At-rules:    {} ({} @namespace, {} @-moz-document)",
        report.at_rules,
        report.namespaces,
        report.documents.len()
    );
    println!("  Comments:    {}", report.comments);
    println!();

    for block in &report.documents {
        println!("@-moz-document on line {} ({} rules)", block.line, block.rules);
        println!("  Params:      {}", block.params);
        println!("  Check:       {}", block.expression);
    }
    if !report.documents.is_empty() {
        println!();
    }

    println!("Match patterns:");
    if report.match_patterns.is_frozen() {
        println!("  (none - the script runs on every page)");
    } else if report.match_patterns.patterns().is_empty() {
        println!("  (none - no @-moz-document blocks, the script runs on every page)");
    } else {
        for pattern in report.match_patterns.patterns() {
            println!("  {}", pattern);
        }
    }

    if !report.diagnostics.is_empty() {
        println!();
        println!("Diagnostics:");
        for diagnostic in &report.diagnostics {
            println!("  {}", diagnostic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_nodes_and_collects_blocks() {
        let css = "@namespace url(http://www.w3.org/1999/xhtml);\n/* c */\na {}\n\
                   @-moz-document domain(\"a.com\") {\n  b {}\n  /* x */\n  c {}\n}\n";
        let report = inspect(css).unwrap();
        assert_eq!(report.rules, 1);
        assert_eq!(report.comments, 1);
        assert_eq!(report.at_rules, 2);
        assert_eq!(report.namespaces, 1);
        assert_eq!(report.documents.len(), 1);
        assert_eq!(report.documents[0].line, 4);
        assert_eq!(report.documents[0].rules, 2);
        assert_eq!(report.documents[0].expression, r"/(?:^|\.)a\.com$/.test(domain)");
        assert_eq!(
            report.match_patterns.patterns(),
            &["*://a.com/*", "*://*.a.com/*"]
        );
    }

    #[test]
    fn serializes_frozen_state() {
        let report = inspect("@-moz-document regexp(\".*\") { a {} }").unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["match_patterns"]["state"], "frozen");
        assert_eq!(json["diagnostics"][0]["kind"], "regexp_condition");
    }
}
