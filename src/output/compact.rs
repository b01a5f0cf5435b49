//! Compact output formatter
//!
//! One line per diagnostic, minimal output for scripting.

use super::OutputFormatter;
use crate::diagnostic::Diagnostic;
use crate::engine::LintResult;

/// Compact one-line-per-finding formatter
pub struct CompactFormatter {
    pub show_severity: bool,
    pub show_rule: bool,
}

impl CompactFormatter {
    pub fn new() -> Self {
        Self {
            show_severity: true,
            show_rule: true,
        }
    }

    pub fn without_severity(mut self) -> Self {
        self.show_severity = false;
        self
    }

    pub fn without_rule(mut self) -> Self {
        self.show_rule = false;
        self
    }
}

impl Default for CompactFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for CompactFormatter {
    fn format(&self, result: &LintResult) -> String {
        let mut output = String::new();
        for diag in &result.diagnostics {
            output.push_str(&self.format_diagnostic(diag));
            output.push('\n');
        }
        output
    }

    fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        let location = &diagnostic.finding.location;
        let mut line = format!(
            "{}:{}:{}:",
            diagnostic.file.display(),
            location.line,
            location.column
        );
        if self.show_severity {
            line.push_str(&format!(" {}", diagnostic.severity()));
        }
        if self.show_rule {
            line.push_str(&format!(" [{}]", diagnostic.rule_id()));
        }
        line.push(' ');
        line.push_str(&diagnostic.finding.message);
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Severity;
    use crate::output::sample;

    #[test]
    fn test_compact_format() {
        let diag = sample("a.ast.json", 10, 5, "EX001", Severity::Error);
        assert_eq!(
            CompactFormatter::new().format_diagnostic(&diag),
            "a.ast.json:10:5: error [EX001] EX001 message"
        );
    }

    #[test]
    fn test_compact_minimal() {
        let formatter = CompactFormatter::new().without_severity().without_rule();
        let diag = sample("a.ast.json", 1, 1, "EX001", Severity::Error);
        assert_eq!(formatter.format_diagnostic(&diag), "a.ast.json:1:1: EX001 message");
    }

    #[test]
    fn test_compact_result() {
        let result = LintResult {
            diagnostics: vec![
                sample("a.ast.json", 1, 1, "EX001", Severity::Error),
                sample("a.ast.json", 2, 1, "EX004", Severity::Warning),
            ],
            ..Default::default()
        };
        assert_eq!(CompactFormatter::new().format(&result).lines().count(), 2);
    }
}
