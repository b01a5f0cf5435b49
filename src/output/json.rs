//! JSON output formatter

use super::OutputFormatter;
use crate::diagnostic::Diagnostic;
use crate::engine::LintResult;
use serde::Serialize;

/// JSON formatter for machine-readable output
#[derive(Default)]
pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    fn render<T: Serialize>(&self, value: &T) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|e| {
            log::error!("failed to serialize output: {}", e);
            String::new()
        })
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    diagnostics: &'a [Diagnostic],
    summary: JsonSummary<'a>,
}

#[derive(Serialize)]
struct JsonSummary<'a> {
    files_processed: usize,
    files_with_errors: usize,
    files_with_warnings: usize,
    files_cancelled: usize,
    error_count: usize,
    warning_count: usize,
    info_count: usize,
    faulted_rules: &'a [String],
    duration_ms: u128,
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, result: &LintResult) -> String {
        self.render(&JsonOutput {
            diagnostics: &result.diagnostics,
            summary: JsonSummary {
                files_processed: result.files_processed,
                files_with_errors: result.files_with_errors,
                files_with_warnings: result.files_with_warnings,
                files_cancelled: result.files_cancelled,
                error_count: result.error_count,
                warning_count: result.warning_count,
                info_count: result.info_count,
                faulted_rules: &result.faulted_rules,
                duration_ms: result.duration.as_millis(),
            },
        })
    }

    fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        self.render(diagnostic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Severity;
    use crate::output::sample;

    #[test]
    fn test_json_format_diagnostic() {
        let formatter = JsonFormatter::new();
        let diag = sample("a.ast.json", 10, 5, "EX004", Severity::Warning);

        let output = formatter.format_diagnostic(&diag);
        assert!(output.contains("\"rule_id\":\"EX004\""));
        assert!(output.contains("\"severity\":\"warning\""));
        assert!(output.contains("\"category\":\"suspicious\""));
        assert!(output.contains("\"line\":10"));
        assert!(output.contains("\"node_kind\":\"catch_clause\""));

        let parsed: Diagnostic = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.finding, diag.finding);
    }

    #[test]
    fn test_json_format_result() {
        let formatter = JsonFormatter::new();
        let result = LintResult {
            files_processed: 5,
            error_count: 2,
            warning_count: 3,
            ..Default::default()
        };

        let output = formatter.format(&result);
        assert!(output.contains("\"files_processed\":5"));
        assert!(output.contains("\"error_count\":2"));
        assert!(output.contains("\"warning_count\":3"));
    }

    #[test]
    fn test_json_pretty() {
        let formatter = JsonFormatter::new().pretty();
        let diag = sample("a.ast.json", 1, 1, "EX004", Severity::Info);
        assert!(formatter.format_diagnostic(&diag).contains('\n'));
    }
}
