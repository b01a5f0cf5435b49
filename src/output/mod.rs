//! Output formatters for lint results

mod compact;
mod json;
mod text;

pub use compact::CompactFormatter;
pub use json::JsonFormatter;
pub use text::TextFormatter;

use crate::diagnostic::Diagnostic;
use crate::engine::LintResult;

/// Output formatter trait
pub trait OutputFormatter: Send + Sync {
    /// Format the entire lint result
    fn format(&self, result: &LintResult) -> String;

    /// Format a single diagnostic
    fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String;
}

#[cfg(test)]
pub(crate) fn sample(file: &str, line: usize, column: usize, rule_id: &str, severity: crate::diagnostic::Severity) -> Diagnostic {
    use crate::diagnostic::{Finding, Location};
    use crate::rule::RuleCategory;
    use crate::syntax::NodeKind;

    let finding = Finding {
        rule_id: rule_id.to_string(),
        severity,
        category: RuleCategory::Suspicious,
        message: format!("{} message", rule_id),
        location: Location {
            start: 0,
            end: 5,
            line,
            column,
            length: 5,
        },
        node_kind: NodeKind::CatchClause,
    };
    Diagnostic::new(file.into(), finding)
}
