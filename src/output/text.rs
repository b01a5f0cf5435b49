//! Human-readable text output formatter

use super::OutputFormatter;
use crate::diagnostic::{Diagnostic, Severity};
use crate::engine::LintResult;
use colored::*;
use std::path::Path;

/// Text formatter with optional color support
pub struct TextFormatter {
    pub colored: bool,

    /// Show the offending source line with an underline
    pub show_source: bool,

    /// Show the rule description
    pub show_help: bool,

    pub show_stats: bool,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self {
            colored: true,
            show_source: true,
            show_help: false,
            show_stats: true,
        }
    }
}

impl TextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_color(mut self) -> Self {
        self.colored = false;
        self
    }

    pub fn with_help(mut self, show: bool) -> Self {
        self.show_help = show;
        self
    }

    pub fn with_stats(mut self, show: bool) -> Self {
        self.show_stats = show;
        self
    }

    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.colored {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn severity_str(&self, severity: Severity) -> String {
        let s = severity.to_string();
        match severity {
            Severity::Error => self.paint(&s, |t| t.red().bold()),
            Severity::Warning => self.paint(&s, |t| t.yellow().bold()),
            Severity::Info => self.paint(&s, |t| t.blue()),
        }
    }

    fn count(&self, n: usize, singular: &str, plural: &str, style: fn(&str) -> ColoredString) -> Option<String> {
        (n > 0).then(|| self.paint(&format!("{} {}", n, if n == 1 { singular } else { plural }), style))
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, result: &LintResult) -> String {
        let mut output = String::new();

        // group by file, keeping the order files were given in
        let mut by_file: Vec<(&Path, Vec<&Diagnostic>)> = Vec::new();
        for diag in &result.diagnostics {
            match by_file.last_mut() {
                Some((file, group)) if *file == diag.file.as_path() => group.push(diag),
                _ => by_file.push((diag.file.as_path(), vec![diag])),
            }
        }

        for (file, diagnostics) in &by_file {
            output.push_str(&self.paint(&file.display().to_string(), |t| t.underline()));
            output.push('\n');
            for diag in diagnostics {
                output.push_str(&self.format_diagnostic(diag));
                output.push('\n');
            }
        }

        if !self.show_stats {
            return output;
        }

        output.push_str(&format!(
            "\n{} {} processed",
            result.files_processed,
            if result.files_processed == 1 { "file" } else { "files" }
        ));
        let counts: Vec<String> = [
            self.count(result.error_count, "error", "errors", |t| t.red()),
            self.count(result.warning_count, "warning", "warnings", |t| t.yellow()),
            self.count(result.info_count, "info", "infos", |t| t.blue()),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !counts.is_empty() {
            output.push_str(&format!(": {}", counts.join(", ")));
        }
        output.push('\n');

        if !result.is_complete() {
            output.push_str(&self.paint(
                &format!("{} file(s) cancelled before analysis finished\n", result.files_cancelled),
                |t| t.yellow(),
            ));
        }
        if !result.faulted_rules.is_empty() {
            output.push_str(&self.paint(
                &format!("Rules that faulted: {}\n", result.faulted_rules.join(", ")),
                |t| t.red(),
            ));
        }
        output.push_str(&format!("Finished in {:.2}s\n", result.duration.as_secs_f64()));
        output
    }

    fn format_diagnostic(&self, diag: &Diagnostic) -> String {
        let location = &diag.finding.location;
        let mut output = format!(
            "{}:{}:{}: {}[{}]: {}\n",
            diag.file.display(),
            location.line,
            location.column,
            self.severity_str(diag.severity()),
            self.paint(diag.rule_id(), |t| t.cyan()),
            diag.finding.message
        );

        let bar = self.paint("|", |t| t.blue());
        if self.show_source {
            if let Some(source) = &diag.source_line {
                let line_num = self.paint(&format!("{:>4}", location.line), |t| t.blue());
                output.push_str(&format!("   {}\n", bar));
                output.push_str(&format!("{} {} {}\n", line_num, bar, source));
                if location.column > 0 {
                    let padding = " ".repeat(location.column - 1);
                    let underline = "^".repeat(location.length.max(1));
                    output.push_str(&format!(
                        "   {} {}{}\n",
                        bar,
                        padding,
                        self.paint(&underline, |t| t.red())
                    ));
                }
            }
        }

        if self.show_help {
            if let Some(help) = &diag.help {
                output.push_str(&format!("   {} help: {}\n", self.paint("=", |t| t.blue()), help));
            }
        }
        if diag.fixable {
            output.push_str(&format!(
                "   {} fix: available with `exlint fix --rule {}`\n",
                self.paint("=", |t| t.green()),
                diag.rule_id()
            ));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::sample;

    #[test]
    fn test_format_diagnostic() {
        let formatter = TextFormatter::new().without_color().with_help(true);
        let diag = sample("a.ast.json", 3, 3, "EX004", Severity::Warning)
            .with_source_line("} catch (Exception) { }")
            .with_help("An empty catch block hides failures.");

        let output = formatter.format_diagnostic(&diag);
        assert!(output.starts_with("a.ast.json:3:3: warning[EX004]: EX004 message\n"));
        assert!(output.contains("   3 | } catch (Exception) { }\n"));
        assert!(output.contains("   |   ^^^^^\n"));
        assert!(output.contains("help: An empty catch block hides failures."));
        assert!(!output.contains("fix:"));
    }

    #[test]
    fn test_fixable_hint() {
        let formatter = TextFormatter::new().without_color();
        let diag = sample("a.ast.json", 1, 1, "EX002", Severity::Warning).with_fixable(true);
        assert!(formatter
            .format_diagnostic(&diag)
            .contains("fix: available with `exlint fix --rule EX002`"));
    }

    #[test]
    fn test_format_result() {
        let formatter = TextFormatter::new().without_color();
        let result = LintResult {
            diagnostics: vec![
                sample("b.ast.json", 1, 1, "EX004", Severity::Warning),
                sample("b.ast.json", 2, 1, "EX001", Severity::Error),
                sample("a.ast.json", 1, 1, "EX019", Severity::Info),
            ],
            files_processed: 2,
            error_count: 1,
            warning_count: 1,
            info_count: 1,
            ..Default::default()
        };

        let output = formatter.format(&result);
        let b = output.find("b.ast.json\n").unwrap();
        let a = output.find("a.ast.json\n").unwrap();
        assert!(b < a);
        assert!(output.contains("2 files processed: 1 error, 1 warning, 1 info"));
    }

    #[test]
    fn test_incomplete_result() {
        let formatter = TextFormatter::new().without_color();
        let result = LintResult {
            files_processed: 1,
            files_cancelled: 1,
            faulted_rules: vec!["EX009".to_string()],
            ..Default::default()
        };
        let output = formatter.format(&result);
        assert!(output.contains("1 file(s) cancelled"));
        assert!(output.contains("Rules that faulted: EX009"));
    }
}
