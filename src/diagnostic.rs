//! Findings and the diagnostics built from them

use crate::rule::RuleCategory;
use crate::syntax::{NodeKind, SyntaxTree, TextRange};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity level for findings
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,
    /// Warning - potential issue
    #[default]
    Warning,
    /// Error - definite problem
    Error,
}

/// Fix safety classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixSafety {
    /// Preserves program meaning, can be applied automatically
    #[default]
    Safe,
    /// May change runtime behavior or public surface
    Unsafe,
}

impl std::fmt::Display for FixSafety {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FixSafety::Safe => write!(f, "safe"),
            FixSafety::Unsafe => write!(f, "unsafe"),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" | "hint" | "note" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" | "err" => Ok(Severity::Error),
            _ => Err(()),
        }
    }
}

/// Source location of a finding within the rendered document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub column: usize,
    /// Length of the highlighted region on the first line
    pub length: usize,
}

impl Location {
    /// Location of a span in a tree's canonical text
    pub fn from_span(tree: &SyntaxTree, span: TextRange) -> Self {
        let (line, column) = tree.line_col(span.start);
        let first_line = tree
            .slice(span)
            .split('\n')
            .next()
            .map(str::len)
            .unwrap_or_default();
        Self {
            start: span.start,
            end: span.end,
            line,
            column,
            length: first_line,
        }
    }

    pub fn span(&self) -> TextRange {
        TextRange::new(self.start, self.end)
    }
}

/// A rule match at a specific location
///
/// Findings refer to the tree only through their span, so they stay valid
/// after the tree they came from is replaced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    pub rule_id: String,
    pub severity: Severity,
    pub category: RuleCategory,
    pub message: String,
    pub location: Location,
    /// Kind of the node the finding is anchored on
    pub node_kind: NodeKind,
}

impl Finding {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

/// A finding reported for a file by the batch engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub file: PathBuf,
    #[serde(flatten)]
    pub finding: Finding,
    /// The source line (for display)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_line: Option<String>,
    /// Help text (usually the rule description)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// Whether a fixer is registered for the rule
    #[serde(default)]
    pub fixable: bool,
}

impl Diagnostic {
    pub fn new(file: PathBuf, finding: Finding) -> Self {
        Self {
            file,
            finding,
            source_line: None,
            help: None,
            fixable: false,
        }
    }

    /// Add source line for display
    pub fn with_source_line(mut self, line: &str) -> Self {
        self.source_line = Some(line.to_string());
        self
    }

    /// Add help text
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    pub fn with_fixable(mut self, fixable: bool) -> Self {
        self.fixable = fixable;
        self
    }

    pub fn rule_id(&self) -> &str {
        &self.finding.rule_id
    }

    pub fn severity(&self) -> Severity {
        self.finding.severity
    }

    pub fn is_error(&self) -> bool {
        self.finding.is_error()
    }

    pub fn is_warning(&self) -> bool {
        self.finding.is_warning()
    }
}
