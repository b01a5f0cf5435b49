//! Batch analysis of documents

use crate::config::{Config, ConfigError, PerFileIgnores};
use crate::diagnostic::{Diagnostic, Finding, Location, Severity};
use crate::dispatcher::{AnalysisOptions, CancellationToken, Dispatcher, RuleTiming};
use crate::document::Document;
use crate::registry::Registry;
use crate::rule::RuleCategory;
use crate::syntax::NodeKind;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Rule id of the diagnostic reported for documents that fail to load
pub const LOAD_ERROR: &str = "document-load-error";

/// Result of linting operation
#[derive(Debug, Default)]
pub struct LintResult {
    /// All diagnostics, in input file order
    pub diagnostics: Vec<Diagnostic>,

    pub files_processed: usize,

    pub files_with_errors: usize,

    pub files_with_warnings: usize,

    /// Files whose analysis was cut short by cancellation
    pub files_cancelled: usize,

    pub error_count: usize,

    pub warning_count: usize,

    pub info_count: usize,

    /// Rules that faulted on some document
    pub faulted_rules: Vec<String>,

    pub duration: Duration,

    /// Per-rule timing statistics (rule_id -> timing)
    pub rule_timings: HashMap<String, RuleTiming>,
}

impl LintResult {
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.warning_count > 0
    }

    pub fn is_clean(&self) -> bool {
        self.error_count == 0 && self.warning_count == 0
    }

    pub fn is_complete(&self) -> bool {
        self.files_cancelled == 0
    }

    /// Get exit code (0 = success, 1 = warnings, 2 = errors)
    pub fn exit_code(&self) -> i32 {
        if self.error_count > 0 {
            2
        } else if self.warning_count > 0 {
            1
        } else {
            0
        }
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity() {
            Severity::Error => self.error_count += 1,
            Severity::Warning => self.warning_count += 1,
            Severity::Info => self.info_count += 1,
        }
        self.diagnostics.push(diagnostic);
    }

    /// Merge another result into this one
    pub fn merge(&mut self, other: LintResult) {
        self.diagnostics.extend(other.diagnostics);
        self.files_processed += other.files_processed;
        self.files_with_errors += other.files_with_errors;
        self.files_with_warnings += other.files_with_warnings;
        self.files_cancelled += other.files_cancelled;
        self.error_count += other.error_count;
        self.warning_count += other.warning_count;
        self.info_count += other.info_count;

        for id in other.faulted_rules {
            if !self.faulted_rules.contains(&id) {
                self.faulted_rules.push(id);
            }
        }
        for (rule_id, timing) in other.rule_timings {
            self.rule_timings.entry(rule_id).or_default().merge(&timing);
        }
    }

    /// Rule timings sorted by total time (descending)
    pub fn sorted_timings(&self) -> Vec<(&str, &RuleTiming)> {
        let mut timings: Vec<_> = self
            .rule_timings
            .iter()
            .map(|(id, timing)| (id.as_str(), timing))
            .collect();
        timings.sort_by(|a, b| b.1.total_time.cmp(&a.1.total_time).then(a.0.cmp(b.0)));
        timings
    }

    /// Format timing statistics as a string
    pub fn format_timings(&self) -> String {
        let timings = self.sorted_timings();
        if timings.is_empty() {
            return "No timing data available".to_string();
        }

        let mut output = String::new();
        output.push_str("Rule Timing Statistics:\n");
        output.push_str(&format!(
            "{:<12} {:>12} {:>12} {:>10} {:>12}\n",
            "Rule ID", "Total", "Avg", "Evals", "Matches"
        ));
        output.push_str(&"-".repeat(62));
        output.push('\n');

        for (rule_id, timing) in timings {
            let total_ms = timing.total_time.as_secs_f64() * 1000.0;
            let avg_us = timing.avg_time().as_secs_f64() * 1_000_000.0;
            output.push_str(&format!(
                "{:<12} {:>10.2}ms {:>10.2}µs {:>10} {:>12}\n",
                rule_id, total_ms, avg_us, timing.evaluation_count, timing.match_count
            ));
        }
        output
    }
}

/// Runs the dispatcher over many documents and applies host-level filtering
pub struct Engine {
    config: Config,
    registry: Registry,
    options: AnalysisOptions,
    per_file: PerFileIgnores,
    cancel: CancellationToken,
}

impl Engine {
    pub fn new(config: Config, registry: Registry) -> Result<Self, ConfigError> {
        let per_file = config.per_file_ignores()?;
        let options = config.analysis_options();
        Ok(Self {
            config,
            registry,
            options,
            per_file,
            cancel: CancellationToken::new(),
        })
    }

    /// Collect per-rule timings
    pub fn with_timings(mut self, enabled: bool) -> Self {
        self.options = self.options.with_timings(enabled);
        self
    }

    /// Share a cancellation token with the caller
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Lint multiple files; diagnostics keep the order of `files`
    pub fn lint(&self, files: &[PathBuf]) -> LintResult {
        let start = Instant::now();

        let results: Vec<LintResult> = match self.pool() {
            Some(pool) => pool.install(|| files.par_iter().map(|f| self.lint_file(f)).collect()),
            None => files.iter().map(|f| self.lint_file(f)).collect(),
        };

        let mut combined = LintResult::default();
        for result in results {
            combined.merge(result);
        }
        combined.duration = start.elapsed();
        log::debug!(
            "linted {} files in {:?}",
            combined.files_processed,
            combined.duration
        );
        combined
    }

    fn pool(&self) -> Option<rayon::ThreadPool> {
        if !self.config.engine.parallel {
            return None;
        }
        let threads = match self.config.engine.jobs {
            0 => num_cpus::get(),
            jobs => jobs,
        };
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => Some(pool),
            Err(e) => {
                log::warn!("falling back to sequential analysis: {}", e);
                None
            }
        }
    }

    /// Lint a single document file
    pub fn lint_file(&self, path: &Path) -> LintResult {
        match Document::load(path) {
            Ok(document) => self.lint_document(path, &document),
            Err(e) => {
                log::debug!("failed to load {}: {}", path.display(), e);
                Self::load_failure(path, &e.to_string())
            }
        }
    }

    /// Lint an already loaded document, reported under `path`
    pub fn lint_document(&self, path: &Path, document: &Document) -> LintResult {
        let (tree, facts) = match document.open(self.config.engine.approximate_facts) {
            Ok(opened) => opened,
            Err(e) => return Self::load_failure(path, &e.to_string()),
        };

        let analysis = Dispatcher::new(&self.registry).analyze_with(&tree, &facts, &self.options, &self.cancel);
        log::debug!(
            "{}: {} nodes, {} findings",
            path.display(),
            analysis.nodes_visited,
            analysis.findings.len()
        );

        let mut result = LintResult {
            files_processed: 1,
            files_cancelled: usize::from(!analysis.is_complete()),
            faulted_rules: analysis.faulted_rules,
            rule_timings: analysis.timings,
            ..LintResult::default()
        };

        for finding in analysis.findings {
            let Some(rule) = self.registry.rule(&finding.rule_id) else {
                continue;
            };
            if !self.config.is_rule_enabled(rule.descriptor())
                || self.per_file.is_ignored(&finding.rule_id, path)
            {
                continue;
            }

            let mut diagnostic = Diagnostic::new(path.to_path_buf(), finding)
                .with_help(rule.descriptor().description)
                .with_fixable(self.registry.fixer_for(rule.id()).is_some());
            if let Some(line) = tree.line(diagnostic.finding.location.line) {
                diagnostic = diagnostic.with_source_line(line);
            }
            result.push(diagnostic);
        }

        result.files_with_errors = usize::from(result.has_errors());
        result.files_with_warnings = usize::from(result.has_warnings());
        result
    }

    fn load_failure(path: &Path, message: &str) -> LintResult {
        let finding = Finding {
            rule_id: LOAD_ERROR.to_string(),
            severity: Severity::Error,
            category: RuleCategory::Correctness,
            message: format!("Failed to load document: {}", message),
            location: Location::default(),
            node_kind: NodeKind::CompilationUnit,
        };
        let mut result = LintResult {
            files_processed: 1,
            files_with_errors: 1,
            ..LintResult::default()
        };
        result.push(Diagnostic::new(path.to_path_buf(), finding));
        result
    }
}
