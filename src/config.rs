//! Configuration for the batch engine and the CLI
//!
//! Reads configuration from:
//! - `.exlintrc.yaml` / `.exlintrc.yml` / `.exlintrc.json` (project-level)
//! - the same names in the home directory (user-level)
//!
//! Enablement and per-file filtering are applied by the engine around the
//! dispatcher; severity overrides are handed to the dispatcher itself.

use crate::diagnostic::Severity;
use crate::dispatcher::AnalysisOptions;
use crate::rule::{RuleCategory, RuleDescriptor};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_NAMES: &[&str] = &[".exlintrc.yaml", ".exlintrc.yml", ".exlintrc.json"];

const MAX_EXTENDS_DEPTH: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Analyze documents in parallel
    pub parallel: bool,

    /// Number of parallel jobs (0 = auto-detect)
    pub jobs: usize,

    /// Resolve facts by name for documents that ship none
    pub approximate_facts: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            jobs: 0,
            approximate_facts: true,
        }
    }
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub color: ColorMode,
    pub verbose: bool,
    pub statistics: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            color: ColorMode::Auto,
            verbose: false,
            statistics: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Compact,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "compact" => Ok(OutputFormat::Compact),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

/// Which documents a directory walk picks up
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            include: vec![
                "**/*.ast.json".to_string(),
                "**/*.ast.yaml".to_string(),
                "**/*.ast.yml".to_string(),
            ],
            exclude: vec!["**/target/**".to_string(), "**/node_modules/**".to_string()],
        }
    }
}

impl FilesConfig {
    /// Compile include and exclude patterns
    pub fn matcher(&self) -> Result<FileMatcher, ConfigError> {
        Ok(FileMatcher {
            include: glob_set(&self.include)?,
            exclude: glob_set(&self.exclude)?,
        })
    }
}

fn glob_set(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| ConfigError::Invalid(format!("bad glob '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| ConfigError::Invalid(format!("bad glob set: {}", e)))
}

/// Compiled [`FilesConfig`]
pub struct FileMatcher {
    include: GlobSet,
    exclude: GlobSet,
}

impl FileMatcher {
    pub fn is_match(&self, path: &Path) -> bool {
        self.include.is_match(path) && !self.exclude.is_match(path)
    }

    /// Expand globs and walk directories into a list of documents
    ///
    /// Directory walks keep only matching documents; explicit files and
    /// globs are taken as given. Each document appears once, at its first
    /// position, however many arguments name it.
    pub fn collect(&self, patterns: &[String]) -> Result<Vec<PathBuf>, ConfigError> {
        let mut files = Vec::new();
        let mut seen = HashSet::new();
        let mut add = |entry: PathBuf, files: &mut Vec<PathBuf>| {
            let key = entry.canonicalize().unwrap_or_else(|_| entry.clone());
            if seen.insert(key) {
                files.push(entry);
            }
        };

        for pattern in patterns {
            if Path::new(pattern).is_dir() {
                let walk = format!("{}/**/*", pattern.trim_end_matches('/'));
                for entry in expand(&walk)? {
                    if self.is_match(&entry) {
                        add(entry, &mut files);
                    }
                }
                continue;
            }

            let matched = expand(pattern)?;
            if matched.is_empty() {
                log::warn!("'{}' matched no documents", pattern);
            }
            for entry in matched {
                add(entry, &mut files);
            }
        }
        Ok(files)
    }
}

fn expand(pattern: &str) -> Result<Vec<PathBuf>, ConfigError> {
    let paths = glob::glob(pattern)
        .map_err(|e| ConfigError::Invalid(format!("bad pattern '{}': {}", pattern, e)))?;
    Ok(paths.flatten().filter(|p| p.is_file()).collect())
}

/// Rule configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Disabled rules
    pub disabled: Vec<String>,

    /// Enabled rules (empty = all)
    pub enabled: Vec<String>,

    /// Ignore rules by id prefix (e.g. "EX01" ignores EX010 through EX019)
    pub ignore: Vec<String>,

    /// Severity overrides (rule_id -> severity)
    pub severity: HashMap<String, Severity>,

    /// Per-file rule ignores (glob pattern -> rule ids, or "all")
    pub per_file: HashMap<String, Vec<String>>,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Presets or config files this one builds on
    pub extends: Vec<String>,

    pub engine: EngineConfig,

    pub output: OutputConfig,

    pub files: FilesConfig,

    pub rules: RulesConfig,

    /// Rule categories to run (empty = all)
    pub categories: Vec<RuleCategory>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a preset configuration by name
    pub fn preset(name: &str) -> Option<Self> {
        use RuleCategory::*;
        let categories = match name {
            "recommended" => vec![Correctness, Suspicious, Usage, Design, Logging],
            "strict" => Vec::new(),
            "minimal" => vec![Correctness],
            _ => return None,
        };
        Some(Self {
            categories,
            ..Self::default()
        })
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_depth(path, 0)
    }

    fn load_with_depth(path: &Path, depth: usize) -> Result<Self, ConfigError> {
        if depth >= MAX_EXTENDS_DEPTH {
            return Err(ConfigError::Invalid(
                "Maximum config inheritance depth exceeded".to_string(),
            ));
        }

        let content = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config: Self = match ext {
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "Unknown config file format: {}",
                    ext
                )))
            }
        };
        if config.extends.is_empty() {
            return Ok(config);
        }

        let base_dir = path.parent().unwrap_or(Path::new("."));
        let mut base = Self::default();
        for extend in &config.extends {
            let extended = match Self::preset(extend) {
                Some(preset) => preset,
                None => {
                    let extend_path = if Path::new(extend).is_absolute() {
                        PathBuf::from(extend)
                    } else {
                        base_dir.join(extend)
                    };
                    Self::load_with_depth(&extend_path, depth + 1)?
                }
            };
            base.merge(extended);
        }
        base.merge(config);
        Ok(base)
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Self) {
        if other.engine.jobs != 0 {
            self.engine.jobs = other.engine.jobs;
        }
        self.engine.parallel = other.engine.parallel;
        self.engine.approximate_facts = other.engine.approximate_facts;

        if other.output.format != OutputFormat::Text {
            self.output.format = other.output.format;
        }
        if other.output.color != ColorMode::Auto {
            self.output.color = other.output.color;
        }
        if other.output.verbose {
            self.output.verbose = true;
        }
        self.output.statistics = other.output.statistics;

        self.files.include.extend(other.files.include);
        self.files.include.dedup();
        self.files.exclude.extend(other.files.exclude);
        self.files.exclude.dedup();

        self.rules.disabled.extend(other.rules.disabled);
        if !other.rules.enabled.is_empty() {
            self.rules.enabled = other.rules.enabled;
        }
        self.rules.ignore.extend(other.rules.ignore);
        self.rules.severity.extend(other.rules.severity);
        for (pattern, rules) in other.rules.per_file {
            self.rules.per_file.entry(pattern).or_default().extend(rules);
        }

        if !other.categories.is_empty() {
            self.categories = other.categories;
        }
    }

    /// Load from the current directory, then the home directory, else defaults
    pub fn load_default() -> Result<Self, ConfigError> {
        for name in CONFIG_NAMES {
            let path = PathBuf::from(name);
            if path.exists() {
                return Self::load(&path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            for name in CONFIG_NAMES {
                let path = home.join(name);
                if path.exists() {
                    return Self::load(&path);
                }
            }
        }

        Ok(Self::default())
    }

    /// Merge CLI arguments into configuration
    pub fn merge_cli(
        &mut self,
        format: Option<OutputFormat>,
        jobs: Option<usize>,
        disabled_rules: Option<Vec<String>>,
        enabled_rules: Option<Vec<String>>,
    ) {
        if let Some(f) = format {
            self.output.format = f;
        }
        if let Some(j) = jobs {
            self.engine.jobs = j;
        }
        if let Some(disabled) = disabled_rules {
            self.rules.disabled.extend(disabled);
        }
        if let Some(enabled) = enabled_rules {
            self.rules.enabled = enabled;
        }
    }

    /// Check if a rule is enabled
    pub fn is_rule_enabled(&self, rule: &RuleDescriptor) -> bool {
        let id = rule.id;
        if self.rules.disabled.iter().any(|d| d == id) {
            return false;
        }

        let upper = id.to_uppercase();
        if self
            .rules
            .ignore
            .iter()
            .any(|prefix| upper.starts_with(&prefix.to_uppercase()))
        {
            return false;
        }

        if !self.rules.enabled.is_empty() {
            return self.rules.enabled.iter().any(|e| e == id);
        }

        self.categories.is_empty() || self.categories.contains(&rule.category)
    }

    pub fn severity_override(&self, rule_id: &str) -> Option<Severity> {
        self.rules.severity.get(rule_id).copied()
    }

    /// Dispatcher options carrying the severity overrides
    pub fn analysis_options(&self) -> AnalysisOptions {
        self.rules
            .severity
            .iter()
            .fold(AnalysisOptions::default(), |options, (id, severity)| {
                options.with_severity(id, *severity)
            })
    }

    /// Compile the per-file ignores
    pub fn per_file_ignores(&self) -> Result<PerFileIgnores, ConfigError> {
        let mut entries = Vec::new();
        for (pattern, rules) in &self.rules.per_file {
            let matcher = Glob::new(pattern)
                .map_err(|e| ConfigError::Invalid(format!("bad glob '{}': {}", pattern, e)))?
                .compile_matcher();
            entries.push((matcher, rules.clone()));
        }
        Ok(PerFileIgnores { entries })
    }
}

/// Compiled `rules.per_file` table
pub struct PerFileIgnores {
    entries: Vec<(globset::GlobMatcher, Vec<String>)>,
}

impl PerFileIgnores {
    pub fn is_ignored(&self, rule_id: &str, file: &Path) -> bool {
        self.entries.iter().any(|(matcher, rules)| {
            matcher.is_match(file) && rules.iter().any(|r| r == "all" || r == rule_id)
        })
    }
}
