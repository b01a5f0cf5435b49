//! Exlint CLI - exception-handling analyzer
//!
//! Lints serialized syntax-tree documents and applies rewrites.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use exlint::config::{ColorMode, Config, OutputFormat};
use exlint::dispatcher::{CancellationToken, Dispatcher};
use exlint::document::Document;
use exlint::engine::Engine;
use exlint::fixer::FixEngine;
use exlint::output::{CompactFormatter, JsonFormatter, OutputFormatter, TextFormatter};
use exlint::registry::Registry;
use exlint::rule::RuleDescriptor;
use exlint::Severity;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "exlint",
    version,
    about = "Exception-handling linter",
    long_about = "Detects exception-handling anti-patterns in C#-like syntax trees and fixes some of them."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lint documents
    Check {
        /// Files, directories or glob patterns to lint
        #[arg(required = true)]
        paths: Vec<String>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<Format>,

        /// Number of parallel jobs (0 = auto)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Show rule descriptions under each finding
        #[arg(short, long)]
        verbose: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Disable specific rules (comma-separated)
        #[arg(long, value_delimiter = ',')]
        disable: Option<Vec<String>>,

        /// Only enable specific rules (comma-separated)
        #[arg(long, value_delimiter = ',')]
        select: Option<Vec<String>>,

        /// Show per-rule timing statistics
        #[arg(long)]
        timing: bool,

        /// Exit with 0 even if errors are found
        #[arg(long)]
        exit_zero: bool,
    },
    /// Apply the fixer of a rule to one of its findings
    Fix {
        /// Document to fix
        document: PathBuf,

        /// Rule whose finding is fixed
        #[arg(short, long)]
        rule: String,

        /// Which finding of the rule to fix (1-based, in document order)
        #[arg(long, default_value = "1")]
        nth: usize,

        /// Write the fixed document back instead of printing the source
        #[arg(long)]
        write: bool,
    },
    /// List available rules
    Rules,
    /// Show detailed information about a rule
    Explain {
        /// Rule ID to explain
        rule_id: String,
    },
    /// Print the canonical source of a document
    Render {
        document: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    Compact,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
            Format::Compact => OutputFormat::Compact,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Check {
            paths,
            config,
            format,
            jobs,
            verbose,
            no_color,
            disable,
            select,
            timing,
            exit_zero,
        } => {
            let options = CheckOptions {
                config,
                format: format.map(OutputFormat::from),
                jobs,
                verbose,
                no_color,
                disable,
                select,
                timing,
            };
            handle_check(&paths, options).map(|code| if exit_zero { 0 } else { code })
        }
        Commands::Fix {
            document,
            rule,
            nth,
            write,
        } => handle_fix(&document, &rule, nth, write).map(|_| 0),
        Commands::Rules => handle_rules().map(|_| 0),
        Commands::Explain { rule_id } => handle_explain(&rule_id).map(|_| 0),
        Commands::Render { document } => handle_render(&document).map(|_| 0),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            std::process::exit(2);
        }
    }
}

struct CheckOptions {
    config: Option<PathBuf>,
    format: Option<OutputFormat>,
    jobs: Option<usize>,
    verbose: bool,
    no_color: bool,
    disable: Option<Vec<String>>,
    select: Option<Vec<String>>,
    timing: bool,
}

fn handle_check(paths: &[String], options: CheckOptions) -> Result<i32> {
    let mut config = match &options.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::load_default().context("failed to load config")?,
    };
    config.merge_cli(options.format, options.jobs, options.disable, options.select);
    if options.verbose {
        config.output.verbose = true;
    }

    let use_color = !options.no_color && config.output.color != ColorMode::Never;
    match (use_color, config.output.color) {
        (false, _) => colored::control::set_override(false),
        (true, ColorMode::Always) => colored::control::set_override(true),
        _ => {}
    }

    let files = config
        .files
        .matcher()
        .context("invalid files configuration")?
        .collect(paths)
        .context("failed to collect documents")?;
    if files.is_empty() {
        bail!("no documents found to lint");
    }
    log::debug!("linting {} documents", files.len());

    let registry = Registry::standard().context("failed to build the rule registry")?;
    let format = config.output.format;
    let mut text = TextFormatter::new()
        .with_help(config.output.verbose)
        .with_stats(config.output.statistics);
    if !use_color {
        text = text.without_color();
    }
    let formatter: Box<dyn OutputFormatter> = match format {
        OutputFormat::Text => Box::new(text),
        OutputFormat::Json => Box::new(JsonFormatter::new().pretty()),
        OutputFormat::Compact => Box::new(CompactFormatter::new()),
    };

    let engine = Engine::new(config, registry)
        .context("invalid configuration")?
        .with_timings(options.timing);
    let result = engine.lint(&files);

    print!("{}", formatter.format(&result));
    if options.timing {
        eprint!("{}", result.format_timings());
    }

    Ok(result.exit_code())
}

fn handle_fix(path: &Path, rule_id: &str, nth: usize, write: bool) -> Result<()> {
    let registry = Registry::standard().context("failed to build the rule registry")?;
    if registry.rule(rule_id).is_none() {
        bail!("unknown rule '{}'", rule_id);
    }

    let document = Document::load(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    let (tree, facts) = document.open(true)?;

    let findings: Vec<_> = Dispatcher::new(&registry)
        .analyze(&tree, &facts)
        .into_iter()
        .filter(|f| f.rule_id == rule_id)
        .collect();
    let finding = match nth.checked_sub(1).and_then(|i| findings.get(i)) {
        Some(finding) => finding,
        None => bail!(
            "{} has {} finding(s) for {}, cannot fix #{}",
            path.display(),
            findings.len(),
            rule_id,
            nth
        ),
    };

    let fix = FixEngine::new(&registry)
        .apply_finding(&tree, finding, &CancellationToken::new())
        .with_context(|| format!("failed to fix {} at line {}", rule_id, finding.location.line))?;
    eprintln!(
        "{} {} ({} fix)",
        "fixed".green().bold(),
        fix.title,
        fix.safety
    );

    if !write {
        print!("{}", fix.tree.text());
        return Ok(());
    }

    // node ids shift after a rewrite, so shipped facts no longer apply
    if document.facts.is_some() {
        log::warn!(
            "{}: semantic facts dropped, the rewritten tree has new node ids",
            path.display()
        );
    }
    Document::new(fix.tree.to_spec())
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn handle_render(path: &Path) -> Result<()> {
    let document = Document::load(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    let (tree, _) = document.open(false)?;
    print!("{}", tree.text());
    Ok(())
}

fn severity_label(severity: Severity) -> colored::ColoredString {
    match severity {
        Severity::Error => "error".red(),
        Severity::Warning => "warning".yellow(),
        Severity::Info => "info".blue(),
    }
}

fn handle_rules() -> Result<()> {
    let registry = Registry::standard().context("failed to build the rule registry")?;
    println!("{}", "Available rules:".bold());
    for rule in registry.rules() {
        print_rule(rule.descriptor(), registry.fixer_for(rule.id()).is_some());
    }
    println!();
    println!("{} rules", registry.len());
    Ok(())
}

fn print_rule(rule: &RuleDescriptor, fixable: bool) {
    let fix_marker = if fixable { " [fix]".green() } else { "".normal() };
    println!(
        "    {} [{}] ({}){}",
        rule.id.cyan(),
        severity_label(rule.severity),
        rule.category,
        fix_marker
    );
    println!("      {}", rule.title);
}

fn handle_explain(rule_id: &str) -> Result<()> {
    let registry = Registry::standard().context("failed to build the rule registry")?;
    let upper = rule_id.to_uppercase();
    let rule = match registry.rule(&upper) {
        Some(rule) => rule.descriptor(),
        None => bail!("unknown rule '{}', run `exlint rules` to list them", rule_id),
    };

    println!("{}", "Rule Details".bold());
    println!();
    println!("  {}: {}", "ID".bold(), rule.id.cyan());
    println!("  {}: {}", "Title".bold(), rule.title);
    println!("  {}: {}", "Severity".bold(), severity_label(rule.severity));
    println!("  {}: {}", "Category".bold(), rule.category);
    let kinds: Vec<&str> = rule.kinds.iter().map(|k| k.as_str()).collect();
    println!("  {}: {}", "Applies to".bold(), kinds.join(", "));

    println!();
    println!("  {}", "Description".bold());
    println!("  {}", rule.description);

    if let Some(fixer) = registry.fixer_for(rule.id) {
        println!();
        println!("  {}", "Auto-fix Available".bold());
        println!("  {} ({})", fixer.title(), fixer.safety());
    }
    Ok(())
}
