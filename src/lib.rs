//! Exlint - exception-handling analyzer for C#-like syntax trees
//!
//! A rule-based analyzer that detects exception-handling anti-patterns
//! (throwing `System.Exception`, losing stack traces, swallowing failures,
//! logging without the exception) and rewrites some of them.
//!
//! # Architecture
//!
//! ```text
//! CLI -> Engine -> Document -> Dispatcher -> Registry -> Rule
//!                                    \-> FixEngine -> Fixer
//! ```
//!
//! A [`syntax::SyntaxTree`] is loaded from a serialized document together
//! with an optional table of semantic facts. The [`Dispatcher`] walks the
//! tree once and invokes every rule interested in each node kind. Rules read
//! semantic facts through the [`SemanticModel`] trait; a fact that cannot be
//! resolved means "no finding", never a false positive. Fixers produce a new
//! tree and leave the original untouched.

pub mod config;
pub mod diagnostic;
pub mod dispatcher;
pub mod document;
pub mod engine;
pub mod fixer;
pub mod fixes;
pub mod output;
pub mod registry;
pub mod rule;
pub mod rules;
pub mod semantic;
pub mod syntax;

// Re-export main types
pub use config::Config;
pub use diagnostic::{Diagnostic, Finding, FixSafety, Location, Severity};
pub use dispatcher::{Analysis, AnalysisOptions, AnalysisStatus, CancellationToken, Dispatcher, RuleTiming};
pub use document::{Document, DocumentError, DocumentFormat};
pub use engine::{Engine, LintResult};
pub use fixer::{FixEngine, FixError, Fixer, ProposedFix};
pub use output::{CompactFormatter, JsonFormatter, OutputFormatter, TextFormatter};
pub use registry::{Registry, RegistryError};
pub use rule::{Match, Rule, RuleCategory, RuleContext, RuleDescriptor};
pub use semantic::{FactTable, NoFacts, SemanticModel, Unresolved};
pub use syntax::{NodeId, NodeKind, NodeRef, NodeSpec, SyntaxTree, TextRange, TreeError};
