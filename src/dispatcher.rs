//! Single-pass rule dispatch over one document
//!
//! The dispatcher walks a tree once in pre-order and, for each node, runs
//! the rules registered for its kind. It keeps no state between documents,
//! so independent documents can be analyzed concurrently against the same
//! registry.

use crate::diagnostic::{Finding, Location, Severity};
use crate::registry::Registry;
use crate::rule::{Rule, RuleContext};
use crate::semantic::SemanticModel;
use crate::syntax::{NodeRef, SyntaxTree};
use serde::Serialize;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cooperative cancellation flag shared between a host and running analyses
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-analysis options
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    /// Severity to report instead of a rule's default, by rule id
    pub severity_overrides: HashMap<String, Severity>,
    /// Record per-rule timing statistics
    pub collect_timings: bool,
}

impl AnalysisOptions {
    pub fn with_severity(mut self, rule_id: &str, severity: Severity) -> Self {
        self.severity_overrides.insert(rule_id.to_string(), severity);
        self
    }

    pub fn with_timings(mut self, enabled: bool) -> Self {
        self.collect_timings = enabled;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Complete,
    /// Cancellation was observed; findings cover only the visited prefix
    Cancelled,
}

/// Timing statistics for a single rule
#[derive(Debug, Clone, Default, Serialize)]
pub struct RuleTiming {
    /// Total time spent evaluating this rule
    pub total_time: Duration,
    /// Number of times the rule was evaluated
    pub evaluation_count: usize,
    /// Number of findings the rule produced
    pub match_count: usize,
}

impl RuleTiming {
    /// Average time per evaluation
    pub fn avg_time(&self) -> Duration {
        if self.evaluation_count == 0 {
            Duration::ZERO
        } else {
            self.total_time / self.evaluation_count as u32
        }
    }

    pub fn merge(&mut self, other: &RuleTiming) {
        self.total_time += other.total_time;
        self.evaluation_count += other.evaluation_count;
        self.match_count += other.match_count;
    }
}

/// Outcome of analyzing one document
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Findings in traversal order, then per-node registration order
    pub findings: Vec<Finding>,
    pub nodes_visited: usize,
    pub status: AnalysisStatus,
    /// Rules that panicked, in the order they faulted
    pub faulted_rules: Vec<String>,
    pub timings: HashMap<String, RuleTiming>,
}

impl Analysis {
    pub fn is_complete(&self) -> bool {
        self.status == AnalysisStatus::Complete
    }
}

/// Runs a registry's rules over documents
#[derive(Clone, Copy)]
pub struct Dispatcher<'r> {
    registry: &'r Registry,
}

impl<'r> Dispatcher<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Analyze one document without cancellation or options
    pub fn analyze(&self, tree: &SyntaxTree, model: &dyn SemanticModel) -> Vec<Finding> {
        self.analyze_with(tree, model, &AnalysisOptions::default(), &CancellationToken::new())
            .findings
    }

    /// Analyze one document
    pub fn analyze_with(
        &self,
        tree: &SyntaxTree,
        model: &dyn SemanticModel,
        options: &AnalysisOptions,
        cancel: &CancellationToken,
    ) -> Analysis {
        let cx = RuleContext::new(tree, model);
        let mut analysis = Analysis {
            findings: Vec::new(),
            nodes_visited: 0,
            status: AnalysisStatus::Complete,
            faulted_rules: Vec::new(),
            timings: HashMap::new(),
        };

        for node in tree.preorder() {
            if cancel.is_cancelled() {
                log::warn!(
                    "analysis cancelled after {} of {} nodes",
                    analysis.nodes_visited,
                    tree.len()
                );
                analysis.status = AnalysisStatus::Cancelled;
                break;
            }
            analysis.nodes_visited += 1;

            for rule in self.registry.rules_for(node.kind()) {
                let started = options.collect_timings.then(Instant::now);
                let produced = self.run_rule(rule, node, &cx, options, &mut analysis);

                if let Some(started) = started {
                    let timing = analysis.timings.entry(rule.id().to_string()).or_default();
                    timing.total_time += started.elapsed();
                    timing.evaluation_count += 1;
                    timing.match_count += produced;
                }
            }
        }

        analysis
    }

    /// Run one rule on one node, appending its findings; returns how many it produced
    fn run_rule(
        &self,
        rule: &dyn Rule,
        node: NodeRef<'_>,
        cx: &RuleContext<'_>,
        options: &AnalysisOptions,
        analysis: &mut Analysis,
    ) -> usize {
        let descriptor = rule.descriptor();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.evaluate(node, cx)));

        let matches = match outcome {
            Ok(Ok(matches)) => matches,
            Ok(Err(unresolved)) => {
                log::trace!("{}: {}", descriptor.id, unresolved);
                return 0;
            }
            Err(_) => {
                log::error!(
                    "rule {} faulted on {} at {}; skipping its findings for this node",
                    descriptor.id,
                    node.kind(),
                    node.span().start
                );
                if !analysis.faulted_rules.iter().any(|id| id == descriptor.id) {
                    analysis.faulted_rules.push(descriptor.id.to_string());
                }
                return 0;
            }
        };

        let severity = options
            .severity_overrides
            .get(descriptor.id)
            .copied()
            .unwrap_or(descriptor.severity);

        let mut produced = 0;
        for found in matches {
            let Some(anchor) = cx.tree.get(found.node) else {
                log::error!("rule {} reported unknown node {}", descriptor.id, found.node);
                continue;
            };
            analysis.findings.push(Finding {
                rule_id: descriptor.id.to_string(),
                severity,
                category: descriptor.category,
                message: descriptor.render_message(&found.args),
                location: Location::from_span(cx.tree, anchor.span()),
                node_kind: anchor.kind(),
            });
            produced += 1;
        }
        produced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Match, RuleCategory, RuleDescriptor};
    use crate::semantic::{NoFacts, Unresolved};
    use crate::syntax::{build::*, NodeKind};
    use std::sync::atomic::AtomicUsize;

    /// Reports every node of its kinds, counting invocations
    struct Every {
        descriptor: RuleDescriptor,
        calls: Arc<AtomicUsize>,
    }

    impl Rule for Every {
        fn descriptor(&self) -> &RuleDescriptor {
            &self.descriptor
        }

        fn evaluate(&self, node: NodeRef<'_>, _: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(vec![Match::at(node).with_arg(node.kind().as_str())])
        }
    }

    /// Reports like `Every`, but cancels the host on its first call
    struct CancelsHost {
        descriptor: RuleDescriptor,
        cancel: CancellationToken,
    }

    impl Rule for CancelsHost {
        fn descriptor(&self) -> &RuleDescriptor {
            &self.descriptor
        }

        fn evaluate(&self, node: NodeRef<'_>, _: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
            self.cancel.cancel();
            Ok(vec![Match::at(node).with_arg(node.kind().as_str())])
        }
    }

    struct Panics(RuleDescriptor);

    impl Rule for Panics {
        fn descriptor(&self) -> &RuleDescriptor {
            &self.0
        }

        fn evaluate(&self, _: NodeRef<'_>, _: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
            panic!("rule bug")
        }
    }

    struct NeedsType(RuleDescriptor);

    impl Rule for NeedsType {
        fn descriptor(&self) -> &RuleDescriptor {
            &self.0
        }

        fn evaluate(&self, node: NodeRef<'_>, cx: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
            cx.require_type(node)?;
            Ok(vec![Match::at(node)])
        }
    }

    fn descriptor(id: &'static str, kinds: &'static [NodeKind]) -> RuleDescriptor {
        RuleDescriptor {
            id,
            title: "test",
            message: "saw {0}",
            description: "",
            category: RuleCategory::Style,
            severity: Severity::Warning,
            kinds,
        }
    }

    fn every(id: &'static str, kinds: &'static [NodeKind], calls: &Arc<AtomicUsize>) -> Every {
        Every {
            descriptor: descriptor(id, kinds),
            calls: Arc::clone(calls),
        }
    }

    fn sample() -> SyntaxTree {
        SyntaxTree::from_spec(&block([
            try_stmt(
                block([throw(new_object("Exception", []))]),
                [catch(Some("Exception"), Some("ex"), None, block([throw(ident("ex"))]))],
                None,
            ),
            rethrow(),
        ]))
        .unwrap()
    }

    #[test]
    fn test_visits_every_node_once() {
        let tree = sample();
        let calls = Arc::new(AtomicUsize::new(0));
        let all: &'static [NodeKind] = &NodeKind::ALL;
        let registry = Registry::builder()
            .rule(every("EX900", all, &calls))
            .build()
            .unwrap();
        let analysis = Dispatcher::new(&registry).analyze_with(
            &tree,
            &NoFacts,
            &AnalysisOptions::default(),
            &CancellationToken::new(),
        );
        assert_eq!(analysis.nodes_visited, tree.len());
        assert_eq!(calls.load(Ordering::Relaxed), tree.len());
        assert!(analysis.is_complete());
    }

    #[test]
    fn test_order_is_traversal_then_registration() {
        let tree = sample();
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = Registry::builder()
            .rule(every("EX902", &[NodeKind::ThrowStatement], &calls))
            .rule(every("EX901", &[NodeKind::ThrowStatement, NodeKind::TryStatement], &calls))
            .build()
            .unwrap();
        let dispatcher = Dispatcher::new(&registry);
        let findings = dispatcher.analyze(&tree, &NoFacts);
        let order: Vec<_> = findings
            .iter()
            .map(|f| (f.location.start, f.rule_id.as_str()))
            .collect();

        let throws: Vec<_> = tree
            .preorder()
            .filter(|n| n.is(NodeKind::ThrowStatement))
            .map(|n| n.span().start)
            .collect();
        let try_start = tree
            .preorder()
            .find(|n| n.is(NodeKind::TryStatement))
            .unwrap()
            .span()
            .start;
        let mut expected = vec![(try_start, "EX901")];
        for start in throws {
            expected.push((start, "EX902"));
            expected.push((start, "EX901"));
        }
        assert_eq!(order, expected);

        // deterministic across runs
        assert_eq!(dispatcher.analyze(&tree, &NoFacts), findings);
    }

    #[test]
    fn test_faulting_rule_is_isolated() {
        let tree = sample();
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = Registry::builder()
            .rule(Panics(descriptor("EX910", &[NodeKind::ThrowStatement])))
            .rule(every("EX911", &[NodeKind::ThrowStatement], &calls))
            .build()
            .unwrap();
        let analysis = Dispatcher::new(&registry).analyze_with(
            &tree,
            &NoFacts,
            &AnalysisOptions::default(),
            &CancellationToken::new(),
        );
        assert_eq!(analysis.faulted_rules, vec!["EX910".to_string()]);
        assert_eq!(analysis.findings.len(), 3);
        assert!(analysis.findings.iter().all(|f| f.rule_id == "EX911"));
    }

    #[test]
    fn test_unresolved_fact_yields_nothing() {
        let tree = sample();
        let registry = Registry::builder()
            .rule(NeedsType(descriptor("EX920", &[NodeKind::ObjectCreation])))
            .build()
            .unwrap();
        assert!(Dispatcher::new(&registry).analyze(&tree, &NoFacts).is_empty());
    }

    #[test]
    fn test_cancelled_before_start() {
        let tree = sample();
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = Registry::builder()
            .rule(every("EX930", &[NodeKind::ThrowStatement], &calls))
            .build()
            .unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let analysis = Dispatcher::new(&registry).analyze_with(
            &tree,
            &NoFacts,
            &AnalysisOptions::default(),
            &cancel,
        );
        assert_eq!(analysis.status, AnalysisStatus::Cancelled);
        assert_eq!(analysis.nodes_visited, 0);
        assert!(analysis.findings.is_empty());
    }

    #[test]
    fn test_cancelled_mid_traversal_keeps_prefix() {
        let tree = sample();
        let calls = Arc::new(AtomicUsize::new(0));
        let full = Registry::builder()
            .rule(every("EX931", &[NodeKind::ThrowStatement], &calls))
            .build()
            .unwrap();
        let uncancelled = Dispatcher::new(&full).analyze(&tree, &NoFacts);
        assert_eq!(uncancelled.len(), 3);

        let cancel = CancellationToken::new();
        let registry = Registry::builder()
            .rule(CancelsHost {
                descriptor: descriptor("EX931", &[NodeKind::ThrowStatement]),
                cancel: cancel.clone(),
            })
            .build()
            .unwrap();
        let analysis = Dispatcher::new(&registry).analyze_with(
            &tree,
            &NoFacts,
            &AnalysisOptions::default(),
            &cancel,
        );

        assert_eq!(analysis.status, AnalysisStatus::Cancelled);
        assert!(analysis.nodes_visited < tree.len());
        assert!(!analysis.findings.is_empty());
        assert!(analysis.findings.len() < uncancelled.len());
        assert_eq!(analysis.findings[..], uncancelled[..analysis.findings.len()]);
    }

    #[test]
    fn test_severity_override_and_timings() {
        let tree = sample();
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = Registry::builder()
            .rule(every("EX940", &[NodeKind::TryStatement], &calls))
            .build()
            .unwrap();
        let options = AnalysisOptions::default()
            .with_severity("EX940", Severity::Error)
            .with_timings(true);
        let analysis = Dispatcher::new(&registry).analyze_with(
            &tree,
            &NoFacts,
            &options,
            &CancellationToken::new(),
        );
        assert_eq!(analysis.findings[0].severity, Severity::Error);
        assert_eq!(analysis.findings[0].message, "saw try_statement");
        let timing = &analysis.timings["EX940"];
        assert_eq!(timing.evaluation_count, 1);
        assert_eq!(timing.match_count, 1);
    }
}
