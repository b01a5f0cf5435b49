//! Fix application
//!
//! A fixer rewrites the node a finding is anchored on and returns a new tree.
//! Fixers never trust the finding: the tree may have changed since it was
//! produced, so each one re-checks the node's shape before editing.
//!
//! - Shapes a fixer does not recognize fail with [`FixError::Unsupported`]
//! - Shapes that are already fixed fail with [`FixError::NothingToFix`]
//! - The input tree is never modified; a failed fix leaves nothing behind

use crate::diagnostic::{Finding, FixSafety};
use crate::dispatcher::CancellationToken;
use crate::registry::Registry;
use crate::syntax::{NodeId, NodeRef, SyntaxTree, TreeError};
use thiserror::Error;

/// Rejected fix request
#[derive(Debug, Error)]
pub enum FixError {
    #[error("cannot fix {rule_id}: {reason}")]
    Unsupported { rule_id: String, reason: String },

    #[error("nothing to fix for {rule_id}: already fixed")]
    NothingToFix { rule_id: String },

    #[error("fix cancelled")]
    Cancelled,

    #[error("no node for {rule_id} at {target}")]
    TargetNotFound { rule_id: String, target: String },

    #[error("edit failed: {0}")]
    Tree(#[from] TreeError),
}

impl FixError {
    pub fn unsupported(rule_id: &str, reason: impl Into<String>) -> Self {
        Self::Unsupported {
            rule_id: rule_id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn nothing_to_fix(rule_id: &str) -> Self {
        Self::NothingToFix {
            rule_id: rule_id.to_string(),
        }
    }
}

/// Rewrites the node of one rule's findings
pub trait Fixer: Send + Sync {
    /// Rule whose findings this fixer resolves
    fn rule_id(&self) -> &'static str;

    /// Short description for display
    fn title(&self) -> &'static str;

    fn safety(&self) -> FixSafety {
        FixSafety::Safe
    }

    /// Produce a new tree with `target` rewritten
    fn apply(&self, tree: &SyntaxTree, target: NodeRef<'_>) -> Result<SyntaxTree, FixError>;
}

/// A fixed tree offered to the host, which decides whether to keep it
#[derive(Debug)]
pub struct ProposedFix {
    pub rule_id: String,
    pub title: String,
    pub safety: FixSafety,
    pub tree: SyntaxTree,
}

/// Routes fix requests to the registered fixers
pub struct FixEngine<'r> {
    registry: &'r Registry,
}

impl<'r> FixEngine<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Whether a fixer exists for the rule
    pub fn can_fix(&self, rule_id: &str) -> bool {
        self.registry.fixer_for(rule_id).is_some()
    }

    /// Fix the finding of `rule_id` anchored on `target`
    pub fn apply(
        &self,
        tree: &SyntaxTree,
        target: NodeId,
        rule_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ProposedFix, FixError> {
        if cancel.is_cancelled() {
            return Err(FixError::Cancelled);
        }
        let fixer = self
            .registry
            .fixer_for(rule_id)
            .ok_or_else(|| FixError::unsupported(rule_id, "no fixer is registered for this rule"))?;
        let node = tree.get(target).ok_or_else(|| FixError::TargetNotFound {
            rule_id: rule_id.to_string(),
            target: target.to_string(),
        })?;

        let fixed = fixer.apply(tree, node)?;
        log::debug!("{} applied to {} {}", rule_id, node.kind(), target);

        Ok(ProposedFix {
            rule_id: rule_id.to_string(),
            title: fixer.title().to_string(),
            safety: fixer.safety(),
            tree: fixed,
        })
    }

    /// Fix a finding, locating its node by span and kind
    pub fn apply_finding(
        &self,
        tree: &SyntaxTree,
        finding: &Finding,
        cancel: &CancellationToken,
    ) -> Result<ProposedFix, FixError> {
        let span = finding.location.span();
        let node = tree
            .find(span, finding.node_kind)
            .ok_or_else(|| FixError::TargetNotFound {
                rule_id: finding.rule_id.clone(),
                target: format!("{} {}..{}", finding.node_kind, span.start, span.end),
            })?;
        self.apply(tree, node.id(), &finding.rule_id, cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;
    use crate::semantic::FactTable;
    use crate::syntax::build::*;
    use pretty_assertions::assert_eq;

    fn rethrowing_tree() -> SyntaxTree {
        SyntaxTree::from_spec(&try_stmt(
            block([expr_stmt(invoke(ident("Run"), []))]),
            [catch(Some("Exception"), Some("ex"), None, block([throw(ident("ex"))]))],
            None,
        ))
        .unwrap()
    }

    #[test]
    fn test_apply_finding() {
        let registry = Registry::standard().unwrap();
        let tree = rethrowing_tree();
        let facts = FactTable::approximate(&tree);
        let findings = Dispatcher::new(&registry).analyze(&tree, &facts);
        let finding = findings.iter().find(|f| f.rule_id == "EX002").unwrap();

        let fix = FixEngine::new(&registry)
            .apply_finding(&tree, finding, &CancellationToken::new())
            .unwrap();
        assert_eq!(fix.rule_id, "EX002");
        assert_eq!(fix.safety, FixSafety::Safe);
        assert_eq!(
            fix.tree.text(),
            "try {\n    Run();\n} catch (Exception ex) {\n    throw;\n}\n"
        );
        // the original tree is untouched
        assert!(tree.text().contains("throw ex;"));
    }

    #[test]
    fn test_rule_without_fixer() {
        let registry = Registry::standard().unwrap();
        let tree = rethrowing_tree();
        let engine = FixEngine::new(&registry);
        assert!(!engine.can_fix("EX004"));
        let err = engine
            .apply(&tree, NodeId::ROOT, "EX004", &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, FixError::Unsupported { .. }));
    }

    #[test]
    fn test_cancelled_before_start() {
        let registry = Registry::standard().unwrap();
        let tree = rethrowing_tree();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = FixEngine::new(&registry)
            .apply(&tree, NodeId::ROOT, "EX002", &cancel)
            .unwrap_err();
        assert!(matches!(err, FixError::Cancelled));
    }

    #[test]
    fn test_unknown_target() {
        let registry = Registry::standard().unwrap();
        let tree = rethrowing_tree();
        let err = FixEngine::new(&registry)
            .apply(&tree, NodeId(9999), "EX002", &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, FixError::TargetNotFound { .. }));
    }

    #[test]
    fn test_stale_finding() {
        let registry = Registry::standard().unwrap();
        let tree = rethrowing_tree();
        let facts = FactTable::approximate(&tree);
        let findings = Dispatcher::new(&registry).analyze(&tree, &facts);
        let finding = findings.iter().find(|f| f.rule_id == "EX002").unwrap();

        let other = SyntaxTree::from_spec(&block([])).unwrap();
        let err = FixEngine::new(&registry)
            .apply_finding(&other, finding, &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, FixError::TargetNotFound { .. }));
    }
}
