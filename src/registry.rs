//! Rule and fixer registry
//!
//! Built once at startup and read-only afterwards. The registry owns every
//! rule and fixer and precomputes, for each node kind, the ordered list of
//! rules interested in it.

use crate::fixer::Fixer;
use crate::rule::Rule;
use crate::syntax::NodeKind;
use regex::Regex;
use std::collections::HashMap;
use thiserror::Error;

/// Malformed rule set, detected at build time
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate rule id: {0}")]
    DuplicateRule(String),

    #[error("rule id '{0}' does not have the form EX###")]
    InvalidRuleId(String),

    #[error("rule {0} declares no node kinds")]
    EmptyInterest(String),

    #[error("fixer references unknown rule id: {0}")]
    DanglingFixer(String),

    #[error("rule {0} already has a fixer")]
    DuplicateFixer(String),

    #[error("invalid rule id pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Collects rules and fixers before validation
#[derive(Default)]
pub struct RegistryBuilder {
    rules: Vec<Box<dyn Rule>>,
    fixers: Vec<Box<dyn Fixer>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule; registration order is the per-node dispatch order
    pub fn rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_boxed(mut self, rule: Box<dyn Rule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn fixer(mut self, fixer: impl Fixer + 'static) -> Self {
        self.fixers.push(Box::new(fixer));
        self
    }

    pub fn fixer_boxed(mut self, fixer: Box<dyn Fixer>) -> Self {
        self.fixers.push(fixer);
        self
    }

    /// Validate and index the rule set
    pub fn build(self) -> Result<Registry, RegistryError> {
        let id_pattern = Regex::new(r"^EX\d{3}$")?;

        let mut by_id = HashMap::new();
        let mut by_kind = vec![Vec::new(); NodeKind::COUNT];

        for (index, rule) in self.rules.iter().enumerate() {
            let descriptor = rule.descriptor();
            if !id_pattern.is_match(descriptor.id) {
                return Err(RegistryError::InvalidRuleId(descriptor.id.to_string()));
            }
            if descriptor.kinds.is_empty() {
                return Err(RegistryError::EmptyInterest(descriptor.id.to_string()));
            }
            if by_id.insert(descriptor.id, index).is_some() {
                return Err(RegistryError::DuplicateRule(descriptor.id.to_string()));
            }

            let mut kinds = descriptor.kinds.to_vec();
            kinds.sort();
            kinds.dedup();
            for kind in kinds {
                by_kind[kind.index()].push(index);
            }
        }

        let mut fixers = HashMap::new();
        for fixer in self.fixers {
            let rule_id = fixer.rule_id();
            if !by_id.contains_key(rule_id) {
                return Err(RegistryError::DanglingFixer(rule_id.to_string()));
            }
            if fixers.insert(rule_id, fixer).is_some() {
                return Err(RegistryError::DuplicateFixer(rule_id.to_string()));
            }
        }

        log::debug!(
            "registry built with {} rules and {} fixers",
            self.rules.len(),
            fixers.len()
        );

        Ok(Registry {
            rules: self.rules,
            by_id,
            by_kind,
            fixers,
        })
    }
}

/// Immutable rule set shared by every analysis
pub struct Registry {
    rules: Vec<Box<dyn Rule>>,
    by_id: HashMap<&'static str, usize>,
    by_kind: Vec<Vec<usize>>,
    fixers: HashMap<&'static str, Box<dyn Fixer>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// The complete built-in catalogue with its fixers
    pub fn standard() -> Result<Self, RegistryError> {
        let builder = crate::rules::all()
            .into_iter()
            .fold(RegistryBuilder::new(), RegistryBuilder::rule_boxed);
        crate::fixes::all()
            .into_iter()
            .fold(builder, RegistryBuilder::fixer_boxed)
            .build()
    }

    /// Rules interested in `kind`, in registration order
    pub fn rules_for(&self, kind: NodeKind) -> impl Iterator<Item = &dyn Rule> + '_ {
        self.by_kind[kind.index()]
            .iter()
            .map(move |&i| self.rules[i].as_ref())
    }

    pub fn has_rules_for(&self, kind: NodeKind) -> bool {
        !self.by_kind[kind.index()].is_empty()
    }

    pub fn rule(&self, id: &str) -> Option<&dyn Rule> {
        self.by_id.get(id).map(|&i| self.rules[i].as_ref())
    }

    /// All rules in registration order
    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> + '_ {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn fixer_for(&self, rule_id: &str) -> Option<&dyn Fixer> {
        self.fixers.get(rule_id).map(|f| f.as_ref())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{FixSafety, Severity};
    use crate::fixer::FixError;
    use crate::rule::{Match, RuleCategory, RuleContext, RuleDescriptor};
    use crate::semantic::Unresolved;
    use crate::syntax::{NodeRef, SyntaxTree};

    struct Stub(RuleDescriptor);

    impl Rule for Stub {
        fn descriptor(&self) -> &RuleDescriptor {
            &self.0
        }

        fn evaluate(&self, _: NodeRef<'_>, _: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
            Ok(Vec::new())
        }
    }

    fn stub(id: &'static str, kinds: &'static [NodeKind]) -> Stub {
        Stub(RuleDescriptor {
            id,
            title: "stub",
            message: "stub",
            description: "",
            category: RuleCategory::Style,
            severity: Severity::Info,
            kinds,
        })
    }

    struct StubFixer(&'static str);

    impl Fixer for StubFixer {
        fn rule_id(&self) -> &'static str {
            self.0
        }

        fn title(&self) -> &'static str {
            "stub"
        }

        fn safety(&self) -> FixSafety {
            FixSafety::Safe
        }

        fn apply(&self, _: &SyntaxTree, _: NodeRef<'_>) -> Result<SyntaxTree, FixError> {
            Err(FixError::NothingToFix {
                rule_id: self.0.to_string(),
            })
        }
    }

    #[test]
    fn test_kind_index_keeps_registration_order() {
        let registry = Registry::builder()
            .rule(stub("EX101", &[NodeKind::ThrowStatement]))
            .rule(stub("EX100", &[NodeKind::CatchClause, NodeKind::ThrowStatement]))
            .build()
            .unwrap();
        let ids: Vec<_> = registry
            .rules_for(NodeKind::ThrowStatement)
            .map(|r| r.id())
            .collect();
        assert_eq!(ids, vec!["EX101", "EX100"]);
        assert!(!registry.has_rules_for(NodeKind::Block));
        assert!(registry.rule("EX100").is_some());
    }

    #[test]
    fn test_duplicate_rule_fails() {
        let result = Registry::builder()
            .rule(stub("EX001", &[NodeKind::Block]))
            .rule(stub("EX001", &[NodeKind::Block]))
            .build();
        assert!(matches!(result, Err(RegistryError::DuplicateRule(id)) if id == "EX001"));
    }

    #[test]
    fn test_invalid_rules_fail() {
        let bad_id = Registry::builder().rule(stub("E01", &[NodeKind::Block])).build();
        assert!(matches!(bad_id, Err(RegistryError::InvalidRuleId(_))));

        let no_kinds = Registry::builder().rule(stub("EX001", &[])).build();
        assert!(matches!(no_kinds, Err(RegistryError::EmptyInterest(_))));
    }

    #[test]
    fn test_fixer_validation() {
        let dangling = Registry::builder()
            .rule(stub("EX001", &[NodeKind::Block]))
            .fixer(StubFixer("EX002"))
            .build();
        assert!(matches!(dangling, Err(RegistryError::DanglingFixer(id)) if id == "EX002"));

        let duplicate = Registry::builder()
            .rule(stub("EX001", &[NodeKind::Block]))
            .fixer(StubFixer("EX001"))
            .fixer(StubFixer("EX001"))
            .build();
        assert!(matches!(duplicate, Err(RegistryError::DuplicateFixer(_))));

        let registry = Registry::builder()
            .rule(stub("EX001", &[NodeKind::Block]))
            .fixer(StubFixer("EX001"))
            .build()
            .unwrap();
        assert!(registry.fixer_for("EX001").is_some());
        assert!(registry.fixer_for("EX002").is_none());
    }

    #[test]
    fn test_standard_registry() {
        let registry = Registry::standard().unwrap();
        assert_eq!(registry.len(), 23);
        for (i, rule) in registry.rules().enumerate() {
            assert_eq!(rule.id(), format!("EX{:03}", i + 1));
        }
        for id in ["EX002", "EX013", "EX017", "EX018", "EX019"] {
            assert!(registry.fixer_for(id).is_some(), "{} has no fixer", id);
        }
    }
}
