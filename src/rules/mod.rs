//! Built-in rule catalogue
//!
//! Rules are grouped by the construct they inspect. `all` returns them in
//! id order, which is also the per-node dispatch order of the standard
//! registry.

pub mod query;

mod catching;
mod creation;
mod logging;
mod tasks;
mod throwing;
mod types;

pub use catching::{AlwaysTrueFilter, EmptyCatch, ManualTypeFilter, ThreadAbortSwallow, UnusedCatchVariable};
pub use creation::{CreatedNotThrown, MissingMessage, NotImplemented, ParamNameLiteral, ReservedException};
pub use logging::{FlattenedException, LogFullException};
pub use tasks::WaitAllWithoutAggregate;
pub use throwing::{
    BaseExceptionThrow, GetterThrow, MissingInnerException, PointlessTry, PreserveStackTrace,
    ThrowInFinally, ThrowNull,
};
pub use types::{ExceptionSuffix, MissingConstructors, NotPublic, StandardConstructors};

use crate::rule::Rule;

/// Every built-in rule, EX001 through EX023
pub fn all() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(MissingMessage),
        Box::new(PreserveStackTrace),
        Box::new(MissingInnerException),
        Box::new(EmptyCatch),
        Box::new(PointlessTry),
        Box::new(BaseExceptionThrow),
        Box::new(ThrowNull),
        Box::new(GetterThrow),
        Box::new(AlwaysTrueFilter),
        Box::new(ManualTypeFilter),
        Box::new(LogFullException),
        Box::new(FlattenedException),
        Box::new(ThreadAbortSwallow),
        Box::new(NotImplemented),
        Box::new(ExceptionSuffix),
        Box::new(WaitAllWithoutAggregate),
        Box::new(MissingConstructors),
        Box::new(NotPublic),
        Box::new(UnusedCatchVariable),
        Box::new(ThrowInFinally),
        Box::new(ReservedException),
        Box::new(CreatedNotThrown),
        Box::new(ParamNameLiteral),
    ]
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::diagnostic::Finding;
    use crate::dispatcher::Dispatcher;
    use crate::registry::Registry;
    use crate::semantic::{FactTable, SemanticModel};
    use crate::syntax::{NodeSpec, SyntaxTree};

    /// Findings of one rule over a spec, with facts from the approximate resolver
    pub fn findings(rule_id: &str, spec: &NodeSpec) -> Vec<Finding> {
        let tree = SyntaxTree::from_spec(spec).unwrap();
        let facts = FactTable::approximate(&tree);
        findings_with(rule_id, &tree, &facts)
    }

    pub fn findings_with(rule_id: &str, tree: &SyntaxTree, model: &dyn SemanticModel) -> Vec<Finding> {
        let registry = Registry::standard().unwrap();
        Dispatcher::new(&registry)
            .analyze(tree, model)
            .into_iter()
            .filter(|f| f.rule_id == rule_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_order() {
        let ids: Vec<_> = all().iter().map(|r| r.id()).collect();
        let expected: Vec<_> = (1..=23).map(|n| format!("EX{:03}", n)).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_descriptors_are_complete() {
        for rule in all() {
            let descriptor = rule.descriptor();
            assert!(!descriptor.title.is_empty(), "{}", descriptor.id);
            assert!(!descriptor.message.is_empty(), "{}", descriptor.id);
            assert!(!descriptor.description.is_empty(), "{}", descriptor.id);
            assert!(!descriptor.kinds.is_empty(), "{}", descriptor.id);
        }
    }
}
