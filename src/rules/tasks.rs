//! Rules on task-based code

use super::query::{ancestors_in_member, catch_type};
use crate::diagnostic::Severity;
use crate::rule::{Match, Rule, RuleCategory, RuleContext, RuleDescriptor};
use crate::semantic::Unresolved;
use crate::syntax::{NodeKind, NodeRef};

const WAIT_ALL: &str = "System.Threading.Tasks.Task.WaitAll";
const AGGREGATE: &str = "System.AggregateException";

static WAIT_ALL_UNGUARDED: RuleDescriptor = RuleDescriptor {
    id: "EX016",
    title: "Task.WaitAll without AggregateException catch",
    message: "Task.WaitAll failures arrive wrapped in an AggregateException that is not caught here",
    description: "Task.WaitAll reports task failures as a single AggregateException. Without a \
                  catch for it, handlers for the individual exception types never run.",
    category: RuleCategory::Usage,
    severity: Severity::Warning,
    kinds: &[NodeKind::Invocation],
};

pub struct WaitAllWithoutAggregate;

impl Rule for WaitAllWithoutAggregate {
    fn descriptor(&self) -> &RuleDescriptor {
        &WAIT_ALL_UNGUARDED
    }

    fn evaluate(&self, node: NodeRef<'_>, cx: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
        let callee = node.first_child();
        let named_wait_all = callee.is_some_and(|c| c.text() == "WaitAll");
        if !named_wait_all {
            return Ok(vec![]);
        }
        if cx.require_symbol(node)?.qualified_name != WAIT_ALL {
            return Ok(vec![]);
        }

        // Only a try block guards the call, not its catch or finally parts
        let mut child = node;
        for ancestor in ancestors_in_member(node) {
            let guarded_by_try = ancestor.is(NodeKind::TryStatement)
                && ancestor.child_of_kind(NodeKind::Block) == Some(child);
            if guarded_by_try {
                let catches_aggregate = ancestor
                    .children_of_kind(NodeKind::CatchClause)
                    .filter_map(catch_type)
                    .any(|ty| cx.type_of(ty) == Some(AGGREGATE));
                if catches_aggregate {
                    return Ok(vec![]);
                }
            }
            child = ancestor;
        }
        Ok(vec![Match::at(node)])
    }
}

#[cfg(test)]
mod tests {
    use crate::rules::testing::findings;
    use crate::syntax::{build::*, NodeSpec};

    fn wait_all() -> NodeSpec {
        expr_stmt(invoke(path("Task.WaitAll"), [ident("tasks")]))
    }

    #[test]
    fn test_unguarded_wait_all() {
        let spec = method("Run", &[], "void", [], block([wait_all()]));
        assert_eq!(findings("EX016", &spec).len(), 1);
    }

    #[test]
    fn test_guarded_wait_all() {
        let spec = method(
            "Run",
            &[],
            "void",
            [],
            block([try_stmt(
                block([wait_all()]),
                [catch(Some("AggregateException"), Some("ae"), None, block([rethrow()]))],
                None,
            )]),
        );
        assert!(findings("EX016", &spec).is_empty());
    }

    #[test]
    fn test_wait_all_in_catch_is_not_guarded() {
        let spec = method(
            "Run",
            &[],
            "void",
            [],
            block([try_stmt(
                block([]),
                [catch(Some("AggregateException"), None, None, block([wait_all()]))],
                None,
            )]),
        );
        assert_eq!(findings("EX016", &spec).len(), 1);

        let other_catch = method(
            "Run",
            &[],
            "void",
            [],
            block([try_stmt(
                block([wait_all()]),
                [catch(Some("IOException"), None, None, block([]))],
                None,
            )]),
        );
        assert_eq!(findings("EX016", &other_catch).len(), 1);
    }

    #[test]
    fn test_other_wait_all_is_ignored() {
        let spec = method(
            "Run",
            &[],
            "void",
            [],
            block([expr_stmt(invoke(path("scheduler.WaitAll"), []))]),
        );
        assert!(findings("EX016", &spec).is_empty());
    }
}
