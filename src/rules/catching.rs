//! Rules on catch clauses

use super::query::{
    catch_block, catch_filter, catch_type, catch_variable, is_bare_rethrow, is_identifier,
    references, unparenthesize,
};
use crate::diagnostic::Severity;
use crate::rule::{Match, Rule, RuleCategory, RuleContext, RuleDescriptor};
use crate::semantic::{ConstantValue, Unresolved};
use crate::syntax::{has_comment, NodeKind, NodeRef};

static EMPTY_CATCH: RuleDescriptor = RuleDescriptor {
    id: "EX004",
    title: "Empty catch block",
    message: "Empty catch block silently swallows {0}",
    description: "An empty catch block hides failures. Handle the exception, log it, or leave a \
                  comment inside the block explaining why it is safe to ignore.",
    category: RuleCategory::Suspicious,
    severity: Severity::Warning,
    kinds: &[NodeKind::CatchClause],
};

/// A comment inside the block marks it as intentionally empty
pub struct EmptyCatch;

impl Rule for EmptyCatch {
    fn descriptor(&self) -> &RuleDescriptor {
        &EMPTY_CATCH
    }

    fn evaluate(&self, node: NodeRef<'_>, _cx: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
        let Some(block) = catch_block(node) else {
            return Ok(vec![]);
        };
        if block.child_count() > 0 || has_comment(block.inner()) {
            return Ok(vec![]);
        }
        let caught = match catch_type(node) {
            Some(ty) => format!("'{}'", ty.text()),
            None => "all exceptions".to_string(),
        };
        Ok(vec![Match::at(node).with_arg(caught)])
    }
}

static ALWAYS_TRUE_FILTER: RuleDescriptor = RuleDescriptor {
    id: "EX009",
    title: "Catch filter is always true",
    message: "Catch filter is always true and filters nothing",
    description: "A 'when' clause that is constantly true has no effect. Remove it or write the \
                  condition that was intended.",
    category: RuleCategory::Suspicious,
    severity: Severity::Warning,
    kinds: &[NodeKind::CatchFilter],
};

pub struct AlwaysTrueFilter;

impl Rule for AlwaysTrueFilter {
    fn descriptor(&self) -> &RuleDescriptor {
        &ALWAYS_TRUE_FILTER
    }

    fn evaluate(&self, node: NodeRef<'_>, cx: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
        let Some(condition) = node.first_child() else {
            return Ok(vec![]);
        };
        Ok(match cx.constant(condition) {
            Some(ConstantValue::Bool(true)) => vec![Match::at(node)],
            _ => vec![],
        })
    }
}

static MANUAL_TYPE_FILTER: RuleDescriptor = RuleDescriptor {
    id: "EX010",
    title: "Manual exception type filtering",
    message: "Catch '{1}' directly or use 'when ({0} is {1})' instead of testing the type inside the block",
    description: "Testing the caught exception's type with 'is' at the top of a catch block \
                  catches more than intended and loses the original throw site when rethrowing. \
                  A typed catch or an exception filter expresses the same intent.",
    category: RuleCategory::Style,
    severity: Severity::Info,
    kinds: &[NodeKind::CatchClause],
};

pub struct ManualTypeFilter;

impl Rule for ManualTypeFilter {
    fn descriptor(&self) -> &RuleDescriptor {
        &MANUAL_TYPE_FILTER
    }

    fn evaluate(&self, node: NodeRef<'_>, _cx: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
        if catch_filter(node).is_some() {
            return Ok(vec![]);
        }
        let Some(variable) = catch_variable(node) else {
            return Ok(vec![]);
        };
        let Some(check) = catch_block(node)
            .and_then(|b| b.first_child())
            .filter(|s| s.is(NodeKind::IfStatement))
        else {
            return Ok(vec![]);
        };

        let condition = check.first_child().map(unparenthesize);
        let Some(test) = condition.filter(|c| c.is(NodeKind::IsExpression)) else {
            return Ok(vec![]);
        };
        let subject = test.first_child().map(unparenthesize);
        if !subject.is_some_and(|s| is_identifier(s, variable)) {
            return Ok(vec![]);
        }
        let tested = test
            .child_of_kind(NodeKind::TypeName)
            .map(|t| t.text())
            .unwrap_or_default();
        Ok(vec![Match::at(check).with_arg(variable).with_arg(tested)])
    }
}

const THREAD_ABORT: &str = "System.Threading.ThreadAbortException";

static THREAD_ABORT_SWALLOW: RuleDescriptor = RuleDescriptor {
    id: "EX013",
    title: "ThreadAbortException swallowed",
    message: "ThreadAbortException is caught without being rethrown",
    description: "ThreadAbortException is rethrown automatically at the end of the catch block, \
                  so swallowing it has no effect and misleads the reader. Rethrow it explicitly.",
    category: RuleCategory::Correctness,
    severity: Severity::Warning,
    kinds: &[NodeKind::CatchClause],
};

pub struct ThreadAbortSwallow;

impl Rule for ThreadAbortSwallow {
    fn descriptor(&self) -> &RuleDescriptor {
        &THREAD_ABORT_SWALLOW
    }

    fn evaluate(&self, node: NodeRef<'_>, cx: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
        let (Some(ty), Some(block)) = (catch_type(node), catch_block(node)) else {
            return Ok(vec![]);
        };
        if cx.require_type(ty)? != THREAD_ABORT {
            return Ok(vec![]);
        }
        let rethrows = block.descendants().any(is_bare_rethrow);
        Ok(if rethrows { vec![] } else { vec![Match::at(node)] })
    }
}

static UNUSED_VARIABLE: RuleDescriptor = RuleDescriptor {
    id: "EX019",
    title: "Unused catch variable",
    message: "Catch variable '{0}' is never used",
    description: "Declaring a name for the caught exception that is never referenced adds \
                  noise. Catch the type alone.",
    category: RuleCategory::Style,
    severity: Severity::Info,
    kinds: &[NodeKind::CatchDeclaration],
};

pub struct UnusedCatchVariable;

impl Rule for UnusedCatchVariable {
    fn descriptor(&self) -> &RuleDescriptor {
        &UNUSED_VARIABLE
    }

    fn evaluate(&self, node: NodeRef<'_>, _cx: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
        let (Some(name), Some(clause)) = (node.text_opt(), node.parent()) else {
            return Ok(vec![]);
        };
        let used = clause
            .children()
            .filter(|c| c.is(NodeKind::CatchFilter) || c.is(NodeKind::Block))
            .any(|c| references(c, name));
        Ok(if used { vec![] } else { vec![Match::at(node).with_arg(name)] })
    }
}

#[cfg(test)]
mod tests {
    use crate::rules::testing::findings;
    use crate::syntax::{build::*, NodeKind, NodeSpec, Trivia};

    fn guarded(clause: NodeSpec) -> NodeSpec {
        try_stmt(block([expr_stmt(invoke(ident("Work"), []))]), [clause], None)
    }

    #[test]
    fn test_empty_catch() {
        let found = findings("EX004", &guarded(catch(Some("Exception"), None, None, block([]))));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, "Empty catch block silently swallows 'Exception'");

        let commented = block([]).with_inner(Trivia::line_comment("shutdown races are expected"));
        assert!(findings("EX004", &guarded(catch(Some("Exception"), None, None, commented))).is_empty());

        let general = findings("EX004", &guarded(catch(None, None, None, block([]))));
        assert_eq!(general[0].message, "Empty catch block silently swallows all exceptions");
    }

    #[test]
    fn test_always_true_filter() {
        let clause = |filter| guarded(catch(Some("Exception"), Some("ex"), Some(filter), block([rethrow()])));
        assert_eq!(findings("EX009", &clause(boolean(true))).len(), 1);
        assert_eq!(findings("EX009", &clause(paren(boolean(true)))).len(), 1);
        assert!(findings("EX009", &clause(boolean(false))).is_empty());
        assert!(findings("EX009", &clause(is_type(ident("ex"), "IOException"))).is_empty());
    }

    #[test]
    fn test_always_true_filter_folded_by_resolver() {
        let filter = binary("==", number("1"), number("1"));
        let spec = guarded(catch(Some("Exception"), Some("ex"), Some(filter), block([rethrow()])));
        assert_eq!(findings("EX009", &spec).len(), 1);
    }

    #[test]
    fn test_manual_type_filter() {
        let body = block([
            if_stmt(is_type(ident("ex"), "IOException"), block([rethrow()]), None),
            expr_stmt(invoke(ident("Log"), [ident("ex")])),
        ]);
        let found = findings("EX010", &guarded(catch(Some("Exception"), Some("ex"), None, body.clone())));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].node_kind, NodeKind::IfStatement);

        let filtered = catch(Some("Exception"), Some("ex"), Some(boolean(true)), body);
        assert!(findings("EX010", &guarded(filtered)).is_empty());
    }

    #[test]
    fn test_thread_abort_swallow() {
        let swallowed = guarded(catch(
            Some("ThreadAbortException"),
            None,
            None,
            block([expr_stmt(invoke(ident("Cleanup"), []))]),
        ));
        assert_eq!(findings("EX013", &swallowed).len(), 1);

        let rethrown = guarded(catch(Some("ThreadAbortException"), None, None, block([rethrow()])));
        assert!(findings("EX013", &rethrown).is_empty());

        let other = guarded(catch(Some("IOException"), None, None, block([])));
        assert!(findings("EX013", &other).is_empty());
    }

    #[test]
    fn test_unused_catch_variable() {
        let unused = guarded(catch(Some("Exception"), Some("ex"), None, block([rethrow()])));
        let found = findings("EX019", &unused);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].node_kind, NodeKind::CatchDeclaration);

        let in_filter = guarded(catch(
            Some("Exception"),
            Some("ex"),
            Some(is_type(ident("ex"), "IOException")),
            block([rethrow()]),
        ));
        assert!(findings("EX019", &in_filter).is_empty());
        assert!(findings("EX019", &guarded(catch(Some("Exception"), None, None, block([rethrow()])))).is_empty());
    }
}
