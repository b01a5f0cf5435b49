//! Rules on throw statements and expressions

use super::query::{
    ancestors_in_member, arguments, catch_block, catch_variable, enclosing_catch, is_identifier,
    is_sole_rethrow, simple_name, thrown_operand, unparenthesize,
};
use crate::diagnostic::Severity;
use crate::rule::{literal_value, Match, Rule, RuleCategory, RuleContext, RuleDescriptor};
use crate::semantic::{ConstantValue, Unresolved};
use crate::syntax::{NodeKind, NodeRef};

static PRESERVE_STACK_TRACE: RuleDescriptor = RuleDescriptor {
    id: "EX002",
    title: "Rethrow loses the stack trace",
    message: "'throw {0};' resets the stack trace; use 'throw;' to rethrow",
    description: "Throwing the caught exception variable again starts a new stack trace at the \
                  rethrow site. A bare 'throw;' rethrows the original exception unchanged.",
    category: RuleCategory::Correctness,
    severity: Severity::Warning,
    kinds: &[NodeKind::ThrowStatement],
};

/// Matches the catch variable by name only; a shadowing local with the
/// same name is treated as the catch variable.
pub struct PreserveStackTrace;

impl Rule for PreserveStackTrace {
    fn descriptor(&self) -> &RuleDescriptor {
        &PRESERVE_STACK_TRACE
    }

    fn evaluate(&self, node: NodeRef<'_>, _cx: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
        let Some(operand) = node.first_child() else {
            return Ok(vec![]);
        };
        let variable = enclosing_catch(node).and_then(catch_variable);
        Ok(match variable {
            Some(name) if is_identifier(operand, name) => vec![Match::at(node).with_arg(name)],
            _ => vec![],
        })
    }
}

static INNER_EXCEPTION: RuleDescriptor = RuleDescriptor {
    id: "EX003",
    title: "Inner exception not preserved",
    message: "'{0}' thrown from a catch block does not pass '{1}' as its inner exception",
    description: "When a catch block throws a new exception, pass the caught exception as the \
                  inner exception so the original failure and its stack trace are kept.",
    category: RuleCategory::Correctness,
    severity: Severity::Warning,
    kinds: &[NodeKind::ThrowStatement],
};

/// Lexical like [`PreserveStackTrace`]: any argument spelled like the catch
/// variable counts as passing it.
pub struct MissingInnerException;

impl Rule for MissingInnerException {
    fn descriptor(&self) -> &RuleDescriptor {
        &INNER_EXCEPTION
    }

    fn evaluate(&self, node: NodeRef<'_>, cx: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
        let Some(creation) = thrown_operand(node).filter(|o| o.is(NodeKind::ObjectCreation)) else {
            return Ok(vec![]);
        };
        let Some(variable) = enclosing_catch(node).and_then(catch_variable) else {
            return Ok(vec![]);
        };
        if arguments(creation)
            .iter()
            .any(|a| is_identifier(unparenthesize(*a), variable))
        {
            return Ok(vec![]);
        }
        Ok(match cx.require_exception_type(creation)? {
            Some(ty) => vec![Match::at(node).with_arg(simple_name(ty)).with_arg(variable)],
            None => vec![],
        })
    }
}

static POINTLESS_TRY: RuleDescriptor = RuleDescriptor {
    id: "EX005",
    title: "Pointless try/catch",
    message: "{0} only rethrows and has no effect",
    description: "A catch block that does nothing but rethrow, or a try block that only \
                  rethrows without any catch clause, adds noise without changing behavior.",
    category: RuleCategory::Style,
    severity: Severity::Info,
    kinds: &[NodeKind::TryStatement, NodeKind::CatchClause],
};

pub struct PointlessTry;

impl Rule for PointlessTry {
    fn descriptor(&self) -> &RuleDescriptor {
        &POINTLESS_TRY
    }

    fn evaluate(&self, node: NodeRef<'_>, _cx: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
        let pointless = match node.kind() {
            NodeKind::TryStatement => {
                node.child_of_kind(NodeKind::CatchClause).is_none()
                    && node.child_of_kind(NodeKind::Block).is_some_and(is_sole_rethrow)
            }
            _ => catch_block(node).is_some_and(is_sole_rethrow),
        };
        if !pointless {
            return Ok(vec![]);
        }
        let what = if node.is(NodeKind::TryStatement) {
            "try block"
        } else {
            "catch block"
        };
        Ok(vec![Match::at(node).with_arg(what)])
    }
}

const BASE_TYPES: &[&str] = &["System.Exception", "System.SystemException"];

static BASE_EXCEPTION: RuleDescriptor = RuleDescriptor {
    id: "EX006",
    title: "Throwing a base exception type",
    message: "Throw a more specific exception than '{0}'",
    description: "Exception and SystemException are too general for callers to handle \
                  selectively. Throw a specific framework exception or a dedicated type.",
    category: RuleCategory::Usage,
    severity: Severity::Warning,
    kinds: &[NodeKind::ThrowStatement, NodeKind::ThrowExpression],
};

/// Zero-argument creations are left to the missing-message rule
pub struct BaseExceptionThrow;

impl Rule for BaseExceptionThrow {
    fn descriptor(&self) -> &RuleDescriptor {
        &BASE_EXCEPTION
    }

    fn evaluate(&self, node: NodeRef<'_>, cx: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
        let Some(creation) = thrown_operand(node).filter(|o| o.is(NodeKind::ObjectCreation)) else {
            return Ok(vec![]);
        };
        if arguments(creation).is_empty() {
            return Ok(vec![]);
        }
        let ty = cx.require_type(creation)?;
        Ok(if BASE_TYPES.contains(&ty) {
            vec![Match::at(node).with_arg(simple_name(ty))]
        } else {
            vec![]
        })
    }
}

static THROW_NULL: RuleDescriptor = RuleDescriptor {
    id: "EX007",
    title: "Throwing null",
    message: "Throwing null raises a NullReferenceException instead",
    description: "'throw null' does not throw the intended exception; the runtime replaces it \
                  with a NullReferenceException.",
    category: RuleCategory::Correctness,
    severity: Severity::Error,
    kinds: &[NodeKind::ThrowStatement, NodeKind::ThrowExpression],
};

pub struct ThrowNull;

impl Rule for ThrowNull {
    fn descriptor(&self) -> &RuleDescriptor {
        &THROW_NULL
    }

    fn evaluate(&self, node: NodeRef<'_>, _cx: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
        let is_null = thrown_operand(node)
            .and_then(literal_value)
            .is_some_and(|v| v == ConstantValue::Null);
        Ok(if is_null { vec![Match::at(node)] } else { vec![] })
    }
}

static GETTER_THROW: RuleDescriptor = RuleDescriptor {
    id: "EX008",
    title: "Throw in property getter",
    message: "Property getter '{0}' throws an exception",
    description: "Property getters are expected to be cheap and safe. Throwing from a getter \
                  surprises callers and debuggers; use a method or return a default instead.",
    category: RuleCategory::Design,
    severity: Severity::Warning,
    kinds: &[NodeKind::ThrowStatement, NodeKind::ThrowExpression],
};

pub struct GetterThrow;

impl Rule for GetterThrow {
    fn descriptor(&self) -> &RuleDescriptor {
        &GETTER_THROW
    }

    fn evaluate(&self, node: NodeRef<'_>, _cx: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
        for ancestor in node.ancestors() {
            match ancestor.kind() {
                NodeKind::AccessorDeclaration => {
                    if ancestor.text() != "get" {
                        return Ok(vec![]);
                    }
                    let property = ancestor
                        .ancestors()
                        .find(|a| a.is(NodeKind::PropertyDeclaration));
                    let name = property.map(|p| p.text()).unwrap_or_default();
                    return Ok(vec![Match::at(node).with_arg(name)]);
                }
                NodeKind::ArrowExpressionClause => {
                    if let Some(property) = ancestor
                        .parent()
                        .filter(|p| p.is(NodeKind::PropertyDeclaration))
                    {
                        return Ok(vec![Match::at(node).with_arg(property.text())]);
                    }
                }
                kind if kind.is_member() => break,
                _ => {}
            }
        }
        Ok(vec![])
    }
}

static THROW_IN_FINALLY: RuleDescriptor = RuleDescriptor {
    id: "EX020",
    title: "Throw inside finally block",
    message: "Throwing from a finally block hides any exception already in flight",
    description: "An exception thrown from a finally block replaces the exception that was \
                  propagating, and the original failure is lost.",
    category: RuleCategory::Suspicious,
    severity: Severity::Warning,
    kinds: &[NodeKind::ThrowStatement],
};

pub struct ThrowInFinally;

impl Rule for ThrowInFinally {
    fn descriptor(&self) -> &RuleDescriptor {
        &THROW_IN_FINALLY
    }

    fn evaluate(&self, node: NodeRef<'_>, _cx: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
        let in_finally = ancestors_in_member(node).any(|a| a.is(NodeKind::FinallyClause));
        Ok(if in_finally { vec![Match::at(node)] } else { vec![] })
    }
}

#[cfg(test)]
mod tests {
    use crate::rules::testing::findings;
    use crate::syntax::{build::*, NodeKind, NodeSpec};

    fn in_catch(var: Option<&str>, statements: Vec<NodeSpec>) -> NodeSpec {
        method(
            "Run",
            &[],
            "void",
            [],
            block([try_stmt(
                block([expr_stmt(invoke(ident("Work"), []))]),
                [catch(Some("Exception"), var, None, block(statements))],
                None,
            )]),
        )
    }

    #[test]
    fn test_preserve_stack_trace() {
        let found = findings("EX002", &in_catch(Some("ex"), vec![throw(ident("ex"))]));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].node_kind, NodeKind::ThrowStatement);

        assert!(findings("EX002", &in_catch(Some("ex"), vec![rethrow()])).is_empty());
        assert!(findings("EX002", &in_catch(Some("ex"), vec![throw(ident("other"))])).is_empty());
    }

    #[test]
    fn test_preserve_stack_trace_is_lexical() {
        // a shadowing local spelled like the catch variable is still reported
        let spec = in_catch(
            Some("ex"),
            vec![block([
                local("Exception", "ex", Some(new_object("Exception", [string("x")]))),
                throw(ident("ex")),
            ])],
        );
        assert_eq!(findings("EX002", &spec).len(), 1);
    }

    #[test]
    fn test_missing_inner_exception() {
        let wrapped = |args: Vec<NodeSpec>| {
            in_catch(Some("ex"), vec![throw(new_object("InvalidOperationException", args))])
        };
        let found = findings("EX003", &wrapped(vec![string("failed")]));
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].message,
            "'InvalidOperationException' thrown from a catch block does not pass 'ex' as its inner exception"
        );
        assert_eq!(findings("EX003", &wrapped(vec![member(ident("ex"), "Message")])).len(), 1);
        assert!(findings("EX003", &wrapped(vec![string("failed"), ident("ex")])).is_empty());
        assert!(findings("EX003", &wrapped(vec![string("failed"), paren(ident("ex"))])).is_empty());
        let parenthesized = in_catch(
            Some("ex"),
            vec![throw(paren(new_object("InvalidOperationException", [string("failed")])))],
        );
        assert_eq!(findings("EX003", &parenthesized).len(), 1);

        // no catch variable to pass
        let spec = in_catch(None, vec![throw(new_object("InvalidOperationException", [string("x")]))]);
        assert!(findings("EX003", &spec).is_empty());
    }

    #[test]
    fn test_pointless_try() {
        assert_eq!(findings("EX005", &in_catch(Some("ex"), vec![rethrow()])).len(), 1);
        let try_only = try_stmt(block([rethrow()]), [], Some(block([expr_stmt(invoke(ident("Close"), []))])));
        let found = findings("EX005", &try_only);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, "try block only rethrows and has no effect");
        assert!(findings("EX005", &in_catch(Some("ex"), vec![expr_stmt(invoke(ident("Log"), [ident("ex")])), rethrow()])).is_empty());
    }

    #[test]
    fn test_base_exception_throw() {
        assert_eq!(findings("EX006", &throw(new_object("Exception", [string("x")]))).len(), 1);
        assert_eq!(findings("EX006", &throw(new_object("SystemException", [string("x")]))).len(), 1);
        assert!(findings("EX006", &throw(new_object("Exception", []))).is_empty());
        assert!(findings("EX006", &throw(new_object("IOException", [string("x")]))).is_empty());
        let expr = property_arrow("Name", &[], "string", throw_expr(new_object("Exception", [string("x")])));
        assert_eq!(findings("EX006", &expr).len(), 1);
    }

    #[test]
    fn test_throw_null() {
        assert_eq!(findings("EX007", &throw(null())).len(), 1);
        assert_eq!(findings("EX007", &throw(paren(null()))).len(), 1);
        assert!(findings("EX007", &throw(ident("error"))).is_empty());
    }

    #[test]
    fn test_getter_throw() {
        let thrown = || throw(new_object("InvalidOperationException", [string("x")]));
        let getter = property("Value", &["public"], "int", [accessor("get", Some(block([thrown()])))]);
        let found = findings("EX008", &getter);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, "Property getter 'Value' throws an exception");

        let arrow_getter = property(
            "Value",
            &[],
            "int",
            [accessor("get", Some(arrow(throw_expr(new_object("InvalidOperationException", [string("x")])))))],
        );
        assert_eq!(findings("EX008", &arrow_getter).len(), 1);

        let arrow_property = property_arrow("Value", &[], "int", throw_expr(new_object("InvalidOperationException", [string("x")])));
        assert_eq!(findings("EX008", &arrow_property).len(), 1);

        let setter = property("Value", &[], "int", [accessor("set", Some(block([thrown()])))]);
        assert!(findings("EX008", &setter).is_empty());
        assert!(findings("EX008", &method("Get", &[], "int", [], block([thrown()]))).is_empty());
    }

    #[test]
    fn test_throw_in_finally() {
        let spec = try_stmt(
            block([]),
            [],
            Some(block([throw(new_object("InvalidOperationException", [string("x")]))])),
        );
        assert_eq!(findings("EX020", &spec).len(), 1);
        assert!(findings("EX020", &in_catch(Some("ex"), vec![rethrow()])).is_empty());
    }
}
