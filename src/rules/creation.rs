//! Rules on exception object creation

use super::query::{arguments, enclosing_callable, simple_name, STRING_SPELLINGS};
use crate::diagnostic::Severity;
use crate::rule::{Match, Rule, RuleCategory, RuleContext, RuleDescriptor};
use crate::semantic::{ConstantValue, Unresolved};
use crate::syntax::{NodeKind, NodeRef};

static MISSING_MESSAGE: RuleDescriptor = RuleDescriptor {
    id: "EX001",
    title: "Exception created without a message",
    message: "'{0}' is created without a meaningful message",
    description: "Exceptions should describe what went wrong. A constructor call with no \
                  arguments, or with a null, empty or whitespace-only message literal, leaves \
                  the reader of a log or stack trace without context.",
    category: RuleCategory::Usage,
    severity: Severity::Warning,
    kinds: &[NodeKind::ObjectCreation],
};

pub struct MissingMessage;

impl Rule for MissingMessage {
    fn descriptor(&self) -> &RuleDescriptor {
        &MISSING_MESSAGE
    }

    fn evaluate(&self, node: NodeRef<'_>, cx: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
        let Some(ty) = cx.require_exception_type(node)? else {
            return Ok(vec![]);
        };
        let args = arguments(node);
        if args.is_empty() {
            return Ok(vec![Match::at(node).with_arg(simple_name(ty))]);
        }

        let constructor = cx.require_symbol(node)?;
        let message_index = constructor.parameters.iter().position(|p| {
            p.type_name == "System.String" || STRING_SPELLINGS.contains(&p.type_name.as_str())
        });
        let Some(message) = message_index.and_then(|i| args.get(i)) else {
            return Ok(vec![]);
        };

        // Computed messages are never flagged
        let blank = match cx.constant(*message) {
            Some(ConstantValue::Null) => true,
            Some(ConstantValue::String(text)) => text.trim().is_empty(),
            _ => false,
        };
        Ok(if blank {
            vec![Match::at(node).with_arg(simple_name(ty))]
        } else {
            vec![]
        })
    }
}

static NOT_IMPLEMENTED: RuleDescriptor = RuleDescriptor {
    id: "EX014",
    title: "NotImplementedException left in code",
    message: "NotImplementedException marks unfinished code",
    description: "NotImplementedException is a placeholder for work in progress. Implement the \
                  member, or throw NotSupportedException if the operation is intentionally \
                  unavailable.",
    category: RuleCategory::Usage,
    severity: Severity::Info,
    kinds: &[NodeKind::ObjectCreation],
};

pub struct NotImplemented;

impl Rule for NotImplemented {
    fn descriptor(&self) -> &RuleDescriptor {
        &NOT_IMPLEMENTED
    }

    fn evaluate(&self, node: NodeRef<'_>, cx: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
        let ty = cx.require_type(node)?;
        Ok(if ty == "System.NotImplementedException" {
            vec![Match::at(node)]
        } else {
            vec![]
        })
    }
}

const RESERVED_TYPES: &[&str] = &[
    "System.NullReferenceException",
    "System.IndexOutOfRangeException",
    "System.OutOfMemoryException",
    "System.StackOverflowException",
    "System.ExecutionEngineException",
    "System.AccessViolationException",
];

static RESERVED: RuleDescriptor = RuleDescriptor {
    id: "EX021",
    title: "Reserved exception type thrown",
    message: "'{0}' is reserved for the runtime and should not be thrown by user code",
    description: "Some exception types are raised only by the runtime. Throwing them from \
                  application code misleads callers about the failure; throw an argument or \
                  operation exception instead.",
    category: RuleCategory::Usage,
    severity: Severity::Warning,
    kinds: &[NodeKind::ObjectCreation],
};

pub struct ReservedException;

impl Rule for ReservedException {
    fn descriptor(&self) -> &RuleDescriptor {
        &RESERVED
    }

    fn evaluate(&self, node: NodeRef<'_>, cx: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
        let thrown = node
            .parent()
            .is_some_and(|p| p.is(NodeKind::ThrowStatement) || p.is(NodeKind::ThrowExpression));
        if !thrown {
            return Ok(vec![]);
        }
        let ty = cx.require_type(node)?;
        Ok(if RESERVED_TYPES.contains(&ty) {
            vec![Match::at(node).with_arg(simple_name(ty))]
        } else {
            vec![]
        })
    }
}

static NOT_THROWN: RuleDescriptor = RuleDescriptor {
    id: "EX022",
    title: "Exception created but not thrown",
    message: "'{0}' is created but never thrown",
    description: "Creating an exception as a statement on its own has no effect. The \
                  'throw' keyword is most likely missing.",
    category: RuleCategory::Correctness,
    severity: Severity::Warning,
    kinds: &[NodeKind::ObjectCreation],
};

pub struct CreatedNotThrown;

impl Rule for CreatedNotThrown {
    fn descriptor(&self) -> &RuleDescriptor {
        &NOT_THROWN
    }

    fn evaluate(&self, node: NodeRef<'_>, cx: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
        if !node.parent().is_some_and(|p| p.is(NodeKind::ExpressionStatement)) {
            return Ok(vec![]);
        }
        Ok(match cx.require_exception_type(node)? {
            Some(ty) => vec![Match::at(node).with_arg(simple_name(ty))],
            None => vec![],
        })
    }
}

const ARGUMENT_TYPES: &[&str] = &[
    "System.ArgumentException",
    "System.ArgumentNullException",
    "System.ArgumentOutOfRangeException",
];

static PARAM_NAME_LITERAL: RuleDescriptor = RuleDescriptor {
    id: "EX023",
    title: "Parameter name passed as string literal",
    message: "Use nameof({0}) instead of the string literal \"{0}\"",
    description: "A parameter name written as a string literal silently goes stale when the \
                  parameter is renamed. nameof keeps it in sync.",
    category: RuleCategory::Style,
    severity: Severity::Info,
    kinds: &[NodeKind::ObjectCreation],
};

pub struct ParamNameLiteral;

impl Rule for ParamNameLiteral {
    fn descriptor(&self) -> &RuleDescriptor {
        &PARAM_NAME_LITERAL
    }

    fn evaluate(&self, node: NodeRef<'_>, cx: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
        let ty = cx.require_type(node)?;
        if !ARGUMENT_TYPES.contains(&ty) {
            return Ok(vec![]);
        }
        let Some(callable) = enclosing_callable(node) else {
            return Ok(vec![]);
        };

        let constructor = cx.require_symbol(node)?;
        let args = arguments(node);
        let literal = constructor
            .parameters
            .iter()
            .position(|p| p.name == "paramName")
            .and_then(|i| args.get(i))
            .filter(|a| a.is(NodeKind::StringLiteral))
            .map(|a| a.text());
        let Some(literal) = literal else {
            return Ok(vec![]);
        };

        let declared = callable
            .child_of_kind(NodeKind::ParameterList)
            .is_some_and(|list| list.children().any(|p| p.text() == literal));
        Ok(if declared {
            vec![Match::at(node).with_arg(literal)]
        } else {
            vec![]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::{findings, findings_with};
    use crate::semantic::{FactTable, ParameterInfo, Symbol, SymbolKind};
    use crate::syntax::{build::*, SyntaxTree};

    #[test]
    fn test_missing_message() {
        let flagged = [
            throw(new_object("Exception", [])),
            throw(new_object("InvalidOperationException", [string("  ")])),
            throw(new_object("InvalidOperationException", [null()])),
        ];
        for spec in flagged {
            assert_eq!(findings("EX001", &spec).len(), 1, "{:?}", spec);
        }

        let clean = [
            throw(new_object("InvalidOperationException", [string("Queue is empty")])),
            throw(new_object("InvalidOperationException", [invoke(ident("Describe"), [])])),
            expr_stmt(invoke(ident("Use"), [new_object("Widget", [])])),
        ];
        for spec in clean {
            assert!(findings("EX001", &spec).is_empty(), "{:?}", spec);
        }
    }

    #[test]
    fn test_missing_message_uses_string_parameter() {
        // ArgumentNullException(paramName) binds the first string parameter
        let spec = throw(new_object("ArgumentNullException", [string("")]));
        assert_eq!(findings("EX001", &spec).len(), 1);
    }

    #[test]
    fn test_missing_message_needs_constructor_symbol() {
        let spec = throw(new_object("FooException", [string("")]));
        let tree = SyntaxTree::from_spec(&spec).unwrap();
        let creation = tree.root().first_child().unwrap();
        let facts = FactTable::new()
            .with_type(creation.id(), "App.FooException")
            .with_base("App.FooException", "System.Exception");
        assert!(findings_with("EX001", &tree, &facts).is_empty());

        let facts = facts.with_symbol(
            creation.id(),
            Symbol::new(SymbolKind::Constructor, "App.FooException..ctor")
                .with_parameters(vec![ParameterInfo::new("message", "System.String")]),
        );
        assert_eq!(findings_with("EX001", &tree, &facts).len(), 1);
    }

    #[test]
    fn test_not_implemented() {
        let spec = method(
            "Run",
            &["public"],
            "void",
            [],
            block([throw(new_object("NotImplementedException", []))]),
        );
        let found = findings("EX014", &spec);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].node_kind, NodeKind::ObjectCreation);
    }

    #[test]
    fn test_reserved_exception() {
        let spec = throw(new_object("NullReferenceException", [string("x")]));
        let found = findings("EX021", &spec);
        assert_eq!(found.len(), 1);
        assert!(found[0].message.starts_with("'NullReferenceException'"));

        let caught = local("NullReferenceException", "e", Some(new_object("NullReferenceException", [])));
        assert!(findings("EX021", &caught).is_empty());
    }

    #[test]
    fn test_created_not_thrown() {
        let spec = block([expr_stmt(new_object("InvalidOperationException", [string("x")]))]);
        assert_eq!(findings("EX022", &spec).len(), 1);
        let spec = block([expr_stmt(new_object("StringBuilder", []))]);
        assert!(findings("EX022", &spec).is_empty());
    }

    #[test]
    fn test_param_name_literal() {
        let body = |arg: &str| {
            method(
                "Load",
                &["public"],
                "void",
                [param("string", "path")],
                block([if_stmt(
                    binary("==", ident("path"), null()),
                    throw(new_object("ArgumentNullException", [string(arg)])),
                    None,
                )]),
            )
        };
        let found = findings("EX023", &body("path"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, "Use nameof(path) instead of the string literal \"path\"");
        assert!(findings("EX023", &body("other")).is_empty());
    }
}
