//! Rules on how caught exceptions reach logging calls

use super::query::{arguments, catch_variable, enclosing_catch, is_identifier, is_logging_call, unparenthesize};
use crate::diagnostic::Severity;
use crate::rule::{Match, Rule, RuleCategory, RuleContext, RuleDescriptor};
use crate::semantic::{Unresolved, EXCEPTION};
use crate::syntax::{NodeKind, NodeRef};

static LOG_FULL_EXCEPTION: RuleDescriptor = RuleDescriptor {
    id: "EX011",
    title: "Log the full exception",
    message: "Pass '{0}' to the logger instead of only '{0}.Message'",
    description: "Logging only the exception message drops the exception type, the stack trace \
                  and any inner exceptions. Pass the exception object to the logger.",
    category: RuleCategory::Logging,
    severity: Severity::Warning,
    kinds: &[NodeKind::Invocation],
};

pub struct LogFullException;

impl Rule for LogFullException {
    fn descriptor(&self) -> &RuleDescriptor {
        &LOG_FULL_EXCEPTION
    }

    fn evaluate(&self, node: NodeRef<'_>, _cx: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
        if !is_logging_call(node) {
            return Ok(vec![]);
        }
        let Some(variable) = enclosing_catch(node).and_then(catch_variable) else {
            return Ok(vec![]);
        };

        let args = arguments(node);
        let passes_exception = args.iter().any(|a| is_identifier(unparenthesize(*a), variable));
        let uses_message = args.iter().any(|a| {
            a.subtree().any(|n| {
                n.is(NodeKind::MemberAccess)
                    && n.text() == "Message"
                    && n.first_child().is_some_and(|t| is_identifier(t, variable))
            })
        });

        Ok(if uses_message && !passes_exception {
            vec![Match::at(node).with_arg(variable)]
        } else {
            vec![]
        })
    }
}

static FLATTENED: RuleDescriptor = RuleDescriptor {
    id: "EX012",
    title: "Exception flattened to string in log",
    message: "'{0}' is converted to a string before logging; pass the exception object instead",
    description: "Calling ToString() on an exception or interpolating it into the log message \
                  turns structured exception data into plain text. Structured loggers accept \
                  the exception as its own argument.",
    category: RuleCategory::Logging,
    severity: Severity::Info,
    kinds: &[NodeKind::Invocation],
};

pub struct FlattenedException;

impl FlattenedException {
    /// Identifier an argument flattens to text, if any
    fn flattened<'t>(node: NodeRef<'t>) -> Option<NodeRef<'t>> {
        match node.kind() {
            NodeKind::Invocation => {
                let callee = node.first_child()?;
                if !callee.is(NodeKind::MemberAccess) || callee.text() != "ToString" {
                    return None;
                }
                callee
                    .first_child()
                    .map(unparenthesize)
                    .filter(|t| t.is(NodeKind::IdentifierName))
            }
            NodeKind::Interpolation => node
                .first_child()
                .map(unparenthesize)
                .filter(|t| t.is(NodeKind::IdentifierName)),
            _ => None,
        }
    }
}

impl Rule for FlattenedException {
    fn descriptor(&self) -> &RuleDescriptor {
        &FLATTENED
    }

    fn evaluate(&self, node: NodeRef<'_>, cx: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
        if !is_logging_call(node) {
            return Ok(vec![]);
        }

        // an identifier with no resolved type is not a candidate
        let flattened = arguments(node).into_iter().find_map(|arg| {
            arg.subtree()
                .filter_map(Self::flattened)
                .find(|candidate| cx.type_of(*candidate) == Some(EXCEPTION))
        });
        Ok(match flattened {
            Some(candidate) => vec![Match::at(node).with_arg(candidate.text())],
            None => vec![],
        })
    }
}
