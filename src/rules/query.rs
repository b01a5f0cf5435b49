//! Shape queries shared by the rules and fixers

use crate::syntax::{NodeKind, NodeRef};
use regex::Regex;
use std::sync::LazyLock;

/// Spellings of the string type in parameter lists
pub const STRING_SPELLINGS: &[&str] = &["string", "String", "System.String"];

/// Spellings of the base exception type in parameter lists
pub const EXCEPTION_SPELLINGS: &[&str] = &["Exception", "System.Exception"];

/// Strict ancestors up to, not including, the enclosing member declaration
pub fn ancestors_in_member<'t>(node: NodeRef<'t>) -> impl Iterator<Item = NodeRef<'t>> {
    node.ancestors().take_while(|a| !a.kind().is_member())
}

/// Nearest member declaration containing the node
pub fn enclosing_member(node: NodeRef<'_>) -> Option<NodeRef<'_>> {
    node.ancestors().find(|a| a.kind().is_member())
}

/// Nearest method or constructor containing the node
pub fn enclosing_callable(node: NodeRef<'_>) -> Option<NodeRef<'_>> {
    enclosing_member(node).filter(|m| {
        m.is(NodeKind::MethodDeclaration) || m.is(NodeKind::ConstructorDeclaration)
    })
}

/// Nearest catch clause whose filter or block contains the node
pub fn enclosing_catch(node: NodeRef<'_>) -> Option<NodeRef<'_>> {
    ancestors_in_member(node).find(|a| a.is(NodeKind::CatchClause))
}

/// Declared exception variable of a catch clause
pub fn catch_variable<'t>(catch: NodeRef<'t>) -> Option<&'t str> {
    catch
        .child_of_kind(NodeKind::CatchDeclaration)?
        .text_opt()
}

/// Type name node of a catch clause's declaration
pub fn catch_type(catch: NodeRef<'_>) -> Option<NodeRef<'_>> {
    catch
        .child_of_kind(NodeKind::CatchDeclaration)?
        .child_of_kind(NodeKind::TypeName)
}

pub fn catch_block(catch: NodeRef<'_>) -> Option<NodeRef<'_>> {
    catch.child_of_kind(NodeKind::Block)
}

pub fn catch_filter(catch: NodeRef<'_>) -> Option<NodeRef<'_>> {
    catch.child_of_kind(NodeKind::CatchFilter)
}

/// `throw;` with no operand
pub fn is_bare_rethrow(node: NodeRef<'_>) -> bool {
    node.is(NodeKind::ThrowStatement) && node.child_count() == 0
}

/// Block holding exactly one statement, a bare rethrow
pub fn is_sole_rethrow(block: NodeRef<'_>) -> bool {
    block.child_count() == 1 && block.first_child().is_some_and(is_bare_rethrow)
}

/// Operand of a throw statement or expression, with parentheses removed
pub fn thrown_operand(node: NodeRef<'_>) -> Option<NodeRef<'_>> {
    node.first_child().map(unparenthesize)
}

pub fn unparenthesize(mut node: NodeRef<'_>) -> NodeRef<'_> {
    while node.is(NodeKind::ParenthesizedExpression) {
        match node.first_child() {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

/// Argument expressions of a creation or invocation
pub fn arguments(node: NodeRef<'_>) -> Vec<NodeRef<'_>> {
    node.child_of_kind(NodeKind::ArgumentList)
        .map(|list| list.children().filter_map(|a| a.first_child()).collect())
        .unwrap_or_default()
}

/// Whether `node` is an identifier spelled `name`
pub fn is_identifier(node: NodeRef<'_>, name: &str) -> bool {
    node.is(NodeKind::IdentifierName) && node.text() == name
}

/// Whether any identifier in the subtree is spelled `name`
pub fn references(node: NodeRef<'_>, name: &str) -> bool {
    node.subtree().any(|n| is_identifier(n, name))
}

/// Modifier keywords of a declaration
pub fn modifiers<'t>(decl: NodeRef<'t>) -> impl Iterator<Item = &'t str> + 't {
    decl.children_of_kind(NodeKind::Modifier).map(|m| m.text())
}

/// Parameter type spellings of a constructor or method
pub fn parameter_types<'t>(decl: NodeRef<'t>) -> Vec<&'t str> {
    decl.child_of_kind(NodeKind::ParameterList)
        .map(|list| {
            list.children()
                .map(|p| {
                    p.child_of_kind(NodeKind::TypeName)
                        .map(|t| t.text())
                        .unwrap_or_default()
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Last segment of a dotted name
pub fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

static LOG_METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Log(Trace|Debug|Information|Info|Warning|Warn|Error|Critical|Fatal)?$")
        .expect("log method pattern is a valid regex")
});

const LEVEL_METHODS: &[&str] = &[
    "Trace",
    "Debug",
    "Info",
    "Information",
    "Warn",
    "Warning",
    "Error",
    "Fatal",
    "Critical",
];

/// Whether an invocation looks like a call into a logging API
///
/// Matches `x.Log(...)`, `x.LogError(...)` and friends, and level methods
/// such as `Error(...)` on a receiver whose name mentions "log".
pub fn is_logging_call(invocation: NodeRef<'_>) -> bool {
    let Some(callee) = invocation.first_child() else {
        return false;
    };
    let (method, receiver) = match callee.kind() {
        NodeKind::MemberAccess => (callee.text(), callee.first_child()),
        NodeKind::IdentifierName => (callee.text(), None),
        _ => return false,
    };

    if LOG_METHOD.is_match(method) {
        return true;
    }

    let receiver_is_logger = receiver
        .map(|r| match r.kind() {
            NodeKind::MemberAccess | NodeKind::IdentifierName => r.text().to_lowercase(),
            _ => String::new(),
        })
        .is_some_and(|name| name.contains("log"));
    receiver_is_logger && LEVEL_METHODS.contains(&method)
}
