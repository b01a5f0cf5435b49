//! Rules on user-declared exception types

use super::query::{modifiers, parameter_types, EXCEPTION_SPELLINGS, STRING_SPELLINGS};
use crate::diagnostic::Severity;
use crate::rule::{Match, Rule, RuleCategory, RuleContext, RuleDescriptor};
use crate::semantic::{Unresolved, EXCEPTION};
use crate::syntax::{NodeKind, NodeRef};

/// Whether a class declaration declares a type strictly derived from `System.Exception`
fn declares_exception(node: NodeRef<'_>, cx: &RuleContext<'_>) -> Result<bool, Unresolved> {
    let symbol = cx.require_symbol(node)?;
    let ty = symbol.qualified_name.as_str();
    Ok(ty != EXCEPTION && cx.is_exception(ty))
}

static SUFFIX: RuleDescriptor = RuleDescriptor {
    id: "EX015",
    title: "Exception type name lacks 'Exception' suffix",
    message: "Exception type '{0}' should be named '{0}Exception'",
    description: "By convention every type deriving from System.Exception ends in 'Exception', \
                  which tells readers at a glance that it is thrown rather than returned.",
    category: RuleCategory::Naming,
    severity: Severity::Info,
    kinds: &[NodeKind::ClassDeclaration],
};

pub struct ExceptionSuffix;

impl Rule for ExceptionSuffix {
    fn descriptor(&self) -> &RuleDescriptor {
        &SUFFIX
    }

    fn evaluate(&self, node: NodeRef<'_>, cx: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
        if node.text().ends_with("Exception") || !declares_exception(node, cx)? {
            return Ok(vec![]);
        }
        Ok(vec![Match::at(node).with_arg(node.text())])
    }
}

/// Which standard constructors a class declares
pub struct StandardConstructors {
    pub message: bool,
    pub message_and_inner: bool,
}

impl StandardConstructors {
    pub fn of(class: NodeRef<'_>) -> Self {
        let mut found = Self {
            message: false,
            message_and_inner: false,
        };
        for constructor in class.children_of_kind(NodeKind::ConstructorDeclaration) {
            match parameter_types(constructor).as_slice() {
                [ty] if STRING_SPELLINGS.contains(ty) => found.message = true,
                [ty, inner] if STRING_SPELLINGS.contains(ty) && EXCEPTION_SPELLINGS.contains(inner) => {
                    found.message_and_inner = true
                }
                _ => {}
            }
        }
        found
    }

    pub fn is_complete(&self) -> bool {
        self.message && self.message_and_inner
    }

    fn describe_missing(&self) -> String {
        let mut missing = Vec::new();
        if !self.message {
            missing.push("(string message)");
        }
        if !self.message_and_inner {
            missing.push("(string message, Exception innerException)");
        }
        missing.join(" and ")
    }
}

static MISSING_CONSTRUCTORS: RuleDescriptor = RuleDescriptor {
    id: "EX017",
    title: "Missing standard exception constructors",
    message: "Exception type '{0}' is missing the constructors {1}",
    description: "Custom exceptions should offer the standard constructors so callers can attach \
                  a message and wrap an inner exception.",
    category: RuleCategory::Design,
    severity: Severity::Info,
    kinds: &[NodeKind::ClassDeclaration],
};

pub struct MissingConstructors;

impl Rule for MissingConstructors {
    fn descriptor(&self) -> &RuleDescriptor {
        &MISSING_CONSTRUCTORS
    }

    fn evaluate(&self, node: NodeRef<'_>, cx: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
        let found = StandardConstructors::of(node);
        if found.is_complete() || !declares_exception(node, cx)? {
            return Ok(vec![]);
        }
        Ok(vec![Match::at(node)
            .with_arg(node.text())
            .with_arg(found.describe_missing())])
    }
}

static NOT_PUBLIC: RuleDescriptor = RuleDescriptor {
    id: "EX018",
    title: "Exception type is not public",
    message: "Exception type '{0}' should be public",
    description: "Exceptions cross API boundaries. A non-public exception type cannot be caught \
                  by name outside its assembly, forcing callers to catch a base type.",
    category: RuleCategory::Design,
    severity: Severity::Warning,
    kinds: &[NodeKind::ClassDeclaration],
};

pub struct NotPublic;

impl Rule for NotPublic {
    fn descriptor(&self) -> &RuleDescriptor {
        &NOT_PUBLIC
    }

    fn evaluate(&self, node: NodeRef<'_>, cx: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved> {
        if modifiers(node).any(|m| m == "public") || !declares_exception(node, cx)? {
            return Ok(vec![]);
        }
        Ok(vec![Match::at(node).with_arg(node.text())])
    }
}
