//! Rule definition and evaluation context

use crate::diagnostic::Severity;
use crate::semantic::{self, ConstantValue, SemanticModel, Symbol, Unresolved};
use crate::syntax::{NodeId, NodeKind, NodeRef, SyntaxTree};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rule category for grouping related rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    /// Code that is definitely wrong
    Correctness,
    /// Code that is likely wrong or suspicious
    Suspicious,
    /// Idiomatic and consistent style rules
    #[default]
    Style,
    /// Misuse of exception APIs
    Usage,
    /// Shape of exception types and members
    Design,
    Naming,
    Logging,
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleCategory::Correctness => write!(f, "correctness"),
            RuleCategory::Suspicious => write!(f, "suspicious"),
            RuleCategory::Style => write!(f, "style"),
            RuleCategory::Usage => write!(f, "usage"),
            RuleCategory::Design => write!(f, "design"),
            RuleCategory::Naming => write!(f, "naming"),
            RuleCategory::Logging => write!(f, "logging"),
        }
    }
}

impl std::str::FromStr for RuleCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "correctness" => Ok(RuleCategory::Correctness),
            "suspicious" => Ok(RuleCategory::Suspicious),
            "style" => Ok(RuleCategory::Style),
            "usage" => Ok(RuleCategory::Usage),
            "design" => Ok(RuleCategory::Design),
            "naming" => Ok(RuleCategory::Naming),
            "logging" | "log" => Ok(RuleCategory::Logging),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

/// Static description of a rule
#[derive(Debug, Clone, Serialize)]
pub struct RuleDescriptor {
    /// Stable identifier, `EX` followed by three digits
    pub id: &'static str,
    pub title: &'static str,
    /// Message template; `{0}`, `{1}`, ... are replaced by match arguments
    pub message: &'static str,
    /// Longer explanation shown by `explain` and as help text
    pub description: &'static str,
    pub category: RuleCategory,
    pub severity: Severity,
    /// Node kinds the rule is invoked on
    pub kinds: &'static [NodeKind],
}

impl RuleDescriptor {
    /// Fill the message template's positional placeholders
    ///
    /// Arguments are inserted verbatim; placeholders inside them are not expanded.
    pub fn render_message(&self, args: &[String]) -> String {
        let mut message = String::with_capacity(self.message.len());
        let mut rest = self.message;
        while let Some(open) = rest.find('{') {
            message.push_str(&rest[..open]);
            let tail = &rest[open + 1..];
            let arg = tail.find('}').and_then(|close| {
                let index: usize = tail[..close].parse().ok()?;
                args.get(index).map(|arg| (arg, close))
            });
            match arg {
                Some((arg, close)) => {
                    message.push_str(arg);
                    rest = &tail[close + 1..];
                }
                None => {
                    message.push('{');
                    rest = tail;
                }
            }
        }
        message.push_str(rest);
        message
    }
}

/// A node matched by a rule, plus the message arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Node the finding is anchored on
    pub node: NodeId,
    pub args: Vec<String>,
}

impl Match {
    pub fn at(node: NodeRef<'_>) -> Self {
        Self {
            node: node.id(),
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// A detection policy over syntax shape and semantic facts
///
/// Rules are invoked only on nodes whose kind is listed in their
/// descriptor. They must not keep state between calls. A fact the rule needs
/// but cannot resolve is reported as [`Unresolved`], which the dispatcher
/// treats as "no finding".
pub trait Rule: Send + Sync {
    fn descriptor(&self) -> &RuleDescriptor;

    fn evaluate(&self, node: NodeRef<'_>, cx: &RuleContext<'_>) -> Result<Vec<Match>, Unresolved>;

    fn id(&self) -> &'static str {
        self.descriptor().id
    }
}

/// Per-document context handed to every rule invocation
#[derive(Clone, Copy)]
pub struct RuleContext<'a> {
    pub tree: &'a SyntaxTree,
    pub model: &'a dyn SemanticModel,
}

impl<'a> RuleContext<'a> {
    pub fn new(tree: &'a SyntaxTree, model: &'a dyn SemanticModel) -> Self {
        Self { tree, model }
    }

    pub fn type_of(&self, node: NodeRef<'_>) -> Option<&'a str> {
        self.model.type_of(node)
    }

    pub fn require_type(&self, node: NodeRef<'_>) -> Result<&'a str, Unresolved> {
        self.type_of(node)
            .ok_or_else(|| Unresolved::new(node.id(), "type"))
    }

    pub fn symbol(&self, node: NodeRef<'_>) -> Option<&'a Symbol> {
        self.model.symbol(node)
    }

    pub fn require_symbol(&self, node: NodeRef<'_>) -> Result<&'a Symbol, Unresolved> {
        self.symbol(node)
            .ok_or_else(|| Unresolved::new(node.id(), "symbol"))
    }

    /// Constant value; literals are read from the syntax directly
    pub fn constant(&self, node: NodeRef<'_>) -> Option<ConstantValue> {
        literal_value(node).or_else(|| self.model.constant_value(node).cloned())
    }

    pub fn require_constant(&self, node: NodeRef<'_>) -> Result<ConstantValue, Unresolved> {
        self.constant(node)
            .ok_or_else(|| Unresolved::new(node.id(), "constant"))
    }

    /// Whether the resolved type is or derives from `System.Exception`
    pub fn is_exception(&self, ty: &str) -> bool {
        semantic::is_exception_type(self.model, ty)
    }

    pub fn derives_from(&self, ty: &str, target: &str) -> bool {
        semantic::derives_from(self.model, ty, target)
    }

    /// Resolved type of a node that must be an exception type
    pub fn require_exception_type(&self, node: NodeRef<'_>) -> Result<Option<&'a str>, Unresolved> {
        let ty = self.require_type(node)?;
        Ok(self.is_exception(ty).then_some(ty))
    }
}

/// Value of a literal node, without consulting the resolver
pub fn literal_value(node: NodeRef<'_>) -> Option<ConstantValue> {
    match node.kind() {
        NodeKind::NullLiteral => Some(ConstantValue::Null),
        NodeKind::BooleanLiteral => Some(ConstantValue::Bool(node.text() == "true")),
        NodeKind::StringLiteral => Some(ConstantValue::String(node.text().to_string())),
        NodeKind::NumericLiteral => node.text().parse().ok().map(ConstantValue::Int),
        NodeKind::ParenthesizedExpression => node.first_child().and_then(literal_value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::{FactTable, NoFacts};
    use crate::syntax::build::*;

    const DESCRIPTOR: RuleDescriptor = RuleDescriptor {
        id: "EX999",
        title: "Test rule",
        message: "Found {0} in {1}",
        description: "",
        category: RuleCategory::Style,
        severity: Severity::Info,
        kinds: &[NodeKind::ThrowStatement],
    };

    #[test]
    fn test_render_message() {
        let args = vec!["ex".to_string(), "Run".to_string()];
        assert_eq!(DESCRIPTOR.render_message(&args), "Found ex in Run");
        assert_eq!(DESCRIPTOR.render_message(&[]), "Found {0} in {1}");
    }

    #[test]
    fn test_render_message_does_not_expand_arguments() {
        let args = vec!["{1}".to_string(), "Run".to_string()];
        assert_eq!(DESCRIPTOR.render_message(&args), "Found {1} in Run");

        let partial = vec!["ex".to_string()];
        assert_eq!(DESCRIPTOR.render_message(&partial), "Found ex in {1}");
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("usage".parse::<RuleCategory>(), Ok(RuleCategory::Usage));
        assert_eq!("LOG".parse::<RuleCategory>(), Ok(RuleCategory::Logging));
        assert!("perf".parse::<RuleCategory>().is_err());
        assert_eq!(RuleCategory::Design.to_string(), "design");
    }

    #[test]
    fn test_literals_skip_the_resolver() {
        let tree = SyntaxTree::from_spec(&binary("==", paren(boolean(true)), ident("x"))).unwrap();
        let cx = RuleContext::new(&tree, &NoFacts);
        let left = tree.root().child(0).unwrap();
        let right = tree.root().child(1).unwrap();
        assert_eq!(cx.constant(left), Some(ConstantValue::Bool(true)));
        assert_eq!(cx.constant(right), None);
        assert_eq!(
            cx.require_constant(tree.root()),
            Err(Unresolved::new(tree.root().id(), "constant"))
        );
    }

    #[test]
    fn test_require_exception_type() {
        let tree = SyntaxTree::from_spec(&new_object("Widget", [])).unwrap();
        let root = tree.root();
        let facts = FactTable::new().with_type(root.id(), "App.Widget");
        let cx = RuleContext::new(&tree, &facts);
        assert_eq!(cx.require_exception_type(root), Ok(None));
        let cx = RuleContext::new(&tree, &NoFacts);
        assert!(cx.require_exception_type(root).is_err());
    }
}
