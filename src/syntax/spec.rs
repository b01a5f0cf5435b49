//! Owned, serializable tree description
//!
//! `NodeSpec` is the interchange format between hosts and the analyzer:
//! hosts serialize their parsed trees into it, fixtures are written in it,
//! and fixers use it to describe replacement subtrees.

use super::kind::NodeKind;
use super::trivia::Trivia;
use serde::{Deserialize, Serialize};

/// Nested, owned description of a syntax node and its subtree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub kind: NodeKind,

    /// Token text (identifier, type name, literal value, operator, keyword)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub leading: Vec<Trivia>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trailing: Vec<Trivia>,

    /// Trivia enclosed by the node but not owned by any child
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inner: Vec<Trivia>,
}

impl NodeSpec {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            text: None,
            children: Vec::new(),
            leading: Vec::new(),
            trailing: Vec::new(),
            inner: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn with_child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = NodeSpec>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn with_leading(mut self, trivia: Trivia) -> Self {
        self.leading.push(trivia);
        self
    }

    pub fn with_trailing(mut self, trivia: Trivia) -> Self {
        self.trailing.push(trivia);
        self
    }

    pub fn with_inner(mut self, trivia: Trivia) -> Self {
        self.inner.push(trivia);
        self
    }

    /// Number of nodes in this subtree, self included
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(NodeSpec::size).sum::<usize>()
    }
}

/// Constructors for every node kind, following the child layout the
/// renderer and the rules expect
pub mod build {
    use super::NodeSpec;
    use crate::syntax::NodeKind;

    pub fn compilation_unit(items: impl IntoIterator<Item = NodeSpec>) -> NodeSpec {
        NodeSpec::new(NodeKind::CompilationUnit).with_children(items)
    }

    pub fn using(namespace: &str) -> NodeSpec {
        NodeSpec::new(NodeKind::UsingDirective).with_text(namespace)
    }

    pub fn namespace(name: &str, members: impl IntoIterator<Item = NodeSpec>) -> NodeSpec {
        NodeSpec::new(NodeKind::NamespaceDeclaration)
            .with_text(name)
            .with_children(members)
    }

    pub fn modifier(keyword: &str) -> NodeSpec {
        NodeSpec::new(NodeKind::Modifier).with_text(keyword)
    }

    pub fn type_name(name: &str) -> NodeSpec {
        NodeSpec::new(NodeKind::TypeName).with_text(name)
    }

    /// Class with modifiers, base types and members
    pub fn class(
        name: &str,
        modifiers: &[&str],
        bases: &[&str],
        members: impl IntoIterator<Item = NodeSpec>,
    ) -> NodeSpec {
        let mut node = NodeSpec::new(NodeKind::ClassDeclaration)
            .with_text(name)
            .with_children(modifiers.iter().map(|m| modifier(m)));
        if !bases.is_empty() {
            node = node.with_child(
                NodeSpec::new(NodeKind::BaseList)
                    .with_children(bases.iter().map(|b| type_name(b))),
            );
        }
        node.with_children(members)
    }

    pub fn param(ty: &str, name: &str) -> NodeSpec {
        NodeSpec::new(NodeKind::Parameter)
            .with_text(name)
            .with_child(type_name(ty))
    }

    pub fn params(items: impl IntoIterator<Item = NodeSpec>) -> NodeSpec {
        NodeSpec::new(NodeKind::ParameterList).with_children(items)
    }

    /// Constructor; `initializer` is `("base" | "this", args)`
    pub fn constructor(
        name: &str,
        modifiers: &[&str],
        parameters: impl IntoIterator<Item = NodeSpec>,
        initializer: Option<(&str, Vec<NodeSpec>)>,
        body: NodeSpec,
    ) -> NodeSpec {
        let mut node = NodeSpec::new(NodeKind::ConstructorDeclaration)
            .with_text(name)
            .with_children(modifiers.iter().map(|m| modifier(m)))
            .with_child(params(parameters));
        if let Some((keyword, arguments)) = initializer {
            node = node.with_child(
                NodeSpec::new(NodeKind::ConstructorInitializer)
                    .with_text(keyword)
                    .with_child(args(arguments)),
            );
        }
        node.with_child(body)
    }

    pub fn method(
        name: &str,
        modifiers: &[&str],
        return_type: &str,
        parameters: impl IntoIterator<Item = NodeSpec>,
        body: NodeSpec,
    ) -> NodeSpec {
        NodeSpec::new(NodeKind::MethodDeclaration)
            .with_text(name)
            .with_children(modifiers.iter().map(|m| modifier(m)))
            .with_child(type_name(return_type))
            .with_child(params(parameters))
            .with_child(body)
    }

    /// Property with an accessor list
    pub fn property(
        name: &str,
        modifiers: &[&str],
        ty: &str,
        accessors: impl IntoIterator<Item = NodeSpec>,
    ) -> NodeSpec {
        NodeSpec::new(NodeKind::PropertyDeclaration)
            .with_text(name)
            .with_children(modifiers.iter().map(|m| modifier(m)))
            .with_child(type_name(ty))
            .with_child(NodeSpec::new(NodeKind::AccessorList).with_children(accessors))
    }

    /// Expression-bodied property: `T Name => expr;`
    pub fn property_arrow(name: &str, modifiers: &[&str], ty: &str, expr: NodeSpec) -> NodeSpec {
        NodeSpec::new(NodeKind::PropertyDeclaration)
            .with_text(name)
            .with_children(modifiers.iter().map(|m| modifier(m)))
            .with_child(type_name(ty))
            .with_child(arrow(expr))
    }

    /// Accessor; `body` is a block, an arrow clause, or `None` for `get;`
    pub fn accessor(keyword: &str, body: Option<NodeSpec>) -> NodeSpec {
        let node = NodeSpec::new(NodeKind::AccessorDeclaration).with_text(keyword);
        match body {
            Some(body) => node.with_child(body),
            None => node,
        }
    }

    pub fn arrow(expr: NodeSpec) -> NodeSpec {
        NodeSpec::new(NodeKind::ArrowExpressionClause).with_child(expr)
    }

    pub fn block(statements: impl IntoIterator<Item = NodeSpec>) -> NodeSpec {
        NodeSpec::new(NodeKind::Block).with_children(statements)
    }

    pub fn expr_stmt(expr: NodeSpec) -> NodeSpec {
        NodeSpec::new(NodeKind::ExpressionStatement).with_child(expr)
    }

    pub fn local(ty: &str, name: &str, init: Option<NodeSpec>) -> NodeSpec {
        let node = NodeSpec::new(NodeKind::LocalDeclaration)
            .with_text(name)
            .with_child(type_name(ty));
        match init {
            Some(init) => node.with_child(init),
            None => node,
        }
    }

    pub fn ret(expr: Option<NodeSpec>) -> NodeSpec {
        let node = NodeSpec::new(NodeKind::ReturnStatement);
        match expr {
            Some(expr) => node.with_child(expr),
            None => node,
        }
    }

    pub fn throw(expr: NodeSpec) -> NodeSpec {
        NodeSpec::new(NodeKind::ThrowStatement).with_child(expr)
    }

    /// Bare `throw;`
    pub fn rethrow() -> NodeSpec {
        NodeSpec::new(NodeKind::ThrowStatement)
    }

    pub fn if_stmt(condition: NodeSpec, then: NodeSpec, otherwise: Option<NodeSpec>) -> NodeSpec {
        let node = NodeSpec::new(NodeKind::IfStatement)
            .with_child(condition)
            .with_child(then);
        match otherwise {
            Some(otherwise) => node.with_child(otherwise),
            None => node,
        }
    }

    pub fn try_stmt(
        body: NodeSpec,
        catches: impl IntoIterator<Item = NodeSpec>,
        finally: Option<NodeSpec>,
    ) -> NodeSpec {
        let node = NodeSpec::new(NodeKind::TryStatement)
            .with_child(body)
            .with_children(catches);
        match finally {
            Some(body) => node.with_child(NodeSpec::new(NodeKind::FinallyClause).with_child(body)),
            None => node,
        }
    }

    /// `catch (Type var) when (filter) { ... }`; every part but the block is optional
    pub fn catch(
        ty: Option<&str>,
        var: Option<&str>,
        filter: Option<NodeSpec>,
        body: NodeSpec,
    ) -> NodeSpec {
        let mut node = NodeSpec::new(NodeKind::CatchClause);
        if let Some(ty) = ty {
            let mut decl = NodeSpec::new(NodeKind::CatchDeclaration).with_child(type_name(ty));
            if let Some(var) = var {
                decl = decl.with_text(var);
            }
            node = node.with_child(decl);
        }
        if let Some(filter) = filter {
            node = node.with_child(NodeSpec::new(NodeKind::CatchFilter).with_child(filter));
        }
        node.with_child(body)
    }

    pub fn new_object(ty: &str, arguments: impl IntoIterator<Item = NodeSpec>) -> NodeSpec {
        NodeSpec::new(NodeKind::ObjectCreation)
            .with_child(type_name(ty))
            .with_child(args(arguments))
    }

    pub fn invoke(callee: NodeSpec, arguments: impl IntoIterator<Item = NodeSpec>) -> NodeSpec {
        NodeSpec::new(NodeKind::Invocation)
            .with_child(callee)
            .with_child(args(arguments))
    }

    /// Argument list; each expression is wrapped in an `Argument`
    pub fn args(exprs: impl IntoIterator<Item = NodeSpec>) -> NodeSpec {
        NodeSpec::new(NodeKind::ArgumentList).with_children(
            exprs
                .into_iter()
                .map(|e| NodeSpec::new(NodeKind::Argument).with_child(e)),
        )
    }

    pub fn member(target: NodeSpec, name: &str) -> NodeSpec {
        NodeSpec::new(NodeKind::MemberAccess)
            .with_text(name)
            .with_child(target)
    }

    /// `a.b.c` from a dotted path
    pub fn path(dotted: &str) -> NodeSpec {
        let mut parts = dotted.split('.');
        let first = parts.next().unwrap_or_default();
        parts.fold(ident(first), member)
    }

    pub fn ident(name: &str) -> NodeSpec {
        NodeSpec::new(NodeKind::IdentifierName).with_text(name)
    }

    pub fn string(value: &str) -> NodeSpec {
        NodeSpec::new(NodeKind::StringLiteral).with_text(value)
    }

    pub fn null() -> NodeSpec {
        NodeSpec::new(NodeKind::NullLiteral)
    }

    pub fn boolean(value: bool) -> NodeSpec {
        NodeSpec::new(NodeKind::BooleanLiteral).with_text(if value { "true" } else { "false" })
    }

    pub fn number(value: &str) -> NodeSpec {
        NodeSpec::new(NodeKind::NumericLiteral).with_text(value)
    }

    pub fn binary(op: &str, left: NodeSpec, right: NodeSpec) -> NodeSpec {
        NodeSpec::new(NodeKind::BinaryExpression)
            .with_text(op)
            .with_child(left)
            .with_child(right)
    }

    pub fn is_type(expr: NodeSpec, ty: &str) -> NodeSpec {
        NodeSpec::new(NodeKind::IsExpression)
            .with_child(expr)
            .with_child(type_name(ty))
    }

    pub fn interpolated(parts: impl IntoIterator<Item = NodeSpec>) -> NodeSpec {
        NodeSpec::new(NodeKind::InterpolatedString).with_children(parts)
    }

    pub fn interp_text(text: &str) -> NodeSpec {
        NodeSpec::new(NodeKind::InterpolatedText).with_text(text)
    }

    pub fn interp(expr: NodeSpec) -> NodeSpec {
        NodeSpec::new(NodeKind::Interpolation).with_child(expr)
    }

    pub fn throw_expr(expr: NodeSpec) -> NodeSpec {
        NodeSpec::new(NodeKind::ThrowExpression).with_child(expr)
    }

    pub fn paren(expr: NodeSpec) -> NodeSpec {
        NodeSpec::new(NodeKind::ParenthesizedExpression).with_child(expr)
    }
}
