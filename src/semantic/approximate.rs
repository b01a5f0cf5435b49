//! Name-based approximation of a semantic model
//!
//! Used when a document carries no facts from a real compiler frontend. Types
//! resolve through a constant table of framework types plus the classes
//! declared in the tree; identifiers bind lexically to catch variables,
//! locals and parameters. Anything the table cannot answer stays unresolved.

use super::{
    is_exception_type, ConstantValue, FactTable, ParameterInfo, SemanticModel, Symbol, SymbolKind,
    EXCEPTION,
};
use crate::syntax::{NodeKind, NodeRef, SyntaxTree};
use std::collections::HashMap;

const STRING: &str = "System.String";
const OBJECT: &str = "System.Object";
const BOOLEAN: &str = "System.Boolean";
const INT32: &str = "System.Int32";

/// (simple name, qualified name, direct base)
const FRAMEWORK_TYPES: &[(&str, &str, &str)] = &[
    ("Exception", EXCEPTION, OBJECT),
    ("SystemException", "System.SystemException", EXCEPTION),
    ("ApplicationException", "System.ApplicationException", EXCEPTION),
    ("AggregateException", "System.AggregateException", EXCEPTION),
    ("ArgumentException", "System.ArgumentException", "System.SystemException"),
    ("ArgumentNullException", "System.ArgumentNullException", "System.ArgumentException"),
    ("ArgumentOutOfRangeException", "System.ArgumentOutOfRangeException", "System.ArgumentException"),
    ("InvalidOperationException", "System.InvalidOperationException", "System.SystemException"),
    ("ObjectDisposedException", "System.ObjectDisposedException", "System.InvalidOperationException"),
    ("NotImplementedException", "System.NotImplementedException", "System.SystemException"),
    ("NotSupportedException", "System.NotSupportedException", "System.SystemException"),
    ("FormatException", "System.FormatException", "System.SystemException"),
    ("TimeoutException", "System.TimeoutException", "System.SystemException"),
    ("OperationCanceledException", "System.OperationCanceledException", "System.SystemException"),
    ("NullReferenceException", "System.NullReferenceException", "System.SystemException"),
    ("IndexOutOfRangeException", "System.IndexOutOfRangeException", "System.SystemException"),
    ("OutOfMemoryException", "System.OutOfMemoryException", "System.SystemException"),
    ("StackOverflowException", "System.StackOverflowException", "System.SystemException"),
    ("ExecutionEngineException", "System.ExecutionEngineException", "System.SystemException"),
    ("AccessViolationException", "System.AccessViolationException", "System.SystemException"),
    ("IOException", "System.IO.IOException", "System.SystemException"),
    ("FileNotFoundException", "System.IO.FileNotFoundException", "System.IO.IOException"),
    ("ThreadAbortException", "System.Threading.ThreadAbortException", "System.SystemException"),
    ("TaskCanceledException", "System.Threading.Tasks.TaskCanceledException", "System.OperationCanceledException"),
    ("Task", "System.Threading.Tasks.Task", OBJECT),
    ("String", STRING, OBJECT),
    ("Object", OBJECT, ""),
];

const KEYWORD_TYPES: &[(&str, &str)] = &[
    ("string", STRING),
    ("object", OBJECT),
    ("bool", BOOLEAN),
    ("int", INT32),
    ("long", "System.Int64"),
    ("void", "System.Void"),
];

impl FactTable {
    /// Approximate facts for a tree from names alone
    pub fn approximate(tree: &SyntaxTree) -> FactTable {
        let mut resolver = Approximator::new(tree);
        resolver.run();
        log::debug!(
            "approximated facts for {} of {} nodes",
            resolver.facts.nodes.len(),
            tree.len()
        );
        resolver.facts
    }
}

struct Approximator<'t> {
    tree: &'t SyntaxTree,
    facts: FactTable,
    /// Declared classes: simple name to qualified name
    classes: HashMap<&'t str, String>,
    declarations: HashMap<String, NodeRef<'t>>,
}

impl<'t> Approximator<'t> {
    fn new(tree: &'t SyntaxTree) -> Self {
        Self {
            tree,
            facts: FactTable::new(),
            classes: HashMap::new(),
            declarations: HashMap::new(),
        }
    }

    fn run(&mut self) {
        for (_, qualified, base) in FRAMEWORK_TYPES {
            if !base.is_empty() {
                self.facts
                    .hierarchy
                    .insert(qualified.to_string(), base.to_string());
            }
        }
        self.collect_classes();

        // Reverse pre-order visits children before their parents
        let nodes: Vec<NodeRef<'t>> = self.tree.preorder().collect();
        for node in nodes.into_iter().rev() {
            self.visit(node);
        }
    }

    fn collect_classes(&mut self) {
        let classes: Vec<NodeRef<'t>> = self
            .tree
            .preorder()
            .filter(|n| n.is(NodeKind::ClassDeclaration))
            .collect();

        for class in &classes {
            let mut segments: Vec<&str> = class
                .ancestors()
                .filter(|a| a.is(NodeKind::NamespaceDeclaration) || a.is(NodeKind::ClassDeclaration))
                .map(|a| a.text())
                .collect();
            segments.reverse();
            segments.push(class.text());
            let qualified = segments.join(".");
            self.classes.insert(class.text(), qualified.clone());
            self.declarations.insert(qualified, *class);
        }

        for class in classes {
            let Some(qualified) = self.resolve_type(class.text()) else {
                continue;
            };
            let base = class
                .child_of_kind(NodeKind::BaseList)
                .and_then(|list| list.first_child())
                .and_then(|ty| self.resolve_type(ty.text()));
            if let Some(base) = base {
                self.facts.hierarchy.insert(qualified.clone(), base);
            }
            self.facts.set_type(class.id(), &qualified);
            self.facts
                .set_symbol(class.id(), Symbol::new(SymbolKind::Type, &qualified));
        }
    }

    fn resolve_type(&self, name: &str) -> Option<String> {
        let name = name.trim().trim_start_matches("global::");
        if let Some(qualified) = self.classes.get(name) {
            return Some(qualified.clone());
        }
        if let Some((_, qualified)) = KEYWORD_TYPES.iter().find(|(k, _)| *k == name) {
            return Some(qualified.to_string());
        }
        if let Some((_, qualified, _)) = FRAMEWORK_TYPES
            .iter()
            .find(|(short, qualified, _)| *short == name || *qualified == name)
        {
            return Some(qualified.to_string());
        }
        // Dotted names are taken as already qualified
        name.contains('.').then(|| name.to_string())
    }

    fn visit(&mut self, node: NodeRef<'t>) {
        match node.kind() {
            NodeKind::TypeName => {
                if let Some(ty) = self.resolve_type(node.text()) {
                    self.facts.set_type(node.id(), &ty);
                }
            }
            NodeKind::StringLiteral => {
                self.facts
                    .set_constant(node.id(), ConstantValue::String(node.text().to_string()));
                self.facts.set_type(node.id(), STRING);
            }
            NodeKind::NullLiteral => self.facts.set_constant(node.id(), ConstantValue::Null),
            NodeKind::BooleanLiteral => {
                self.facts
                    .set_constant(node.id(), ConstantValue::Bool(node.text() == "true"));
                self.facts.set_type(node.id(), BOOLEAN);
            }
            NodeKind::NumericLiteral => {
                if let Ok(value) = node.text().parse::<i64>() {
                    self.facts.set_constant(node.id(), ConstantValue::Int(value));
                    self.facts.set_type(node.id(), INT32);
                }
            }
            NodeKind::InterpolatedString => self.facts.set_type(node.id(), STRING),
            NodeKind::ParenthesizedExpression => {
                if let Some(inner) = node.first_child() {
                    self.copy_facts(inner, node);
                }
            }
            NodeKind::BinaryExpression => self.fold_binary(node),
            NodeKind::IdentifierName => self.bind_identifier(node),
            NodeKind::MemberAccess => self.resolve_member(node),
            NodeKind::Invocation => self.resolve_invocation(node),
            NodeKind::ObjectCreation => self.resolve_creation(node),
            _ => {}
        }
    }

    fn copy_facts(&mut self, from: NodeRef<'_>, to: NodeRef<'_>) {
        if let Some(facts) = self.facts.nodes.get(&from.id().0).cloned() {
            self.facts.nodes.insert(to.id().0, facts);
        }
    }

    fn fold_binary(&mut self, node: NodeRef<'t>) {
        let (Some(left), Some(right)) = (node.child(0), node.child(1)) else {
            return;
        };
        let op = node.text();
        let folded = match (
            self.facts.constant_value(left),
            self.facts.constant_value(right),
        ) {
            (Some(l), Some(r)) => match op {
                "==" => Some(ConstantValue::Bool(l == r)),
                "!=" => Some(ConstantValue::Bool(l != r)),
                "&&" => l.as_bool().zip(r.as_bool()).map(|(a, b)| ConstantValue::Bool(a && b)),
                "||" => l.as_bool().zip(r.as_bool()).map(|(a, b)| ConstantValue::Bool(a || b)),
                "+" => match (l, r) {
                    (ConstantValue::String(a), ConstantValue::String(b)) => {
                        Some(ConstantValue::String(format!("{}{}", a, b)))
                    }
                    (ConstantValue::Int(a), ConstantValue::Int(b)) => {
                        a.checked_add(*b).map(ConstantValue::Int)
                    }
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        };

        let ty = match op {
            "==" | "!=" | "&&" | "||" | "<" | ">" | "<=" | ">=" => Some(BOOLEAN),
            "+" if self.facts.type_of(left) == Some(STRING)
                || self.facts.type_of(right) == Some(STRING) =>
            {
                Some(STRING)
            }
            _ => None,
        };

        if let Some(value) = folded {
            self.facts.set_constant(node.id(), value);
        }
        if let Some(ty) = ty {
            self.facts.set_type(node.id(), ty);
        }
    }

    /// Bind an identifier to the nearest catch variable, local or parameter
    fn bind_identifier(&mut self, node: NodeRef<'t>) {
        let name = node.text();
        if name.is_empty() {
            return;
        }

        for ancestor in node.ancestors() {
            match ancestor.kind() {
                NodeKind::CatchClause => {
                    let declaration = ancestor
                        .child_of_kind(NodeKind::CatchDeclaration)
                        .filter(|d| d.text() == name);
                    if let Some(declaration) = declaration {
                        let ty = declaration
                            .child_of_kind(NodeKind::TypeName)
                            .and_then(|t| self.resolve_type(t.text()));
                        self.bind(node, SymbolKind::Local, ty);
                        return;
                    }
                }
                NodeKind::Block => {
                    let local = ancestor.children().find(|s| {
                        s.is(NodeKind::LocalDeclaration)
                            && s.text() == name
                            && s.span().end <= node.span().start
                    });
                    if let Some(local) = local {
                        let ty = local
                            .child_of_kind(NodeKind::TypeName)
                            .and_then(|t| self.resolve_type(t.text()));
                        self.bind(node, SymbolKind::Local, ty);
                        return;
                    }
                }
                NodeKind::MethodDeclaration | NodeKind::ConstructorDeclaration => {
                    let parameter = ancestor
                        .child_of_kind(NodeKind::ParameterList)
                        .and_then(|list| list.children().find(|p| p.text() == name));
                    if let Some(parameter) = parameter {
                        let ty = parameter
                            .child_of_kind(NodeKind::TypeName)
                            .and_then(|t| self.resolve_type(t.text()));
                        self.bind(node, SymbolKind::Parameter, ty);
                        return;
                    }
                    break;
                }
                kind if kind.is_member() => break,
                _ => {}
            }
        }

        let starts_upper = name.chars().next().is_some_and(char::is_uppercase);
        if starts_upper {
            if let Some(ty) = self.resolve_type(name) {
                self.facts.set_symbol(node.id(), Symbol::new(SymbolKind::Type, &ty));
            }
        }
    }

    fn bind(&mut self, node: NodeRef<'t>, kind: SymbolKind, ty: Option<String>) {
        self.facts.set_symbol(node.id(), Symbol::new(kind, node.text()));
        if let Some(ty) = ty {
            self.facts.set_type(node.id(), &ty);
        }
    }

    fn resolve_member(&mut self, node: NodeRef<'t>) {
        let Some(target) = node.first_child() else {
            return;
        };
        let name = node.text();
        let is_callee = node
            .parent()
            .filter(|p| p.is(NodeKind::Invocation))
            .and_then(|p| p.first_child())
            == Some(node);

        let target_symbol = self.facts.symbol(target).cloned();
        let target_type = self.facts.type_of(target).map(str::to_string);

        let container = match (&target_symbol, &target_type) {
            (Some(symbol), _) if symbol.kind == SymbolKind::Type => Some(symbol.qualified_name.clone()),
            (_, Some(ty)) => Some(ty.clone()),
            _ => None,
        };
        let Some(container) = container else {
            return;
        };

        let kind = if is_callee {
            SymbolKind::Method
        } else {
            SymbolKind::Property
        };
        let symbol = Symbol::new(kind, &format!("{}.{}", container, name)).with_containing_type(&container);
        self.facts.set_symbol(node.id(), symbol);

        if !is_callee && name == "Message" && is_exception_type(&self.facts, &container) {
            self.facts.set_type(node.id(), STRING);
        }
    }

    fn resolve_invocation(&mut self, node: NodeRef<'t>) {
        let Some(callee) = node.first_child() else {
            return;
        };
        if let Some(symbol) = self.facts.symbol(callee).cloned() {
            if symbol.kind == SymbolKind::Method {
                if symbol.name == "ToString" {
                    self.facts.set_type(node.id(), STRING);
                }
                self.facts.set_symbol(node.id(), symbol);
            }
        }
    }

    fn resolve_creation(&mut self, node: NodeRef<'t>) {
        let Some(ty) = node
            .child_of_kind(NodeKind::TypeName)
            .and_then(|t| self.resolve_type(t.text()))
        else {
            return;
        };
        self.facts.set_type(node.id(), &ty);

        let arguments: Vec<NodeRef<'t>> = node
            .child_of_kind(NodeKind::ArgumentList)
            .map(|list| list.children().filter_map(|a| a.first_child()).collect())
            .unwrap_or_default();

        let parameters = match self.declarations.get(&ty) {
            Some(class) => declared_overload(*class, arguments.len(), |t| self.resolve_type(t)),
            None if is_exception_type(&self.facts, &ty) => {
                let second_is_exception = arguments
                    .get(1)
                    .and_then(|a| self.facts.type_of(*a))
                    .is_some_and(|t| is_exception_type(&self.facts, t));
                standard_overload(&ty, arguments.len(), second_is_exception)
            }
            None => None,
        };

        if let Some(parameters) = parameters {
            let symbol = Symbol::new(SymbolKind::Constructor, &format!("{}..ctor", ty))
                .with_containing_type(&ty)
                .with_parameters(parameters);
            self.facts.set_symbol(node.id(), symbol);
        }
    }
}

/// Constructor of a declared class matching the argument count
fn declared_overload(
    class: NodeRef<'_>,
    arity: usize,
    resolve: impl Fn(&str) -> Option<String>,
) -> Option<Vec<ParameterInfo>> {
    let constructors: Vec<_> = class
        .children_of_kind(NodeKind::ConstructorDeclaration)
        .collect();
    if constructors.is_empty() {
        return (arity == 0).then(Vec::new);
    }
    let list = constructors
        .iter()
        .filter_map(|c| c.child_of_kind(NodeKind::ParameterList))
        .find(|list| list.child_count() == arity)?;
    Some(
        list.children()
            .map(|p| {
                let written = p
                    .child_of_kind(NodeKind::TypeName)
                    .map(|t| t.text())
                    .unwrap_or_default();
                let ty = resolve(written).unwrap_or_else(|| written.to_string());
                ParameterInfo::new(p.text(), &ty)
            })
            .collect(),
    )
}

/// Framework exception constructors, chosen by argument count
fn standard_overload(ty: &str, arity: usize, second_is_exception: bool) -> Option<Vec<ParameterInfo>> {
    let short = ty.rsplit('.').next().unwrap_or(ty);
    let message = || ParameterInfo::new("message", STRING);
    let param_name = || ParameterInfo::new("paramName", STRING);
    let inner = || ParameterInfo::new("innerException", EXCEPTION);
    let param_first = matches!(
        short,
        "ArgumentNullException" | "ArgumentOutOfRangeException"
    );

    let parameters = match (arity, short) {
        (0, _) => vec![],
        (1, "ObjectDisposedException") => vec![ParameterInfo::new("objectName", STRING)],
        (1, _) if param_first => vec![param_name()],
        (1, _) => vec![message()],
        (2, _) if second_is_exception => vec![message(), inner()],
        (2, "ArgumentException") => vec![message(), param_name()],
        (2, "ObjectDisposedException") => vec![ParameterInfo::new("objectName", STRING), message()],
        (2, _) if param_first => vec![param_name(), message()],
        (2, _) => vec![message(), inner()],
        (3, "ArgumentException") => vec![message(), param_name(), inner()],
        (3, "ArgumentOutOfRangeException") => vec![
            param_name(),
            ParameterInfo::new("actualValue", OBJECT),
            message(),
        ],
        _ => return None,
    };
    Some(parameters)
}
