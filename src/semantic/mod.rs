//! Semantic facts consumed by rules
//!
//! The host's resolver answers symbol, type and constant queries for nodes of
//! one tree revision. Answers are borrowed from the model, which is immutable
//! and shared by every rule running on the document.

mod approximate;

use crate::syntax::{NodeId, NodeRef};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use thiserror::Error;

/// Fully-qualified name of the root exception type
pub const EXCEPTION: &str = "System.Exception";

/// Maximum number of base-type hops followed by [`derives_from`]
pub const MAX_HIERARCHY_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Type,
    Method,
    Constructor,
    Property,
    Field,
    Local,
    Parameter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterInfo {
    pub name: String,
    pub type_name: String,
}

impl ParameterInfo {
    pub fn new(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
        }
    }
}

/// A resolved declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    pub qualified_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub containing_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterInfo>,
}

impl Symbol {
    /// Symbol whose simple name is the last segment of `qualified_name`
    pub fn new(kind: SymbolKind, qualified_name: &str) -> Self {
        let name = qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(qualified_name)
            .to_string();
        Self {
            kind,
            name,
            qualified_name: qualified_name.to_string(),
            containing_type: None,
            parameters: Vec::new(),
        }
    }

    pub fn with_containing_type(mut self, ty: &str) -> Self {
        self.containing_type = Some(ty.to_string());
        self
    }

    pub fn with_parameters(mut self, parameters: Vec<ParameterInfo>) -> Self {
        self.parameters = parameters;
        self
    }
}

/// Compile-time constant value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ConstantValue {
    Null,
    Bool(bool),
    Int(i64),
    String(String),
}

impl ConstantValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConstantValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConstantValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Null => write!(f, "null"),
            ConstantValue::Bool(b) => write!(f, "{}", b),
            ConstantValue::Int(i) => write!(f, "{}", i),
            ConstantValue::String(s) => write!(f, "{:?}", s),
        }
    }
}

/// Resolver bound to one tree revision
pub trait SemanticModel: Send + Sync {
    /// Declared or referenced symbol
    fn symbol(&self, node: NodeRef<'_>) -> Option<&Symbol>;

    /// Fully-qualified static type of an expression or type name
    fn type_of(&self, node: NodeRef<'_>) -> Option<&str>;

    fn constant_value(&self, node: NodeRef<'_>) -> Option<&ConstantValue>;

    /// Direct base type of a fully-qualified type
    fn base_type(&self, qualified_type: &str) -> Option<&str>;
}

/// A required semantic fact could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unresolved {fact} for node {node}")]
pub struct Unresolved {
    pub node: NodeId,
    pub fact: &'static str,
}

impl Unresolved {
    pub fn new(node: NodeId, fact: &'static str) -> Self {
        Self { node, fact }
    }
}

/// Whether `ty` is `target` or inherits from it
///
/// Follows `base_type` until the root, a cycle, or [`MAX_HIERARCHY_DEPTH`].
pub fn derives_from(model: &dyn SemanticModel, ty: &str, target: &str) -> bool {
    let mut seen = HashSet::new();
    let mut current = Some(ty);
    for _ in 0..=MAX_HIERARCHY_DEPTH {
        let Some(name) = current else {
            return false;
        };
        if name == target {
            return true;
        }
        if !seen.insert(name) {
            return false;
        }
        current = model.base_type(name);
    }
    false
}

/// Strictly derives: `ty` inherits from `target` but is not `target`
pub fn strictly_derives_from(model: &dyn SemanticModel, ty: &str, target: &str) -> bool {
    ty != target && derives_from(model, ty, target)
}

pub fn is_exception_type(model: &dyn SemanticModel, ty: &str) -> bool {
    derives_from(model, ty, EXCEPTION)
}

/// Facts recorded for one node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFacts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<Symbol>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<ConstantValue>,
}

/// Table-backed semantic model, keyed by node id
///
/// This is the serialized form hosts ship next to a tree, and the model the
/// approximate resolver produces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactTable {
    #[serde(default)]
    pub nodes: BTreeMap<u32, NodeFacts>,
    /// Type name to direct base type name
    #[serde(default)]
    pub hierarchy: BTreeMap<String, String>,
}

impl FactTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, node: NodeId) -> &mut NodeFacts {
        self.nodes.entry(node.0).or_default()
    }

    pub fn with_symbol(mut self, node: NodeId, symbol: Symbol) -> Self {
        self.set_symbol(node, symbol);
        self
    }

    pub fn with_type(mut self, node: NodeId, ty: &str) -> Self {
        self.set_type(node, ty);
        self
    }

    pub fn with_constant(mut self, node: NodeId, value: ConstantValue) -> Self {
        self.set_constant(node, value);
        self
    }

    pub fn with_base(mut self, ty: &str, base: &str) -> Self {
        self.hierarchy.insert(ty.to_string(), base.to_string());
        self
    }

    pub fn set_symbol(&mut self, node: NodeId, symbol: Symbol) {
        self.entry(node).symbol = Some(symbol);
    }

    pub fn set_type(&mut self, node: NodeId, ty: &str) {
        self.entry(node).type_name = Some(ty.to_string());
    }

    pub fn set_constant(&mut self, node: NodeId, value: ConstantValue) {
        self.entry(node).constant = Some(value);
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.hierarchy.is_empty()
    }

    fn facts(&self, node: NodeRef<'_>) -> Option<&NodeFacts> {
        self.nodes.get(&node.id().0)
    }
}

impl SemanticModel for FactTable {
    fn symbol(&self, node: NodeRef<'_>) -> Option<&Symbol> {
        self.facts(node)?.symbol.as_ref()
    }

    fn type_of(&self, node: NodeRef<'_>) -> Option<&str> {
        self.facts(node)?.type_name.as_deref()
    }

    fn constant_value(&self, node: NodeRef<'_>) -> Option<&ConstantValue> {
        self.facts(node)?.constant.as_ref()
    }

    fn base_type(&self, qualified_type: &str) -> Option<&str> {
        self.hierarchy.get(qualified_type).map(String::as_str)
    }
}

/// Model that resolves nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFacts;

impl SemanticModel for NoFacts {
    fn symbol(&self, _node: NodeRef<'_>) -> Option<&Symbol> {
        None
    }

    fn type_of(&self, _node: NodeRef<'_>) -> Option<&str> {
        None
    }

    fn constant_value(&self, _node: NodeRef<'_>) -> Option<&ConstantValue> {
        None
    }

    fn base_type(&self, _qualified_type: &str) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{build::*, SyntaxTree};

    #[test]
    fn test_derives_from() {
        let facts = FactTable::new()
            .with_base("App.FooException", "System.InvalidOperationException")
            .with_base("System.InvalidOperationException", "System.SystemException")
            .with_base("System.SystemException", EXCEPTION);
        assert!(derives_from(&facts, "App.FooException", EXCEPTION));
        assert!(is_exception_type(&facts, EXCEPTION));
        assert!(!strictly_derives_from(&facts, EXCEPTION, EXCEPTION));
        assert!(!derives_from(&facts, "App.Widget", EXCEPTION));
    }

    #[test]
    fn test_derives_from_stops_on_cycle() {
        let facts = FactTable::new().with_base("A", "B").with_base("B", "A");
        assert!(!derives_from(&facts, "A", EXCEPTION));
    }

    #[test]
    fn test_fact_table_lookup() {
        let tree = SyntaxTree::from_spec(&throw(ident("ex"))).unwrap();
        let ex = tree.root().first_child().unwrap();
        let facts = FactTable::new()
            .with_type(ex.id(), EXCEPTION)
            .with_symbol(ex.id(), Symbol::new(SymbolKind::Local, "ex"));
        assert_eq!(facts.type_of(ex), Some(EXCEPTION));
        assert_eq!(facts.symbol(ex).map(|s| s.kind), Some(SymbolKind::Local));
        assert_eq!(facts.type_of(tree.root()), None);
        assert_eq!(NoFacts.type_of(ex), None);
    }

    #[test]
    fn test_fact_table_serde() {
        let facts = FactTable::new()
            .with_constant(NodeId(3), ConstantValue::Bool(true))
            .with_type(NodeId(3), "System.Boolean")
            .with_base("App.FooException", EXCEPTION);
        let json = serde_json::to_string(&facts).unwrap();
        assert!(json.contains(r#""constant":{"kind":"bool","value":true}"#));
        let back: FactTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, facts);
    }
}
