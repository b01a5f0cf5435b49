//! Syntax tree consumed by the analyzer
//!
//! Trees are produced by the host's compiler frontend (directly or through
//! the serializable [`NodeSpec`] form) and are immutable. Nodes live in an
//! arena addressed by [`NodeId`]; each node owns its child list and keeps a
//! plain index back to its parent, so ancestor queries never involve shared
//! ownership.
//!
//! Node ids are assigned in pre-order, so iterating ids in ascending order is
//! a parent-before-children traversal. Spans index into the canonical source
//! text produced by the renderer.

mod edit;
mod kind;
mod render;
mod spec;
mod trivia;

pub use edit::TreeEditor;
pub use kind::NodeKind;
pub use spec::{build, NodeSpec};
pub use trivia::{has_comment, Trivia, TriviaKind};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stable handle of a node within one tree revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Half-open byte range into the rendered source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_range(&self, other: TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Error building or editing a tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("{parent} cannot contain {child}")]
    InvalidChild { parent: NodeKind, child: NodeKind },

    #[error("node {0} does not exist in this tree")]
    UnknownNode(NodeId),

    #[error("the root node cannot be removed")]
    RootRemoval,

    #[error("child index {index} is out of bounds for node {node}")]
    IndexOutOfBounds { node: NodeId, index: usize },
}

/// A node stored in the arena
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    text: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    leading: Vec<Trivia>,
    trailing: Vec<Trivia>,
    inner: Vec<Trivia>,
    span: TextRange,
}

/// Immutable syntax tree with its canonical source text
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    source: String,
    line_starts: Vec<usize>,
}

impl SyntaxTree {
    /// Build a tree from its nested description, validating the shape
    pub fn from_spec(spec: &NodeSpec) -> Result<Self, TreeError> {
        let mut nodes = Vec::with_capacity(spec.size());
        flatten(spec, None, &mut nodes)?;

        let (source, spans) = render::render(&nodes);
        for (node, span) in nodes.iter_mut().zip(spans) {
            node.span = span;
        }

        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        Ok(Self {
            nodes,
            source,
            line_starts,
        })
    }

    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            tree: self,
            id: NodeId::ROOT,
        }
    }

    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        (id.index() < self.nodes.len()).then_some(NodeRef { tree: self, id })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every node, parents before children
    pub fn preorder(&self) -> impl Iterator<Item = NodeRef<'_>> + '_ {
        (0..self.nodes.len()).map(move |i| NodeRef {
            tree: self,
            id: NodeId(i as u32),
        })
    }

    /// Canonical source text of the tree
    pub fn text(&self) -> &str {
        &self.source
    }

    /// Source text covered by a span
    pub fn slice(&self, span: TextRange) -> &str {
        self.source.get(span.start..span.end).unwrap_or_default()
    }

    /// 1-based line and column of a byte offset
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let column = offset - self.line_starts[line] + 1;
        (line + 1, column)
    }

    /// Text of a 1-based line, without the newline
    pub fn line(&self, line: usize) -> Option<&str> {
        self.source.lines().nth(line.checked_sub(1)?)
    }

    /// Node of the given kind whose span is exactly `span`
    pub fn find(&self, span: TextRange, kind: NodeKind) -> Option<NodeRef<'_>> {
        self.preorder()
            .find(|n| n.kind() == kind && n.span() == span)
    }

    /// Convert back into the nested description
    pub fn to_spec(&self) -> NodeSpec {
        self.root().to_spec()
    }

    /// Start an edit session producing a new tree revision
    pub fn edit(&self) -> TreeEditor {
        TreeEditor::new(self)
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

fn flatten(spec: &NodeSpec, parent: Option<NodeId>, nodes: &mut Vec<Node>) -> Result<NodeId, TreeError> {
    let id = NodeId(nodes.len() as u32);
    nodes.push(Node {
        kind: spec.kind,
        text: spec.text.clone(),
        parent,
        children: Vec::with_capacity(spec.children.len()),
        leading: spec.leading.clone(),
        trailing: spec.trailing.clone(),
        inner: spec.inner.clone(),
        span: TextRange::default(),
    });

    for child in &spec.children {
        if !spec.kind.accepts_child(child.kind) {
            return Err(TreeError::InvalidChild {
                parent: spec.kind,
                child: child.kind,
            });
        }
        let child_id = flatten(child, Some(id), nodes)?;
        nodes[id.index()].children.push(child_id);
    }

    Ok(id)
}

/// Borrowed cursor over a node of a tree
#[derive(Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl<'t> NodeRef<'t> {
    fn data(&self) -> &'t Node {
        self.tree.node(self.id)
    }

    fn at(&self, id: NodeId) -> NodeRef<'t> {
        NodeRef {
            tree: self.tree,
            id,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn kind(&self) -> NodeKind {
        self.data().kind
    }

    pub fn is(&self, kind: NodeKind) -> bool {
        self.kind() == kind
    }

    /// Token text, or the empty string
    pub fn text(&self) -> &'t str {
        self.data().text.as_deref().unwrap_or_default()
    }

    pub fn text_opt(&self) -> Option<&'t str> {
        self.data().text.as_deref().filter(|t| !t.is_empty())
    }

    pub fn span(&self) -> TextRange {
        self.data().span
    }

    /// Source text covered by this node
    pub fn source(&self) -> &'t str {
        self.tree.slice(self.span())
    }

    pub fn parent(&self) -> Option<NodeRef<'t>> {
        self.data().parent.map(|id| self.at(id))
    }

    /// Strict ancestors, nearest first
    pub fn ancestors(&self) -> impl Iterator<Item = NodeRef<'t>> {
        std::iter::successors(self.parent(), |n| n.parent())
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'t>> + 't {
        let tree = self.tree;
        self.data()
            .children
            .iter()
            .map(move |&id| NodeRef { tree, id })
    }

    pub fn child_count(&self) -> usize {
        self.data().children.len()
    }

    pub fn child(&self, index: usize) -> Option<NodeRef<'t>> {
        self.data().children.get(index).map(|&id| self.at(id))
    }

    pub fn first_child(&self) -> Option<NodeRef<'t>> {
        self.child(0)
    }

    pub fn child_of_kind(&self, kind: NodeKind) -> Option<NodeRef<'t>> {
        self.children().find(|c| c.kind() == kind)
    }

    pub fn children_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = NodeRef<'t>> + 't {
        self.children().filter(move |c| c.kind() == kind)
    }

    /// Position among the parent's children
    pub fn index_in_parent(&self) -> Option<usize> {
        let parent = self.parent()?;
        parent.data().children.iter().position(|&id| id == self.id)
    }

    /// Strict descendants in pre-order
    pub fn descendants(&self) -> Descendants<'t> {
        Descendants {
            tree: self.tree,
            stack: self.data().children.iter().rev().copied().collect(),
        }
    }

    /// Self followed by all descendants
    pub fn subtree(&self) -> impl Iterator<Item = NodeRef<'t>> {
        std::iter::once(*self).chain(self.descendants())
    }

    pub fn leading(&self) -> &'t [Trivia] {
        &self.data().leading
    }

    pub fn trailing(&self) -> &'t [Trivia] {
        &self.data().trailing
    }

    pub fn inner(&self) -> &'t [Trivia] {
        &self.data().inner
    }

    pub fn to_spec(&self) -> NodeSpec {
        let data = self.data();
        NodeSpec {
            kind: data.kind,
            text: data.text.clone(),
            children: self.children().map(|c| c.to_spec()).collect(),
            leading: data.leading.clone(),
            trailing: data.trailing.clone(),
            inner: data.inner.clone(),
        }
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}@{}..{}", self.kind(), self.id, self.span().start, self.span().end)
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

/// Pre-order iterator over a subtree
pub struct Descendants<'t> {
    tree: &'t SyntaxTree,
    stack: Vec<NodeId>,
}

impl<'t> Iterator for Descendants<'t> {
    type Item = NodeRef<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.node(id).children.iter().rev().copied());
        Some(NodeRef {
            tree: self.tree,
            id,
        })
    }
}
