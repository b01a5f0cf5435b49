//! Copy-on-write editing of syntax trees
//!
//! A [`TreeEditor`] records local edits against a snapshot of a tree and
//! produces a brand-new [`SyntaxTree`] on [`TreeEditor::finish`]. The source
//! tree is never touched, so a failed edit session leaves nothing behind.

use super::{NodeId, NodeKind, NodeSpec, SyntaxTree, TreeError, Trivia};

enum Child {
    Existing(NodeId),
    New(NodeSpec),
}

enum Slot {
    Original {
        kind: NodeKind,
        text: Option<String>,
        children: Vec<Child>,
        leading: Vec<Trivia>,
        trailing: Vec<Trivia>,
        inner: Vec<Trivia>,
    },
    Replaced(NodeSpec),
    Removed,
}

/// Pending edits against one tree revision
pub struct TreeEditor {
    slots: Vec<Slot>,
    parents: Vec<Option<NodeId>>,
}

impl TreeEditor {
    pub(super) fn new(tree: &SyntaxTree) -> Self {
        let slots = tree
            .nodes
            .iter()
            .map(|node| Slot::Original {
                kind: node.kind,
                text: node.text.clone(),
                children: node.children.iter().map(|&c| Child::Existing(c)).collect(),
                leading: node.leading.clone(),
                trailing: node.trailing.clone(),
                inner: node.inner.clone(),
            })
            .collect();
        let parents = tree.nodes.iter().map(|node| node.parent).collect();
        Self { slots, parents }
    }

    /// A node can be edited while neither it nor any ancestor was replaced or removed
    fn check_live(&self, id: NodeId) -> Result<(), TreeError> {
        let mut current = Some(id);
        while let Some(node) = current {
            match self.slots.get(node.index()) {
                Some(Slot::Original { .. }) => {}
                Some(Slot::Replaced(_)) if node != id => return Err(TreeError::UnknownNode(id)),
                Some(Slot::Replaced(_)) => {}
                Some(Slot::Removed) | None => return Err(TreeError::UnknownNode(id)),
            }
            current = self.parents[node.index()];
        }
        Ok(())
    }

    fn original_mut(&mut self, id: NodeId) -> Result<&mut Slot, TreeError> {
        self.check_live(id)?;
        let slot = &mut self.slots[id.index()];
        if matches!(slot, Slot::Original { .. }) {
            Ok(slot)
        } else {
            Err(TreeError::UnknownNode(id))
        }
    }

    fn kind_of(&self, id: NodeId) -> Option<NodeKind> {
        match self.slots.get(id.index())? {
            Slot::Original { kind, .. } => Some(*kind),
            Slot::Replaced(spec) => Some(spec.kind),
            Slot::Removed => None,
        }
    }

    /// Replace a node and its subtree. The old node's leading and trailing
    /// trivia move to the replacement unless it brings its own.
    pub fn replace(&mut self, id: NodeId, mut spec: NodeSpec) -> Result<(), TreeError> {
        self.check_live(id)?;
        if let Some(parent) = self.parents[id.index()] {
            let parent_kind = self.kind_of(parent).ok_or(TreeError::UnknownNode(parent))?;
            if !parent_kind.accepts_child(spec.kind) {
                return Err(TreeError::InvalidChild {
                    parent: parent_kind,
                    child: spec.kind,
                });
            }
        }

        let (leading, trailing) = match &self.slots[id.index()] {
            Slot::Original {
                leading, trailing, ..
            } => (leading.clone(), trailing.clone()),
            Slot::Replaced(old) => (old.leading.clone(), old.trailing.clone()),
            Slot::Removed => return Err(TreeError::UnknownNode(id)),
        };
        if spec.leading.is_empty() {
            spec.leading = leading;
        }
        if spec.trailing.is_empty() {
            spec.trailing = trailing;
        }

        self.slots[id.index()] = Slot::Replaced(spec);
        Ok(())
    }

    /// Remove a node and its subtree
    pub fn remove(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.check_live(id)?;
        let parent = self.parents[id.index()].ok_or(TreeError::RootRemoval)?;
        match self.original_mut(parent)? {
            Slot::Original { children, .. } => {
                children.retain(|c| !matches!(c, Child::Existing(existing) if *existing == id));
            }
            _ => return Err(TreeError::UnknownNode(parent)),
        }
        self.slots[id.index()] = Slot::Removed;
        Ok(())
    }

    /// Insert a new child at `index` among the parent's current children
    pub fn insert_child(&mut self, parent: NodeId, index: usize, spec: NodeSpec) -> Result<(), TreeError> {
        match self.original_mut(parent)? {
            Slot::Original { kind, children, .. } => {
                if !kind.accepts_child(spec.kind) {
                    return Err(TreeError::InvalidChild {
                        parent: *kind,
                        child: spec.kind,
                    });
                }
                if index > children.len() {
                    return Err(TreeError::IndexOutOfBounds {
                        node: parent,
                        index,
                    });
                }
                children.insert(index, Child::New(spec));
                Ok(())
            }
            _ => Err(TreeError::UnknownNode(parent)),
        }
    }

    /// Append a new last child
    pub fn push_child(&mut self, parent: NodeId, spec: NodeSpec) -> Result<(), TreeError> {
        let len = match self.original_mut(parent)? {
            Slot::Original { children, .. } => children.len(),
            _ => return Err(TreeError::UnknownNode(parent)),
        };
        self.insert_child(parent, len, spec)
    }

    /// Set or clear the token text of a node
    pub fn set_text(&mut self, id: NodeId, value: Option<&str>) -> Result<(), TreeError> {
        self.check_live(id)?;
        match &mut self.slots[id.index()] {
            Slot::Original { text, .. } => *text = value.map(str::to_string),
            Slot::Replaced(spec) => spec.text = value.map(str::to_string),
            Slot::Removed => return Err(TreeError::UnknownNode(id)),
        }
        Ok(())
    }

    /// Build the edited tree
    pub fn finish(mut self) -> Result<SyntaxTree, TreeError> {
        let spec = self.take(NodeId::ROOT)?;
        SyntaxTree::from_spec(&spec)
    }

    fn take(&mut self, id: NodeId) -> Result<NodeSpec, TreeError> {
        let slot = std::mem::replace(&mut self.slots[id.index()], Slot::Removed);
        match slot {
            Slot::Original {
                kind,
                text,
                children,
                leading,
                trailing,
                inner,
            } => {
                let children = children
                    .into_iter()
                    .map(|child| match child {
                        Child::Existing(child) => self.take(child),
                        Child::New(spec) => Ok(spec),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(NodeSpec {
                    kind,
                    text,
                    children,
                    leading,
                    trailing,
                    inner,
                })
            }
            Slot::Replaced(spec) => Ok(spec),
            Slot::Removed => Err(TreeError::UnknownNode(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::build::*;
    use pretty_assertions::assert_eq;

    fn tree() -> SyntaxTree {
        SyntaxTree::from_spec(&catch(
            Some("Exception"),
            Some("ex"),
            None,
            block([throw(ident("ex")).with_trailing(Trivia::line_comment("rethrow"))]),
        ))
        .unwrap()
    }

    fn find(tree: &SyntaxTree, kind: NodeKind) -> NodeId {
        tree.preorder().find(|n| n.is(kind)).unwrap().id()
    }

    #[test]
    fn test_replace_carries_trivia() {
        let original = tree();
        let throw_id = find(&original, NodeKind::ThrowStatement);
        let mut editor = original.edit();
        editor.replace(throw_id, rethrow()).unwrap();
        let edited = editor.finish().unwrap();
        assert_eq!(
            edited.text(),
            "catch (Exception ex) {\n    throw; // rethrow\n}\n"
        );
        // source tree untouched
        assert_eq!(
            original.text(),
            "catch (Exception ex) {\n    throw ex; // rethrow\n}\n"
        );
    }

    #[test]
    fn test_remove_and_push() {
        let original = tree();
        let block_id = find(&original, NodeKind::Block);
        let throw_id = find(&original, NodeKind::ThrowStatement);
        let mut editor = original.edit();
        editor.remove(throw_id).unwrap();
        editor.push_child(block_id, expr_stmt(invoke(ident("Log"), []))).unwrap();
        let edited = editor.finish().unwrap();
        assert_eq!(edited.text(), "catch (Exception ex) {\n    Log();\n}\n");
    }

    #[test]
    fn test_set_text_clears_identifier() {
        let original = tree();
        let decl = find(&original, NodeKind::CatchDeclaration);
        let mut editor = original.edit();
        editor.set_text(decl, None).unwrap();
        let edited = editor.finish().unwrap();
        assert!(edited.text().starts_with("catch (Exception) {"));
    }

    #[test]
    fn test_edit_errors() {
        let original = tree();
        let mut editor = original.edit();
        assert_eq!(editor.remove(NodeId::ROOT), Err(TreeError::RootRemoval));
        assert_eq!(
            editor.remove(NodeId(999)),
            Err(TreeError::UnknownNode(NodeId(999)))
        );

        let block_id = find(&original, NodeKind::Block);
        assert_eq!(
            editor.insert_child(block_id, 5, rethrow()),
            Err(TreeError::IndexOutOfBounds {
                node: block_id,
                index: 5
            })
        );
        assert_eq!(
            editor.push_child(block_id, ident("x")),
            Err(TreeError::InvalidChild {
                parent: NodeKind::Block,
                child: NodeKind::IdentifierName
            })
        );

        // nodes below a replaced node are gone
        let throw_id = find(&original, NodeKind::ThrowStatement);
        editor.replace(block_id, block([])).unwrap();
        assert_eq!(editor.remove(throw_id), Err(TreeError::UnknownNode(throw_id)));
    }
}
