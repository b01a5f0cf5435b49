use crate::fixer::{FixError, Fixer};
use crate::rules::query::{catch_block, catch_type, is_bare_rethrow, references, simple_name};
use crate::syntax::{build, NodeKind, NodeRef, SyntaxTree};

/// Appends `throw;` to a catch block that swallows ThreadAbortException
pub struct RethrowThreadAbort;

impl Fixer for RethrowThreadAbort {
    fn rule_id(&self) -> &'static str {
        "EX013"
    }

    fn title(&self) -> &'static str {
        "Rethrow ThreadAbortException"
    }

    fn apply(&self, tree: &SyntaxTree, target: NodeRef<'_>) -> Result<SyntaxTree, FixError> {
        if !target.is(NodeKind::CatchClause) {
            return Err(FixError::unsupported(self.rule_id(), "target is not a catch clause"));
        }
        let caught = catch_type(target).map(|t| simple_name(t.text()));
        if caught != Some("ThreadAbortException") {
            return Err(FixError::unsupported(self.rule_id(), "catch clause does not catch ThreadAbortException"));
        }
        let Some(block) = catch_block(target) else {
            return Err(FixError::unsupported(self.rule_id(), "catch clause has no block"));
        };
        if block.descendants().any(is_bare_rethrow) {
            return Err(FixError::nothing_to_fix(self.rule_id()));
        }

        let mut editor = tree.edit();
        editor.push_child(block.id(), build::rethrow())?;
        Ok(editor.finish()?)
    }
}

/// `catch (T ex)` becomes `catch (T)` when `ex` is never referenced
pub struct RemoveCatchVariable;

impl Fixer for RemoveCatchVariable {
    fn rule_id(&self) -> &'static str {
        "EX019"
    }

    fn title(&self) -> &'static str {
        "Remove unused catch variable"
    }

    fn apply(&self, tree: &SyntaxTree, target: NodeRef<'_>) -> Result<SyntaxTree, FixError> {
        if !target.is(NodeKind::CatchDeclaration) {
            return Err(FixError::unsupported(self.rule_id(), "target is not a catch declaration"));
        }
        let Some(name) = target.text_opt() else {
            return Err(FixError::nothing_to_fix(self.rule_id()));
        };
        let used = target.parent().is_some_and(|clause| {
            clause
                .children()
                .filter(|c| c.is(NodeKind::CatchFilter) || c.is(NodeKind::Block))
                .any(|c| references(c, name))
        });
        if used {
            return Err(FixError::unsupported(self.rule_id(), format!("'{}' is referenced", name)));
        }

        let mut editor = tree.edit();
        editor.set_text(target.id(), None)?;
        Ok(editor.finish()?)
    }
}
