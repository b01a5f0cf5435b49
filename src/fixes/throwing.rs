use crate::fixer::{FixError, Fixer};
use crate::rules::query::{catch_variable, enclosing_catch, is_identifier};
use crate::syntax::{build, NodeKind, NodeRef, SyntaxTree};

/// `throw ex;` inside `catch (T ex)` becomes `throw;`
pub struct BareRethrow;

impl Fixer for BareRethrow {
    fn rule_id(&self) -> &'static str {
        "EX002"
    }

    fn title(&self) -> &'static str {
        "Rethrow with 'throw;'"
    }

    fn apply(&self, tree: &SyntaxTree, target: NodeRef<'_>) -> Result<SyntaxTree, FixError> {
        if !target.is(NodeKind::ThrowStatement) {
            return Err(FixError::unsupported(self.rule_id(), "target is not a throw statement"));
        }
        let Some(operand) = target.first_child() else {
            return Err(FixError::nothing_to_fix(self.rule_id()));
        };
        let Some(variable) = enclosing_catch(target).and_then(catch_variable) else {
            return Err(FixError::unsupported(self.rule_id(), "throw is not inside a catch with a variable"));
        };
        if !is_identifier(operand, variable) {
            return Err(FixError::unsupported(
                self.rule_id(),
                format!("'{}' is not the catch variable '{}'", operand.source(), variable),
            ));
        }

        let mut editor = tree.edit();
        editor.replace(target.id(), build::rethrow())?;
        Ok(editor.finish()?)
    }
}
