use crate::diagnostic::FixSafety;
use crate::fixer::{FixError, Fixer};
use crate::rules::query::modifiers;
use crate::rules::StandardConstructors;
use crate::syntax::build::{block, constructor, ident, modifier, param};
use crate::syntax::{NodeKind, NodeRef, NodeSpec, SyntaxTree};

const ACCESS_MODIFIERS: &[&str] = &["private", "internal", "protected"];

/// Name of a class that still declares a base type
fn exception_class<'t>(rule_id: &str, target: NodeRef<'t>) -> Result<&'t str, FixError> {
    if !target.is(NodeKind::ClassDeclaration) {
        return Err(FixError::unsupported(rule_id, "target is not a class declaration"));
    }
    if target.child_of_kind(NodeKind::BaseList).is_none() {
        return Err(FixError::unsupported(rule_id, "class has no base type"));
    }
    target
        .text_opt()
        .ok_or_else(|| FixError::unsupported(rule_id, "class has no name"))
}

/// Adds the `(string)` and `(string, Exception)` constructors a class lacks,
/// each forwarding to the base constructor
pub struct AddStandardConstructors;

impl AddStandardConstructors {
    fn message_constructor(class: &str) -> NodeSpec {
        constructor(
            class,
            &["public"],
            [param("string", "message")],
            Some(("base", vec![ident("message")])),
            block([]),
        )
    }

    fn inner_constructor(class: &str) -> NodeSpec {
        constructor(
            class,
            &["public"],
            [param("string", "message"), param("Exception", "innerException")],
            Some(("base", vec![ident("message"), ident("innerException")])),
            block([]),
        )
    }
}

impl Fixer for AddStandardConstructors {
    fn rule_id(&self) -> &'static str {
        "EX017"
    }

    fn title(&self) -> &'static str {
        "Add standard exception constructors"
    }

    fn safety(&self) -> FixSafety {
        FixSafety::Unsafe
    }

    fn apply(&self, tree: &SyntaxTree, target: NodeRef<'_>) -> Result<SyntaxTree, FixError> {
        let name = exception_class(self.rule_id(), target)?;
        let found = StandardConstructors::of(target);
        if found.is_complete() {
            return Err(FixError::nothing_to_fix(self.rule_id()));
        }

        let mut editor = tree.edit();
        if !found.message {
            editor.push_child(target.id(), Self::message_constructor(name))?;
        }
        if !found.message_and_inner {
            editor.push_child(target.id(), Self::inner_constructor(name))?;
        }
        Ok(editor.finish()?)
    }
}

/// Replaces the access modifiers of a class with `public`
pub struct MakePublic;

impl Fixer for MakePublic {
    fn rule_id(&self) -> &'static str {
        "EX018"
    }

    fn title(&self) -> &'static str {
        "Make exception type public"
    }

    fn safety(&self) -> FixSafety {
        FixSafety::Unsafe
    }

    fn apply(&self, tree: &SyntaxTree, target: NodeRef<'_>) -> Result<SyntaxTree, FixError> {
        exception_class(self.rule_id(), target)?;
        if modifiers(target).any(|m| m == "public") {
            return Err(FixError::nothing_to_fix(self.rule_id()));
        }

        let mut editor = tree.edit();
        let mut public = modifier("public");
        for stripped in target
            .children_of_kind(NodeKind::Modifier)
            .filter(|m| ACCESS_MODIFIERS.contains(&m.text()))
        {
            // comments attached to a dropped modifier move to `public`
            public.leading.extend(stripped.leading().iter().cloned());
            public.trailing.extend(stripped.trailing().iter().cloned());
            editor.remove(stripped.id())?;
        }
        editor.insert_child(target.id(), 0, public)?;
        Ok(editor.finish()?)
    }
}
