//! Canonical source printer
//!
//! Prints a flattened tree as C#-like source (K&R braces, 4-space indent)
//! and records the span of every node. Spans exclude the node's own leading
//! and trailing trivia. Whitespace trivia is normalized by the printer;
//! comments and explicit newlines are always emitted.

use super::{Node, NodeId, NodeKind, TextRange, Trivia, TriviaKind};

const INDENT: &str = "    ";

pub(super) fn render(nodes: &[Node]) -> (String, Vec<TextRange>) {
    let mut printer = Printer {
        nodes,
        out: String::new(),
        spans: vec![TextRange::default(); nodes.len()],
        depth: 0,
    };
    if !nodes.is_empty() {
        printer.node(NodeId::ROOT, true);
        printer.out.push('\n');
    }
    (printer.out, printer.spans)
}

struct Printer<'a> {
    nodes: &'a [Node],
    out: String,
    spans: Vec<TextRange>,
    depth: usize,
}

impl<'a> Printer<'a> {
    fn data(&self, id: NodeId) -> &'a Node {
        &self.nodes[id.index()]
    }

    fn kind(&self, id: NodeId) -> NodeKind {
        self.data(id).kind
    }

    fn newline(&mut self) {
        self.out.push('\n');
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
    }

    /// End the current line without leaving indentation behind
    fn blank_line(&mut self) {
        let trimmed = self.out.trim_end_matches(' ').len();
        self.out.truncate(trimmed);
        self.out.push('\n');
    }

    /// Print a node; `line` is true when it starts on a fresh indented line
    fn node(&mut self, id: NodeId, line: bool) {
        let data = self.data(id);
        self.leading(&data.leading, line);

        let start = self.out.len();
        self.body(id);
        self.spans[id.index()] = TextRange::new(start, self.out.len());

        self.trailing(&data.trailing, line);
    }

    fn leading(&mut self, trivia: &[Trivia], line: bool) {
        for piece in trivia {
            match piece.kind {
                TriviaKind::LineComment | TriviaKind::BlockComment if line => {
                    self.out.push_str(&piece.text);
                    self.newline();
                }
                TriviaKind::LineComment => {
                    self.out.push_str(&piece.text);
                    self.depth += 1;
                    self.newline();
                    self.depth -= 1;
                }
                TriviaKind::BlockComment => {
                    self.out.push_str(&piece.text);
                    self.out.push(' ');
                }
                TriviaKind::Newline if line => {
                    self.blank_line();
                    self.newline();
                }
                TriviaKind::Newline | TriviaKind::Whitespace => {}
            }
        }
    }

    fn trailing(&mut self, trivia: &[Trivia], line: bool) {
        for piece in trivia {
            match piece.kind {
                TriviaKind::LineComment => {
                    self.out.push(' ');
                    self.out.push_str(&piece.text);
                    if !line {
                        self.depth += 1;
                        self.newline();
                        self.depth -= 1;
                    }
                }
                TriviaKind::BlockComment => {
                    self.out.push(' ');
                    self.out.push_str(&piece.text);
                }
                TriviaKind::Newline | TriviaKind::Whitespace => {}
            }
        }
    }

    /// Inner trivia on its own lines, at the current depth
    fn inner(&mut self, trivia: &[Trivia]) {
        for piece in trivia.iter().filter(|t| t.is_comment()) {
            self.newline();
            self.out.push_str(&piece.text);
        }
    }

    fn children_joined(&mut self, children: &[NodeId], sep: &str) {
        for (i, &child) in children.iter().enumerate() {
            if i > 0 {
                self.out.push_str(sep);
            }
            self.node(child, false);
        }
    }

    /// `{ ... }` body holding line-level items; `spaced` puts a blank line between them
    fn braced(&mut self, id: NodeId, items: &[NodeId], spaced: bool) {
        let inner = &self.data(id).inner;
        if items.is_empty() && !inner.iter().any(Trivia::is_comment) {
            self.out.push_str("{ }");
            return;
        }
        self.out.push('{');
        self.depth += 1;
        for (i, &item) in items.iter().enumerate() {
            if spaced && i > 0 {
                self.blank_line();
            }
            self.newline();
            self.node(item, true);
        }
        self.inner(inner);
        self.depth -= 1;
        self.newline();
        self.out.push('}');
    }

    fn text(&mut self, id: NodeId) {
        if let Some(text) = &self.data(id).text {
            self.out.push_str(text);
        }
    }

    fn body(&mut self, id: NodeId) {
        let data = self.data(id);
        let children = data.children.as_slice();
        match data.kind {
            NodeKind::CompilationUnit => {
                for (i, &child) in children.iter().enumerate() {
                    if i > 0 {
                        let both_usings = self.kind(children[i - 1]) == NodeKind::UsingDirective
                            && self.kind(child) == NodeKind::UsingDirective;
                        if !both_usings {
                            self.blank_line();
                        }
                        self.newline();
                    }
                    self.node(child, true);
                }
            }
            NodeKind::UsingDirective => {
                self.out.push_str("using ");
                self.text(id);
                self.out.push(';');
            }
            NodeKind::NamespaceDeclaration => {
                self.out.push_str("namespace ");
                self.text(id);
                self.out.push(' ');
                self.braced(id, children, true);
            }
            NodeKind::ClassDeclaration => {
                let (modifiers, rest) = self.split_modifiers(children);
                for &modifier in modifiers {
                    self.node(modifier, false);
                    self.out.push(' ');
                }
                self.out.push_str("class ");
                self.text(id);
                let (bases, members): (Vec<NodeId>, Vec<NodeId>) = rest
                    .iter()
                    .partition(|&&c| self.kind(c) == NodeKind::BaseList);
                for base in bases {
                    self.out.push(' ');
                    self.node(base, false);
                }
                self.out.push(' ');
                self.braced(id, &members, true);
            }
            NodeKind::Modifier | NodeKind::TypeName | NodeKind::IdentifierName => self.text(id),
            NodeKind::BaseList => {
                self.out.push_str(": ");
                self.children_joined(children, ", ");
            }
            NodeKind::ConstructorDeclaration => {
                let (modifiers, rest) = self.split_modifiers(children);
                for &modifier in modifiers {
                    self.node(modifier, false);
                    self.out.push(' ');
                }
                self.text(id);
                for &child in rest {
                    match self.kind(child) {
                        NodeKind::ParameterList => {}
                        _ => self.out.push(' '),
                    }
                    self.node(child, false);
                }
            }
            NodeKind::ConstructorInitializer => {
                self.out.push_str(": ");
                self.text(id);
                self.children_joined(children, "");
            }
            NodeKind::MethodDeclaration => {
                let (modifiers, rest) = self.split_modifiers(children);
                for &modifier in modifiers {
                    self.node(modifier, false);
                    self.out.push(' ');
                }
                let mut named = false;
                for &child in rest {
                    match self.kind(child) {
                        NodeKind::TypeName if !named => {
                            self.node(child, false);
                            self.out.push(' ');
                            self.text(id);
                            named = true;
                        }
                        NodeKind::ParameterList => {
                            if !named {
                                self.text(id);
                                named = true;
                            }
                            self.node(child, false);
                        }
                        NodeKind::ArrowExpressionClause => {
                            self.out.push(' ');
                            self.node(child, false);
                            self.out.push(';');
                        }
                        _ => {
                            self.out.push(' ');
                            self.node(child, false);
                        }
                    }
                }
            }
            NodeKind::PropertyDeclaration => {
                let (modifiers, rest) = self.split_modifiers(children);
                for &modifier in modifiers {
                    self.node(modifier, false);
                    self.out.push(' ');
                }
                for &child in rest {
                    match self.kind(child) {
                        NodeKind::TypeName => {
                            self.node(child, false);
                            self.out.push(' ');
                            self.text(id);
                        }
                        NodeKind::ArrowExpressionClause => {
                            self.out.push(' ');
                            self.node(child, false);
                            self.out.push(';');
                        }
                        _ => {
                            self.out.push(' ');
                            self.node(child, false);
                        }
                    }
                }
            }
            NodeKind::AccessorList => {
                let multiline = children
                    .iter()
                    .any(|&a| self.data(a).children.iter().any(|&b| self.kind(b) == NodeKind::Block));
                if multiline {
                    self.braced(id, children, false);
                } else if children.is_empty() {
                    self.out.push_str("{ }");
                } else {
                    self.out.push_str("{ ");
                    self.children_joined(children, " ");
                    self.out.push_str(" }");
                }
            }
            NodeKind::AccessorDeclaration => {
                self.text(id);
                match children.first() {
                    None => self.out.push(';'),
                    Some(_) => {
                        for &child in children {
                            self.out.push(' ');
                            self.node(child, false);
                            if self.kind(child) == NodeKind::ArrowExpressionClause {
                                self.out.push(';');
                            }
                        }
                    }
                }
            }
            NodeKind::ArrowExpressionClause => {
                self.out.push_str("=> ");
                self.children_joined(children, " ");
            }
            NodeKind::ParameterList | NodeKind::ArgumentList => {
                self.out.push('(');
                self.children_joined(children, ", ");
                self.out.push(')');
            }
            NodeKind::Parameter => {
                self.children_joined(children, " ");
                self.out.push(' ');
                self.text(id);
            }
            NodeKind::Block => self.braced(id, children, false),
            NodeKind::ExpressionStatement => {
                self.children_joined(children, " ");
                self.out.push(';');
            }
            NodeKind::LocalDeclaration => {
                for (i, &child) in children.iter().enumerate() {
                    if i == 0 {
                        self.node(child, false);
                        self.out.push(' ');
                        self.text(id);
                    } else {
                        self.out.push_str(" = ");
                        self.node(child, false);
                    }
                }
                self.out.push(';');
            }
            NodeKind::ReturnStatement | NodeKind::ThrowStatement => {
                self.out
                    .push_str(if data.kind == NodeKind::ReturnStatement { "return" } else { "throw" });
                for &child in children {
                    self.out.push(' ');
                    self.node(child, false);
                }
                self.out.push(';');
            }
            NodeKind::IfStatement => self.if_statement(children),
            NodeKind::TryStatement => {
                self.out.push_str("try");
                for &child in children {
                    self.out.push(' ');
                    self.node(child, false);
                }
            }
            NodeKind::CatchClause => {
                self.out.push_str("catch");
                for &child in children {
                    self.out.push(' ');
                    self.node(child, false);
                }
            }
            NodeKind::CatchDeclaration => {
                self.out.push('(');
                self.children_joined(children, " ");
                if let Some(name) = data.text.as_deref().filter(|t| !t.is_empty()) {
                    self.out.push(' ');
                    self.out.push_str(name);
                }
                self.out.push(')');
            }
            NodeKind::CatchFilter => {
                self.out.push_str("when (");
                self.children_joined(children, " ");
                self.out.push(')');
            }
            NodeKind::FinallyClause => {
                self.out.push_str("finally ");
                self.children_joined(children, " ");
            }
            NodeKind::ObjectCreation => {
                self.out.push_str("new ");
                self.children_joined(children, "");
            }
            NodeKind::Invocation => self.children_joined(children, ""),
            NodeKind::Argument => self.children_joined(children, " "),
            NodeKind::MemberAccess => {
                self.children_joined(children, " ");
                self.out.push('.');
                self.text(id);
            }
            NodeKind::StringLiteral => {
                self.out.push('"');
                escape_into(&mut self.out, data.text.as_deref().unwrap_or_default(), false);
                self.out.push('"');
            }
            NodeKind::NullLiteral => self.out.push_str("null"),
            NodeKind::BooleanLiteral => {
                self.out.push_str(data.text.as_deref().unwrap_or("false"));
            }
            NodeKind::NumericLiteral => {
                self.out.push_str(data.text.as_deref().unwrap_or("0"));
            }
            NodeKind::BinaryExpression => {
                let op = data.text.as_deref().unwrap_or("+");
                self.children_joined(children, &format!(" {} ", op));
            }
            NodeKind::IsExpression => self.children_joined(children, " is "),
            NodeKind::InterpolatedString => {
                self.out.push_str("$\"");
                self.children_joined(children, "");
                self.out.push('"');
            }
            NodeKind::InterpolatedText => {
                escape_into(&mut self.out, data.text.as_deref().unwrap_or_default(), true);
            }
            NodeKind::Interpolation => {
                self.out.push('{');
                self.children_joined(children, " ");
                self.out.push('}');
            }
            NodeKind::ThrowExpression => {
                self.out.push_str("throw ");
                self.children_joined(children, " ");
            }
            NodeKind::ParenthesizedExpression => {
                self.out.push('(');
                self.children_joined(children, " ");
                self.out.push(')');
            }
        }
    }

    fn split_modifiers<'c>(&self, children: &'c [NodeId]) -> (&'c [NodeId], &'c [NodeId]) {
        let count = children
            .iter()
            .take_while(|&&c| self.kind(c) == NodeKind::Modifier)
            .count();
        children.split_at(count)
    }

    fn if_statement(&mut self, children: &[NodeId]) {
        self.out.push_str("if (");
        let Some((&condition, branches)) = children.split_first() else {
            self.out.push(')');
            return;
        };
        self.node(condition, false);
        self.out.push(')');

        let mut previous_block = false;
        for (i, &branch) in branches.iter().enumerate() {
            let kind = self.kind(branch);
            if i > 0 {
                if previous_block {
                    self.out.push_str(" else");
                } else {
                    self.newline();
                    self.out.push_str("else");
                }
            }
            if kind == NodeKind::Block || (i > 0 && kind == NodeKind::IfStatement) {
                self.out.push(' ');
                self.node(branch, false);
            } else {
                self.depth += 1;
                self.newline();
                self.node(branch, true);
                self.depth -= 1;
            }
            previous_block = kind == NodeKind::Block;
        }
    }
}

fn escape_into(out: &mut String, text: &str, interpolated: bool) {
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            '{' if interpolated => out.push_str("{{"),
            '}' if interpolated => out.push_str("}}"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::syntax::build::*;
    use crate::syntax::{NodeSpec, SyntaxTree, Trivia};
    use pretty_assertions::assert_eq;

    fn text(spec: NodeSpec) -> String {
        SyntaxTree::from_spec(&spec).unwrap().text().to_string()
    }

    #[test]
    fn test_empty_catch_is_inline() {
        let spec = try_stmt(
            block([expr_stmt(invoke(ident("Run"), []))]),
            [catch(Some("Exception"), None, None, block([]))],
            None,
        );
        assert_eq!(text(spec), "try {\n    Run();\n} catch (Exception) { }\n");
    }

    #[test]
    fn test_inner_comment_in_block() {
        let spec = catch(
            Some("Exception"),
            None,
            None,
            block([]).with_inner(Trivia::line_comment("ignored on purpose")),
        );
        assert_eq!(text(spec), "catch (Exception) {\n    // ignored on purpose\n}\n");
    }

    #[test]
    fn test_filter_and_rethrow() {
        let spec = catch(
            Some("Exception"),
            Some("ex"),
            Some(is_type(ident("ex"), "IOException")),
            block([rethrow()]),
        );
        assert_eq!(
            text(spec),
            "catch (Exception ex) when (ex is IOException) {\n    throw;\n}\n"
        );
    }

    #[test]
    fn test_class_with_constructor() {
        let spec = class(
            "FooException",
            &["public"],
            &["Exception"],
            [constructor(
                "FooException",
                &["public"],
                [param("string", "message")],
                Some(("base", vec![ident("message")])),
                block([]),
            )],
        );
        assert_eq!(
            text(spec),
            "public class FooException : Exception {\n    public FooException(string message) : base(message) { }\n}\n"
        );
    }

    #[test]
    fn test_property_getter() {
        let spec = property(
            "Value",
            &["public"],
            "int",
            [accessor("get", Some(block([throw(new_object("InvalidOperationException", []))])))],
        );
        assert_eq!(
            text(spec),
            "public int Value {\n    get {\n        throw new InvalidOperationException();\n    }\n}\n"
        );
        let auto = property("Name", &[], "string", [accessor("get", None), accessor("set", None)]);
        assert_eq!(text(auto), "string Name { get; set; }\n");
    }

    #[test]
    fn test_expressions() {
        let call = expr_stmt(invoke(
            path("logger.LogError"),
            [binary("+", string("x: "), member(ident("ex"), "Message"))],
        ));
        assert_eq!(text(call), "logger.LogError(\"x: \" + ex.Message);\n");

        let interp = expr_stmt(invoke(
            path("log.Info"),
            [interpolated([interp_text("failed {0}: "), interp(ident("ex"))])],
        ));
        assert_eq!(text(interp), "log.Info($\"failed {{0}}: {ex}\");\n");

        let escaped = expr_stmt(invoke(ident("Write"), [string("say \"hi\"\n")]));
        assert_eq!(text(escaped), "Write(\"say \\\"hi\\\"\\n\");\n");
    }

    #[test]
    fn test_if_else_chain() {
        let spec = if_stmt(
            ident("a"),
            block([rethrow()]),
            Some(if_stmt(ident("b"), ret(None), None)),
        );
        assert_eq!(text(spec), "if (a) {\n    throw;\n} else if (b)\n    return;\n");
    }

    #[test]
    fn test_comments_around_statements() {
        let spec = block([
            rethrow()
                .with_leading(Trivia::line_comment("keep the trace"))
                .with_trailing(Trivia::line_comment("rethrow")),
        ]);
        assert_eq!(text(spec), "{\n    // keep the trace\n    throw; // rethrow\n}\n");
    }

    #[test]
    fn test_compilation_unit_spacing() {
        let spec = compilation_unit([
            using("System"),
            using("System.IO"),
            namespace("App", [class("A", &[], &[], []), class("B", &[], &[], [])]),
        ]);
        assert_eq!(
            text(spec),
            "using System;\nusing System.IO;\n\nnamespace App {\n    class A { }\n\n    class B { }\n}\n"
        );
    }
}
