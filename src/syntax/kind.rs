//! Node kinds for the C#-like syntax tree

use serde::{Deserialize, Serialize};
use std::fmt;

/// Syntactic category of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum NodeKind {
    CompilationUnit,
    UsingDirective,
    NamespaceDeclaration,
    ClassDeclaration,
    Modifier,
    BaseList,
    ConstructorDeclaration,
    ConstructorInitializer,
    MethodDeclaration,
    PropertyDeclaration,
    AccessorList,
    AccessorDeclaration,
    ArrowExpressionClause,
    ParameterList,
    Parameter,
    TypeName,
    Block,
    ExpressionStatement,
    LocalDeclaration,
    ReturnStatement,
    ThrowStatement,
    IfStatement,
    TryStatement,
    CatchClause,
    CatchDeclaration,
    CatchFilter,
    FinallyClause,
    ObjectCreation,
    Invocation,
    ArgumentList,
    Argument,
    MemberAccess,
    IdentifierName,
    StringLiteral,
    NullLiteral,
    BooleanLiteral,
    NumericLiteral,
    BinaryExpression,
    IsExpression,
    InterpolatedString,
    InterpolatedText,
    Interpolation,
    ThrowExpression,
    ParenthesizedExpression,
}

impl NodeKind {
    /// Number of distinct kinds
    pub const COUNT: usize = 44;

    /// Every kind, in declaration order
    pub const ALL: [NodeKind; NodeKind::COUNT] = [
        NodeKind::CompilationUnit,
        NodeKind::UsingDirective,
        NodeKind::NamespaceDeclaration,
        NodeKind::ClassDeclaration,
        NodeKind::Modifier,
        NodeKind::BaseList,
        NodeKind::ConstructorDeclaration,
        NodeKind::ConstructorInitializer,
        NodeKind::MethodDeclaration,
        NodeKind::PropertyDeclaration,
        NodeKind::AccessorList,
        NodeKind::AccessorDeclaration,
        NodeKind::ArrowExpressionClause,
        NodeKind::ParameterList,
        NodeKind::Parameter,
        NodeKind::TypeName,
        NodeKind::Block,
        NodeKind::ExpressionStatement,
        NodeKind::LocalDeclaration,
        NodeKind::ReturnStatement,
        NodeKind::ThrowStatement,
        NodeKind::IfStatement,
        NodeKind::TryStatement,
        NodeKind::CatchClause,
        NodeKind::CatchDeclaration,
        NodeKind::CatchFilter,
        NodeKind::FinallyClause,
        NodeKind::ObjectCreation,
        NodeKind::Invocation,
        NodeKind::ArgumentList,
        NodeKind::Argument,
        NodeKind::MemberAccess,
        NodeKind::IdentifierName,
        NodeKind::StringLiteral,
        NodeKind::NullLiteral,
        NodeKind::BooleanLiteral,
        NodeKind::NumericLiteral,
        NodeKind::BinaryExpression,
        NodeKind::IsExpression,
        NodeKind::InterpolatedString,
        NodeKind::InterpolatedText,
        NodeKind::Interpolation,
        NodeKind::ThrowExpression,
        NodeKind::ParenthesizedExpression,
    ];

    /// Dense index, usable for per-kind lookup tables
    pub fn index(self) -> usize {
        self as usize
    }

    /// Snake-case name, identical to the serialized form
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::CompilationUnit => "compilation_unit",
            NodeKind::UsingDirective => "using_directive",
            NodeKind::NamespaceDeclaration => "namespace_declaration",
            NodeKind::ClassDeclaration => "class_declaration",
            NodeKind::Modifier => "modifier",
            NodeKind::BaseList => "base_list",
            NodeKind::ConstructorDeclaration => "constructor_declaration",
            NodeKind::ConstructorInitializer => "constructor_initializer",
            NodeKind::MethodDeclaration => "method_declaration",
            NodeKind::PropertyDeclaration => "property_declaration",
            NodeKind::AccessorList => "accessor_list",
            NodeKind::AccessorDeclaration => "accessor_declaration",
            NodeKind::ArrowExpressionClause => "arrow_expression_clause",
            NodeKind::ParameterList => "parameter_list",
            NodeKind::Parameter => "parameter",
            NodeKind::TypeName => "type_name",
            NodeKind::Block => "block",
            NodeKind::ExpressionStatement => "expression_statement",
            NodeKind::LocalDeclaration => "local_declaration",
            NodeKind::ReturnStatement => "return_statement",
            NodeKind::ThrowStatement => "throw_statement",
            NodeKind::IfStatement => "if_statement",
            NodeKind::TryStatement => "try_statement",
            NodeKind::CatchClause => "catch_clause",
            NodeKind::CatchDeclaration => "catch_declaration",
            NodeKind::CatchFilter => "catch_filter",
            NodeKind::FinallyClause => "finally_clause",
            NodeKind::ObjectCreation => "object_creation",
            NodeKind::Invocation => "invocation",
            NodeKind::ArgumentList => "argument_list",
            NodeKind::Argument => "argument",
            NodeKind::MemberAccess => "member_access",
            NodeKind::IdentifierName => "identifier_name",
            NodeKind::StringLiteral => "string_literal",
            NodeKind::NullLiteral => "null_literal",
            NodeKind::BooleanLiteral => "boolean_literal",
            NodeKind::NumericLiteral => "numeric_literal",
            NodeKind::BinaryExpression => "binary_expression",
            NodeKind::IsExpression => "is_expression",
            NodeKind::InterpolatedString => "interpolated_string",
            NodeKind::InterpolatedText => "interpolated_text",
            NodeKind::Interpolation => "interpolation",
            NodeKind::ThrowExpression => "throw_expression",
            NodeKind::ParenthesizedExpression => "parenthesized_expression",
        }
    }

    /// Statements are the items of a block
    pub fn is_statement(self) -> bool {
        matches!(
            self,
            NodeKind::Block
                | NodeKind::ExpressionStatement
                | NodeKind::LocalDeclaration
                | NodeKind::ReturnStatement
                | NodeKind::ThrowStatement
                | NodeKind::IfStatement
                | NodeKind::TryStatement
        )
    }

    pub fn is_expression(self) -> bool {
        matches!(
            self,
            NodeKind::ObjectCreation
                | NodeKind::Invocation
                | NodeKind::MemberAccess
                | NodeKind::IdentifierName
                | NodeKind::StringLiteral
                | NodeKind::NullLiteral
                | NodeKind::BooleanLiteral
                | NodeKind::NumericLiteral
                | NodeKind::BinaryExpression
                | NodeKind::IsExpression
                | NodeKind::InterpolatedString
                | NodeKind::ThrowExpression
                | NodeKind::ParenthesizedExpression
        )
    }

    /// Type members; ancestor walks stop at these
    pub fn is_member(self) -> bool {
        matches!(
            self,
            NodeKind::ClassDeclaration
                | NodeKind::ConstructorDeclaration
                | NodeKind::MethodDeclaration
                | NodeKind::PropertyDeclaration
        )
    }

    /// Literal kinds carry their constant value in the node text
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            NodeKind::StringLiteral
                | NodeKind::NullLiteral
                | NodeKind::BooleanLiteral
                | NodeKind::NumericLiteral
        )
    }

    /// Whether a node of this kind may own a child of kind `child`
    pub fn accepts_child(self, child: NodeKind) -> bool {
        use NodeKind::*;
        match self {
            CompilationUnit => matches!(
                child,
                UsingDirective | NamespaceDeclaration | ClassDeclaration
            ),
            NamespaceDeclaration => matches!(
                child,
                UsingDirective | NamespaceDeclaration | ClassDeclaration
            ),
            ClassDeclaration => matches!(child, Modifier | BaseList) || child.is_member(),
            BaseList => child == TypeName,
            ConstructorDeclaration => matches!(
                child,
                Modifier | ParameterList | ConstructorInitializer | Block
            ),
            ConstructorInitializer => child == ArgumentList,
            MethodDeclaration => matches!(
                child,
                Modifier | TypeName | ParameterList | Block | ArrowExpressionClause
            ),
            PropertyDeclaration => matches!(
                child,
                Modifier | TypeName | AccessorList | ArrowExpressionClause
            ),
            AccessorList => child == AccessorDeclaration,
            AccessorDeclaration => matches!(child, Block | ArrowExpressionClause),
            ParameterList => child == Parameter,
            Parameter => child == TypeName,
            Block => child.is_statement(),
            LocalDeclaration => child == TypeName || child.is_expression(),
            IfStatement => child.is_expression() || child.is_statement(),
            TryStatement => matches!(child, Block | CatchClause | FinallyClause),
            CatchClause => matches!(child, CatchDeclaration | CatchFilter | Block),
            CatchDeclaration => child == TypeName,
            FinallyClause => child == Block,
            ObjectCreation => matches!(child, TypeName | ArgumentList),
            Invocation => child == ArgumentList || child.is_expression(),
            ArgumentList => child == Argument,
            IsExpression => child == TypeName || child.is_expression(),
            InterpolatedString => matches!(child, InterpolatedText | Interpolation),
            ArrowExpressionClause | ExpressionStatement | ReturnStatement | ThrowStatement
            | CatchFilter | Argument | MemberAccess | BinaryExpression | Interpolation
            | ThrowExpression | ParenthesizedExpression => child.is_expression(),
            UsingDirective | Modifier | TypeName | IdentifierName | StringLiteral
            | NullLiteral | BooleanLiteral | NumericLiteral | InterpolatedText => false,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("Unknown node kind: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_is_dense() {
        for (i, kind) in NodeKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_name_round_trip() {
        for kind in NodeKind::ALL {
            assert_eq!(kind.as_str().parse::<NodeKind>(), Ok(kind));
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_categories_are_disjoint() {
        for kind in NodeKind::ALL {
            let hits = [kind.is_statement(), kind.is_expression(), kind.is_member()]
                .iter()
                .filter(|b| **b)
                .count();
            assert!(hits <= 1, "{} is in more than one category", kind);
        }
    }

    #[test]
    fn test_accepts_child() {
        assert!(NodeKind::Block.accepts_child(NodeKind::ThrowStatement));
        assert!(!NodeKind::Block.accepts_child(NodeKind::IdentifierName));
        assert!(NodeKind::ThrowStatement.accepts_child(NodeKind::ObjectCreation));
        assert!(NodeKind::ClassDeclaration.accepts_child(NodeKind::ConstructorDeclaration));
        assert!(!NodeKind::IdentifierName.accepts_child(NodeKind::IdentifierName));
    }
}
