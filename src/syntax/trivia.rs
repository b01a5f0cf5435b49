//! Trivia: whitespace and comments attached to node boundaries

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriviaKind {
    Whitespace,
    Newline,
    /// `// ...` up to the end of the line
    LineComment,
    /// `/* ... */`
    BlockComment,
}

/// A single piece of trivia; `text` holds the exact source, delimiters included
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub text: String,
}

impl Trivia {
    pub fn whitespace(text: &str) -> Self {
        Self {
            kind: TriviaKind::Whitespace,
            text: text.to_string(),
        }
    }

    pub fn newline() -> Self {
        Self {
            kind: TriviaKind::Newline,
            text: "\n".to_string(),
        }
    }

    /// Line comment; a missing `//` prefix is added
    pub fn line_comment(text: &str) -> Self {
        let text = if text.starts_with("//") {
            text.to_string()
        } else {
            format!("// {}", text)
        };
        Self {
            kind: TriviaKind::LineComment,
            text,
        }
    }

    /// Block comment; missing delimiters are added
    pub fn block_comment(text: &str) -> Self {
        let text = if text.starts_with("/*") && text.ends_with("*/") {
            text.to_string()
        } else {
            format!("/* {} */", text)
        };
        Self {
            kind: TriviaKind::BlockComment,
            text,
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TriviaKind::LineComment | TriviaKind::BlockComment)
    }
}

/// Whether any trivia in the list is a comment
pub fn has_comment(trivia: &[Trivia]) -> bool {
    trivia.iter().any(Trivia::is_comment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_delimiters() {
        assert_eq!(Trivia::line_comment("ignored").text, "// ignored");
        assert_eq!(Trivia::line_comment("// kept").text, "// kept");
        assert_eq!(Trivia::block_comment("note").text, "/* note */");
        assert_eq!(Trivia::block_comment("/* x */").text, "/* x */");
    }

    #[test]
    fn test_has_comment() {
        assert!(!has_comment(&[Trivia::whitespace("  "), Trivia::newline()]));
        assert!(has_comment(&[Trivia::newline(), Trivia::line_comment("x")]));
    }
}
