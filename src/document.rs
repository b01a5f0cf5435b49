//! Serialized analysis input
//!
//! A document is what a host frontend hands over: the syntax tree of one
//! source file plus, optionally, the semantic facts it resolved for that
//! tree. Documents are stored as JSON or YAML.

use crate::semantic::FactTable;
use crate::syntax::{NodeSpec, SyntaxTree, TreeError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported document format: {0}")]
    Unsupported(String),

    #[error("invalid tree: {0}")]
    Tree(#[from] TreeError),
}

/// Storage format of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(DocumentError::Unsupported(ext.to_string())),
        }
    }
}

/// One source file's tree and facts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Source file the tree was parsed from, for display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,

    pub tree: NodeSpec,

    /// Facts keyed by pre-order node index; absent when the host resolved none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facts: Option<FactTable>,
}

impl Document {
    pub fn new(tree: NodeSpec) -> Self {
        Self {
            source: None,
            tree,
            facts: None,
        }
    }

    pub fn with_facts(mut self, facts: FactTable) -> Self {
        self.facts = Some(facts);
        self
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let format = DocumentFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, format)
    }

    pub fn parse(content: &str, format: DocumentFormat) -> Result<Self, DocumentError> {
        Ok(match format {
            DocumentFormat::Json => serde_json::from_str(content)?,
            DocumentFormat::Yaml => serde_yaml::from_str(content)?,
        })
    }

    pub fn to_string(&self, format: DocumentFormat) -> Result<String, DocumentError> {
        Ok(match format {
            DocumentFormat::Json => serde_json::to_string_pretty(self)?,
            DocumentFormat::Yaml => serde_yaml::to_string(self)?,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        let format = DocumentFormat::from_path(path)?;
        std::fs::write(path, self.to_string(format)?)?;
        Ok(())
    }

    /// Build the tree and pick its facts. Without shipped facts the
    /// name-based approximation is used when `approximate` is set, and
    /// nothing resolves otherwise.
    pub fn open(&self, approximate: bool) -> Result<(SyntaxTree, FactTable), DocumentError> {
        let tree = SyntaxTree::from_spec(&self.tree)?;
        let facts = match &self.facts {
            Some(facts) => facts.clone(),
            None if approximate => FactTable::approximate(&tree),
            None => FactTable::new(),
        };
        Ok((tree, facts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::build::*;
    use crate::syntax::NodeId;
    use tempfile::TempDir;

    #[test]
    fn test_format_from_path() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.json")).unwrap(), DocumentFormat::Json);
        assert_eq!(DocumentFormat::from_path(Path::new("a.yml")).unwrap(), DocumentFormat::Yaml);
        assert!(matches!(
            DocumentFormat::from_path(Path::new("a.cs")),
            Err(DocumentError::Unsupported(_))
        ));
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{
            "source": "Widget.cs",
            "tree": {
                "kind": "throw_statement",
                "children": [{
                    "kind": "object_creation",
                    "children": [
                        {"kind": "type_name", "text": "Exception"},
                        {"kind": "argument_list"}
                    ]
                }]
            }
        }"#;
        let document = Document::parse(json, DocumentFormat::Json).unwrap();
        assert_eq!(document.source, Some(PathBuf::from("Widget.cs")));
        assert!(document.facts.is_none());
        let (tree, facts) = document.open(true).unwrap();
        assert_eq!(tree.text(), "throw new Exception();\n");
        assert!(!facts.is_empty());
    }

    #[test]
    fn test_open_without_approximation() {
        let document = Document::new(throw(new_object("Exception", [])));
        let (_, facts) = document.open(false).unwrap();
        assert!(facts.is_empty());
    }

    #[test]
    fn test_shipped_facts_win() {
        let facts = FactTable::new().with_type(NodeId(1), "Acme.Failure");
        let document = Document::new(throw(new_object("Exception", []))).with_facts(facts.clone());
        let (_, opened) = document.open(true).unwrap();
        assert_eq!(opened, facts);
    }

    #[test]
    fn test_invalid_tree() {
        let document = Document::new(block([using("System")]));
        assert!(matches!(document.open(true), Err(DocumentError::Tree(_))));
    }

    #[test]
    fn test_save_and_load_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.yaml");
        let document = Document::new(block([rethrow()])).with_source("A.cs");
        document.save(&path).unwrap();
        assert_eq!(Document::load(&path).unwrap(), document);
    }
}
