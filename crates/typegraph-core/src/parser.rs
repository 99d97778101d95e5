//! Source loading and tree-sitter parsing.
//!
//! A [`SourceParser`] turns the text of one file into a [`ParsedFile`] using
//! the grammar of a [`Frontend`]. Tree-sitter parsers are not thread safe, so
//! every extraction worker owns its own `SourceParser`; the frontends they
//! parse with are compiled once and shared.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tree_sitter::{Node, Tree};

use crate::lang::Frontend;

/// Why a file could not be turned into a syntax tree.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("No declaration extractor for {0}")]
    Unsupported(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(PathBuf),

    #[error("{language} grammar unavailable: {reason}")]
    Grammar { language: Language, reason: String },

    #[error("Parser produced no tree for {0}")]
    NoTree(String),
}

/// Source languages with a declaration extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    CSharp,
    Java,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::CSharp, Language::Java];

    /// Match a file extension, without the dot, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|lang| lang.extension().eq_ignore_ascii_case(ext))
    }

    /// Language of a source path, by extension.
    pub fn of_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// File extension of the language's sources.
    pub fn extension(self) -> &'static str {
        match self {
            Language::CSharp => "cs",
            Language::Java => "java",
        }
    }

    /// Extensions of every supported language.
    pub fn supported_extensions() -> Vec<&'static str> {
        Self::ALL.into_iter().map(Language::extension).collect()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Language::CSharp => "C#",
            Language::Java => "Java",
        })
    }
}

/// Syntax tree of one source file together with its text.
pub struct ParsedFile {
    pub language: Language,
    pub tree: Tree,
    pub source: String,
    /// Path recorded in the extracted metadata.
    pub path: String,
}

impl ParsedFile {
    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Source text spanned by `node`.
    pub fn node_text(&self, node: Node) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    /// The tree contains error or missing nodes.
    pub fn has_syntax_errors(&self) -> bool {
        self.root_node().has_error()
    }
}

/// Read a source file as text, dropping a leading byte order mark.
pub fn read_source(path: &Path) -> Result<String, ParseError> {
    let bytes = std::fs::read(path).map_err(|source| ParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|_| ParseError::InvalidUtf8(path.to_path_buf()))?;
    Ok(match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

/// A tree-sitter parser that switches grammar only when the language changes.
pub struct SourceParser {
    inner: tree_sitter::Parser,
    current: Option<Language>,
}

impl SourceParser {
    pub fn new() -> Self {
        Self {
            inner: tree_sitter::Parser::new(),
            current: None,
        }
    }

    /// Parse `source` with the frontend's grammar.
    pub fn parse(
        &mut self,
        frontend: &Frontend,
        source: String,
        path: impl Into<String>,
    ) -> Result<ParsedFile, ParseError> {
        let language = frontend.language();
        if self.current != Some(language) {
            self.inner
                .set_language(frontend.grammar())
                .map_err(|e| ParseError::Grammar {
                    language,
                    reason: e.to_string(),
                })?;
            self.current = Some(language);
        }

        let path = path.into();
        let tree = self
            .inner
            .parse(&source, None)
            .ok_or_else(|| ParseError::NoTree(path.clone()))?;

        Ok(ParsedFile {
            language,
            tree,
            source,
            path,
        })
    }
}

impl Default for SourceParser {
    fn default() -> Self {
        Self::new()
    }
}
