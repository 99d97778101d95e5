//! Language-specific declaration extractors.
//!
//! Each language module turns a parsed syntax tree into [`ExtractedType`]s.
//! Everything after extraction works on [`TypeRecord`]s only, so adding a
//! language means adding a module here, a variant to [`Language`] and an arm
//! to [`Frontend`]'s compile table.

pub mod csharp;
pub mod java;

use std::sync::OnceLock;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Query, QueryCursor};

use crate::parser::{Language, ParseError, ParsedFile};
use crate::records::{TypeKind, TypeRecord};

pub use csharp::CSharpExtractor;
pub use java::JavaExtractor;

/// A type declaration pulled out of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedType {
    /// Metadata of the declaration.
    pub record: TypeRecord,
    /// The declaration's source span, byte for byte.
    pub declaration: String,
}

/// Produces type declarations, bases, members and imports from a parsed file.
pub trait DeclarationExtractor: Send + Sync {
    /// Extract every type declaration matched by `query` in `parsed`.
    fn extract(&self, parsed: &ParsedFile, query: &Query) -> Vec<ExtractedType>;
}

/// Everything needed to turn one language's sources into [`ExtractedType`]s:
/// its grammar, its compiled declarations query and its extractor.
pub struct Frontend {
    language: Language,
    grammar: tree_sitter::Language,
    query: Query,
    extractor: &'static dyn DeclarationExtractor,
}

impl Frontend {
    /// The shared frontend of `language`, compiled on first use.
    pub fn get(language: Language) -> Result<&'static Frontend, ParseError> {
        static CSHARP: OnceLock<Result<Frontend, String>> = OnceLock::new();
        static JAVA: OnceLock<Result<Frontend, String>> = OnceLock::new();

        let slot = match language {
            Language::CSharp => &CSHARP,
            Language::Java => &JAVA,
        };
        slot.get_or_init(|| Self::compile(language))
            .as_ref()
            .map_err(|reason| ParseError::Grammar {
                language,
                reason: reason.clone(),
            })
    }

    fn compile(language: Language) -> Result<Frontend, String> {
        let (grammar, query_source, extractor): (tree_sitter::Language, &str, &'static dyn DeclarationExtractor) =
            match language {
                Language::CSharp => (
                    tree_sitter_c_sharp::LANGUAGE.into(),
                    include_str!("../queries/csharp_declarations.scm"),
                    &CSharpExtractor,
                ),
                Language::Java => (
                    tree_sitter_java::LANGUAGE.into(),
                    include_str!("../queries/java_declarations.scm"),
                    &JavaExtractor,
                ),
            };

        let query = Query::new(&grammar, query_source).map_err(|e| e.to_string())?;
        Ok(Frontend {
            language,
            grammar,
            query,
            extractor,
        })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn grammar(&self) -> &tree_sitter::Language {
        &self.grammar
    }

    /// Run the language's extractor over a file parsed with this frontend.
    pub fn extract(&self, parsed: &ParsedFile) -> Vec<ExtractedType> {
        self.extractor.extract(parsed, &self.query)
    }
}

/// Type declaration and import nodes captured by a declarations query.
pub(crate) struct Captures<'tree> {
    pub types: Vec<(TypeKind, Node<'tree>)>,
    pub imports: Vec<Node<'tree>>,
}

/// Run a declarations query over the whole file.
pub(crate) fn capture_declarations<'tree>(parsed: &'tree ParsedFile, query: &Query) -> Captures<'tree> {
    let mut captures = Captures {
        types: Vec::new(),
        imports: Vec::new(),
    };

    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, parsed.root_node(), parsed.source.as_bytes());

    while let Some(match_) = matches.next() {
        for capture in match_.captures {
            let capture_name = query.capture_names()[capture.index as usize];
            match capture_name {
                "class" => captures.types.push((TypeKind::Class, capture.node)),
                "interface" => captures.types.push((TypeKind::Interface, capture.node)),
                "struct" => captures.types.push((TypeKind::Struct, capture.node)),
                "import" => captures.imports.push(capture.node),
                _ => {}
            }
        }
    }

    captures
}

/// Direct children of `node` with the given kind.
pub(crate) fn children_of_kind<'tree>(node: Node<'tree>, kind: &str) -> Vec<Node<'tree>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|child| child.kind() == kind)
        .collect()
}

/// Normalize a dotted name written with arbitrary spacing (`A . B` -> `A.B`).
pub(crate) fn dotted_name(text: &str) -> String {
    text.split('.')
        .map(|segment| segment.split_whitespace().collect::<String>())
        .collect::<Vec<_>>()
        .join(".")
}
