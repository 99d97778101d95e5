//! typegraph-core: type declaration extraction and namespace dependency graphs
//!
//! This crate provides the analysis engine behind the `typegraph` CLI:
//! - Source tree scanning and tree-sitter parsing (C#, Java)
//! - Per-type metadata documents and declaration dumps
//! - An in-memory namespace index of every extracted type
//! - Heuristic inherit/implement/reference edge inference per namespace
//! - `graph.csv` output for visualization

pub mod builder;
pub mod edges;
pub mod extractor;
pub mod index;
pub mod lang;
pub mod layout;
pub mod parser;
pub mod pipeline;
pub mod records;
pub mod scanner;
pub mod writer;

pub use builder::{DeclarationSource, NamespaceGraph, ReferenceGraphBuilder, classify};
pub use edges::{EdgeLabel, GRAPH_HEADER, GraphEdge, GraphNode, GraphRow};
pub use extractor::{ExtractStats, FileExtraction, TypeExtractor, extract_all};
pub use index::{MetadataIndex, Registration, TypeId};
pub use lang::{CSharpExtractor, DeclarationExtractor, ExtractedType, Frontend, JavaExtractor};
pub use layout::{LayoutError, OutputLayout};
pub use parser::{Language, ParseError, ParsedFile, SourceParser};
pub use pipeline::{AnalyzeOptions, PipelineError, RunSummary, analyze};
pub use records::{FunctionKind, FunctionRecord, Parameter, TypeFlags, TypeKind, TypeRecord};
pub use scanner::{ScanError, SourceScanner};
pub use writer::{GraphTable, GraphWriter};
