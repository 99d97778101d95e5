//! The two-phase analysis run.
//!
//! Phase one scans the source tree, extracts every file in parallel, merges
//! the results into a [`MetadataIndex`] in sorted path order (folding the
//! parts of `partial` types together) and persists the per-type artifacts.
//! Phase two starts only once the index is complete: it builds every
//! namespace graph in parallel and writes the `graph.csv` files.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::builder::{NamespaceGraph, ReferenceGraphBuilder};
use crate::extractor::{ExtractStats, extract_all, persist};
use crate::index::{MetadataIndex, Registration};
use crate::layout::{LayoutError, OutputLayout};
use crate::parser::Language;
use crate::scanner::{ScanError, SourceScanner};
use crate::writer::GraphWriter;

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Scan failed: {0}")]
    Scan(#[from] ScanError),

    #[error("Writing artifacts failed: {0}")]
    Layout(#[from] LayoutError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Options for an analysis run.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// Source file extensions to scan, without the dot.
    pub extensions: Vec<String>,
    pub respect_gitignore: bool,
    pub include_hidden: bool,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            extensions: Language::supported_extensions()
                .into_iter()
                .map(String::from)
                .collect(),
            respect_gitignore: false,
            include_hidden: false,
        }
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub types: usize,
    /// Declarations folded into an earlier one with the same identifier.
    pub merged_declarations: usize,
    pub namespaces: usize,
    pub nodes: usize,
    pub edges: usize,
}

/// Output of the extraction phase: the complete, read-only index.
#[derive(Debug)]
pub struct Extracted {
    pub index: MetadataIndex,
    pub stats: ExtractStats,
    pub merged_declarations: usize,
}

/// Enumerate the source files of a run, sorted.
pub fn scan_phase(source_root: &Path, options: &AnalyzeOptions) -> Result<Vec<PathBuf>> {
    let files = SourceScanner::new(source_root, &options.extensions)
        .respect_gitignore(options.respect_gitignore)
        .include_hidden(options.include_hidden)
        .collect_files()?;
    tracing::info!("Found {} source files in {}", files.len(), source_root.display());
    Ok(files)
}

/// Extract `files`, register their types and persist them.
///
/// `files` must be sorted. Declarations sharing an identifier are merged into
/// the one from the earliest path, and their declaration texts concatenated
/// in path order.
pub fn extract_phase(
    files: &[PathBuf],
    source_root: &Path,
    layout: &OutputLayout,
) -> Result<Extracted> {
    let batch = extract_all(files, Some(source_root));

    let mut index = MetadataIndex::new();
    let mut declarations: Vec<String> = Vec::new();
    let mut merged_declarations = 0;
    for extracted in batch.files.into_iter().flat_map(|file| file.types) {
        match index.insert(extracted.record) {
            Registration::Added(_) => declarations.push(extracted.declaration),
            Registration::Merged(id) => {
                let text = &mut declarations[id.index()];
                text.push('\n');
                text.push_str(&extracted.declaration);
                merged_declarations += 1;
            }
        }
    }

    let written = persist(layout, &index, &declarations)?;
    tracing::info!(
        "Extracted {} types from {} files ({} skipped, {} partial declarations merged) in {}ms",
        written,
        batch.stats.files_processed,
        batch.stats.files_skipped,
        merged_declarations,
        batch.stats.elapsed_ms
    );

    Ok(Extracted {
        index,
        stats: batch.stats,
        merged_declarations,
    })
}

/// Build and write every namespace graph of a complete index.
pub fn build_phase(index: &MetadataIndex, layout: &OutputLayout) -> Result<Vec<NamespaceGraph>> {
    let start = Instant::now();
    let graphs = ReferenceGraphBuilder::new(index, layout).build_all();

    graphs
        .par_iter()
        .try_for_each(|graph| GraphWriter::write(layout, graph).map(|_| ()))?;

    tracing::info!(
        "Wrote {} namespace graphs in {}ms",
        graphs.len(),
        start.elapsed().as_millis()
    );
    Ok(graphs)
}

/// Run the whole pipeline from `source_root` into `layout`.
pub fn analyze(source_root: &Path, layout: &OutputLayout, options: &AnalyzeOptions) -> Result<RunSummary> {
    let files = scan_phase(source_root, options)?;
    let extracted = extract_phase(&files, source_root, layout)?;
    let graphs = build_phase(&extracted.index, layout)?;

    Ok(RunSummary {
        files_scanned: files.len(),
        files_skipped: extracted.stats.files_skipped,
        types: extracted.index.len(),
        merged_declarations: extracted.merged_declarations,
        namespaces: graphs.len(),
        nodes: graphs.iter().map(NamespaceGraph::node_count).sum(),
        edges: graphs.iter().map(NamespaceGraph::edge_count).sum(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{TypeKind, TypeRecord};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_partial_declarations_are_merged() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        fs::write(
            src.path().join("A.cs"),
            "namespace Pkg { interface IDrawable { } partial class Widget { int size; } }",
        )
        .unwrap();
        fs::write(
            src.path().join("B.cs"),
            "namespace Pkg { partial class Widget : IDrawable { void Draw() { } } }",
        )
        .unwrap();

        let layout = OutputLayout::new(out.path());
        let summary = analyze(src.path(), &layout, &AnalyzeOptions::default()).unwrap();

        assert_eq!(summary.types, 2);
        assert_eq!(summary.merged_declarations, 1);
        assert_eq!(summary.edges, 1);

        let graph = fs::read_to_string(layout.graph_path("Pkg")).unwrap();
        assert!(graph.contains("edge,,Pkg.Widget,Pkg.IDrawable,implement,\n"));

        let text = fs::read_to_string(out.path().join("Pkg/Widget/syntaxtree.txt")).unwrap();
        assert_eq!(
            text,
            "partial class Widget { int size; }\npartial class Widget : IDrawable { void Draw() { } }"
        );

        let widget = layout.read_metadata(&TypeRecord::new("Widget", TypeKind::Class, "Pkg", "")).unwrap();
        assert_eq!(widget.file_path, "A.cs");
        assert!(widget.flags.has_numeric_field);
        assert_eq!(widget.base_types(), ["IDrawable"]);
        assert_eq!(widget.functions.len(), 1);
    }

    #[test]
    fn test_missing_source_root_is_fatal() {
        let out = tempdir().unwrap();
        let layout = OutputLayout::new(out.path());
        let err = analyze(&out.path().join("missing"), &layout, &AnalyzeOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Scan(ScanError::RootNotFound(_))));
    }

    #[test]
    fn test_empty_tree() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        let summary = analyze(src.path(), &OutputLayout::new(out.path()), &AnalyzeOptions::default()).unwrap();
        assert_eq!(summary, RunSummary::default());
    }
}
