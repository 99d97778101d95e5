//! Per-file type extraction.
//!
//! Ties the parser to the language extractors. Files are independent, so a
//! batch is extracted in parallel with one [`TypeExtractor`] (and therefore
//! one tree-sitter parser) per rayon worker. A file that cannot be read or
//! parsed is skipped without affecting the rest of the batch.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;

use crate::index::MetadataIndex;
use crate::lang::{ExtractedType, Frontend};
use crate::layout::{LayoutError, OutputLayout};
use crate::parser::{Language, ParseError, SourceParser, read_source};

/// Types extracted from one source file.
#[derive(Debug, Clone)]
pub struct FileExtraction {
    pub path: PathBuf,
    pub types: Vec<ExtractedType>,
    /// The syntax tree contains error nodes; `types` holds what parsed.
    pub has_syntax_errors: bool,
}

/// A file left out of the batch, with the reason.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Statistics from an extraction batch.
#[derive(Debug, Clone, Default)]
pub struct ExtractStats {
    /// Files parsed successfully.
    pub files_processed: usize,
    /// Files skipped because they could not be read or parsed.
    pub files_skipped: usize,
    /// Type declarations extracted.
    pub types_extracted: usize,
    /// Files whose syntax tree contains error nodes.
    pub files_with_syntax_errors: usize,
    /// Wall-clock time of the batch in milliseconds.
    pub elapsed_ms: u64,
}

/// Result of extracting a batch of files.
#[derive(Debug, Default)]
pub struct ExtractionBatch {
    /// Successful extractions, in input order.
    pub files: Vec<FileExtraction>,
    pub skipped: Vec<SkippedFile>,
    pub stats: ExtractStats,
}

/// Extracts type declarations from source files.
pub struct TypeExtractor {
    parser: SourceParser,
    root: Option<PathBuf>,
}

impl TypeExtractor {
    /// Extractor recording file paths as given.
    pub fn new() -> Self {
        Self {
            parser: SourceParser::new(),
            root: None,
        }
    }

    /// Extractor recording file paths relative to `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            parser: SourceParser::new(),
            root: Some(root.into()),
        }
    }

    /// Parse one file and extract its type declarations.
    pub fn extract_file(&mut self, path: &Path) -> Result<FileExtraction, ParseError> {
        let language = Language::of_path(path).ok_or_else(|| ParseError::Unsupported(path.to_path_buf()))?;
        let source = read_source(path)?;
        let display_path = self.display_path(path);

        let mut extraction = self.extract_source(source, language, &display_path)?;
        extraction.path = path.to_path_buf();
        Ok(extraction)
    }

    /// Extract type declarations from in-memory source recorded as `file_path`.
    pub fn extract_source(
        &mut self,
        source: String,
        language: Language,
        file_path: &str,
    ) -> Result<FileExtraction, ParseError> {
        let frontend = Frontend::get(language)?;
        let parsed = self.parser.parse(frontend, source, file_path)?;
        let has_syntax_errors = parsed.has_syntax_errors();
        if has_syntax_errors {
            tracing::debug!("Syntax errors in {}, extracting what parsed", file_path);
        }

        Ok(FileExtraction {
            path: PathBuf::from(file_path),
            types: frontend.extract(&parsed),
            has_syntax_errors,
        })
    }

    fn display_path(&self, path: &Path) -> String {
        let relative = self
            .root
            .as_deref()
            .and_then(|root| path.strip_prefix(root).ok())
            .unwrap_or(path);
        relative.to_string_lossy().replace('\\', "/")
    }
}

impl Default for TypeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract every file in parallel, isolating per-file failures.
pub fn extract_all(files: &[PathBuf], root: Option<&Path>) -> ExtractionBatch {
    let start = Instant::now();

    let results: Vec<_> = files
        .par_iter()
        .map_init(
            || match root {
                Some(root) => TypeExtractor::with_root(root),
                None => TypeExtractor::new(),
            },
            |extractor, path| (path, extractor.extract_file(path)),
        )
        .collect();

    let mut batch = ExtractionBatch::default();
    for (path, result) in results {
        match result {
            Ok(extraction) => {
                tracing::debug!("Extracted {} types from {}", extraction.types.len(), path.display());
                batch.stats.files_processed += 1;
                batch.stats.types_extracted += extraction.types.len();
                if extraction.has_syntax_errors {
                    batch.stats.files_with_syntax_errors += 1;
                }
                batch.files.push(extraction);
            }
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path.display(), e);
                batch.stats.files_skipped += 1;
                batch.skipped.push(SkippedFile {
                    path: path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    batch.stats.elapsed_ms = start.elapsed().as_millis() as u64;
    batch
}

/// Write the metadata document and declaration dump of every indexed type.
///
/// `declarations[i]` is the declaration text of the record with `TypeId` `i`.
pub fn persist(
    layout: &OutputLayout,
    index: &MetadataIndex,
    declarations: &[String],
) -> Result<usize, LayoutError> {
    index
        .records()
        .par_iter()
        .zip(declarations.par_iter())
        .try_for_each(|(record, declaration)| layout.write_type_artifacts(record, declaration))?;
    Ok(index.len())
}
