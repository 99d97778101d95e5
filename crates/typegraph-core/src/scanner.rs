//! Recursive source file discovery.
//!
//! Walks a source tree with `ignore::WalkBuilder` and yields every file whose
//! extension is one of the configured source extensions. Any traversal error
//! (unreadable directory, broken entry) is reported to the caller, who treats
//! it as fatal for the run.

use std::path::{Path, PathBuf};

use ignore::{Walk, WalkBuilder};
use thiserror::Error;


/// Errors that can occur while scanning a source tree.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Source root not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Failed to walk source tree: {0}")]
    Walk(#[from] ignore::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;

/// Enumerates source files under a root directory.
#[derive(Debug, Clone)]
pub struct SourceScanner {
    root: PathBuf,
    extensions: Vec<String>,
    respect_gitignore: bool,
    include_hidden: bool,
}

impl SourceScanner {
    /// Scanner for `root` matching the given extensions (without the dot).
    pub fn new<S: AsRef<str>>(root: impl AsRef<Path>, extensions: &[S]) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extensions: extensions
                .iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
            respect_gitignore: false,
            include_hidden: false,
        }
    }

    /// Skip files excluded by `.gitignore`, `.ignore` and git exclude files.
    pub fn respect_gitignore(mut self, yes: bool) -> Self {
        self.respect_gitignore = yes;
        self
    }

    /// Descend into hidden directories and pick up hidden files.
    pub fn include_hidden(mut self, yes: bool) -> Self {
        self.include_hidden = yes;
        self
    }

    /// Start a lazy walk over the tree.
    pub fn scan(&self) -> Result<SourceFiles> {
        if !self.root.is_dir() {
            return Err(ScanError::RootNotFound(self.root.clone()));
        }

        let mut builder = WalkBuilder::new(&self.root);
        builder
            .standard_filters(false)
            .hidden(!self.include_hidden)
            .git_ignore(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .git_global(self.respect_gitignore)
            .ignore(self.respect_gitignore)
            .parents(self.respect_gitignore);

        Ok(SourceFiles {
            walk: builder.build(),
            extensions: self.extensions.clone(),
        })
    }

    /// Drain the walk into a sorted list, stopping at the first error.
    pub fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = self.scan()?.collect::<Result<Vec<_>>>()?;
        files.sort();
        tracing::debug!("Found {} source files under {}", files.len(), self.root.display());
        Ok(files)
    }
}

/// Lazy iterator over matching source files.
pub struct SourceFiles {
    walk: Walk,
    extensions: Vec<String>,
}

impl SourceFiles {
    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

impl Iterator for SourceFiles {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walk.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(ScanError::Walk(e))),
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            if self.matches(entry.path()) {
                return Some(Ok(entry.into_path()));
            }
        }
    }
}
