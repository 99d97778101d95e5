//! On-disk layout of analysis artifacts.
//!
//! ```text
//! {root}/{namespace as dirs}/{TypeName}/metadata.json
//! {root}/{namespace as dirs}/{TypeName}/syntaxtree.txt
//! {root}/{namespace as dirs}/graph.csv
//! ```
//!
//! Every write creates missing directories and overwrites existing files, so
//! writing the same artifact twice is not an error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::builder::DeclarationSource;
use crate::records::{TypeRecord, namespace_dir};

/// Serialized [`TypeRecord`] of one type.
pub const METADATA_FILE: &str = "metadata.json";
/// Byte-faithful declaration span of one type.
pub const DECLARATION_FILE: &str = "syntaxtree.txt";
/// Per-namespace graph table.
pub const GRAPH_FILE: &str = "graph.csv";

/// Errors that can occur while writing artifacts.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("Failed to serialize metadata for {identifier}: {source}")]
    Serialize {
        identifier: String,
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, LayoutError>;

/// Artifact paths below one output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    /// Layout rooted directly at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a fresh run directory below `base`, named after `started_at`.
    ///
    /// Format: `YYYY-MM-DDTHH-MM-SS`, with `_N` appended when a run with the
    /// same timestamp already exists. A prior run's directory is never reused.
    pub fn for_run(base: &Path, started_at: DateTime<Utc>) -> Result<Self> {
        create_dir_all(base)?;

        let stamp = started_at.format("%Y-%m-%dT%H-%M-%S").to_string();
        let mut candidate = base.join(&stamp);
        let mut suffix = 0u32;
        loop {
            match fs::create_dir(&candidate) {
                Ok(()) => break,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    suffix += 1;
                    candidate = base.join(format!("{stamp}_{suffix}"));
                }
                Err(source) => {
                    return Err(LayoutError::CreateDir {
                        path: candidate,
                        source,
                    });
                }
            }
        }

        tracing::debug!("Created run directory {}", candidate.display());
        Ok(Self::new(candidate))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of a namespace; the root itself for the global namespace.
    pub fn namespace_dir(&self, namespace: &str) -> PathBuf {
        self.root.join(namespace_dir(namespace))
    }

    /// Directory holding one type's artifacts.
    pub fn type_dir(&self, record: &TypeRecord) -> PathBuf {
        self.root.join(record.artifact_dir())
    }

    pub fn metadata_path(&self, record: &TypeRecord) -> PathBuf {
        self.type_dir(record).join(METADATA_FILE)
    }

    pub fn declaration_path(&self, record: &TypeRecord) -> PathBuf {
        self.type_dir(record).join(DECLARATION_FILE)
    }

    pub fn graph_path(&self, namespace: &str) -> PathBuf {
        self.namespace_dir(namespace).join(GRAPH_FILE)
    }

    /// Write both artifacts of one type.
    pub fn write_type_artifacts(&self, record: &TypeRecord, declaration: &str) -> Result<()> {
        let dir = self.type_dir(record);
        create_dir_all(&dir)?;

        let json = serde_json::to_string_pretty(record).map_err(|source| LayoutError::Serialize {
            identifier: record.identifier(),
            source,
        })?;
        write_file(&dir.join(METADATA_FILE), json.as_bytes())?;
        write_file(&dir.join(DECLARATION_FILE), declaration.as_bytes())
    }
}

impl DeclarationSource for OutputLayout {
    fn declaration_text(&self, record: &TypeRecord) -> Option<String> {
        let path = self.declaration_path(record);
        match fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::debug!("No declaration text at {}: {}", path.display(), e);
                None
            }
        }
    }
}

pub(crate) fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| LayoutError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents).map_err(|source| LayoutError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
impl OutputLayout {
    /// Read back a type's metadata document, if present and well formed.
    pub(crate) fn read_metadata(&self, record: &TypeRecord) -> Option<TypeRecord> {
        let json = fs::read_to_string(self.metadata_path(record)).ok()?;
        serde_json::from_str(&json).ok()
    }
}
