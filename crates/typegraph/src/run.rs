//! Run bookkeeping.
//!
//! Each analysis run writes a `run.json` next to its artifacts describing what
//! was analyzed and what came out.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typegraph_core::RunSummary;

/// File name of the run metadata document.
pub const RUN_FILE: &str = "run.json";

/// Metadata about one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    /// Source tree that was analyzed.
    pub source_root: PathBuf,

    /// Extensions that were scanned.
    pub extensions: Vec<String>,

    /// Counts from the pipeline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RunSummary>,
}

impl RunMetadata {
    /// Create metadata for a run starting now.
    pub fn new(started_at: DateTime<Utc>, source_root: PathBuf, extensions: Vec<String>) -> Self {
        Self {
            started_at,
            finished_at: None,
            source_root,
            extensions,
            summary: None,
        }
    }

    /// Record the outcome of the run.
    pub fn finish(mut self, summary: RunSummary) -> Self {
        self.finished_at = Some(Utc::now());
        self.summary = Some(summary);
        self
    }
}

/// Write run metadata to the run directory.
pub fn write_metadata(run_dir: &Path, metadata: &RunMetadata) -> anyhow::Result<()> {
    let path = run_dir.join(RUN_FILE);
    let json = serde_json::to_string_pretty(metadata)?;
    fs::write(&path, json)?;
    Ok(())
}
