//! `graph.csv` output and read-back.

use std::fs;
use std::path::{Path, PathBuf};

use crate::builder::NamespaceGraph;
use crate::edges::{EdgeLabel, GRAPH_HEADER, GraphEdge, GraphNode};
use crate::layout::{LayoutError, OutputLayout, create_dir_all, write_file};
use crate::records::TypeKind;

/// Writes namespace graphs into an output layout.
pub struct GraphWriter;

impl GraphWriter {
    /// Write `graph` to its namespace directory, replacing any previous file.
    pub fn write(layout: &OutputLayout, graph: &NamespaceGraph) -> Result<PathBuf, LayoutError> {
        create_dir_all(&layout.namespace_dir(&graph.namespace))?;
        let path = layout.graph_path(&graph.namespace);
        write_file(&path, graph.to_csv().as_bytes())?;
        tracing::debug!("Wrote {}", path.display());
        Ok(path)
    }
}

/// Nodes and edges read back from a `graph.csv`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphTable {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphTable {
    /// Parse `graph.csv` text.
    ///
    /// The header and blank lines are ignored. Rows without exactly six
    /// columns, or with an unknown row type, label or kind, are skipped.
    pub fn parse(text: &str) -> Self {
        let mut table = Self::default();

        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() || line == GRAPH_HEADER {
                continue;
            }

            let columns: Vec<&str> = line.split(',').collect();
            let &[row_type, identifier, source, target, label, kind] = columns.as_slice() else {
                tracing::debug!("Skipping malformed graph row: {}", line);
                continue;
            };

            match row_type {
                "node" => {
                    if let Some(kind) = TypeKind::from_name(kind) {
                        table.nodes.push(GraphNode::new(identifier, label, kind));
                    }
                }
                "edge" => {
                    if let Some(label) = EdgeLabel::from_name(label) {
                        table.edges.push(GraphEdge::new(source, target, label));
                    }
                }
                _ => tracing::debug!("Skipping unknown graph row type: {}", row_type),
            }
        }

        table
    }

    /// Read and parse a `graph.csv` file.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    /// Look up a node by identifier.
    pub fn node(&self, identifier: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.identifier == identifier)
    }
}
