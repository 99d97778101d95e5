//! Reference graph construction for namespace groups.
//!
//! Runs after the [`MetadataIndex`] is complete. For one namespace it emits a
//! node per type, then infers edges:
//!
//! - **intra-namespace**: each type against every other type of the group;
//! - **cross-namespace**: each foreign type whose imports mention the
//!   namespace path, against every type of the group.
//!
//! Edge inference is a textual heuristic over the declaration dumps and the
//! extracted metadata, not a type resolver. See [`classify`].

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;

use crate::edges::{EdgeLabel, GRAPH_HEADER, GraphEdge, GraphNode, GraphRow};
use crate::index::MetadataIndex;
use crate::records::TypeRecord;

/// Supplies the declaration text of a type.
///
/// A missing text is not an error: the pair is treated as having no textual
/// reference.
pub trait DeclarationSource: Sync {
    fn declaration_text(&self, record: &TypeRecord) -> Option<String>;
}

/// Declaration texts keyed by type identifier.
impl DeclarationSource for HashMap<String, String> {
    fn declaration_text(&self, record: &TypeRecord) -> Option<String> {
        self.get(&record.identifier()).cloned()
    }
}

/// Decide the edge from `dependent` to `target`, if any.
///
/// 1. `target` is named in the dependent's base list: `implement` for an
///    interface, `inherit` otherwise.
/// 2. `target`'s name occurs in the dependent's declaration text: `reference`,
///    unless the dependent's own name contains the target's name. Then the
///    name must also appear as a return or parameter type (exact or `Name<`)
///    or inside a function body.
pub fn classify(
    dependent: &TypeRecord,
    dependent_text: Option<&str>,
    target: &TypeRecord,
) -> Option<EdgeLabel> {
    let name = target.type_name.as_str();

    if dependent.flags.is_inherited && dependent.base_types().iter().any(|base| base == name) {
        return Some(EdgeLabel::for_base(target.kind));
    }

    if !dependent_text.is_some_and(|text| text.contains(name)) {
        return None;
    }

    if !dependent.type_name.contains(name) || dependent.uses_in_signature_or_body(name) {
        Some(EdgeLabel::Reference)
    } else {
        None
    }
}

/// True when one of `record`'s imports mentions `namespace`.
pub fn imports_namespace(record: &TypeRecord, namespace: &str) -> bool {
    record.imports.iter().any(|import| import.contains(namespace))
}

/// Deduplicated rows of one namespace graph, in first-occurrence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceGraph {
    pub namespace: String,
    pub rows: Vec<GraphRow>,
}

impl NamespaceGraph {
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.rows.iter().filter_map(GraphRow::as_node)
    }

    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.rows.iter().filter_map(GraphRow::as_edge)
    }

    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }

    pub fn edge_count(&self) -> usize {
        self.edges().count()
    }

    /// Render as `graph.csv` contents: header, then one line per row.
    pub fn to_csv(&self) -> String {
        let mut out = String::with_capacity(64 * (self.rows.len() + 1));
        out.push_str(GRAPH_HEADER);
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.to_csv_line());
            out.push('\n');
        }
        out
    }
}

/// Row buffer that drops exact duplicates and self-loops.
#[derive(Default)]
struct RowBuffer {
    rows: Vec<GraphRow>,
    seen: HashSet<GraphRow>,
}

impl RowBuffer {
    fn push(&mut self, row: GraphRow) {
        if self.seen.insert(row.clone()) {
            self.rows.push(row);
        }
    }

    fn node(&mut self, record: &TypeRecord) {
        self.push(GraphRow::Node(GraphNode::from(record)));
    }

    /// Emit `node` and the edge `dependent -> target`.
    fn dependency(&mut self, node: &TypeRecord, dependent: &TypeRecord, target: &TypeRecord, label: EdgeLabel) {
        let edge = GraphEdge::new(dependent.identifier(), target.identifier(), label);
        if edge.is_self_loop() {
            return;
        }
        self.node(node);
        self.push(GraphRow::Edge(edge));
    }
}

/// Builds namespace graphs from a complete index.
pub struct ReferenceGraphBuilder<'a> {
    index: &'a MetadataIndex,
    source: &'a dyn DeclarationSource,
}

impl<'a> ReferenceGraphBuilder<'a> {
    pub fn new(index: &'a MetadataIndex, source: &'a dyn DeclarationSource) -> Self {
        Self { index, source }
    }

    /// Build the graph of one namespace.
    pub fn build_namespace(&self, namespace: &str) -> NamespaceGraph {
        let group: Vec<&TypeRecord> = self.index.group(namespace).collect();
        let mut buffer = RowBuffer::default();

        for record in &group {
            buffer.node(record);
        }

        for dependent in &group {
            let text = self.source.declaration_text(dependent);
            for target in group.iter().filter(|t| t.type_name != dependent.type_name) {
                if let Some(label) = classify(dependent, text.as_deref(), target) {
                    buffer.dependency(target, dependent, target, label);
                }
            }
        }

        // The empty global namespace path matches any foreign type with an import.
        for (other_namespace, others) in self.index.groups() {
            if other_namespace == namespace {
                continue;
            }
            for foreign in others {
                if !imports_namespace(foreign, namespace) {
                    continue;
                }
                let text = self.source.declaration_text(foreign);
                for target in &group {
                    if let Some(label) = classify(foreign, text.as_deref(), target) {
                        buffer.dependency(foreign, foreign, target, label);
                    }
                }
            }
        }

        let graph = NamespaceGraph {
            namespace: namespace.to_string(),
            rows: buffer.rows,
        };
        tracing::debug!(
            "Namespace '{}': {} nodes, {} edges",
            namespace,
            graph.node_count(),
            graph.edge_count()
        );
        graph
    }

    /// Build every namespace graph in parallel, ordered by namespace.
    pub fn build_all(&self) -> Vec<NamespaceGraph> {
        let namespaces: Vec<&str> = self.index.namespaces().collect();
        namespaces
            .into_par_iter()
            .map(|namespace| self.build_namespace(namespace))
            .collect()
    }
}
