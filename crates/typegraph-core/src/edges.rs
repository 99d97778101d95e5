//! Graph rows: the nodes and labeled edges of a namespace graph.
//!
//! Rows render to the `graph.csv` schema consumed by the visualization layer:
//!
//! ```text
//! Type,Identifier,Source,Target,Label,TypeKind
//! node,{identifier},,,{typeName},{typeKind}
//! edge,,{source},{target},{label},
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::records::{TypeKind, TypeRecord};

/// Header line of every `graph.csv`.
pub const GRAPH_HEADER: &str = "Type,Identifier,Source,Target,Label,TypeKind";

/// The kind of relationship between two types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeLabel {
    /// The dependent lists a non-interface type as a base.
    Inherit,
    /// The dependent lists an interface as a base.
    Implement,
    /// The dependent's declaration mentions the target's name.
    Reference,
}

impl EdgeLabel {
    /// Returns the string representation written to `graph.csv`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeLabel::Inherit => "inherit",
            EdgeLabel::Implement => "implement",
            EdgeLabel::Reference => "reference",
        }
    }

    /// Parse a `graph.csv` label.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "inherit" => Some(EdgeLabel::Inherit),
            "implement" => Some(EdgeLabel::Implement),
            "reference" => Some(EdgeLabel::Reference),
            _ => None,
        }
    }

    /// Label for a base-list relationship, decided by the base's kind.
    pub fn for_base(base_kind: TypeKind) -> Self {
        if base_kind == TypeKind::Interface {
            EdgeLabel::Implement
        } else {
            EdgeLabel::Inherit
        }
    }
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A type as a graph node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphNode {
    pub identifier: String,
    pub display_name: String,
    pub kind: TypeKind,
}

impl GraphNode {
    pub fn new(identifier: impl Into<String>, display_name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
            kind,
        }
    }
}

impl From<&TypeRecord> for GraphNode {
    fn from(record: &TypeRecord) -> Self {
        Self::new(record.identifier(), record.type_name.clone(), record.kind)
    }
}

/// A directed, labeled edge between two node identifiers.
///
/// Edges go from the dependent type to the type it depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source_id: String,
    pub target_id: String,
    pub label: EdgeLabel,
}

impl GraphEdge {
    /// Create a new edge.
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>, label: EdgeLabel) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            label,
        }
    }

    /// Returns true if both endpoints are the same node.
    pub fn is_self_loop(&self) -> bool {
        self.source_id == self.target_id
    }
}

/// One data row of `graph.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GraphRow {
    Node(GraphNode),
    Edge(GraphEdge),
}

impl GraphRow {
    /// Render the row as a `graph.csv` line (without line terminator).
    pub fn to_csv_line(&self) -> String {
        self.to_string()
    }

    pub fn as_node(&self) -> Option<&GraphNode> {
        match self {
            GraphRow::Node(node) => Some(node),
            GraphRow::Edge(_) => None,
        }
    }

    pub fn as_edge(&self) -> Option<&GraphEdge> {
        match self {
            GraphRow::Edge(edge) => Some(edge),
            GraphRow::Node(_) => None,
        }
    }
}

impl fmt::Display for GraphRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphRow::Node(node) => write!(
                f,
                "node,{},,,{},{}",
                node.identifier, node.display_name, node.kind
            ),
            GraphRow::Edge(edge) => write!(
                f,
                "edge,,{},{},{},",
                edge.source_id, edge.target_id, edge.label
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_label_as_str() {
        assert_eq!(EdgeLabel::Inherit.as_str(), "inherit");
        assert_eq!(EdgeLabel::Implement.as_str(), "implement");
        assert_eq!(EdgeLabel::Reference.as_str(), "reference");
        assert_eq!(EdgeLabel::from_name("implement"), Some(EdgeLabel::Implement));
        assert_eq!(EdgeLabel::from_name("calls"), None);
    }

    #[test]
    fn test_label_for_base() {
        assert_eq!(EdgeLabel::for_base(TypeKind::Interface), EdgeLabel::Implement);
        assert_eq!(EdgeLabel::for_base(TypeKind::Class), EdgeLabel::Inherit);
        assert_eq!(EdgeLabel::for_base(TypeKind::Struct), EdgeLabel::Inherit);
    }

    #[test]
    fn test_node_row_csv() {
        let record = TypeRecord::new("Base", TypeKind::Interface, "Pkg", "Base.cs");
        let row = GraphRow::Node(GraphNode::from(&record));
        assert_eq!(row.to_csv_line(), "node,Pkg.Base,,,Base,Interface");
    }

    #[test]
    fn test_edge_row_csv() {
        let row = GraphRow::Edge(GraphEdge::new("Pkg.Derived", "Pkg.Base", EdgeLabel::Inherit));
        assert_eq!(row.to_csv_line(), "edge,,Pkg.Derived,Pkg.Base,inherit,");

        let row = GraphRow::Edge(GraphEdge::new("Pkg.Service", "Pkg.Base", EdgeLabel::Reference));
        assert_eq!(row.to_csv_line(), "edge,,Pkg.Service,Pkg.Base,reference,");
    }

    #[test]
    fn test_header_and_rows_have_six_columns() {
        assert_eq!(GRAPH_HEADER.split(',').count(), 6);
        let node = GraphRow::Node(GraphNode::new("A.B", "B", TypeKind::Class));
        let edge = GraphRow::Edge(GraphEdge::new("A.C", "A.B", EdgeLabel::Implement));
        assert_eq!(node.to_csv_line().split(',').count(), 6);
        assert_eq!(edge.to_csv_line().split(',').count(), 6);
    }

    #[test]
    fn test_self_loop_detection() {
        assert!(GraphEdge::new("A.B", "A.B", EdgeLabel::Reference).is_self_loop());
        assert!(!GraphEdge::new("A.B", "A.C", EdgeLabel::Reference).is_self_loop());
    }
}
