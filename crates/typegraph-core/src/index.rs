//! In-memory index of every extracted type, grouped by namespace.
//!
//! Records live in one arena and are addressed by [`TypeId`]; namespace groups
//! and the `(namespace, name)` lookup hold ids only. The index is filled once
//! by the extraction phase and read without mutation by the graph builder.

use std::collections::{BTreeMap, HashMap};

use crate::records::TypeRecord;

/// Position of a record in the index arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(usize);

impl TypeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Outcome of [`MetadataIndex::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// First declaration of its identifier.
    Added(TypeId),
    /// Another part of an already registered type, folded into it.
    Merged(TypeId),
}

/// Namespace-grouped table of type records.
#[derive(Debug, Default)]
pub struct MetadataIndex {
    records: Vec<TypeRecord>,
    by_key: HashMap<(String, String), TypeId>,
    groups: BTreeMap<String, Vec<TypeId>>,
}

impl MetadataIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record.
    ///
    /// A record whose identifier is already present (a `partial` type split
    /// across declarations) is merged into the first one; ids are assigned
    /// densely in registration order.
    pub fn insert(&mut self, record: TypeRecord) -> Registration {
        let key = (record.namespace.clone(), record.type_name.clone());
        if let Some(&existing) = self.by_key.get(&key) {
            let first = &mut self.records[existing.0];
            tracing::debug!(
                "Merging {} from {} into the declaration from {}",
                record.identifier(),
                record.file_path,
                first.file_path
            );
            first.absorb(record);
            return Registration::Merged(existing);
        }

        let id = TypeId(self.records.len());
        self.groups
            .entry(record.namespace.clone())
            .or_default()
            .push(id);
        self.by_key.insert(key, id);
        self.records.push(record);
        Registration::Added(id)
    }

    /// Records of one namespace, in registration order.
    pub fn group<'a>(&'a self, namespace: &str) -> impl Iterator<Item = &'a TypeRecord> + use<'a> {
        self.groups
            .get(namespace)
            .into_iter()
            .flatten()
            .map(|id| &self.records[id.0])
    }

    /// All namespace groups, ordered by namespace.
    pub fn groups(&self) -> impl Iterator<Item = (&str, Vec<&TypeRecord>)> {
        self.groups.iter().map(|(namespace, ids)| {
            let records = ids.iter().map(|id| &self.records[id.0]).collect();
            (namespace.as_str(), records)
        })
    }

    /// Namespace paths, ordered.
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Records in id order.
    pub fn records(&self) -> &[TypeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<TypeRecord> for MetadataIndex {
    /// Collect records, merging repeated identifiers.
    fn from_iter<I: IntoIterator<Item = TypeRecord>>(iter: I) -> Self {
        let mut index = Self::new();
        for record in iter {
            index.insert(record);
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{FunctionRecord, TypeKind};

    fn record(namespace: &str, name: &str, path: &str) -> TypeRecord {
        TypeRecord::new(name, TypeKind::Class, namespace, path)
    }

    #[test]
    fn test_insert_assigns_dense_ids() {
        let mut index = MetadataIndex::new();
        let Registration::Added(id) = index.insert(record("Pkg", "Base", "Base.cs")) else {
            panic!("first declaration must be added");
        };
        index.insert(record("Pkg", "Derived", "Derived.cs"));
        index.insert(record("Other", "Base", "Other.cs"));

        assert_eq!(index.len(), 3);
        assert_eq!(id.index(), 0);
        assert_eq!(index.records()[id.index()].identifier(), "Pkg.Base");
        let names: Vec<_> = index.records().iter().map(TypeRecord::identifier).collect();
        assert_eq!(names, ["Pkg.Base", "Pkg.Derived", "Other.Base"]);
    }

    #[test]
    fn test_repeated_identifier_is_merged_into_first() {
        let mut index = MetadataIndex::new();
        let Registration::Added(first) = index.insert(record("Pkg", "Widget", "A.cs")) else {
            panic!("first declaration must be added");
        };
        let second = index.insert(
            record("Pkg", "Widget", "B.cs")
                .with_base_types(vec!["IDrawable".into()])
                .with_functions(vec![FunctionRecord::new("Draw", "void")]),
        );

        assert_eq!(second, Registration::Merged(first));
        assert_eq!(index.len(), 1);

        let widget = &index.records()[first.index()];
        assert_eq!(widget.file_path, "A.cs");
        assert_eq!(widget.base_types(), ["IDrawable"]);
        assert!(widget.flags.is_inherited);
        assert_eq!(widget.functions.len(), 1);
        assert_eq!(index.group("Pkg").count(), 1);
    }

    #[test]
    fn test_groups_are_ordered_by_namespace() {
        let index: MetadataIndex = vec![
            record("Zeta", "Z", "Z.cs"),
            record("", "Program", "Program.cs"),
            record("Alpha", "B", "B.cs"),
            record("Alpha", "A", "A.cs"),
        ]
        .into_iter()
        .collect();

        let namespaces: Vec<_> = index.namespaces().collect();
        assert_eq!(namespaces, vec!["", "Alpha", "Zeta"]);

        let alpha: Vec<_> = index.group("Alpha").map(|r| r.type_name.as_str()).collect();
        assert_eq!(alpha, vec!["B", "A"]);

        let groups: Vec<_> = index.groups().map(|(ns, records)| (ns, records.len())).collect();
        assert_eq!(groups, vec![("", 1), ("Alpha", 2), ("Zeta", 1)]);
        assert_eq!(index.group("Missing").count(), 0);
    }
}
