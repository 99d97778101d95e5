//! Java-specific declaration extraction using tree-sitter.
//!
//! Classes, interfaces and records map onto the Class/Interface/Struct kinds.
//! The package declaration plays the role of the namespace and `import`
//! declarations the role of using directives.

use tree_sitter::{Node, Query};

use super::{DeclarationExtractor, ExtractedType, capture_declarations, children_of_kind, dotted_name};
use crate::parser::ParsedFile;
use crate::records::{FunctionKind, FunctionRecord, Parameter, TypeFlags, TypeRecord};

/// Java-specific declaration extractor.
pub struct JavaExtractor;

impl DeclarationExtractor for JavaExtractor {
    fn extract(&self, parsed: &ParsedFile, query: &Query) -> Vec<ExtractedType> {
        let captures = capture_declarations(parsed, query);
        let file_path = parsed.path.clone();
        let package = package_name(parsed).unwrap_or_default();

        let imports: Vec<String> = captures
            .imports
            .iter()
            .map(|node| parsed.node_text(*node).to_string())
            .collect();

        captures
            .types
            .into_iter()
            .filter_map(|(kind, node)| {
                let name_node = node.child_by_field_name("name")?;

                let mut record =
                    TypeRecord::new(parsed.node_text(name_node), kind, package.clone(), file_path.clone())
                        .with_imports(imports.clone());
                if let Some(bases) = base_types(parsed, node) {
                    record = record.with_base_types(bases);
                }
                let record = record
                    .with_flags(type_flags(parsed, node))
                    .with_functions(methods(parsed, node));

                Some(ExtractedType {
                    record,
                    declaration: parsed.node_text(node).to_string(),
                })
            })
            .collect()
    }
}

fn package_name(parsed: &ParsedFile) -> Option<String> {
    let package = children_of_kind(parsed.root_node(), "package_declaration")
        .into_iter()
        .next()?;
    let mut cursor = package.walk();
    let name = package
        .named_children(&mut cursor)
        .find(|child| matches!(child.kind(), "scoped_identifier" | "identifier"))?;
    Some(dotted_name(parsed.node_text(name)))
}

/// `extends` types followed by `implements` types, as written.
fn base_types(parsed: &ParsedFile, node: Node) -> Option<Vec<String>> {
    let mut bases = Vec::new();
    let mut found = false;

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "superclass" => {
                found = true;
                let mut inner = child.walk();
                bases.extend(
                    child
                        .named_children(&mut inner)
                        .map(|ty| parsed.node_text(ty).to_string()),
                );
            }
            "super_interfaces" | "extends_interfaces" => {
                found = true;
                for list in children_of_kind(child, "type_list") {
                    let mut inner = list.walk();
                    bases.extend(
                        list.named_children(&mut inner)
                            .map(|ty| parsed.node_text(ty).to_string()),
                    );
                }
            }
            _ => {}
        }
    }

    found.then_some(bases)
}

/// Keyword children of the node's `modifiers` block.
fn modifier_keywords<'tree>(node: Node<'tree>) -> Vec<&'static str> {
    let mut keywords = Vec::new();
    for modifiers in children_of_kind(node, "modifiers") {
        let mut cursor = modifiers.walk();
        for child in modifiers.children(&mut cursor) {
            match child.kind() {
                "static" => keywords.push("static"),
                "abstract" => keywords.push("abstract"),
                "final" => keywords.push("final"),
                "sealed" => keywords.push("sealed"),
                _ => {}
            }
        }
    }
    keywords
}

fn type_flags(parsed: &ParsedFile, node: Node) -> TypeFlags {
    let keywords = modifier_keywords(node);
    TypeFlags {
        is_static: keywords.contains(&"static"),
        is_sealed: keywords.contains(&"final") || keywords.contains(&"sealed"),
        is_abstract: keywords.contains(&"abstract"),
        has_numeric_field: has_int_field(parsed, node),
        is_inherited: false,
    }
}

fn members<'tree>(node: Node<'tree>, kind: &str) -> Vec<Node<'tree>> {
    node.child_by_field_name("body")
        .map(|body| children_of_kind(body, kind))
        .unwrap_or_default()
}

fn has_int_field(parsed: &ParsedFile, node: Node) -> bool {
    members(node, "field_declaration")
        .into_iter()
        .filter_map(|field| field.child_by_field_name("type"))
        .any(|ty| ty.kind() == "integral_type" && parsed.node_text(ty) == "int")
}

fn methods(parsed: &ParsedFile, node: Node) -> Vec<FunctionRecord> {
    members(node, "method_declaration")
        .into_iter()
        .filter_map(|method| {
            let name = method.child_by_field_name("name")?;
            let return_type = method
                .child_by_field_name("type")
                .map(|ty| parsed.node_text(ty).to_string())
                .unwrap_or_default();
            let kind = if modifier_keywords(method).contains(&"static") {
                FunctionKind::Static
            } else {
                FunctionKind::Instance
            };
            let body = method
                .child_by_field_name("body")
                .map(|body| parsed.node_text(body).to_string());

            Some(FunctionRecord {
                name: parsed.node_text(name).to_string(),
                kind,
                return_type,
                body,
                parameters: parameters(parsed, method),
            })
        })
        .collect()
}

fn parameters(parsed: &ParsedFile, method: Node) -> Vec<Parameter> {
    let Some(list) = method.child_by_field_name("parameters") else {
        return Vec::new();
    };
    children_of_kind(list, "formal_parameter")
        .into_iter()
        .filter_map(|param| {
            let name = param.child_by_field_name("name")?;
            let ty = param
                .child_by_field_name("type")
                .map(|ty| parsed.node_text(ty).to_string())
                .unwrap_or_default();
            Some(Parameter::new(ty, parsed.node_text(name)))
        })
        .collect()
}
