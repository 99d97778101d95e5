//! C#-specific declaration extraction using tree-sitter.
//!
//! Extracts classes, interfaces and structs with their namespace, modifiers,
//! base list and methods, plus the file's `using` directives.

use tree_sitter::{Node, Query};

use super::{DeclarationExtractor, ExtractedType, capture_declarations, children_of_kind, dotted_name};
use crate::parser::ParsedFile;
use crate::records::{FunctionKind, FunctionRecord, Parameter, TypeFlags, TypeKind, TypeRecord};

/// C#-specific declaration extractor.
pub struct CSharpExtractor;

impl DeclarationExtractor for CSharpExtractor {
    fn extract(&self, parsed: &ParsedFile, query: &Query) -> Vec<ExtractedType> {
        let captures = capture_declarations(parsed, query);
        let file_path = parsed.path.clone();

        let imports: Vec<String> = captures
            .imports
            .iter()
            .map(|node| parsed.node_text(*node).to_string())
            .collect();
        let file_namespace = file_scoped_namespace(parsed);

        captures
            .types
            .into_iter()
            .filter_map(|(kind, node)| {
                let name_node = node.child_by_field_name("name")?;
                let namespace = enclosing_namespace(parsed, node)
                    .or_else(|| file_namespace.clone())
                    .unwrap_or_default();

                let mut record = TypeRecord::new(parsed.node_text(name_node), kind, namespace, file_path.clone())
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

/// Name of the nearest enclosing block namespace.
fn enclosing_namespace(parsed: &ParsedFile, node: Node) -> Option<String> {
    let mut current = node.parent();
    while let Some(ancestor) = current {
        if matches!(
            ancestor.kind(),
            "namespace_declaration" | "file_scoped_namespace_declaration"
        ) {
            let name = ancestor.child_by_field_name("name")?;
            return Some(dotted_name(parsed.node_text(name)));
        }
        current = ancestor.parent();
    }
    None
}

/// `namespace Foo.Bar;` applies to every declaration that follows it in the file.
fn file_scoped_namespace(parsed: &ParsedFile) -> Option<String> {
    let root = parsed.root_node();
    let namespace = children_of_kind(root, "file_scoped_namespace_declaration")
        .into_iter()
        .next()?;
    let name = namespace.child_by_field_name("name")?;
    Some(dotted_name(parsed.node_text(name)))
}

/// Entries of the declaration's base list, as written. `None` without a base list.
fn base_types(parsed: &ParsedFile, node: Node) -> Option<Vec<String>> {
    let base_list = children_of_kind(node, "base_list").into_iter().next()?;
    let mut cursor = base_list.walk();
    let bases = base_list
        .named_children(&mut cursor)
        .filter(|child| !matches!(child.kind(), "argument_list" | "comment"))
        .map(|child| parsed.node_text(child).to_string())
        .collect();
    Some(bases)
}

fn modifiers(parsed: &ParsedFile, node: Node) -> Vec<String> {
    children_of_kind(node, "modifier")
        .into_iter()
        .map(|m| parsed.node_text(m).trim().to_string())
        .collect()
}

fn type_flags(parsed: &ParsedFile, node: Node) -> TypeFlags {
    let modifiers = modifiers(parsed, node);
    let has = |keyword: &str| modifiers.iter().any(|m| m == keyword);

    TypeFlags {
        is_static: has("static"),
        is_sealed: has("sealed"),
        is_abstract: has("abstract"),
        has_numeric_field: has_int_field(parsed, node),
        is_inherited: false,
    }
}

/// Body of a type declaration (`declaration_list`).
fn declaration_body(node: Node) -> Option<Node> {
    node.child_by_field_name("body")
        .filter(|body| body.kind() == "declaration_list")
        .or_else(|| children_of_kind(node, "declaration_list").into_iter().next())
}

/// Direct members of the type with the given kind.
fn members<'tree>(node: Node<'tree>, kind: &str) -> Vec<Node<'tree>> {
    declaration_body(node)
        .map(|body| children_of_kind(body, kind))
        .unwrap_or_default()
}

fn has_int_field(parsed: &ParsedFile, node: Node) -> bool {
    members(node, "field_declaration").into_iter().any(|field| {
        children_of_kind(field, "variable_declaration")
            .into_iter()
            .filter_map(|decl| decl.child_by_field_name("type"))
            .any(|ty| ty.kind() == "predefined_type" && parsed.node_text(ty) == "int")
    })
}

fn methods(parsed: &ParsedFile, node: Node) -> Vec<FunctionRecord> {
    members(node, "method_declaration")
        .into_iter()
        .filter_map(|method| {
            let name = method.child_by_field_name("name")?;
            let return_type = method
                .child_by_field_name("returns")
                .or_else(|| method.child_by_field_name("type"))
                .map(|ty| parsed.node_text(ty).to_string())
                .unwrap_or_default();
            let kind = if modifiers(parsed, method).iter().any(|m| m == "static") {
                FunctionKind::Static
            } else {
                FunctionKind::Instance
            };
            let body = method
                .child_by_field_name("body")
                .filter(|body| body.kind() == "block")
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
    children_of_kind(list, "parameter")
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::Frontend;
    use crate::parser::{Language, SourceParser};

    fn extract(source: &str) -> Vec<ExtractedType> {
        let frontend = Frontend::get(Language::CSharp).unwrap();
        let parsed = SourceParser::new()
            .parse(frontend, source.to_string(), "src/Sample.cs")
            .unwrap();
        CSharpExtractor.extract(&parsed, &frontend.query)
    }

    fn find<'a>(types: &'a [ExtractedType], name: &str) -> &'a TypeRecord {
        &types
            .iter()
            .find(|t| t.record.type_name == name)
            .unwrap_or_else(|| panic!("type {name} not extracted"))
            .record
    }

    #[test]
    fn test_extract_kinds_and_namespace() {
        let types = extract(
            r#"
using System;
using System.Collections.Generic;

namespace Pkg
{
    public interface IShape { double Area(); }
    public struct Point { public int X; }
    public class Circle : IShape
    {
        public double Area() { return 3.14; }
    }
}
"#,
        );

        assert_eq!(types.len(), 3);
        assert_eq!(find(&types, "IShape").kind, TypeKind::Interface);
        assert_eq!(find(&types, "Point").kind, TypeKind::Struct);
        let circle = find(&types, "Circle");
        assert_eq!(circle.kind, TypeKind::Class);
        assert_eq!(circle.namespace, "Pkg");
        assert_eq!(circle.identifier(), "Pkg.Circle");
        assert_eq!(circle.file_name, "Sample.cs");
        assert_eq!(
            circle.imports,
            vec!["using System;", "using System.Collections.Generic;"]
        );
    }

    #[test]
    fn test_global_namespace() {
        let types = extract("class Program { static void Main() {} }");
        assert_eq!(types.len(), 1);
        assert_eq!(types[0].record.namespace, "");
        assert!(types[0].record.imports.is_empty());
    }

    #[test]
    fn test_file_scoped_namespace() {
        let types = extract(
            r#"
namespace Acme.Billing;

public class Invoice { }
"#,
        );
        assert_eq!(find(&types, "Invoice").namespace, "Acme.Billing");
    }

    #[test]
    fn test_nearest_namespace_wins() {
        let types = extract(
            r#"
namespace Outer
{
    class A { }
    namespace Inner
    {
        class B { }
    }
}
"#,
        );
        assert_eq!(find(&types, "A").namespace, "Outer");
        assert_eq!(find(&types, "B").namespace, "Inner");
    }

    #[test]
    fn test_base_list_verbatim() {
        let types = extract(
            r#"
namespace Pkg
{
    class Repo : Base<int>, IDisposable, System.ICloneable { }
    class Plain { }
}
"#,
        );

        let repo = find(&types, "Repo");
        assert!(repo.flags.is_inherited);
        assert_eq!(
            repo.base_types(),
            ["Base<int>", "IDisposable", "System.ICloneable"]
        );

        let plain = find(&types, "Plain");
        assert!(!plain.flags.is_inherited);
        assert!(plain.base_type_names.is_none());
    }

    #[test]
    fn test_modifier_flags() {
        let types = extract(
            r#"
namespace Pkg
{
    public static class Helpers { }
    public sealed class Leaf { private int count; }
    public abstract class Shape { private long size; }
}
"#,
        );

        let helpers = find(&types, "Helpers");
        assert!(helpers.flags.is_static);
        assert!(!helpers.flags.is_sealed);

        let leaf = find(&types, "Leaf");
        assert!(leaf.flags.is_sealed);
        assert!(leaf.flags.has_numeric_field);

        let shape = find(&types, "Shape");
        assert!(shape.flags.is_abstract);
        assert!(!shape.flags.has_numeric_field);
    }

    #[test]
    fn test_methods() {
        let types = extract(
            r#"
namespace Pkg
{
    class Service
    {
        public static Service Create() { return new Service(); }
        public List<Order> Load(int id, Dictionary<string, Order> cache) { return null; }
        public string Name() => "svc";
    }
}
"#,
        );

        let service = find(&types, "Service");
        assert_eq!(service.functions.len(), 3);

        let create = &service.functions[0];
        assert_eq!(create.name, "Create");
        assert_eq!(create.kind, FunctionKind::Static);
        assert_eq!(create.return_type, "Service");
        assert_eq!(create.body.as_deref(), Some("{ return new Service(); }"));

        let load = &service.functions[1];
        assert_eq!(load.kind, FunctionKind::Instance);
        assert_eq!(load.return_type, "List<Order>");
        assert_eq!(
            load.parameters,
            vec![
                Parameter::new("int", "id"),
                Parameter::new("Dictionary<string, Order>", "cache"),
            ]
        );

        // expression-bodied members have no block body
        assert_eq!(service.functions[2].body, None);
    }

    #[test]
    fn test_nested_types_and_declaration_span() {
        let source = r#"namespace Pkg
{
    class Outer
    {
        class Inner { }
    }
}
"#;
        let types = extract(source);
        assert_eq!(types.len(), 2);

        let outer = types.iter().find(|t| t.record.type_name == "Outer").unwrap();
        assert!(outer.declaration.starts_with("class Outer"));
        assert!(outer.declaration.ends_with('}'));
        assert!(source.contains(&outer.declaration));

        let inner = types.iter().find(|t| t.record.type_name == "Inner").unwrap();
        assert_eq!(inner.declaration, "class Inner { }");
        assert_eq!(inner.record.namespace, "Pkg");
    }

    #[test]
    fn test_usings_inside_namespace_are_collected() {
        let types = extract(
            r#"
using System;
namespace Pkg
{
    using Pkg.Models;
    class A { }
}
"#,
        );
        assert_eq!(find(&types, "A").imports, vec!["using System;", "using Pkg.Models;"]);
    }
}
