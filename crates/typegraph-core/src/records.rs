//! Type records extracted from source declarations.
//!
//! A [`TypeRecord`] is the unit everything downstream works on: it is
//! serialized as the per-type metadata document, stored in the metadata index,
//! and consulted by the reference graph builder.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The kind of type declaration.
///
/// The serialized form (`Class`, `Interface`, `Struct`) is also the
/// `TypeKind` column of `graph.csv`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    Class,
    Interface,
    Struct,
}

impl TypeKind {
    /// Returns the string representation used in metadata and graph rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Class => "Class",
            TypeKind::Interface => "Interface",
            TypeKind::Struct => "Struct",
        }
    }

    /// Parse the graph/metadata representation back into a kind.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Class" => Some(TypeKind::Class),
            "Interface" => Some(TypeKind::Interface),
            "Struct" => Some(TypeKind::Struct),
            _ => None,
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a function is attached to the type or to an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum FunctionKind {
    Static,
    #[default]
    Instance,
}

/// Modifier and shape flags of a type declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TypeFlags {
    pub is_static: bool,
    pub is_sealed: bool,
    pub is_abstract: bool,
    /// The type declares at least one field of the predefined `int` type.
    pub has_numeric_field: bool,
    /// The declaration carries a base-type list.
    pub is_inherited: bool,
}

/// A function parameter as written in source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    #[serde(rename = "Type")]
    pub ty: String,
    pub name: String,
}

impl Parameter {
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
        }
    }
}

/// A member function of a type declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FunctionRecord {
    pub name: String,
    pub kind: FunctionKind,
    /// Return type text exactly as written.
    pub return_type: String,
    /// Raw body text; absent for abstract, interface and expression-bodied members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub parameters: Vec<Parameter>,
}

impl FunctionRecord {
    /// Create an instance function with no parameters and no body.
    pub fn new(name: impl Into<String>, return_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FunctionKind::Instance,
            return_type: return_type.into(),
            body: None,
            parameters: Vec::new(),
        }
    }

    /// Set the function kind.
    pub fn with_kind(mut self, kind: FunctionKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the body text.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Append a parameter.
    pub fn with_parameter(mut self, ty: impl Into<String>, name: impl Into<String>) -> Self {
        self.parameters.push(Parameter::new(ty, name));
        self
    }
}

/// Metadata of one type declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TypeRecord {
    pub file_name: String,
    pub file_path: String,
    #[serde(rename = "TypeKind")]
    pub kind: TypeKind,
    pub type_name: String,
    /// Dotted namespace path; empty for the global namespace.
    pub namespace: String,
    /// Raw import/using statements of the declaring file, in source order.
    pub imports: Vec<String>,
    pub flags: TypeFlags,
    /// Base types exactly as written; present only when `flags.is_inherited`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_type_names: Option<Vec<String>>,
    pub functions: Vec<FunctionRecord>,
}

impl TypeRecord {
    /// Create a record with required fields.
    pub fn new(
        type_name: impl Into<String>,
        kind: TypeKind,
        namespace: impl Into<String>,
        file_path: impl Into<String>,
    ) -> Self {
        let file_path = file_path.into();
        let file_name = file_path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&file_path)
            .to_string();
        Self {
            file_name,
            file_path,
            kind,
            type_name: type_name.into(),
            namespace: namespace.into(),
            imports: Vec::new(),
            flags: TypeFlags::default(),
            base_type_names: None,
            functions: Vec::new(),
        }
    }

    /// Set the import statements.
    pub fn with_imports(mut self, imports: Vec<String>) -> Self {
        self.imports = imports;
        self
    }

    /// Set the flags. `is_inherited` is kept in sync with the base types.
    pub fn with_flags(mut self, flags: TypeFlags) -> Self {
        let inherited = self.base_type_names.is_some();
        self.flags = flags;
        self.flags.is_inherited = inherited;
        self
    }

    /// Set the base-type list; marks the record as inherited.
    pub fn with_base_types(mut self, bases: Vec<String>) -> Self {
        self.flags.is_inherited = true;
        self.base_type_names = Some(bases);
        self
    }

    /// Set the member functions.
    pub fn with_functions(mut self, functions: Vec<FunctionRecord>) -> Self {
        self.functions = functions;
        self
    }

    /// Fold another declaration of the same type into this one.
    ///
    /// Used for types split into `partial` parts: imports and base types are
    /// unioned in order of first appearance, functions appended and modifier
    /// flags combined. Kind and file location stay those of `self`.
    pub fn absorb(&mut self, other: TypeRecord) {
        for import in other.imports {
            if !self.imports.contains(&import) {
                self.imports.push(import);
            }
        }

        if let Some(bases) = other.base_type_names {
            let own = self.base_type_names.get_or_insert_with(Vec::new);
            for base in bases {
                if !own.contains(&base) {
                    own.push(base);
                }
            }
            self.flags.is_inherited = true;
        }

        self.flags.is_static |= other.flags.is_static;
        self.flags.is_sealed |= other.flags.is_sealed;
        self.flags.is_abstract |= other.flags.is_abstract;
        self.flags.has_numeric_field |= other.flags.has_numeric_field;
        self.functions.extend(other.functions);
    }

    /// The graph node key: `Namespace.TypeName`.
    pub fn identifier(&self) -> String {
        format!("{}.{}", self.namespace, self.type_name)
    }

    /// Base types as written, empty when the type has no base list.
    pub fn base_types(&self) -> &[String] {
        self.base_type_names.as_deref().unwrap_or(&[])
    }

    /// Relative directory of this type's artifacts: namespace segments then the type name.
    pub fn artifact_dir(&self) -> PathBuf {
        namespace_dir(&self.namespace).join(&self.type_name)
    }

    /// True when `name` is an exact or generic (`name<`) return or parameter
    /// type of some function, or appears inside some function body.
    pub fn uses_in_signature_or_body(&self, name: &str) -> bool {
        let generic = format!("{name}<");
        let matches_type = |ty: &str| ty == name || ty.starts_with(&generic);

        self.functions.iter().any(|f| {
            matches_type(&f.return_type)
                || f.parameters.iter().any(|p| matches_type(&p.ty))
                || f.body.as_deref().is_some_and(|body| body.contains(name))
        })
    }
}

/// Map a dotted namespace to a relative directory path.
pub fn namespace_dir(namespace: &str) -> PathBuf {
    namespace
        .split('.')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}
