//! Declaration graph handed over by the front end.
//!
//! A document lists record types (each with an ordered field list and the
//! declared type expression of every field) plus the hand-written methods the
//! front end already found on those types. Nothing here is resolved yet; the
//! [`crate::graph::TypeGraph`] does that.
pub mod scalar;

use std::fmt;
use std::path::Path;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::error::GenerateError;

pub use scalar::Scalar;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Declarations {
    #[serde(default)]
    pub types: Vec<TypeDecl>,
    /// Hand-written methods observed in the declarations.
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDecl>, // declaration order
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MethodDecl {
    pub receiver: String,
    pub name: String,
}

/// Declared shape of a field, exactly as written. Arrays and slices share
/// the `slice` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeExpr {
    Named(String),
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Map { key: Box<TypeExpr>, value: Box<TypeExpr> },
    Interface,
    Func,
    Chan,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self { Self::Named(name.into()) }
    pub fn pointer(inner: TypeExpr) -> Self { Self::Pointer(Box::new(inner)) }
    pub fn slice(elem: TypeExpr) -> Self { Self::Slice(Box::new(elem)) }
    pub fn map(key: TypeExpr, value: TypeExpr) -> Self {
        Self::Map { key: Box::new(key), value: Box::new(value) }
    }

    /// `Some` when this is a bare name that is a recognized scalar.
    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Self::Named(name) => Scalar::from_name(name),
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Self::Slice(_) | Self::Map { .. })
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Pointer(inner) => write!(f, "*{inner}"),
            Self::Slice(elem) => write!(f, "[]{elem}"),
            Self::Map { key, value } => write!(f, "map[{key}]{value}"),
            Self::Interface => f.write_str("interface{}"),
            Self::Func => f.write_str("func()"),
            Self::Chan => f.write_str("chan"),
        }
    }
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self { name: name.into(), ty }
    }
}

impl TypeDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: Vec::new() }
    }

    pub fn field(mut self, name: impl Into<String>, ty: TypeExpr) -> Self {
        self.fields.push(FieldDecl::new(name, ty));
        self
    }
}

impl Declarations {
    pub fn new() -> Self { Self::default() }

    pub fn with_type(mut self, decl: TypeDecl) -> Self {
        self.types.push(decl);
        self
    }

    pub fn with_method(mut self, receiver: impl Into<String>, name: impl Into<String>) -> Self {
        self.methods.push(MethodDecl { receiver: receiver.into(), name: name.into() });
        self
    }

    /// Append another document. Duplicate type names are left for the
    /// graph to reject so the error names the offending type.
    pub fn merge(&mut self, other: Declarations) {
        self.types.extend(other.types);
        self.methods.extend(other.methods);
    }

    /// Parse a declaration document, reporting the JSON path of any failure.
    pub fn from_json_str(src: &str) -> Result<Self, GenerateError> {
        let de = &mut serde_json::Deserializer::from_str(src);
        deserialize_with_path(de)
    }

    /// Select the declaration document inside a larger dump via a JSON Pointer
    /// (e.g. `/analysis/declarations`). An empty pointer selects the root.
    pub fn from_json_value_at(value: serde_json::Value, pointer: &str) -> Result<Self, GenerateError> {
        let selected = if pointer.is_empty() {
            value
        } else {
            value.pointer(pointer).cloned().ok_or_else(|| GenerateError::MissingPointer {
                pointer: pointer.to_string(),
            })?
        };
        deserialize_with_path(selected)
    }

    /// Read one document from disk, optionally selecting it by JSON Pointer.
    pub fn from_path(path: impl AsRef<Path>, pointer: Option<&str>) -> Result<Self, GenerateError> {
        let source = std::fs::read_to_string(path.as_ref())?;
        match pointer {
            None => Self::from_json_str(&source),
            Some(pointer) => {
                let value = Self::parse_value(&source)?;
                Self::from_json_value_at(value, pointer)
            }
        }
    }

    fn parse_value(source: &str) -> Result<serde_json::Value, GenerateError> {
        let de = &mut serde_json::Deserializer::from_str(source);
        deserialize_with_path(de)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn deserialize_with_path<'de, D, T>(de: D) -> Result<T, GenerateError>
where
    D: serde::Deserializer<'de, Error = serde_json::Error>,
    T: DeserializeOwned,
{
    serde_path_to_error::deserialize(de).map_err(|err| {
        let path = err.path().to_string();
        GenerateError::Json { path, source: err.into_inner() }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_type_expressions() {
        let src = r#"{
            "types": [{ "name": "Job", "fields": [
                { "name": "ID",    "type": { "named": "string" } },
                { "name": "Owner", "type": { "pointer": { "named": "Team" } } },
                { "name": "Meta",  "type": { "map": { "key": { "named": "string" }, "value": { "named": "int" } } } },
                { "name": "Hook",  "type": "func" }
            ]}],
            "methods": [{ "receiver": "Team", "name": "Copy" }]
        }"#;
        let decls = Declarations::from_json_str(src).unwrap();
        let job = &decls.types[0];
        assert_eq!(job.fields[1].ty, TypeExpr::pointer(TypeExpr::named("Team")));
        assert_eq!(job.fields[2].ty.to_string(), "map[string]int");
        assert_eq!(job.fields[3].ty, TypeExpr::Func);
        assert_eq!(decls.methods[0].receiver, "Team");
    }

    #[test]
    fn errors_carry_json_path() {
        let src = r#"{ "types": [{ "name": "Job", "fields": [{ "name": "X", "type": { "nope": 1 } }] }] }"#;
        let err = Declarations::from_json_str(src).unwrap_err();
        match err {
            GenerateError::Json { path, .. } => assert!(path.starts_with("types[0].fields[0]"), "{path}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn pointer_selects_nested_document() {
        let value = serde_json::json!({ "frontend": { "decls": { "types": [{ "name": "A" }] } } });
        let decls = Declarations::from_json_value_at(value.clone(), "/frontend/decls").unwrap();
        assert_eq!(decls.types[0].name, "A");
        assert!(matches!(
            Declarations::from_json_value_at(value, "/missing"),
            Err(GenerateError::MissingPointer { .. })
        ));
    }

    #[test]
    fn display_uses_declaration_notation() {
        let expr = TypeExpr::slice(TypeExpr::pointer(TypeExpr::named("Person")));
        assert_eq!(expr.to_string(), "[]*Person");
        assert_eq!(TypeExpr::Interface.to_string(), "interface{}");
    }
}
