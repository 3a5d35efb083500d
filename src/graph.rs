//! Arena of record types and their containment edges.
//!
//! Nodes live in one insertion-ordered map and refer to each other by
//! [`TypeId`] only, so cyclic declarations (`A` holds `*B`, `B` holds `*A`)
//! need no shared ownership. Every field that names another type also records
//! a reverse edge on that type, which is what copier propagation walks.
//!
//! Field shapes are resolved once, when the field is added, and cached on the
//! [`FieldNode`]. Resolution only descends the declared type expression (a
//! finite tree); named types are linked lazily by id and never re-entered.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::{debug, trace};

use crate::classify::Reason;
use crate::config::Operation;
use crate::decl::{FieldDecl, Scalar, TypeExpr};
use crate::error::{ConfigError, Diagnostic};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(usize);

#[derive(Debug, Default)]
pub struct TypeGraph {
    nodes: IndexMap<String, TypeNode>,
}

#[derive(Debug)]
pub struct TypeNode {
    pub name: String,
    pub fields: Vec<FieldNode>,
    /// Reverse edges: every (owner, field) that refers to this type.
    pub parents: IndexSet<Edge>,
    /// False for types only ever seen as the target of some field.
    pub declared: bool,
    pub has_copy: bool,
    pub has_equals: bool,
    pub(crate) copier: Option<Reason>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub owner: TypeId,
    pub field: usize, // index into owner's field list
}

#[derive(Debug, Clone)]
pub struct FieldNode {
    pub name: String,
    pub expr: TypeExpr,
    pub kind: FieldKind,
}

/// Resolved field shape.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Scalar(Scalar),
    Pointer(TypeRef),
    /// Struct held by value.
    Embedded(TypeId),
    Slice(Elem),
    Map { key: Elem, value: Elem },
    Unsupported(Unsupported),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRef {
    Scalar(Scalar),
    Named(TypeId),
}

/// Resolved element (or map key) of a container field.
#[derive(Debug, Clone, PartialEq)]
pub struct Elem {
    pub expr: TypeExpr,
    pub class: ElemClass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElemClass {
    Scalar(Scalar),
    Named { id: TypeId, by_pointer: bool },
    PointerToScalar(Scalar),
    /// Slice or map nested inside a container.
    Container,
    /// Any other indirection (`**T`, `*[]T`).
    Indirect,
    Unsupported(Unsupported),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unsupported {
    Interface,
    Func,
    Chan,
    /// Pointer to something other than a named type.
    Indirect,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl TypeNode {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: Vec::new(),
            parents: IndexSet::new(),
            declared: false,
            has_copy: false,
            has_equals: false,
            copier: None,
        }
    }

    pub fn is_copier(&self) -> bool { self.copier.is_some() }

    /// Why this type was first marked a copier.
    pub fn copier_reason(&self) -> Option<&Reason> { self.copier.as_ref() }

    pub fn has_method(&self, op: Operation) -> bool {
        match op {
            Operation::Copy => self.has_copy,
            Operation::Equals => self.has_equals,
        }
    }
}

impl FieldKind {
    /// Shapes that on their own make the owner a copier: every pointer
    /// (including `**T` and `*[]T`), slice and map. Pointers to interfaces,
    /// functions and channels do not count.
    pub fn is_structural_trigger(&self) -> bool {
        matches!(
            self,
            Self::Pointer(_)
                | Self::Slice(_)
                | Self::Map { .. }
                | Self::Unsupported(Unsupported::Indirect)
        )
    }

    /// Named types this field refers to, directly or through a container.
    pub fn referenced(&self) -> impl Iterator<Item = TypeId> {
        let (a, b) = match self {
            Self::Pointer(TypeRef::Named(id)) | Self::Embedded(id) => (Some(*id), None),
            Self::Slice(elem) => (elem.named(), None),
            Self::Map { key, value } => (key.named(), value.named()),
            _ => (None, None),
        };
        a.into_iter().chain(b)
    }
}

impl Elem {
    pub fn named(&self) -> Option<TypeId> {
        match self.class {
            ElemClass::Named { id, .. } => Some(id),
            _ => None,
        }
    }
}

impl Unsupported {
    pub fn describe(self) -> &'static str {
        match self {
            Self::Interface => "interface",
            Self::Func => "function",
            Self::Chan => "channel",
            Self::Indirect => "indirect pointer",
        }
    }
}

impl TypeGraph {
    pub fn new() -> Self { Self::default() }

    /// Idempotent upsert by name.
    pub fn add_or_get_type(&mut self, name: &str) -> TypeId {
        if let Some(index) = self.nodes.get_index_of(name) {
            return TypeId(index);
        }
        let (index, _) = self.nodes.insert_full(name.to_string(), TypeNode::new(name));
        trace!(type_name = name, "registered type");
        TypeId(index)
    }

    /// Register a type declaration. A name may be declared only once, though
    /// it may already exist as the target of an earlier field.
    pub fn declare_type(&mut self, name: &str) -> Result<TypeId, ConfigError> {
        let id = self.add_or_get_type(name);
        let node = self.node_mut(id);
        if node.declared {
            return Err(ConfigError::DuplicateType { name: name.to_string() });
        }
        node.declared = true;
        debug!(type_name = name, "declared type");
        Ok(id)
    }

    pub fn record_method(&mut self, id: TypeId, op: Operation) {
        let node = self.node_mut(id);
        match op {
            Operation::Copy => node.has_copy = true,
            Operation::Equals => node.has_equals = true,
        }
    }

    /// Resolve and append a field to `owner`, linking reverse edges from
    /// every named type it references. Returns the field index.
    pub fn add_field(&mut self, owner: TypeId, decl: &FieldDecl) -> usize {
        let kind = self.resolve_field(&decl.ty);
        trace!(owner = %self.node(owner).name, field = %decl.name, ?kind, "resolved field");
        let referenced = kind.referenced().collect::<Vec<_>>();
        let fields = &mut self.node_mut(owner).fields;
        let index = fields.len();
        fields.push(FieldNode { name: decl.name.clone(), expr: decl.ty.clone(), kind });
        for target in referenced {
            self.node_mut(target).parents.insert(Edge { owner, field: index });
        }
        index
    }

    pub fn node(&self, id: TypeId) -> &TypeNode { &self.nodes[id.0] }

    pub(crate) fn node_mut(&mut self, id: TypeId) -> &mut TypeNode { &mut self.nodes[id.0] }

    pub fn id_of(&self, name: &str) -> Option<TypeId> {
        self.nodes.get_index_of(name).map(TypeId)
    }

    pub fn get(&self, name: &str) -> Option<&TypeNode> { self.nodes.get(name) }

    pub fn field(&self, edge: Edge) -> &FieldNode { &self.node(edge.owner).fields[edge.field] }

    pub fn ids(&self) -> impl Iterator<Item = TypeId> { (0..self.nodes.len()).map(TypeId) }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &TypeNode)> {
        self.nodes.values().enumerate().map(|(i, n)| (TypeId(i), n))
    }

    pub fn len(&self) -> usize { self.nodes.len() }

    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    /// Fields of declared types that refer to a type nobody declared.
    pub fn unresolved(&self) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        for (_, node) in self.iter().filter(|(_, n)| n.declared) {
            for field in &node.fields {
                for target in field.kind.referenced() {
                    let target = self.node(target);
                    if !target.declared {
                        out.push(Diagnostic::UnresolvableType {
                            owner: node.name.clone(),
                            field: field.name.clone(),
                            type_name: target.name.clone(),
                        });
                    }
                }
            }
        }
        out
    }

    // -------------------------------- Resolve ------------------------------- //

    fn resolve_field(&mut self, expr: &TypeExpr) -> FieldKind {
        match expr {
            TypeExpr::Named(name) => match Scalar::from_name(name) {
                Some(scalar) => FieldKind::Scalar(scalar),
                None => FieldKind::Embedded(self.add_or_get_type(name)),
            },
            TypeExpr::Pointer(inner) => match inner.as_ref() {
                TypeExpr::Named(name) => match Scalar::from_name(name) {
                    Some(scalar) => FieldKind::Pointer(TypeRef::Scalar(scalar)),
                    None => FieldKind::Pointer(TypeRef::Named(self.add_or_get_type(name))),
                },
                TypeExpr::Interface => FieldKind::Unsupported(Unsupported::Interface),
                TypeExpr::Func => FieldKind::Unsupported(Unsupported::Func),
                TypeExpr::Chan => FieldKind::Unsupported(Unsupported::Chan),
                _ => FieldKind::Unsupported(Unsupported::Indirect),
            },
            TypeExpr::Slice(elem) => FieldKind::Slice(self.resolve_elem(elem)),
            TypeExpr::Map { key, value } => FieldKind::Map {
                key: self.resolve_elem(key),
                value: self.resolve_elem(value),
            },
            TypeExpr::Interface => FieldKind::Unsupported(Unsupported::Interface),
            TypeExpr::Func => FieldKind::Unsupported(Unsupported::Func),
            TypeExpr::Chan => FieldKind::Unsupported(Unsupported::Chan),
        }
    }

    fn resolve_elem(&mut self, expr: &TypeExpr) -> Elem {
        let class = match expr {
            TypeExpr::Named(name) => match Scalar::from_name(name) {
                Some(scalar) => ElemClass::Scalar(scalar),
                None => ElemClass::Named { id: self.add_or_get_type(name), by_pointer: false },
            },
            TypeExpr::Pointer(inner) => match inner.as_ref() {
                TypeExpr::Named(name) => match Scalar::from_name(name) {
                    Some(scalar) => ElemClass::PointerToScalar(scalar),
                    None => ElemClass::Named { id: self.add_or_get_type(name), by_pointer: true },
                },
                _ => ElemClass::Indirect,
            },
            TypeExpr::Slice(_) | TypeExpr::Map { .. } => ElemClass::Container,
            TypeExpr::Interface => ElemClass::Unsupported(Unsupported::Interface),
            TypeExpr::Func => ElemClass::Unsupported(Unsupported::Func),
            TypeExpr::Chan => ElemClass::Unsupported(Unsupported::Chan),
        };
        Elem { expr: expr.clone(), class }
    }
}
