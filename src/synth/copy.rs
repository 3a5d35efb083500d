//! Deep-copy synthesis.
//!
//! The emitted method starts with one whole-record shallow copy; the
//! instructions here override only the fields that copy would alias.
//! Scalars and embedded non-copier values need no instruction.

use serde::Serialize;
use tracing::warn;

use super::{FieldScope, Synthesis};
use crate::config::ExclusionSet;
use crate::decl::Scalar;
use crate::graph::{Elem, ElemClass, FieldKind, FieldNode, TypeGraph, TypeId, TypeRef, Unsupported};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum CopyInstruction {
    /// `new = old == nil ? nil : old.Copy()`
    Recurse { field: String, target: String },
    /// `new = old == nil ? nil : &(*old)`
    ShallowPointer { field: String, target: String },
    /// `new = old.Copy()`, value fields are never nil
    RecurseValue { field: String, target: String },
    CopyContainerRecurse { field: String, element: String, by_pointer: bool },
    CopyContainerPrimitive { field: String, helper: SliceHelper },
    CopyContainerGeneric { field: String, element: String },
    CopyMapRecurse { field: String, key: String, value: String, by_pointer: bool },
    CopyMapPrimitive { field: String, helper: MapHelper },
    CopyMapGeneric { field: String, key: String, value: String },
}

/// Shared slice copy helpers, keyed by element kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SliceHelper {
    #[serde(rename = "CopySliceString")]
    String,
    #[serde(rename = "CopySliceInt")]
    Int,
}

/// Shared map copy helpers, keyed by exact key/value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MapHelper {
    #[serde(rename = "CopyMapStringString")]
    StringString,
    #[serde(rename = "CopyMapStringInt")]
    StringInt,
    #[serde(rename = "CopyMapStringFloat64")]
    StringFloat64,
}

impl SliceHelper {
    pub fn for_element(elem: Scalar) -> Option<Self> {
        match elem {
            Scalar::String => Some(Self::String),
            Scalar::Int => Some(Self::Int),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::String => "CopySliceString",
            Self::Int => "CopySliceInt",
        }
    }
}

impl MapHelper {
    pub fn for_pair(key: Scalar, value: Scalar) -> Option<Self> {
        match (key, value) {
            (Scalar::String, Scalar::String) => Some(Self::StringString),
            (Scalar::String, Scalar::Int) => Some(Self::StringInt),
            (Scalar::String, Scalar::Float64) => Some(Self::StringFloat64),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::StringString => "CopyMapStringString",
            Self::StringInt => "CopyMapStringInt",
            Self::StringFloat64 => "CopyMapStringFloat64",
        }
    }
}

impl CopyInstruction {
    pub fn field(&self) -> &str {
        match self {
            Self::Recurse { field, .. }
            | Self::ShallowPointer { field, .. }
            | Self::RecurseValue { field, .. }
            | Self::CopyContainerRecurse { field, .. }
            | Self::CopyContainerPrimitive { field, .. }
            | Self::CopyContainerGeneric { field, .. }
            | Self::CopyMapRecurse { field, .. }
            | Self::CopyMapPrimitive { field, .. }
            | Self::CopyMapGeneric { field, .. } => field,
        }
    }
}

pub struct CopySynthesizer<'a> {
    scope: FieldScope<'a>,
}

impl<'a> CopySynthesizer<'a> {
    pub fn new(graph: &'a TypeGraph, target: TypeId, exclusions: &'a ExclusionSet) -> Self {
        Self { scope: FieldScope::new(graph, target, exclusions) }
    }

    pub fn synthesize(&self) -> Synthesis<CopyInstruction> {
        let mut out = Synthesis::default();
        for field in self.scope.fields() {
            let name = field.name.clone();
            let instruction = match &field.kind {
                FieldKind::Scalar(_) => None,
                FieldKind::Pointer(TypeRef::Named(id)) => {
                    let target = self.scope.name_of(*id);
                    if self.scope.is_copier(*id) {
                        Some(CopyInstruction::Recurse { field: name, target })
                    } else {
                        Some(CopyInstruction::ShallowPointer { field: name, target })
                    }
                }
                FieldKind::Pointer(TypeRef::Scalar(scalar)) => Some(CopyInstruction::ShallowPointer {
                    field: name,
                    target: scalar.name().to_string(),
                }),
                FieldKind::Embedded(id) => self.scope.is_copier(*id).then(|| {
                    CopyInstruction::RecurseValue { field: name, target: self.scope.name_of(*id) }
                }),
                FieldKind::Slice(elem) => {
                    Some(self.slice(field, name, elem, &mut out))
                }
                FieldKind::Map { key, value } => {
                    Some(self.map(field, name, key, value, &mut out))
                }
                FieldKind::Unsupported(kind) => {
                    let diag = self.scope.unsupported(field, *kind);
                    warn!("{diag}");
                    out.diagnostics.push(diag);
                    None
                }
            };
            out.instructions.extend(instruction);
        }
        out
    }

    fn slice(
        &self,
        field: &FieldNode,
        name: String,
        elem: &Elem,
        out: &mut Synthesis<CopyInstruction>,
    ) -> CopyInstruction {
        match elem.class {
            ElemClass::Named { id, by_pointer } if self.scope.is_copier(id) => {
                CopyInstruction::CopyContainerRecurse {
                    field: name,
                    element: self.scope.name_of(id),
                    by_pointer,
                }
            }
            ElemClass::Scalar(scalar) => match SliceHelper::for_element(scalar) {
                Some(helper) => CopyInstruction::CopyContainerPrimitive { field: name, helper },
                None => CopyInstruction::CopyContainerGeneric { field: name, element: elem.expr.to_string() },
            },
            other => {
                self.flag_element(field, other, out);
                CopyInstruction::CopyContainerGeneric { field: name, element: elem.expr.to_string() }
            }
        }
    }

    fn map(
        &self,
        field: &FieldNode,
        name: String,
        key: &Elem,
        value: &Elem,
        out: &mut Synthesis<CopyInstruction>,
    ) -> CopyInstruction {
        match (key.class, value.class) {
            (_, ElemClass::Named { id, by_pointer }) if self.scope.is_copier(id) => {
                CopyInstruction::CopyMapRecurse {
                    field: name,
                    key: key.expr.to_string(),
                    value: self.scope.name_of(id),
                    by_pointer,
                }
            }
            (ElemClass::Scalar(k), ElemClass::Scalar(v)) => match MapHelper::for_pair(k, v) {
                Some(helper) => CopyInstruction::CopyMapPrimitive { field: name, helper },
                None => CopyInstruction::CopyMapGeneric {
                    field: name,
                    key: key.expr.to_string(),
                    value: value.expr.to_string(),
                },
            },
            (_, other) => {
                self.flag_element(field, other, out);
                CopyInstruction::CopyMapGeneric {
                    field: name,
                    key: key.expr.to_string(),
                    value: value.expr.to_string(),
                }
            }
        }
    }

    /// Element shapes the generic by-value copy cannot make deep.
    fn flag_element(
        &self,
        field: &FieldNode,
        class: ElemClass,
        out: &mut Synthesis<CopyInstruction>,
    ) {
        let diag = match class {
            ElemClass::Container => self.scope.nested_container(field),
            ElemClass::Unsupported(kind) => self.scope.unsupported(field, kind),
            ElemClass::Indirect => self.scope.unsupported(field, Unsupported::Indirect),
            _ => return,
        };
        warn!("{diag}");
        out.diagnostics.push(diag);
    }
}
