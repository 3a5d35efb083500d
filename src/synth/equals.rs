//! Structural-equality synthesis.
//!
//! One comparison per non-excluded field, in declaration order. The emitted
//! method reports "not equal" at the first failing comparison.

use serde::Serialize;
use tracing::warn;

use super::{FieldScope, Synthesis};
use crate::config::ExclusionSet;
use crate::graph::{Elem, ElemClass, FieldKind, FieldNode, TypeGraph, TypeId, TypeRef, Unsupported};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum EqualsInstruction {
    /// `a.F == b.F`
    Compare { field: String },
    /// Both nil, or both non-nil with equal pointees.
    ComparePointee { field: String, target: String },
    /// The field type's own `Equals`; nil-aware when `by_pointer`.
    Delegate { field: String, target: String, by_pointer: bool },
    /// Length check, then element by element.
    CompareContainer { field: String, element: ElementCompare },
    /// Length check, then key presence and value per key.
    CompareMap { field: String, value: ElementCompare },
}

/// How two elements (or map values) at the same position are compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "by", rename_all = "kebab-case")]
pub enum ElementCompare {
    Direct,
    Pointee,
    Delegate { target: String, by_pointer: bool },
}

impl EqualsInstruction {
    pub fn field(&self) -> &str {
        match self {
            Self::Compare { field }
            | Self::ComparePointee { field, .. }
            | Self::Delegate { field, .. }
            | Self::CompareContainer { field, .. }
            | Self::CompareMap { field, .. } => field,
        }
    }
}

pub struct EqualsSynthesizer<'a> {
    scope: FieldScope<'a>,
}

impl<'a> EqualsSynthesizer<'a> {
    pub fn new(graph: &'a TypeGraph, target: TypeId, exclusions: &'a ExclusionSet) -> Self {
        Self { scope: FieldScope::new(graph, target, exclusions) }
    }

    pub fn synthesize(&self) -> Synthesis<EqualsInstruction> {
        let mut out = Synthesis::default();
        for field in self.scope.fields() {
            let name = field.name.clone();
            let instruction = match &field.kind {
                FieldKind::Scalar(_) => EqualsInstruction::Compare { field: name },
                FieldKind::Pointer(TypeRef::Named(id)) => {
                    let target = self.scope.name_of(*id);
                    if self.scope.delegates_equals(*id) {
                        EqualsInstruction::Delegate { field: name, target, by_pointer: true }
                    } else {
                        EqualsInstruction::ComparePointee { field: name, target }
                    }
                }
                FieldKind::Pointer(TypeRef::Scalar(scalar)) => EqualsInstruction::ComparePointee {
                    field: name,
                    target: scalar.name().to_string(),
                },
                FieldKind::Embedded(id) if self.scope.delegates_equals(*id) => {
                    EqualsInstruction::Delegate {
                        field: name,
                        target: self.scope.name_of(*id),
                        by_pointer: false,
                    }
                }
                FieldKind::Embedded(_) => EqualsInstruction::Compare { field: name },
                FieldKind::Slice(elem) => EqualsInstruction::CompareContainer {
                    field: name,
                    element: self.element(field, elem, &mut out),
                },
                FieldKind::Map { value, .. } => EqualsInstruction::CompareMap {
                    field: name,
                    value: self.element(field, value, &mut out),
                },
                FieldKind::Unsupported(kind) => {
                    let diag = self.scope.unsupported(field, *kind);
                    warn!("{diag}");
                    out.diagnostics.push(diag);
                    continue;
                }
            };
            out.instructions.push(instruction);
        }
        out
    }

    fn element(
        &self,
        field: &FieldNode,
        elem: &Elem,
        out: &mut Synthesis<EqualsInstruction>,
    ) -> ElementCompare {
        let diag = match elem.class {
            ElemClass::Named { id, by_pointer } if self.scope.delegates_equals(id) => {
                return ElementCompare::Delegate { target: self.scope.name_of(id), by_pointer };
            }
            ElemClass::Named { by_pointer: true, .. } | ElemClass::PointerToScalar(_) => {
                return ElementCompare::Pointee;
            }
            ElemClass::Named { .. } | ElemClass::Scalar(_) => return ElementCompare::Direct,
            ElemClass::Container => self.scope.nested_container(field),
            ElemClass::Unsupported(kind) => self.scope.unsupported(field, kind),
            ElemClass::Indirect => self.scope.unsupported(field, Unsupported::Indirect),
        };
        warn!("{diag}");
        out.diagnostics.push(diag);
        ElementCompare::Direct
    }
}
