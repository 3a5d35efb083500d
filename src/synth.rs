//! Per-field synthesis for one requested type.
//!
//! Both synthesizers are pure functions of (target type, finished
//! classification, exclusion set) to an ordered instruction list. They only
//! read the graph, so once classification is done they can run for many
//! targets at the same time.
pub mod copy;
pub mod equals;

use crate::config::ExclusionSet;
use crate::error::Diagnostic;
use crate::graph::{FieldNode, TypeGraph, TypeId, TypeNode, Unsupported};

pub use copy::{CopyInstruction, CopySynthesizer, MapHelper, SliceHelper};
pub use equals::{ElementCompare, EqualsInstruction, EqualsSynthesizer};

/// Output of one (type, operation) synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis<I> {
    pub instructions: Vec<I>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<I> Default for Synthesis<I> {
    fn default() -> Self {
        Self { instructions: Vec::new(), diagnostics: Vec::new() }
    }
}

/// Read-only view shared by both synthesizers.
#[derive(Clone, Copy)]
pub(crate) struct FieldScope<'a> {
    pub graph: &'a TypeGraph,
    pub owner: &'a TypeNode,
    exclusions: &'a ExclusionSet,
}

impl<'a> FieldScope<'a> {
    pub fn new(graph: &'a TypeGraph, target: TypeId, exclusions: &'a ExclusionSet) -> Self {
        Self { graph, owner: graph.node(target), exclusions }
    }

    /// Non-excluded fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &'a FieldNode> + use<'a> {
        let owner = self.owner;
        let exclusions = self.exclusions;
        owner
            .fields
            .iter()
            .filter(move |f| !exclusions.contains(&owner.name, &f.name))
    }

    pub fn is_copier(&self, id: TypeId) -> bool { self.graph.node(id).is_copier() }

    /// Field types whose own equality operation is called: copiers, and
    /// types that already carry a hand-written `Equals`.
    pub fn delegates_equals(&self, id: TypeId) -> bool {
        let node = self.graph.node(id);
        node.is_copier() || node.has_equals
    }

    pub fn name_of(&self, id: TypeId) -> String { self.graph.node(id).name.clone() }

    pub fn unsupported(&self, field: &FieldNode, kind: Unsupported) -> Diagnostic {
        Diagnostic::UnsupportedFieldShape {
            owner: self.owner.name.clone(),
            field: field.name.clone(),
            shape: kind.describe().to_string(),
        }
    }

    pub fn nested_container(&self, field: &FieldNode) -> Diagnostic {
        Diagnostic::NestedContainer {
            owner: self.owner.name.clone(),
            field: field.name.clone(),
            shape: field.expr.to_string(),
        }
    }
}

/// Number of fields left for `target` once exclusions are applied.
pub fn remaining_fields(graph: &TypeGraph, target: TypeId, exclusions: &ExclusionSet) -> usize {
    FieldScope::new(graph, target, exclusions).fields().count()
}
