//! Copier classification.
//!
//! A type is a copier when its instances need a field-aware deep copy. The
//! fact is seeded by operator intent and by hand-written `Copy` methods, set
//! by structural triggers (pointer, slice or map fields), and propagated to
//! every containing type over the reverse edges of the [`TypeGraph`].
//!
//! Propagation is an immediate broadcast: whenever a type flips to copier its
//! recorded parents are marked too, with an explicit worklist. Marking is
//! monotone and already-marked types short-circuit, so the walk is bounded by
//! the number of edges and terminates on cyclic graphs. The result does not
//! depend on visiting order.

use serde::Serialize;
use tracing::debug;

use crate::config::ExclusionSet;
use crate::graph::{TypeGraph, TypeId};

/// Why a type was first marked a copier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Reason {
    Requested,
    ExistingMethod,
    Structural { field: String },
    Propagated { from: String, field: String },
}

pub struct Classifier<'a> {
    graph: &'a mut TypeGraph,
    exclusions: &'a ExclusionSet,
}

impl<'a> Classifier<'a> {
    pub fn new(graph: &'a mut TypeGraph, exclusions: &'a ExclusionSet) -> Self {
        Self { graph, exclusions }
    }

    /// Full pass to the fixed point. Running it again on the same graph
    /// marks nothing new.
    pub fn classify(&mut self, requested: &[TypeId]) -> usize {
        let mut marked = 0;

        // 1) operator intent always wins
        for &id in requested {
            marked += self.mark(id, Reason::Requested);
        }

        // 2) hand-written Copy methods count as evidence
        let existing = self
            .graph
            .iter()
            .filter(|(_, n)| n.has_copy)
            .map(|(id, _)| id)
            .collect::<Vec<_>>();
        for id in existing {
            marked += self.mark(id, Reason::ExistingMethod);
        }

        // 3) structural triggers, then 4) references to copiers that were
        // marked before the referencing edge existed
        let ids = self.graph.ids().collect::<Vec<_>>();
        for id in ids {
            for index in 0..self.graph.node(id).fields.len() {
                marked += self.field_added(id, index);
            }
        }
        marked
    }

    /// Apply the structural and propagation rules to one newly added field.
    /// Keeps classification consistent with a graph that grows after the
    /// initial pass.
    pub fn field_added(&mut self, owner: TypeId, index: usize) -> usize {
        let node = self.graph.node(owner);
        if node.is_copier() {
            return 0;
        }
        let field = &node.fields[index];
        if self.exclusions.contains(&node.name, &field.name) {
            return 0;
        }
        if field.kind.is_structural_trigger() {
            let reason = Reason::Structural { field: field.name.clone() };
            return self.mark(owner, reason);
        }
        let copier_target = field
            .kind
            .referenced()
            .find(|target| self.graph.node(*target).is_copier());
        match copier_target {
            Some(target) => {
                let reason = Reason::Propagated {
                    from: self.graph.node(target).name.clone(),
                    field: field.name.clone(),
                };
                self.mark(owner, reason)
            }
            None => 0,
        }
    }

    /// Mark `id` a copier and broadcast to all of its parents, skipping
    /// edges that go through excluded fields. Returns how many types flipped.
    pub fn mark(&mut self, id: TypeId, reason: Reason) -> usize {
        let mut stack = vec![(id, reason)];
        let mut flipped = 0;
        while let Some((id, reason)) = stack.pop() {
            let node = self.graph.node_mut(id);
            if node.copier.is_some() {
                continue;
            }
            debug!(type_name = %node.name, ?reason, "marked copier");
            node.copier = Some(reason);
            flipped += 1;

            let node = self.graph.node(id);
            for edge in &node.parents {
                let parent = self.graph.node(edge.owner);
                if parent.is_copier() {
                    continue;
                }
                let field = &parent.fields[edge.field];
                if self.exclusions.contains(&parent.name, &field.name) {
                    continue;
                }
                let reason = Reason::Propagated {
                    from: node.name.clone(),
                    field: field.name.clone(),
                };
                stack.push((edge.owner, reason));
            }
        }
        flipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{FieldDecl, TypeExpr};

    fn graph(decls: Vec<(&str, Vec<(&str, TypeExpr)>)>) -> TypeGraph {
        let mut g = TypeGraph::new();
        for (name, fields) in decls {
            let id = g.declare_type(name).unwrap();
            for (field, ty) in fields {
                g.add_field(id, &FieldDecl::new(field, ty));
            }
        }
        g
    }

    fn copiers(g: &TypeGraph) -> Vec<&str> {
        g.iter().filter(|(_, n)| n.is_copier()).map(|(_, n)| n.name.as_str()).collect()
    }

    fn named(n: &str) -> TypeExpr { TypeExpr::named(n) }
    fn ptr(n: &str) -> TypeExpr { TypeExpr::pointer(TypeExpr::named(n)) }

    #[test]
    fn chain_propagates_to_all_ancestors() {
        // A embeds B embeds C; only C has a slice
        let mut g = graph(vec![
            ("A", vec![("B", named("B"))]),
            ("B", vec![("C", named("C"))]),
            ("C", vec![("Tags", TypeExpr::slice(named("string")))]),
        ]);
        let none = ExclusionSet::default();
        Classifier::new(&mut g, &none).classify(&[]);
        assert_eq!(copiers(&g), ["A", "B", "C"]);
        assert_eq!(
            g.get("A").unwrap().copier_reason(),
            Some(&Reason::Propagated { from: "B".into(), field: "B".into() })
        );
    }

    #[test]
    fn order_of_declaration_does_not_matter() {
        // parent declared after the child was already marked
        let mut g = graph(vec![("C", vec![("Tags", TypeExpr::slice(named("string")))])]);
        let none = ExclusionSet::default();
        Classifier::new(&mut g, &none).classify(&[]);
        let b = g.declare_type("B").unwrap();
        g.add_field(b, &FieldDecl::new("C", named("C")));
        let mut classifier = Classifier::new(&mut g, &none);
        assert_eq!(classifier.field_added(b, 0), 1);
        assert_eq!(copiers(&g), ["C", "B"]);
    }

    #[test]
    fn scalars_and_plain_values_do_not_trigger() {
        let mut g = graph(vec![
            ("Outer", vec![("ID", named("string")), ("Inner", named("Inner"))]),
            ("Inner", vec![("N", named("int"))]),
        ]);
        let none = ExclusionSet::default();
        assert_eq!(Classifier::new(&mut g, &none).classify(&[]), 0);
        assert!(copiers(&g).is_empty());
    }

    #[test]
    fn value_cycle_without_trigger_stays_clean_until_marked() {
        let mut g = graph(vec![("A", vec![("B", named("B"))]), ("B", vec![("A", named("A"))])]);
        let none = ExclusionSet::default();
        let mut classifier = Classifier::new(&mut g, &none);
        assert_eq!(classifier.classify(&[]), 0);
        let a = g.id_of("A").unwrap();
        assert_eq!(Classifier::new(&mut g, &none).mark(a, Reason::ExistingMethod), 2);
        assert_eq!(copiers(&g), ["A", "B"]);
    }

    #[test]
    fn pointer_cycle_terminates() {
        let mut g = graph(vec![("A", vec![("B", ptr("B"))]), ("B", vec![("A", ptr("A"))])]);
        let none = ExclusionSet::default();
        assert_eq!(Classifier::new(&mut g, &none).classify(&[]), 2);
        assert_eq!(copiers(&g), ["A", "B"]);
    }

    #[test]
    fn classification_is_idempotent() {
        let mut g = graph(vec![
            ("Job", vec![("Owner", ptr("Team")), ("ID", named("string"))]),
            ("Team", vec![("Name", named("string"))]),
            ("Loose", vec![("N", named("int"))]),
        ]);
        let none = ExclusionSet::default();
        let job = g.id_of("Job").unwrap();
        let first = Classifier::new(&mut g, &none).classify(&[job]);
        let before = copiers(&g).into_iter().map(String::from).collect::<Vec<_>>();
        let second = Classifier::new(&mut g, &none).classify(&[job]);
        assert_eq!(first, 1);
        assert_eq!(second, 0);
        assert_eq!(copiers(&g), before);
    }

    #[test]
    fn existing_copy_method_seeds_and_propagates() {
        let mut g = graph(vec![
            ("Holder", vec![("Strategy", named("UpdateStrategy"))]),
            ("UpdateStrategy", vec![("Stagger", named("int64"))]),
        ]);
        let id = g.id_of("UpdateStrategy").unwrap();
        g.record_method(id, crate::config::Operation::Copy);
        let none = ExclusionSet::default();
        Classifier::new(&mut g, &none).classify(&[]);
        assert_eq!(copiers(&g), ["Holder", "UpdateStrategy"]);
        assert_eq!(g.node(id).copier_reason(), Some(&Reason::ExistingMethod));
    }

    #[test]
    fn excluded_fields_neither_trigger_nor_propagate() {
        let mut g = graph(vec![
            ("Dispatch", vec![("ID", named("string")), ("Payload", TypeExpr::slice(named("byte")))]),
            ("Wrapper", vec![("Inner", named("Child"))]),
            ("Child", vec![("Tags", TypeExpr::slice(named("string")))]),
        ]);
        let mut exclusions = ExclusionSet::default();
        exclusions.insert("Dispatch", "Payload");
        exclusions.insert("Wrapper", "Inner");
        Classifier::new(&mut g, &exclusions).classify(&[]);
        assert_eq!(copiers(&g), ["Child"]);
    }
}
