//! One analysis run: build the graph, classify, synthesize.
//!
//! Graph construction and classification are sequential and need `&mut self`.
//! [`Analysis::plan`] takes `&self`, so the classification it reads is
//! already at its fixed point when the per-target synthesis fans out.

use indexmap::IndexSet;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classify::{Classifier, Reason};
use crate::config::{GenerateConfig, Operation};
use crate::decl::{Declarations, FieldDecl};
use crate::error::{ConfigError, Diagnostic};
use crate::graph::{TypeGraph, TypeId};
use crate::plan::{Plan, TargetPlan};
use crate::synth::{CopySynthesizer, EqualsSynthesizer};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug)]
pub struct Analysis {
    config: GenerateConfig,
    graph: TypeGraph,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CopierEntry {
    pub name: String,
    #[serde(flatten)]
    pub reason: Reason,
}

/// Output of `copygen analyze`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub copiers: Vec<CopierEntry>,
    /// Declared types that need no deep copy.
    pub plain: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Analysis {
    pub fn new(config: GenerateConfig) -> Self {
        Self { config, graph: TypeGraph::new() }
    }

    pub fn config(&self) -> &GenerateConfig { &self.config }

    pub fn graph(&self) -> &TypeGraph { &self.graph }

    /// Register a declaration document, then bring classification back to
    /// its fixed point.
    /// Duplicate names are rejected before anything is added, so a failed
    /// call leaves the analysis unchanged.
    pub fn declare(&mut self, decls: &Declarations) -> Result<(), ConfigError> {
        let mut seen = IndexSet::new();
        for decl in &decls.types {
            let taken = self.graph.get(&decl.name).is_some_and(|n| n.declared);
            if taken || !seen.insert(decl.name.as_str()) {
                return Err(ConfigError::DuplicateType { name: decl.name.clone() });
            }
        }
        for decl in &decls.types {
            let id = self.graph.declare_type(&decl.name)?;
            for field in &decl.fields {
                self.graph.add_field(id, field);
            }
        }
        for method in &decls.methods {
            match Operation::from_method_name(&method.name) {
                Some(op) => {
                    let id = self.graph.add_or_get_type(&method.receiver);
                    self.graph.record_method(id, op);
                }
                None => debug!(receiver = %method.receiver, method = %method.name, "ignored method"),
            }
        }
        self.classify();
        Ok(())
    }

    /// Add one field to an already declared type. Only the new field is
    /// evaluated; anything it makes a copier is propagated at once.
    pub fn add_field(&mut self, owner: &str, field: FieldDecl) -> Result<usize, ConfigError> {
        let id = self.declared(owner)?;
        let index = self.graph.add_field(id, &field);
        let flipped = Classifier::new(&mut self.graph, self.config.exclusions()).field_added(id, index);
        debug!(owner, field = %field.name, flipped, "added field");
        Ok(flipped)
    }

    /// Full classification pass. Idempotent; returns how many types flipped.
    pub fn classify(&mut self) -> usize {
        let requested = self
            .config
            .targets()
            .filter_map(|name| self.graph.id_of(name))
            .collect::<Vec<_>>();
        Classifier::new(&mut self.graph, self.config.exclusions()).classify(&requested)
    }

    pub fn is_copier(&self, name: &str) -> bool {
        self.graph.get(name).is_some_and(|n| n.is_copier())
    }

    /// Copier types in graph order, with the reason each was first marked.
    pub fn copiers(&self) -> Vec<CopierEntry> {
        self.graph
            .iter()
            .filter_map(|(_, node)| {
                let reason = node.copier_reason()?.clone();
                Some(CopierEntry { name: node.name.clone(), reason })
            })
            .collect()
    }

    pub fn report(&self) -> ClassificationReport {
        ClassificationReport {
            copiers: self.copiers(),
            plain: self
                .graph
                .iter()
                .filter(|(_, n)| n.declared && !n.is_copier())
                .map(|(_, n)| n.name.clone())
                .collect(),
            diagnostics: self.diagnostics(),
        }
    }

    /// Graph-level diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let diags = self.graph.unresolved();
        for diag in &diags {
            warn!("{diag}");
        }
        diags
    }

    /// Validate the configuration and synthesize every requested target.
    /// Targets keep request order.
    pub fn plan(&self) -> Result<Plan, ConfigError> {
        let ids = self.config.validate(&self.graph)?;
        let targets = ids
            .par_iter()
            .map(|id| self.plan_target(*id))
            .collect::<Vec<_>>();
        Ok(Plan { targets, diagnostics: self.diagnostics() })
    }

    fn plan_target(&self, id: TypeId) -> TargetPlan {
        let node = self.graph.node(id);
        let exclusions = self.config.exclusions();
        let mut plan = TargetPlan::new(&node.name);
        let mut diagnostics = IndexSet::new();

        for op in self.config.operations_for(&node.name).iter() {
            if node.has_method(op) {
                debug!(type_name = %node.name, %op, "hand-written method exists, skipped");
                plan.skipped.push(op);
                continue;
            }
            match op {
                Operation::Copy => {
                    let out = CopySynthesizer::new(&self.graph, id, exclusions).synthesize();
                    diagnostics.extend(out.diagnostics);
                    plan.copy = Some(out.instructions);
                }
                Operation::Equals => {
                    let out = EqualsSynthesizer::new(&self.graph, id, exclusions).synthesize();
                    diagnostics.extend(out.diagnostics);
                    plan.equals = Some(out.instructions);
                }
            }
        }
        plan.diagnostics = diagnostics.into_iter().collect();
        info!(
            type_name = %plan.name,
            copy = plan.copy.as_ref().map_or(0, Vec::len),
            equals = plan.equals.as_ref().map_or(0, Vec::len),
            "synthesized"
        );
        plan
    }

    fn declared(&self, name: &str) -> Result<TypeId, ConfigError> {
        self.graph
            .id_of(name)
            .filter(|id| self.graph.node(*id).declared)
            .ok_or_else(|| ConfigError::UnknownType { name: name.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{TypeDecl, TypeExpr};
    use crate::synth::CopyInstruction;
    use pretty_assertions::assert_eq;

    fn job_and_team() -> Declarations {
        Declarations::new()
            .with_type(
                TypeDecl::new("Job")
                    .field("ID", TypeExpr::named("string"))
                    .field("Owner", TypeExpr::pointer(TypeExpr::named("Team"))),
            )
            .with_type(TypeDecl::new("Team").field("Name", TypeExpr::named("string")))
    }

    #[test]
    fn hand_written_methods_are_skipped() {
        let decls = job_and_team().with_method("Job", "Equals");
        let mut analysis = Analysis::new(GenerateConfig::new().target("Job"));
        analysis.declare(&decls).unwrap();
        let plan = analysis.plan().unwrap();
        let job = plan.target("Job").unwrap();
        assert_eq!(job.skipped, vec![Operation::Equals]);
        assert!(job.equals.is_none());
        assert_eq!(job.copy.as_deref().map(<[_]>::len), Some(1));
    }

    #[test]
    fn report_lists_reasons() {
        let mut analysis = Analysis::new(GenerateConfig::new().target("Team"));
        analysis.declare(&job_and_team()).unwrap();
        let report = analysis.report();
        assert_eq!(report.copiers, vec![
            CopierEntry {
                name: "Job".into(),
                reason: Reason::Propagated { from: "Team".into(), field: "Owner".into() },
            },
            CopierEntry { name: "Team".into(), reason: Reason::Requested },
        ]);
        assert!(report.plain.is_empty());
    }

    #[test]
    fn duplicate_declarations_leave_graph_untouched() {
        let mut analysis = Analysis::new(GenerateConfig::new().target("Job"));
        analysis.declare(&job_and_team()).unwrap();
        let before = analysis.graph().len();

        let clash = Declarations::new()
            .with_type(TypeDecl::new("Extra").field("Tags", TypeExpr::slice(TypeExpr::named("string"))))
            .with_type(TypeDecl::new("Job"));
        assert_eq!(analysis.declare(&clash), Err(ConfigError::DuplicateType { name: "Job".into() }));
        assert_eq!(analysis.graph().len(), before);
        assert!(analysis.graph().get("Extra").is_none());

        let twice = Declarations::new()
            .with_type(TypeDecl::new("Fresh"))
            .with_type(TypeDecl::new("Fresh"));
        assert_eq!(analysis.declare(&twice), Err(ConfigError::DuplicateType { name: "Fresh".into() }));
        assert!(analysis.graph().get("Fresh").is_none());
    }

    #[test]
    fn add_field_rejects_undeclared_owner() {
        let mut analysis = Analysis::new(GenerateConfig::new());
        analysis.declare(&job_and_team()).unwrap();
        assert_eq!(
            analysis.add_field("Ghost", FieldDecl::new("X", TypeExpr::named("int"))),
            Err(ConfigError::UnknownType { name: "Ghost".into() })
        );
    }

    #[test]
    fn targets_keep_request_order() {
        let decls = job_and_team();
        let config = GenerateConfig::new().target("Team").target("Job");
        let mut analysis = Analysis::new(config);
        analysis.declare(&decls).unwrap();
        let plan = analysis.plan().unwrap();
        let names = plan.targets.iter().map(|t| t.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["Team", "Job"]);
        // Team is requested, so Job's pointer recurses
        assert_eq!(plan.target("Job").unwrap().copy.as_deref(), Some(&[CopyInstruction::Recurse {
            field: "Owner".into(),
            target: "Team".into(),
        }][..]));
    }
}
