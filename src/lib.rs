//! Deep-copy and structural-equality planning for record types.
//!
//! Given the record declarations a front end found (types, their ordered
//! fields and declared field shapes, plus any hand-written methods), `copygen`
//! decides which types need a field-aware deep copy (*copiers*), propagates
//! that need across the containment graph (cycles included), and produces an
//! ordered per-field instruction list for the `Copy` and `Equals` methods of
//! every requested type. Rendering the instructions into source is left to a
//! [`render::MethodEmitter`].
//!
//! ```
//! use copygen::decl::{Declarations, TypeDecl, TypeExpr};
//! use copygen::config::GenerateConfig;
//!
//! let decls = Declarations::new().with_type(
//!     TypeDecl::new("Job")
//!         .field("ID", TypeExpr::named("string"))
//!         .field("Tags", TypeExpr::slice(TypeExpr::named("string"))),
//! );
//! let plan = copygen::generate(&decls, GenerateConfig::new().target("Job")).unwrap();
//! assert_eq!(plan.targets[0].receiver, "j");
//! ```
pub mod analysis;
pub mod classify;
pub mod config;
pub mod decl;
pub mod error;
pub mod graph;
pub mod plan;
pub mod render;
pub mod synth;

pub use analysis::{Analysis, ClassificationReport, CopierEntry};
pub use config::{ExclusionSet, GenerateConfig, Operation, OperationSet};
pub use error::{ConfigError, Diagnostic, GenerateError};
pub use plan::{Plan, TargetPlan};

/// Build, classify and synthesize in one call.
pub fn generate(decls: &decl::Declarations, config: GenerateConfig) -> Result<Plan, GenerateError> {
    let mut analysis = Analysis::new(config);
    analysis.declare(decls)?;
    Ok(analysis.plan()?)
}
