//! Instruction plan handed to a method emitter.
use serde::Serialize;

use crate::config::Operation;
use crate::error::Diagnostic;
use crate::synth::{CopyInstruction, EqualsInstruction};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Plan {
    pub targets: Vec<TargetPlan>,
    /// Graph-level findings, e.g. references to undeclared types.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Everything an emitter needs for one requested type. `copy`/`equals` are
/// `None` when the operation was not requested or is already hand-written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetPlan {
    pub name: String,
    pub receiver: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copy: Option<Vec<CopyInstruction>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equals: Option<Vec<EqualsInstruction>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<Operation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Plan {
    pub fn target(&self, name: &str) -> Option<&TargetPlan> {
        self.targets.iter().find(|t| t.name == name)
    }

    /// Graph-level and per-target diagnostics together.
    pub fn all_diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .chain(self.targets.iter().flat_map(|t| t.diagnostics.iter()))
    }
}

impl TargetPlan {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            receiver: receiver_for(&name),
            name,
            copy: None,
            equals: None,
            skipped: Vec::new(),
            diagnostics: Vec::new(),
        }
    }
}

/// Single-letter receiver: the lowercased first character of the type name.
pub fn receiver_for(type_name: &str) -> String {
    type_name
        .chars()
        .next()
        .map(|c| c.to_lowercase().collect())
        .unwrap_or_default()
}
