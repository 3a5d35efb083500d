//! Seam for method emitters, plus a plain-text outline for debugging.
//!
//! Real emitters render target-language source from a [`Plan`]. The
//! [`Outline`] shipped here lists the instructions one per line, with the
//! receiver and method header, so a plan can be eyeballed from the terminal.

use std::fmt::Write as _;

use crate::plan::{Plan, TargetPlan};
use crate::synth::{CopyInstruction, ElementCompare, EqualsInstruction};

pub trait MethodEmitter {
    type Error;

    fn emit_copy(&mut self, target: &TargetPlan, body: &[CopyInstruction]) -> Result<(), Self::Error>;

    fn emit_equals(&mut self, target: &TargetPlan, body: &[EqualsInstruction]) -> Result<(), Self::Error>;
}

/// Drive `emitter` over every target, copy before equals.
pub fn render_plan<E: MethodEmitter>(plan: &Plan, emitter: &mut E) -> Result<(), E::Error> {
    for target in &plan.targets {
        if let Some(body) = &target.copy {
            emitter.emit_copy(target, body)?;
        }
        if let Some(body) = &target.equals {
            emitter.emit_equals(target, body)?;
        }
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct Outline {
    buf: String,
}

impl Outline {
    pub fn new() -> Self { Self::default() }

    pub fn into_string(self) -> String { self.buf }

    fn header(&mut self, target: &TargetPlan, method: &str, returns: &str) -> std::fmt::Result {
        if !self.buf.is_empty() {
            self.buf.push('\n');
        }
        writeln!(self.buf, "({} *{}) {method}() {returns}", target.receiver, target.name)
    }
}

impl MethodEmitter for Outline {
    type Error = std::fmt::Error;

    fn emit_copy(&mut self, target: &TargetPlan, body: &[CopyInstruction]) -> std::fmt::Result {
        self.header(target, "Copy", &format!("*{}", target.name))?;
        writeln!(self.buf, "  shallow-copy {}", target.receiver)?;
        for ins in body {
            let line = match ins {
                CopyInstruction::Recurse { field, target } => format!("{field}: recurse {target}"),
                CopyInstruction::ShallowPointer { field, target } => {
                    format!("{field}: shallow-pointer {target}")
                }
                CopyInstruction::RecurseValue { field, target } => {
                    format!("{field}: recurse-value {target}")
                }
                CopyInstruction::CopyContainerRecurse { field, element, by_pointer } => {
                    format!("{field}: copy-container-recurse {}{element}", star(*by_pointer))
                }
                CopyInstruction::CopyContainerPrimitive { field, helper } => {
                    format!("{field}: copy-container-primitive {}", helper.name())
                }
                CopyInstruction::CopyContainerGeneric { field, element } => {
                    format!("{field}: copy-container-generic {element}")
                }
                CopyInstruction::CopyMapRecurse { field, key, value, by_pointer } => {
                    format!("{field}: copy-map-recurse {key} -> {}{value}", star(*by_pointer))
                }
                CopyInstruction::CopyMapPrimitive { field, helper } => {
                    format!("{field}: copy-map-primitive {}", helper.name())
                }
                CopyInstruction::CopyMapGeneric { field, key, value } => {
                    format!("{field}: copy-map-generic {key} -> {value}")
                }
            };
            writeln!(self.buf, "  {line}")?;
        }
        Ok(())
    }

    fn emit_equals(&mut self, target: &TargetPlan, body: &[EqualsInstruction]) -> std::fmt::Result {
        self.header(target, "Equals", "bool")?;
        for ins in body {
            let line = match ins {
                EqualsInstruction::Compare { field } => format!("{field}: compare"),
                EqualsInstruction::ComparePointee { field, target } => {
                    format!("{field}: compare-pointee {target}")
                }
                EqualsInstruction::Delegate { field, target, by_pointer } => {
                    format!("{field}: delegate {}{target}", star(*by_pointer))
                }
                EqualsInstruction::CompareContainer { field, element } => {
                    format!("{field}: compare-container {}", element_label(element))
                }
                EqualsInstruction::CompareMap { field, value } => {
                    format!("{field}: compare-map {}", element_label(value))
                }
            };
            writeln!(self.buf, "  {line}")?;
        }
        Ok(())
    }
}

fn star(by_pointer: bool) -> &'static str {
    if by_pointer { "*" } else { "" }
}

fn element_label(compare: &ElementCompare) -> String {
    match compare {
        ElementCompare::Direct => "direct".to_string(),
        ElementCompare::Pointee => "pointee".to_string(),
        ElementCompare::Delegate { target, by_pointer } => {
            format!("delegate {}{target}", star(*by_pointer))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::SliceHelper;
    use pretty_assertions::assert_eq;

    #[test]
    fn outline_lists_instructions_per_method() {
        let mut job = TargetPlan::new("Job");
        job.copy = Some(vec![
            CopyInstruction::ShallowPointer { field: "Owner".into(), target: "Team".into() },
            CopyInstruction::CopyContainerPrimitive { field: "Tags".into(), helper: SliceHelper::String },
        ]);
        job.equals = Some(vec![
            EqualsInstruction::Compare { field: "ID".into() },
            EqualsInstruction::CompareContainer { field: "Tags".into(), element: ElementCompare::Direct },
        ]);
        let plan = Plan { targets: vec![job], diagnostics: Vec::new() };

        let mut outline = Outline::new();
        render_plan(&plan, &mut outline).unwrap();
        assert_eq!(
            outline.into_string(),
            "(j *Job) Copy() *Job\n\
             \x20 shallow-copy j\n\
             \x20 Owner: shallow-pointer Team\n\
             \x20 Tags: copy-container-primitive CopySliceString\n\
             \n\
             (j *Job) Equals() bool\n\
             \x20 ID: compare\n\
             \x20 Tags: compare-container direct\n"
        );
    }

    #[test]
    fn emitter_errors_stop_rendering() {
        struct Failing(usize);
        impl MethodEmitter for Failing {
            type Error = &'static str;
            fn emit_copy(&mut self, _: &TargetPlan, _: &[CopyInstruction]) -> Result<(), Self::Error> {
                self.0 += 1;
                Err("boom")
            }
            fn emit_equals(&mut self, _: &TargetPlan, _: &[EqualsInstruction]) -> Result<(), Self::Error> {
                self.0 += 1;
                Ok(())
            }
        }
        let mut a = TargetPlan::new("A");
        a.copy = Some(Vec::new());
        a.equals = Some(Vec::new());
        let plan = Plan { targets: vec![a.clone(), a], diagnostics: Vec::new() };
        let mut emitter = Failing(0);
        assert_eq!(render_plan(&plan, &mut emitter), Err("boom"));
        assert_eq!(emitter.0, 1);
    }
}
