//! Run configuration: requested targets, excluded fields, requested operations.
//!
//! One [`GenerateConfig`] value is built per invocation and handed to the
//! analysis; nothing here outlives the run.

use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::ConfigError;
use crate::graph::{TypeGraph, TypeId};
use crate::synth::remaining_fields;

static IDENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex")
});

static QUALIFIED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_]*)$").expect("selector regex")
});

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Operation {
    Copy,
    Equals,
}

/// Which operations to synthesize for a type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationSet {
    copy: bool,
    equals: bool,
}

/// Fields omitted from synthesis, keyed by owning type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    by_type: IndexMap<String, IndexSet<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateConfig {
    targets: IndexSet<String>,
    exclusions: ExclusionSet,
    global_ops: OperationSet,
    type_ops: IndexMap<String, OperationSet>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Operation {
    pub const ALL: [Operation; 2] = [Operation::Copy, Operation::Equals];

    /// Method name as it appears on a receiver type.
    pub fn method_name(self) -> &'static str {
        match self {
            Self::Copy => "Copy",
            Self::Equals => "Equals",
        }
    }

    /// Match a hand-written method name against the operations we synthesize.
    pub fn from_method_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.method_name().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.method_name())
    }
}

impl OperationSet {
    pub fn all() -> Self { Self { copy: true, equals: true } }
    pub fn only(op: Operation) -> Self { Self::default().with(op) }

    pub fn with(mut self, op: Operation) -> Self {
        match op {
            Operation::Copy => self.copy = true,
            Operation::Equals => self.equals = true,
        }
        self
    }

    pub fn union(self, other: Self) -> Self {
        Self { copy: self.copy || other.copy, equals: self.equals || other.equals }
    }

    pub fn contains(&self, op: Operation) -> bool {
        match op {
            Operation::Copy => self.copy,
            Operation::Equals => self.equals,
        }
    }

    pub fn is_empty(&self) -> bool { !self.copy && !self.equals }

    pub fn iter(&self) -> impl Iterator<Item = Operation> + '_ {
        Operation::ALL.into_iter().filter(|op| self.contains(*op))
    }

    /// `copy`, `equals` or `all`, case-insensitive.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::all()),
            "copy" => Ok(Self::only(Operation::Copy)),
            "equals" => Ok(Self::only(Operation::Equals)),
            "diff" | "merge" => Err(ConfigError::UnsupportedOperation { raw: raw.to_string() }),
            _ => Err(ConfigError::UnknownOperation { raw: raw.to_string() }),
        }
    }
}

impl ExclusionSet {
    pub fn insert(&mut self, type_name: impl Into<String>, field: impl Into<String>) {
        self.by_type.entry(type_name.into()).or_default().insert(field.into());
    }

    /// Parse one `Type.Field` selector.
    pub fn insert_selector(&mut self, raw: &str) -> Result<(), ConfigError> {
        let caps = QUALIFIED
            .captures(raw.trim())
            .ok_or_else(|| ConfigError::MalformedExclusion { raw: raw.to_string() })?;
        self.insert(&caps[1], &caps[2]);
        Ok(())
    }

    pub fn contains(&self, type_name: &str, field: &str) -> bool {
        self.by_type
            .get(type_name)
            .is_some_and(|fields| fields.contains(field))
    }

    pub fn fields_of(&self, type_name: &str) -> impl Iterator<Item = &str> {
        self.by_type.get(type_name).into_iter().flatten().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool { self.by_type.is_empty() }
}

impl GenerateConfig {
    pub fn new() -> Self { Self::default() }

    pub fn target(mut self, name: impl Into<String>) -> Self {
        self.targets.insert(name.into());
        self
    }

    pub fn exclude(mut self, type_name: impl Into<String>, field: impl Into<String>) -> Self {
        self.exclusions.insert(type_name, field);
        self
    }

    /// Request `ops` for one type, or for every target when `type_name` is `None`.
    pub fn request(mut self, type_name: Option<&str>, ops: OperationSet) -> Self {
        match type_name {
            None => self.global_ops = self.global_ops.union(ops),
            Some(name) => {
                let entry = self.type_ops.entry(name.to_string()).or_default();
                *entry = entry.union(ops);
            }
        }
        self
    }

    /// Build from the raw operator selectors (`--type`, `--exclude`, `--method`).
    pub fn from_selectors<T, E, M>(types: T, excludes: E, methods: M) -> Result<Self, ConfigError>
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
        M: IntoIterator,
        M::Item: AsRef<str>,
    {
        let mut config = Self::new();
        for name in types {
            let name = name.as_ref().trim();
            if !IDENT.is_match(name) {
                return Err(ConfigError::MalformedType { raw: name.to_string() });
            }
            config.targets.insert(name.to_string());
        }
        for raw in excludes {
            config.exclusions.insert_selector(raw.as_ref())?;
        }
        for raw in methods {
            let raw = raw.as_ref().trim();
            if let Some(caps) = QUALIFIED.captures(raw) {
                let ops = OperationSet::parse(&caps[2])?;
                config = config.request(Some(&caps[1]), ops);
            } else if IDENT.is_match(raw) {
                let ops = OperationSet::parse(raw)?;
                config = config.request(None, ops);
            } else {
                return Err(ConfigError::MalformedMethod { raw: raw.to_string() });
            }
        }
        Ok(config)
    }

    pub fn targets(&self) -> impl ExactSizeIterator<Item = &str> {
        self.targets.iter().map(String::as_str)
    }

    pub fn is_target(&self, name: &str) -> bool { self.targets.contains(name) }

    pub fn exclusions(&self) -> &ExclusionSet { &self.exclusions }

    /// Check the requested targets against a loaded graph. Returns their ids
    /// in request order.
    pub fn validate(&self, graph: &TypeGraph) -> Result<Vec<TypeId>, ConfigError> {
        if self.targets.is_empty() {
            return Err(ConfigError::NoTargetTypesRequested);
        }
        let mut ids = Vec::with_capacity(self.targets.len());
        for name in &self.targets {
            let id = graph
                .id_of(name)
                .filter(|id| graph.node(*id).declared)
                .ok_or_else(|| ConfigError::UnknownType { name: name.clone() })?;
            if remaining_fields(graph, id, &self.exclusions) == 0 {
                return Err(ConfigError::NoFieldsFound { name: name.clone() });
            }
            ids.push(id);
        }
        Ok(ids)
    }

    /// Operations requested for `type_name`. A type no selector mentions
    /// gets every operation.
    pub fn operations_for(&self, type_name: &str) -> OperationSet {
        let scoped = self.type_ops.get(type_name).copied().unwrap_or_default();
        let ops = self.global_ops.union(scoped);
        if ops.is_empty() { OperationSet::all() } else { ops }
    }
}
