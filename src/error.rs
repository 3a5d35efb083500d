//! Error and diagnostic types.
//!
//! Configuration problems abort a run ([`ConfigError`]); problems with single
//! fields or type references are collected as [`Diagnostic`]s and never stop
//! other types from being processed.

use serde::Serialize;
use thiserror::Error;

/// Operator misconfiguration, raised before any synthesis starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("at least one target type must be requested")]
    NoTargetTypesRequested,

    #[error("type '{name}' is not declared")]
    UnknownType { name: String },

    #[error("type '{name}' has no fields left to generate after exclusions")]
    NoFieldsFound { name: String },

    #[error("type '{name}' is declared more than once")]
    DuplicateType { name: String },

    #[error("malformed type name '{raw}', expected an identifier")]
    MalformedType { raw: String },

    #[error("malformed exclusion '{raw}', expected Type.Field")]
    MalformedExclusion { raw: String },

    #[error("malformed method selector '{raw}', expected Type.Method or Method")]
    MalformedMethod { raw: String },

    #[error("unknown operation '{raw}', expected copy, equals or all")]
    UnknownOperation { raw: String },

    #[error("operation '{raw}' is not supported")]
    UnsupportedOperation { raw: String },
}

/// Error type for the whole load → analyze → synthesize pipeline.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid declarations at JSON path {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON pointer '{pointer}' selects nothing")]
    MissingPointer { pointer: String },

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("glob error: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("glob pattern matched no files: {pattern}")]
    NoMatches { pattern: String },
}

/// Non-fatal finding about one field of one type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    #[error("{owner}.{field}: type '{type_name}' is not declared, treated as non-copier")]
    UnresolvableType {
        owner: String,
        field: String,
        type_name: String,
    },

    #[error("{owner}.{field}: {shape} fields are not supported, no code is generated for them")]
    UnsupportedFieldShape {
        owner: String,
        field: String,
        shape: String,
    },

    #[error("{owner}.{field}: elements of {shape} are containers and are handled by value")]
    NestedContainer {
        owner: String,
        field: String,
        shape: String,
    },
}

impl Diagnostic {
    pub fn owner(&self) -> &str {
        match self {
            Self::UnresolvableType { owner, .. }
            | Self::UnsupportedFieldShape { owner, .. }
            | Self::NestedContainer { owner, .. } => owner,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Self::UnresolvableType { field, .. }
            | Self::UnsupportedFieldShape { field, .. }
            | Self::NestedContainer { field, .. } => field,
        }
    }
}
