//! Error types for the extraction and compilation pipeline.
//!
//! Library seams return these typed errors; the CLI layer wraps them with
//! `anyhow` context before reporting.

use std::{fmt::Write as _, io, path::Path, path::PathBuf};

use thiserror::Error;

use crate::core::graphql::validate::Violation;

/// Configuration errors raised while loading the schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error(
        "Error loading schema from `{}`. Expected the schema to be a .graphql file using the GraphQL schema definition language. Error detail:\n{source}",
        path.display()
    )]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "Error loading schema. Expected the schema to be a .graphql file using the GraphQL schema definition language. Error detail:\n{0}"
    )]
    Syntax(#[from] async_graphql_parser::Error),

    #[error("Invalid schema: {0}")]
    Invalid(String),
}

/// Unsupported patterns inside a tagged query template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    #[error(
        "Substitutions are not allowed in graphql fragments. Included fragments should be referenced as `...MyModule_foo`."
    )]
    Substitution,

    #[error("Unexpected empty graphql tag.")]
    Empty,

    #[error("Only `query` operations are supported, found `{0}`.")]
    UnsupportedOperation(&'static str),

    #[error("{0}")]
    Syntax(String),
}

/// Failures of a whole-project compile pass.
///
/// Any variant aborts the pass: partial results are never returned.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Failed to scan source files under `{}`", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to read `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse `{}`: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported graphql tag in `{}`: {source}", path.display())]
    Tag {
        path: PathBuf,
        #[source]
        source: TagError,
    },

    #[error("{}", format_violations(.path, .violations))]
    Validation {
        path: PathBuf,
        violations: Vec<Violation>,
    },

    #[error("Compile task did not complete: {0}")]
    Task(String),
}

impl CompileError {
    /// Rule violations carried by a validation failure, empty otherwise.
    pub fn violations(&self) -> &[Violation] {
        match self {
            CompileError::Validation { violations, .. } => violations,
            _ => &[],
        }
    }
}

/// Failures of the single-file tag extractor.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to read `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse `{}`: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported graphql tag in `{}`: {source}", path.display())]
    Tag {
        path: PathBuf,
        #[source]
        source: TagError,
    },

    #[error(
        "Compiled artifact `{}` for query `{name}` could not be read; the compiler has not run for this file",
        path.display()
    )]
    MissingArtifact {
        name: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn format_violations(path: &Path, violations: &[Violation]) -> String {
    let mut out = format!("GraphQL validation failed in `{}`:", path.display());
    for violation in violations {
        let _ = write!(out, "\n  {violation}");
    }
    out
}
