//! Resolution errors and diagnostics.
//!
//! The pipeline fails soft: a missing reference, a failed fetch or a
//! structural cycle degrades the affected subtree and records a
//! diagnostic, it never aborts the whole tree. [`ResolveError`] is
//! reserved for conditions the caller must see, like a failed top-level
//! lookup.

use folia_case::Str;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type ResolveResult<T> = Result<T, ResolveError>;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("page '{0}' not found")]
    PageNotFound(Str),

    #[error("resolution deadline exceeded")]
    DeadlineExceeded,
}

/// Error surface of the repository collaborators.
#[derive(Error, Debug, Clone)]
pub enum RepositoryError {
    #[error("data fetch failed: {0}")]
    Fetch(Str),

    #[error("data fetch timed out")]
    Timeout,
}

/// Severity of a collected diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    /// Component, collection, asset or page id not found.
    ReferenceMissing,
    /// A repository call failed; the subtree degraded.
    DataFetchFailure,
    /// A component would instance itself transitively.
    ComponentCycle,
    /// A reference-field chain revisited an item.
    ReferenceCycle,
    /// A variable had an unexpected shape and was treated as absent.
    MalformedVariable,
}

impl DiagnosticCode {
    pub fn message(&self) -> &'static str {
        match self {
            Self::ReferenceMissing => "Referenced entity not found.",
            Self::DataFetchFailure => "Data fetch failed; subtree degraded.",
            Self::ComponentCycle => "Component instances itself; expansion stopped.",
            Self::ReferenceCycle => "Reference chain revisits an item; hop skipped.",
            Self::MalformedVariable => "Malformed variable treated as absent.",
        }
    }
}

/// One fail-soft event, attached to the layer it degraded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub layer_id: Str,
    pub detail: Str,
}

impl Diagnostic {
    pub fn warning(code: DiagnosticCode, layer_id: impl Into<Str>, detail: impl Into<Str>) -> Self {
        Self {
            code,
            severity: Severity::Warning,
            layer_id: layer_id.into(),
            detail: detail.into(),
        }
    }
}
