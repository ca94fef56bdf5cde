use crate::model::Definition;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DefscopeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Parsing error: {0}")]
    Parsing(String),
    #[error("Module load failed: {0}")]
    ModuleLoad(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Path not found: {0}")]
    PathNotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, DefscopeError>;

/// Outcome of an exact-definition lookup that did not yield a single match.
///
/// Ambiguity is reported with the full candidate set so callers can show
/// diagnostics instead of picking one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    #[error("definition not found: {file} {identifier}")]
    NotFound { file: String, identifier: String },
    #[error("found {} candidate definitions for {file} {identifier} {keywords:?}", candidates.len())]
    Ambiguous {
        file: String,
        identifier: String,
        keywords: Vec<String>,
        candidates: Vec<Definition>,
    },
}

impl LookupError {
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, LookupError::Ambiguous { .. })
    }
}
