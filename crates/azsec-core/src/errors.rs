//! Error types for the analysis engine

use thiserror::Error;

use crate::document::SourceRange;

/// Errors that occur while turning source text into a document
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The parser rejected the file
    #[error("Failed to parse {file}: {message}")]
    Parse { file: String, message: String },
}

/// Structurally invalid input handed to the evaluator
///
/// Parsed documents never produce these; they point at a defect in whatever
/// built the document model.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Malformed expression at {range}: {reason}")]
pub struct MalformedExpression {
    pub range: SourceRange,
    pub reason: String,
}

impl MalformedExpression {
    pub fn new(range: &SourceRange, reason: impl Into<String>) -> Self {
        Self { range: range.clone(), reason: reason.into() }
    }
}

/// Errors that abort a single rule check
#[derive(Debug, Clone, Error)]
pub enum CheckError {
    #[error(transparent)]
    MalformedExpression(#[from] MalformedExpression),
}

impl CheckError {
    /// Source range the failure points at
    pub fn range(&self) -> &SourceRange {
        match self {
            CheckError::MalformedExpression(e) => &e.range,
        }
    }
}

/// Invalid lint configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown rule '{0}'")]
    UnknownRule(String),
}
