//! Public error types for the calyx API.
//!
//! This module defines the stable error types exposed to library users.
//! Internal errors (`ParserError`, `ExecutionError`) are converted to these
//! public types at API boundaries.

use crate::evaluator::ExecutionError;
use crate::lexer::Span;
use crate::parser::ParserError;
use std::fmt;

/// Public error type for all calyx operations.
#[derive(Debug)]
pub enum Error {
    /// Invalid API usage (e.g., evaluating an expression that was never compiled).
    Api(String),

    /// Compilation errors (lexer, token, syntax, symbol-table, parser errors).
    ///
    /// Contains one diagnostic per collected error, in the order they were raised.
    Compilation {
        diagnostics: Vec<Diagnostic>,
        source: String,
    },

    /// Runtime errors raised during evaluation.
    Runtime(String),

    /// Resource limits exceeded (e.g., loop iteration bound).
    ResourceExceeded(String),
}

impl Error {
    /// Build a compilation error from the parser's error list.
    pub fn compilation(errors: &[ParserError], source: &str) -> Self {
        Error::Compilation {
            diagnostics: errors.iter().map(ParserError::to_diagnostic).collect(),
            source: source.to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Api(msg) => write!(f, "API error: {}", msg),
            Error::Compilation { diagnostics, .. } => {
                let error_count = diagnostics
                    .iter()
                    .filter(|d| d.severity == Severity::Error)
                    .count();
                write!(f, "Compilation failed with {} error(s)", error_count)
            }
            Error::Runtime(msg) => write!(f, "Runtime error: {}", msg),
            Error::ResourceExceeded(msg) => write!(f, "Resource limit exceeded: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<ExecutionError> for Error {
    fn from(err: ExecutionError) -> Self {
        match err {
            ExecutionError::LoopLimit { .. } => Error::ResourceExceeded(err.to_string()),
            ExecutionError::Aborted { .. } => Error::Runtime(err.to_string()),
        }
    }
}

/// A diagnostic message (error, warning, or info) with source location.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level (error, warning, info).
    pub severity: Severity,

    /// Primary diagnostic message.
    pub message: String,

    /// Source location of the primary issue.
    pub span: Span,

    /// Related locations that provide additional context.
    pub related: Vec<RelatedInfo>,

    /// Optional help text suggesting how to fix the issue.
    pub help: Vec<String>,

    /// Optional error code (e.g., "E-SYNTAX") for documentation lookup.
    pub code: Option<String>,
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Error - compilation cannot succeed.
    Error,
    /// Warning - suspicious code that might be wrong.
    Warning,
    /// Info - informational message.
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Related information for a diagnostic (e.g., "declared here").
#[derive(Debug, Clone)]
pub struct RelatedInfo {
    /// Source location of the related information.
    pub span: Span,

    /// Message explaining the relevance.
    pub message: String,
}
