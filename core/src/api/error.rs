//! Public error types.
//!
//! Internal errors ([`CompileError`], [`EvalError`]) are converted to these
//! at the API boundary.

use std::fmt;

use crate::compiler::CompileError;
use crate::evaluator::EvalError;

/// Public error type for all engine operations.
#[derive(Debug)]
pub enum Error {
    /// Invalid API usage (unknown parameter, value of the wrong kind).
    Api(String),

    /// The expression could not be compiled.
    Compilation { diagnostics: Vec<Diagnostic> },

    /// Evaluation failed (storage failure, user-defined function error).
    Runtime(String),

    /// An internal invariant was violated: a calc was evaluated through the
    /// wrong entry point, or a node did not restore the context.
    Defect(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Api(msg) => write!(f, "API error: {}", msg),
            Error::Compilation { diagnostics } => {
                let error_count = diagnostics
                    .iter()
                    .filter(|d| d.severity == Severity::Error)
                    .count();
                write!(f, "Compilation failed with {} error(s)", error_count)
            }
            Error::Runtime(msg) => write!(f, "Runtime error: {}", msg),
            Error::Defect(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// A compilation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,

    /// Primary diagnostic message.
    pub message: String,

    /// Optional help text suggesting how to fix the issue.
    pub help: Option<String>,

    /// Optional error code (e.g., "C001") for documentation lookup.
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

// ============================================================================
// Conversion from internal errors
// ============================================================================

impl From<CompileError> for Error {
    fn from(err: CompileError) -> Self {
        Error::Compilation {
            diagnostics: vec![err.to_diagnostic()],
        }
    }
}

impl From<EvalError> for Error {
    fn from(err: EvalError) -> Self {
        if err.is_defect() {
            Error::Defect(err.to_string())
        } else {
            Error::Runtime(err.to_string())
        }
    }
}
