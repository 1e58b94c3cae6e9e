//! Compilation errors.

use olapcalc_types::{Category, Type};
use thiserror::Error;

use crate::api::{Diagnostic, Severity};

/// Errors that abort the preparation of a query.
///
/// These are reported once, at compile time, and never retried. Expressions
/// are validated before compilation, so most of these indicate a mismatch
/// between the validator and the compiler rather than a user typo.
#[derive(Debug, Clone, Error)]
pub enum CompileError {
    /// The expression cannot produce the category the context requires.
    #[error("cannot compile {expr} of type {found} as {expected}")]
    CategoryMismatch {
        expr: String,
        expected: Category,
        found: Type,
    },

    /// The expression's category has no calculator (cube, symbol).
    #[error("no calculator for {category} expression {expr}")]
    NoCalc { expr: String, category: Category },

    #[error("parameter {name} has unsupported type {ty}")]
    UnsupportedParameterType { name: String, ty: Type },

    #[error("default value of parameter {name} refers to the parameter itself")]
    RecursiveParameter { name: String },

    #[error("{function} expects {expected} argument(s), got {found}")]
    ArgumentCount {
        function: String,
        expected: &'static str,
        found: usize,
    },
}

impl CompileError {
    /// Convert to a Diagnostic for API boundary.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let (code, help) = match self {
            CompileError::CategoryMismatch { .. } => (
                "C001",
                Some("the validator should have inserted a conversion or rejected the expression"),
            ),
            CompileError::NoCalc { .. } => ("C002", None),
            CompileError::UnsupportedParameterType { .. } => (
                "C003",
                Some("parameters must be strings, numbers, members or sets of members"),
            ),
            CompileError::RecursiveParameter { .. } => ("C004", None),
            CompileError::ArgumentCount { .. } => ("C005", None),
        };
        Diagnostic {
            severity: Severity::Error,
            message: self.to_string(),
            help: help.map(String::from),
            code: Some(String::from(code)),
        }
    }
}
