//! Evaluation errors.
//!
//! Null propagation is not an error and never shows up here. What does:
//!
//! - **Provider failures**: the cell value provider could not compute a
//!   value. Fatal for the current cell only; the evaluator context has been
//!   restored by the time the error reaches the caller.
//! - **User function failures**: a host-supplied function returned an error.
//! - **Defects**: a calc invoked through an entry point it does not support,
//!   or a context leak caught by verification. These indicate a bug in the
//!   compiler or in a calc node, never a user error.

use thiserror::Error;

/// Failure reported by a [`CellValueProvider`](super::CellValueProvider).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProviderError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        ProviderError {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps an underlying storage-layer error.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ProviderError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error raised while evaluating a calc.
#[derive(Debug, Error)]
pub enum EvalError {
    /// A calc was invoked through an entry point of another category.
    #[error("{calc} does not support {entry}")]
    Unsupported { calc: String, entry: &'static str },

    /// The cell value provider failed.
    #[error("cell value provider failed: {0}")]
    Provider(#[from] ProviderError),

    /// Evaluation returned without restoring a hierarchy's current member.
    #[error("context leak on {hierarchy}: expected {expected}, found {found}")]
    ContextLeak {
        hierarchy: String,
        expected: String,
        found: String,
    },

    #[error("function {name} failed: {message}")]
    UserFunction { name: String, message: String },

    /// A parameter slot holds a value of the wrong kind for the reading node.
    #[error("parameter {name} holds a {found} value where a {expected} was expected")]
    ParameterValue {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A parameter's default expression produced a value outside its
    /// declared type, such as a member of another hierarchy.
    #[error("default value of parameter {name} does not fit its type {ty}")]
    ParameterDefault { name: String, ty: String },
}

impl EvalError {
    pub fn user_function(name: &str, message: impl Into<String>) -> Self {
        EvalError::UserFunction {
            name: name.to_string(),
            message: message.into(),
        }
    }

    /// Whether this error signals a bug in the compiler or a calc node
    /// rather than a failure of the current cell.
    pub fn is_defect(&self) -> bool {
        matches!(
            self,
            EvalError::Unsupported { .. } | EvalError::ContextLeak { .. }
        )
    }
}
