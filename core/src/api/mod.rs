//! Public API for preparing and evaluating expressions.
//!
//! An [`Engine`] compiles validated expressions against a cube into
//! [`PreparedExpression`]s. A prepared expression owns its calc tree and
//! its parameter slots, and is evaluated any number of times against
//! evaluators positioned at the cells to compute.
//!
//! ```ignore
//! let engine = Engine::new(&cube, EngineOptions::default());
//! let prepared = engine.prepare(&expr)?;
//! prepared.set_parameter_value("Threshold", ParameterValue::Scalar(Value::Number(5.0)))?;
//!
//! let mut evaluator = prepared.evaluator(provider);
//! for member in rows {
//!     let saved = evaluator.set_context(member);
//!     let value = prepared.evaluate(&mut evaluator)?;
//!     evaluator.restore([saved]);
//! }
//! ```

pub mod engine;
pub mod error;
pub mod expression;
pub mod options;

pub use engine::Engine;
pub use error::{Diagnostic, Error, Severity};
pub use expression::PreparedExpression;
pub use options::{CompilationOptions, EngineOptions, ExecutionOptions};
