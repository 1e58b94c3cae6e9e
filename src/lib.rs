//! OLAP Calc - compiled evaluation of multidimensional expressions
//!
//! # Overview
//!
//! OLAP Calc turns validated, typed expressions over a cube (members,
//! tuples, sets, hierarchies, scalars) into trees of calculators and
//! evaluates them against a mutable "current position" in the cube. Cell
//! values come from a storage layer the host plugs in through
//! [`CellValueProvider`].
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use olapcalc::{CubeBuilder, Engine, EngineOptions, Expr, Function, InMemoryProvider, Value};
//!
//! let mut builder = CubeBuilder::new("Sales");
//! let unit_sales = builder.measure("Unit Sales");
//! let store = builder.hierarchy("Store", &["Country"]);
//! let cube = builder.build();
//! let all_stores = cube.default_member(&store);
//! let usa = all_stores.child("USA").unwrap();
//!
//! let mut provider = InMemoryProvider::new(&cube);
//! provider.fact(&unit_sales, &[usa.clone()], 10.0);
//!
//! // (Store.CurrentMember, Unit Sales), evaluated at USA.
//! let engine = Engine::new(&cube, EngineOptions::default());
//! let expr = Expr::call(
//!     Function::Value,
//!     vec![Expr::call(
//!         Function::Tuple,
//!         vec![
//!             Expr::call(Function::CurrentMember, vec![Expr::hierarchy(&store)]),
//!             Expr::member(&unit_sales),
//!         ],
//!     )],
//! );
//! let prepared = engine.prepare(&expr).unwrap();
//!
//! let mut evaluator = prepared.evaluator(Arc::new(provider));
//! let saved = evaluator.set_context(usa);
//! assert_eq!(prepared.evaluate_scalar(&mut evaluator).unwrap(), Value::Number(10.0));
//! evaluator.restore([saved]);
//! ```
//!
//! # Errors
//!
//! Every engine operation returns [`Error`]. [`render_error_to_string`]
//! formats one for people, with a stable code per error class.

// Re-export public API from olapcalc_core
pub use olapcalc_core::api::{
    CompilationOptions, Diagnostic, Engine, EngineOptions, Error, ExecutionOptions,
    PreparedExpression, Severity,
};

// Schema, types and expressions
pub use olapcalc_core::expr::{
    Aggregator, ArithmeticOp, CompareOp, Expr, ExprKind, Function, UserDefinedFunction,
};
pub use olapcalc_core::parameters::{Parameter, ParameterValue};
pub use olapcalc_core::types::{
    self, Category, Cube, CubeBuilder, Dimension, Hierarchy, Level, Member, MemberType, Type,
};
pub use olapcalc_core::values::{CalcValue, Value};

// Evaluation
pub use olapcalc_core::evaluator::{CellValueProvider, EvalError, Evaluator, ProviderError};
pub use olapcalc_core::memory::InMemoryProvider;

pub mod error_renderer;

pub use error_renderer::{
    ErrorReport, render_error, render_error_to, render_error_to_string,
    render_error_to_string_no_color,
};
