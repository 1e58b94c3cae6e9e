//! Compilation and evaluation core for multidimensional expressions.
//!
//! The pipeline, leaves first:
//!
//! 1. [`types`]: static types of expressions and the schema handles they
//!    refer to (re-exported from `olapcalc-types`).
//! 2. [`expr`]: validated, typed expression trees.
//! 3. [`compiler`]: turns an expression into a tree of [`calc`]ulators,
//!    choosing specialized variants when hierarchies are statically known.
//! 4. [`evaluator`]: the mutable current-position context the calc tree is
//!    evaluated against, and the [`CellValueProvider`](evaluator::CellValueProvider)
//!    contract with the storage layer.
//! 5. [`api`]: engine, prepared expressions and options.

pub mod api;
pub mod calc;
pub mod compiler;
pub mod evaluator;
pub mod expr;
pub mod memory;
pub mod parameters;
pub mod values;

pub use olapcalc_types as types;
