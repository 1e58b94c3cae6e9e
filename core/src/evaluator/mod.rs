//! The evaluation context and its contract with the storage layer.
//!
//! An [`Evaluator`] holds the current dimensional position: one current
//! member per hierarchy. Calc nodes read it, override it temporarily, and
//! ask the [`CellValueProvider`] for the value of the current measure at the
//! resulting position.
//!
//! ## Protocol
//!
//! - [`Evaluator::get_context`] is an O(1) lookup by hierarchy ordinal.
//! - [`Evaluator::set_context`] installs a member and returns the prior
//!   occupant. The caller owns that "undo token" and must hand it back with
//!   [`Evaluator::restore`] before returning, on every path.
//! - [`Evaluator::push`] returns an independent copy. Iterating nodes work on
//!   the copy and drop it, so their overrides never reach the caller.

mod context;
mod error;
mod provider;

#[cfg(test)]
mod context_test;

pub use context::Evaluator;
pub use error::{EvalError, ProviderError};
pub use provider::CellValueProvider;
