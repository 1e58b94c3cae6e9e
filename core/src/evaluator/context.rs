//! The evaluation context.

use std::fmt;
use std::sync::Arc;

use olapcalc_types::{Cube, Hierarchy, Member};
use tracing::warn;

use super::{CellValueProvider, EvalError};
use crate::parameters::{ParameterSlot, ParameterValue};
use crate::values::Value;

/// The current dimensional position, threaded through evaluation.
///
/// Holds one current member per hierarchy of the cube, indexed by hierarchy
/// ordinal. Calc nodes override members with [`Evaluator::set_context`] and
/// are solely responsible for handing the returned prior member back before
/// they return.
///
/// An evaluator is not shareable: one thread mutates it at a time. Nodes that
/// iterate use a disposable copy from [`Evaluator::push`].
#[derive(Clone)]
pub struct Evaluator {
    cube: Cube,
    provider: Arc<dyn CellValueProvider>,
    context: Vec<Member>,
}

impl Evaluator {
    /// Creates an evaluator positioned at the cube's default members.
    pub fn new(cube: &Cube, provider: Arc<dyn CellValueProvider>) -> Self {
        Evaluator {
            cube: cube.clone(),
            provider,
            context: cube.default_members().to_vec(),
        }
    }

    pub fn cube(&self) -> &Cube {
        &self.cube
    }

    pub fn provider(&self) -> &Arc<dyn CellValueProvider> {
        &self.provider
    }

    /// Current member of `hierarchy`.
    ///
    /// # Panics
    ///
    /// If `hierarchy` does not belong to this evaluator's cube.
    pub fn get_context(&self, hierarchy: &Hierarchy) -> &Member {
        &self.context[hierarchy.ordinal()]
    }

    /// Current member of `hierarchy` as resolved by the provider.
    pub fn current_member(&self, hierarchy: &Hierarchy) -> Member {
        self.provider.get_context(self, hierarchy)
    }

    /// The current measure.
    pub fn current_measure(&self) -> &Member {
        &self.context[self.cube.measures_hierarchy().ordinal()]
    }

    /// Every current member, in hierarchy ordinal order.
    pub fn members(&self) -> &[Member] {
        &self.context
    }

    /// Installs `member` as the current member of its hierarchy and returns
    /// the member it replaced.
    ///
    /// Setting the member that is already current returns that member and
    /// changes nothing. A hierarchy-less null member has no slot to occupy; it
    /// is returned unchanged.
    pub fn set_context(&mut self, member: Member) -> Member {
        match member.hierarchy().map(Hierarchy::ordinal) {
            Some(ordinal) => std::mem::replace(&mut self.context[ordinal], member),
            None => member,
        }
    }

    /// Hands back prior members returned by [`Evaluator::set_context`], given
    /// in the order they were saved. They are reinstalled last-saved first,
    /// so overriding one hierarchy twice still restores the original member.
    pub fn restore<I>(&mut self, saved: I)
    where
        I: IntoIterator<Item = Member>,
        I::IntoIter: DoubleEndedIterator,
    {
        for member in saved.into_iter().rev() {
            self.set_context(member);
        }
    }

    /// An independent copy sharing the provider and the current position.
    /// Overrides on the copy are never visible here.
    pub fn push(&self) -> Evaluator {
        self.clone()
    }

    /// Value of the current measure at the current position.
    pub fn evaluate_current(&self) -> Result<Value, EvalError> {
        Ok(self.provider.evaluate_current_measure(self)?)
    }

    /// Whether `members` position the current measure on an unrelated
    /// dimension. Delegates to the provider.
    pub fn needs_null_for_unrelated_dimension(&self, members: &[Member]) -> bool {
        self.provider.needs_null_for_unrelated_dimension(self, members)
    }

    /// Reads a parameter through the provider.
    ///
    /// A value fetched for a slot that has not been explicitly assigned is
    /// memoized in the slot, without marking it assigned.
    pub fn parameter_value(&mut self, slot: &ParameterSlot) -> Result<ParameterValue, EvalError> {
        let provider = Arc::clone(&self.provider);
        let value = provider.get_parameter_value(self, slot)?;
        if !slot.is_set() {
            slot.set_value(value.clone(), false);
        }
        Ok(value)
    }

    /// Fails if the position differs from `snapshot`, a copy of
    /// [`Evaluator::members`] taken earlier.
    pub fn verify_restored(&self, snapshot: &[Member]) -> Result<(), EvalError> {
        let leaked = self
            .context
            .iter()
            .zip(snapshot)
            .zip(self.cube.hierarchies())
            .find(|((now, before), _)| now != before);
        match leaked {
            None => Ok(()),
            Some(((found, expected), hierarchy)) => {
                warn!(
                    hierarchy = hierarchy.unique_name(),
                    expected = expected.unique_name(),
                    found = found.unique_name(),
                    "evaluation did not restore the context"
                );
                Err(EvalError::ContextLeak {
                    hierarchy: hierarchy.unique_name().to_string(),
                    expected: expected.unique_name().to_string(),
                    found: found.unique_name().to_string(),
                })
            }
        }
    }
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("cube", &self.cube.name())
            .field("context", &self.context)
            .finish()
    }
}
