//! The cell value provider contract.

use olapcalc_types::{Hierarchy, Member};

use super::{EvalError, Evaluator, ProviderError};
use crate::parameters::{ParameterSlot, ParameterValue};
use crate::values::Value;

/// Resolves cell values for the evaluator.
///
/// Implemented by the storage/aggregation layer. The evaluator treats every
/// call as opaque and synchronous; any blocking happens inside the provider.
///
/// Providers are shared between evaluators (see [`Evaluator::push`]), so they
/// must be `Send + Sync`.
pub trait CellValueProvider: Send + Sync {
    /// Value of the current measure at the evaluator's current position.
    ///
    /// Returns [`Value::Null`] for an empty cell or when any current member
    /// is null.
    fn evaluate_current_measure(&self, evaluator: &Evaluator) -> Result<Value, ProviderError>;

    /// Current member of `hierarchy` as seen by calculations.
    fn get_context(&self, evaluator: &Evaluator, hierarchy: &Hierarchy) -> Member {
        evaluator.get_context(hierarchy).clone()
    }

    /// Value of a parameter.
    ///
    /// The default returns the slot's value if it has one and otherwise
    /// evaluates the slot's default expression.
    fn get_parameter_value(
        &self,
        evaluator: &mut Evaluator,
        slot: &ParameterSlot,
    ) -> Result<ParameterValue, EvalError> {
        if let Some(value) = slot.value() {
            return Ok(value);
        }
        let ty = slot.parameter().ty();
        let result = slot.default_calc().evaluate(evaluator)?;
        let value =
            ParameterValue::from_calc_value(result, ty).ok_or_else(|| EvalError::ParameterValue {
                name: slot.parameter().name().to_string(),
                expected: "scalar, member or member list",
                found: "dimensional",
            })?;
        if !value.fits(ty) {
            return Err(EvalError::ParameterDefault {
                name: slot.parameter().name().to_string(),
                ty: ty.to_string(),
            });
        }
        Ok(value)
    }

    /// Whether the current measure must evaluate to null at the current
    /// position with `members` overriding it.
    ///
    /// This is the unrelated-dimension rule: a measure whose fact table has
    /// no relationship with a hierarchy yields null at any non-default member
    /// of that hierarchy instead of a misleading total. The default applies
    /// no such rule.
    fn needs_null_for_unrelated_dimension(&self, evaluator: &Evaluator, members: &[Member]) -> bool {
        let _ = (evaluator, members);
        false
    }
}
