//! Prepared expressions.

use std::sync::Arc;

use olapcalc_types::{Cube, Type};

use super::{Error, ExecutionOptions};
use crate::calc::{Calc, CalcWriter};
use crate::evaluator::{CellValueProvider, Evaluator};
use crate::parameters::{ParameterSlot, ParameterSlots, ParameterValue};
use crate::values::{CalcValue, Value};

/// A compiled expression ready for evaluation.
///
/// The calc tree is immutable and may be evaluated concurrently, each
/// thread with its own [`Evaluator`]. Parameter slots belong to this
/// statement; binding them concurrently must be serialized by the caller.
pub struct PreparedExpression {
    cube: Cube,
    calc: Calc,
    parameters: ParameterSlots,
    options: ExecutionOptions,
}

impl PreparedExpression {
    pub(crate) fn new(
        cube: &Cube,
        calc: Calc,
        parameters: ParameterSlots,
        options: ExecutionOptions,
    ) -> Self {
        PreparedExpression {
            cube: cube.clone(),
            calc,
            parameters,
            options,
        }
    }

    pub fn with_execution_options(mut self, options: ExecutionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn execution_options(&self) -> &ExecutionOptions {
        &self.options
    }

    /// The root calc.
    pub fn calc(&self) -> &Calc {
        &self.calc
    }

    pub fn return_type(&self) -> &Type {
        self.calc.ty()
    }

    pub fn parameters(&self) -> &ParameterSlots {
        &self.parameters
    }

    /// The calc plan, one node per line.
    pub fn plan(&self) -> String {
        CalcWriter::new().write(&self.calc)
    }

    /// Creates an evaluator positioned at the cube's default members.
    pub fn evaluator(&self, provider: Arc<dyn CellValueProvider>) -> Evaluator {
        Evaluator::new(&self.cube, provider)
    }

    /// Evaluates the root calc at the evaluator's current position.
    ///
    /// The evaluator is left as it was found. With
    /// [`ExecutionOptions::verify_context_restoration`], a calc that fails to
    /// restore it is reported as [`Error::Defect`].
    pub fn evaluate(&self, evaluator: &mut Evaluator) -> Result<CalcValue, Error> {
        if !self.options.verify_context_restoration {
            return Ok(self.calc.evaluate(evaluator)?);
        }
        let snapshot = evaluator.members().to_vec();
        let result = self.calc.evaluate(evaluator);
        evaluator.verify_restored(&snapshot)?;
        Ok(result?)
    }

    /// Evaluates a scalar expression.
    pub fn evaluate_scalar(&self, evaluator: &mut Evaluator) -> Result<Value, Error> {
        match self.evaluate(evaluator)? {
            CalcValue::Scalar(value) => Ok(value),
            other => Err(Error::Api(format!(
                "expression of type {} is not a scalar: {:?}",
                self.calc.ty(),
                other
            ))),
        }
    }

    /// Assigns a parameter explicitly.
    pub fn set_parameter_value(&self, name: &str, value: ParameterValue) -> Result<(), Error> {
        let slot = self.slot(name)?;
        if !value.fits(slot.parameter().ty()) {
            return Err(Error::Api(format!(
                "cannot assign a {} to parameter {} of type {}",
                value.kind_name(),
                name,
                slot.parameter().ty()
            )));
        }
        slot.set_value(value, true);
        Ok(())
    }

    /// Reverts a parameter to its default value.
    pub fn unset_parameter_value(&self, name: &str) -> Result<(), Error> {
        self.slot(name)?.unset();
        Ok(())
    }

    pub fn is_parameter_set(&self, name: &str) -> Result<bool, Error> {
        Ok(self.slot(name)?.is_set())
    }

    fn slot(&self, name: &str) -> Result<&Arc<ParameterSlot>, Error> {
        self.parameters
            .get(name)
            .ok_or_else(|| Error::Api(format!("unknown parameter {}", name)))
    }
}
