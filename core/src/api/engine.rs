//! The compilation engine.

use std::sync::Arc;

use olapcalc_types::Cube;
use tracing::debug;

use super::{CompilationOptions, EngineOptions, Error, PreparedExpression};
use crate::compiler::Compiler;
use crate::expr::Expr;

/// Prepares expressions against one cube.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use olapcalc_core::api::{Engine, EngineOptions};
/// use olapcalc_core::expr::{Expr, Function};
/// use olapcalc_core::memory::InMemoryProvider;
/// use olapcalc_core::values::Value;
/// use olapcalc_types::CubeBuilder;
///
/// let mut builder = CubeBuilder::new("Sales");
/// let unit_sales = builder.measure("Unit Sales");
/// let store = builder.hierarchy("Store", &["Country"]);
/// let cube = builder.build();
/// let usa = cube.default_member(&store).child("USA").unwrap();
///
/// let mut provider = InMemoryProvider::new(&cube);
/// provider.fact(&unit_sales, &[usa.clone()], 10.0);
///
/// let engine = Engine::new(&cube, EngineOptions::default());
/// let value_of_usa = Expr::call(Function::Value, vec![Expr::member(&usa)]);
/// let prepared = engine.prepare(&value_of_usa).unwrap();
/// let mut evaluator = prepared.evaluator(Arc::new(provider));
/// let value = prepared.evaluate_scalar(&mut evaluator).unwrap();
/// assert_eq!(value, Value::Number(10.0));
/// ```
pub struct Engine {
    cube: Cube,
    options: EngineOptions,
}

impl Engine {
    pub fn new(cube: &Cube, options: EngineOptions) -> Self {
        Engine {
            cube: cube.clone(),
            options,
        }
    }

    pub fn cube(&self) -> &Cube {
        &self.cube
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Compiles `expr` with the engine's default options.
    pub fn prepare(&self, expr: &Arc<Expr>) -> Result<PreparedExpression, Error> {
        self.prepare_with_options(expr, self.options.default_compilation_options.clone())
    }

    pub fn prepare_with_options(
        &self,
        expr: &Arc<Expr>,
        options: CompilationOptions,
    ) -> Result<PreparedExpression, Error> {
        let mut compiler = Compiler::new(&self.cube, options);
        let calc = compiler.compile(expr)?;
        debug!(expr = %expr, calc = %calc.describe(), "prepared expression");
        Ok(PreparedExpression::new(
            &self.cube,
            calc,
            compiler.into_parameters(),
            self.options.default_execution_options.clone(),
        ))
    }

    /// Recompiles a statement, keeping the parameter values that were
    /// explicitly assigned on `previous`.
    pub fn prepare_with_previous(
        &self,
        expr: &Arc<Expr>,
        previous: &PreparedExpression,
    ) -> Result<PreparedExpression, Error> {
        let mut compiler = Compiler::new(&self.cube, self.options.default_compilation_options.clone())
            .with_previous(previous.parameters());
        let calc = compiler.compile(expr)?;
        Ok(PreparedExpression::new(
            &self.cube,
            calc,
            compiler.into_parameters(),
            previous.execution_options().clone(),
        ))
    }
}
