//! Void calculators, evaluated only for their side effects.

use std::sync::Arc;

use olapcalc_types::{Hierarchy, Type};

use super::Calc;
use crate::evaluator::{EvalError, Evaluator};
use crate::expr::{Expr, UserDefinedFunction};

#[derive(Debug)]
pub struct VoidCalc {
    ty: Type,
    expr: Arc<Expr>,
    node: VoidNode,
}

#[derive(Debug)]
pub(crate) enum VoidNode {
    /// Evaluates a calc of any category and drops the result.
    Discard(Calc),
    /// A host procedure.
    UserDefined {
        function: Arc<dyn UserDefinedFunction>,
        args: Vec<Calc>,
    },
}

impl VoidCalc {
    pub(crate) fn new(ty: Type, expr: Arc<Expr>, node: VoidNode) -> Self {
        VoidCalc { ty, expr, node }
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn expr(&self) -> &Arc<Expr> {
        &self.expr
    }

    pub fn describe(&self) -> String {
        match &self.node {
            VoidNode::Discard(_) => "Discard".to_string(),
            VoidNode::UserDefined { function, .. } => format!("UserDefined({})", function.name()),
        }
    }

    pub fn children(&self) -> Vec<Calc> {
        match &self.node {
            VoidNode::Discard(calc) => vec![calc.clone()],
            VoidNode::UserDefined { args, .. } => args.clone(),
        }
    }

    pub fn depends_on(&self, hierarchy: &Hierarchy) -> bool {
        match &self.node {
            VoidNode::Discard(calc) => calc.depends_on(hierarchy),
            VoidNode::UserDefined { .. } => true,
        }
    }

    pub fn evaluate(&self, ev: &mut Evaluator) -> Result<(), EvalError> {
        match &self.node {
            VoidNode::Discard(calc) => {
                calc.evaluate(ev)?;
            }
            VoidNode::UserDefined { function, args } => {
                let values = args
                    .iter()
                    .map(|a| a.evaluate(ev))
                    .collect::<Result<Vec<_>, _>>()?;
                function.execute(&mut ev.push(), &values)?;
            }
        }
        Ok(())
    }
}
