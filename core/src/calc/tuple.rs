//! Tuple calculators.

use std::sync::Arc;

use olapcalc_types::{Hierarchy, Type};
use smallvec::{SmallVec, smallvec};

use super::{Calc, MemberCalc, any_depends};
use crate::evaluator::{EvalError, Evaluator};
use crate::expr::Expr;
use crate::values::Tuple;

/// A calc producing a tuple. `None` is the null tuple.
#[derive(Debug)]
pub struct TupleCalc {
    ty: Type,
    expr: Arc<Expr>,
    node: TupleNode,
}

#[derive(Debug)]
pub(crate) enum TupleNode {
    /// `(m1, ..., mk)`. Null if any member is null.
    Constructor(Vec<Arc<MemberCalc>>),
    /// A member used as a one-member tuple.
    FromMember(Arc<MemberCalc>),
}

impl TupleCalc {
    pub(crate) fn new(ty: Type, expr: Arc<Expr>, node: TupleNode) -> Self {
        TupleCalc { ty, expr, node }
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn expr(&self) -> &Arc<Expr> {
        &self.expr
    }

    /// Static arity.
    pub fn arity(&self) -> usize {
        match &self.node {
            TupleNode::Constructor(members) => members.len(),
            TupleNode::FromMember(_) => 1,
        }
    }

    pub fn describe(&self) -> String {
        match &self.node {
            TupleNode::Constructor(_) => "Tuple".to_string(),
            TupleNode::FromMember(_) => "TupleFromMember".to_string(),
        }
    }

    pub fn children(&self) -> Vec<Calc> {
        match &self.node {
            TupleNode::Constructor(members) => {
                members.iter().map(|m| Calc::Member(Arc::clone(m))).collect()
            }
            TupleNode::FromMember(m) => vec![Calc::Member(Arc::clone(m))],
        }
    }

    pub fn depends_on(&self, hierarchy: &Hierarchy) -> bool {
        any_depends(&self.children(), hierarchy)
    }

    pub fn evaluate(&self, ev: &mut Evaluator) -> Result<Option<Tuple>, EvalError> {
        match &self.node {
            TupleNode::Constructor(calcs) => {
                let mut members: Tuple = SmallVec::with_capacity(calcs.len());
                for calc in calcs {
                    match calc.evaluate(ev)? {
                        Some(m) if !m.is_null() => members.push(m),
                        _ => return Ok(None),
                    }
                }
                Ok(Some(members))
            }
            TupleNode::FromMember(calc) => Ok(calc
                .evaluate(ev)?
                .filter(|m| !m.is_null())
                .map(|m| smallvec![m])),
        }
    }
}
