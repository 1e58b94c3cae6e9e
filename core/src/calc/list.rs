//! Member list ("set") calculators.

use std::sync::Arc;

use olapcalc_types::{Hierarchy, Member, Type};

use super::{Calc, MemberCalc, any_depends};
use crate::evaluator::{EvalError, Evaluator};
use crate::expr::Expr;
use crate::parameters::{ParameterSlot, ParameterValue};

/// A calc producing an ordered list of members. The empty list is the
/// closest thing a set has to null.
#[derive(Debug)]
pub struct MemberListCalc {
    ty: Type,
    expr: Arc<Expr>,
    node: MemberListNode,
}

#[derive(Debug)]
pub(crate) enum MemberListNode {
    /// `{m1, ..., mk}`. Null members are skipped.
    Braces(Vec<Arc<MemberCalc>>),
    /// A member used as a one-member set.
    FromMember(Arc<MemberCalc>),
    Parameter(Arc<ParameterSlot>),
}

impl MemberListCalc {
    pub(crate) fn new(ty: Type, expr: Arc<Expr>, node: MemberListNode) -> Self {
        MemberListCalc { ty, expr, node }
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn expr(&self) -> &Arc<Expr> {
        &self.expr
    }

    pub fn describe(&self) -> String {
        match &self.node {
            MemberListNode::Braces(_) => "Set".to_string(),
            MemberListNode::FromMember(_) => "SetFromMember".to_string(),
            MemberListNode::Parameter(slot) => format!("Parameter({})", slot.parameter().name()),
        }
    }

    pub fn children(&self) -> Vec<Calc> {
        match &self.node {
            MemberListNode::Braces(members) => {
                members.iter().map(|m| Calc::Member(Arc::clone(m))).collect()
            }
            MemberListNode::FromMember(m) => vec![Calc::Member(Arc::clone(m))],
            MemberListNode::Parameter(_) => vec![],
        }
    }

    pub fn depends_on(&self, hierarchy: &Hierarchy) -> bool {
        match &self.node {
            MemberListNode::Parameter(slot) => slot.default_calc().depends_on(hierarchy),
            _ => any_depends(&self.children(), hierarchy),
        }
    }

    pub fn evaluate(&self, ev: &mut Evaluator) -> Result<Vec<Member>, EvalError> {
        match &self.node {
            MemberListNode::Braces(calcs) => {
                let mut members = Vec::with_capacity(calcs.len());
                for calc in calcs {
                    if let Some(m) = calc.evaluate(ev)?.filter(|m| !m.is_null()) {
                        members.push(m);
                    }
                }
                Ok(members)
            }
            MemberListNode::FromMember(calc) => Ok(calc
                .evaluate(ev)?
                .filter(|m| !m.is_null())
                .into_iter()
                .collect()),
            MemberListNode::Parameter(slot) => match ev.parameter_value(slot)? {
                ParameterValue::Members(members) => Ok(members),
                other => Err(EvalError::ParameterValue {
                    name: slot.parameter().name().to_string(),
                    expected: "member list",
                    found: other.kind_name(),
                }),
            },
        }
    }
}
