//! Member calculators.

use std::sync::Arc;

use olapcalc_types::{Hierarchy, Member, Type};

use super::{Calc, HierarchyCalc, ScalarCalc, TupleCalc, any_depends};
use crate::evaluator::{EvalError, Evaluator};
use crate::expr::Expr;
use crate::parameters::{ParameterSlot, ParameterValue};

/// A calc producing a member.
///
/// `None` means "no member"; `Some` of a null member is an explicit null.
/// Consumers treat both as null.
#[derive(Debug)]
pub struct MemberCalc {
    ty: Type,
    expr: Arc<Expr>,
    node: MemberNode,
}

#[derive(Debug)]
pub(crate) enum MemberNode {
    Constant(Member),
    /// Current member of a hierarchy known at compile time.
    CurrentMemberFixed(Hierarchy),
    /// Current member of a hierarchy resolved on every evaluation.
    CurrentMember(Arc<HierarchyCalc>),
    DefaultMember(Arc<HierarchyCalc>),
    Parent(Arc<MemberCalc>),
    /// `Item` on a degenerate one-member tuple.
    MemberItem {
        member: Arc<MemberCalc>,
        index: Arc<ScalarCalc>,
    },
    TupleItem {
        tuple: Arc<TupleCalc>,
        index: Arc<ScalarCalc>,
        /// Returned, by index, when the tuple is null. One per element.
        null_members: Vec<Member>,
    },
    Parameter(Arc<ParameterSlot>),
}

impl MemberCalc {
    pub(crate) fn new(ty: Type, expr: Arc<Expr>, node: MemberNode) -> Self {
        MemberCalc { ty, expr, node }
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn expr(&self) -> &Arc<Expr> {
        &self.expr
    }

    /// The constant result, if this calc is a constant.
    pub fn constant(&self) -> Option<&Member> {
        match &self.node {
            MemberNode::Constant(m) => Some(m),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match &self.node {
            MemberNode::Constant(m) => format!("Constant({})", m),
            MemberNode::CurrentMemberFixed(h) => format!("CurrentMemberFixed({})", h),
            MemberNode::CurrentMember(_) => "CurrentMember".to_string(),
            MemberNode::DefaultMember(_) => "DefaultMember".to_string(),
            MemberNode::Parent(_) => "Parent".to_string(),
            MemberNode::MemberItem { .. } => "MemberItem".to_string(),
            MemberNode::TupleItem { .. } => "TupleItem".to_string(),
            MemberNode::Parameter(slot) => format!("Parameter({})", slot.parameter().name()),
        }
    }

    pub fn children(&self) -> Vec<Calc> {
        match &self.node {
            MemberNode::Constant(_)
            | MemberNode::CurrentMemberFixed(_)
            | MemberNode::Parameter(_) => vec![],
            MemberNode::CurrentMember(h) | MemberNode::DefaultMember(h) => {
                vec![Calc::Hierarchy(Arc::clone(h))]
            }
            MemberNode::Parent(m) => vec![Calc::Member(Arc::clone(m))],
            MemberNode::MemberItem { member, index } => vec![
                Calc::Member(Arc::clone(member)),
                Calc::Scalar(Arc::clone(index)),
            ],
            MemberNode::TupleItem { tuple, index, .. } => vec![
                Calc::Tuple(Arc::clone(tuple)),
                Calc::Scalar(Arc::clone(index)),
            ],
        }
    }

    pub fn depends_on(&self, hierarchy: &Hierarchy) -> bool {
        match &self.node {
            MemberNode::Constant(_) => false,
            MemberNode::CurrentMemberFixed(h) => h == hierarchy,
            MemberNode::CurrentMember(h) => {
                h.ty().uses_hierarchy(hierarchy, false) || h.depends_on(hierarchy)
            }
            MemberNode::Parameter(slot) => slot.default_calc().depends_on(hierarchy),
            _ => any_depends(&self.children(), hierarchy),
        }
    }

    pub fn evaluate(&self, ev: &mut Evaluator) -> Result<Option<Member>, EvalError> {
        match &self.node {
            MemberNode::Constant(m) => Ok(Some(m.clone())),
            MemberNode::CurrentMemberFixed(h) => Ok(Some(ev.current_member(h))),
            MemberNode::CurrentMember(h) => Ok(h.evaluate(ev)?.map(|h| ev.current_member(&h))),
            MemberNode::DefaultMember(h) => {
                Ok(h.evaluate(ev)?.map(|h| ev.cube().default_member(&h)))
            }
            MemberNode::Parent(m) => Ok(m.evaluate(ev)?.map(|m| {
                m.parent()
                    .cloned()
                    .unwrap_or_else(|| Member::null(m.hierarchy().cloned()))
            })),
            MemberNode::MemberItem { member, index } => {
                let member = member.evaluate(ev)?;
                let index = index.evaluate(ev)?.as_integer();
                Ok(if index == Some(0) { member } else { None })
            }
            MemberNode::TupleItem {
                tuple,
                index,
                null_members,
            } => {
                let members = tuple.evaluate(ev)?;
                let Some(index) = index
                    .evaluate(ev)?
                    .as_integer()
                    .and_then(|i| usize::try_from(i).ok())
                else {
                    return Ok(None);
                };
                Ok(match members {
                    Some(members) => members.get(index).cloned(),
                    None => null_members.get(index).cloned(),
                })
            }
            MemberNode::Parameter(slot) => match ev.parameter_value(slot)? {
                ParameterValue::Member(m) => Ok(Some(m)),
                other => Err(EvalError::ParameterValue {
                    name: slot.parameter().name().to_string(),
                    expected: "member",
                    found: other.kind_name(),
                }),
            },
        }
    }
}
