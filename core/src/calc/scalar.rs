//! Scalar calculators: numbers, strings, booleans.

use std::cmp::Ordering;
use std::sync::Arc;

use olapcalc_types::{Hierarchy, Member, Type};
use smallvec::SmallVec;
use tracing::trace;

use super::aggregate::aggregate;
use super::{Calc, MemberCalc, MemberListCalc, TupleCalc, any_depends, any_depends_but_first};
use crate::evaluator::{EvalError, Evaluator};
use crate::expr::{Aggregator, ArithmeticOp, CompareOp, Expr, UserDefinedFunction};
use crate::parameters::{ParameterSlot, ParameterValue};
use crate::values::{CalcValue, Value};

/// A calc producing a scalar. The null sentinel is [`Value::Null`].
#[derive(Debug)]
pub struct ScalarCalc {
    ty: Type,
    expr: Arc<Expr>,
    node: ScalarNode,
}

#[derive(Debug)]
pub(crate) enum ScalarNode {
    Constant(Value),
    /// Value of the current measure at the current position.
    CurrentValue,
    /// Overrides the current member of each operand's hierarchy, reads the
    /// current measure, and restores.
    MemberValue {
        members: Vec<Arc<MemberCalc>>,
    },
    /// Like `MemberValue`, with the members of an evaluated tuple.
    TupleValue {
        tuple: Arc<TupleCalc>,
    },
    Parameter(Arc<ParameterSlot>),
    /// Integer view of a numeric operand.
    Integer(Arc<ScalarCalc>),
    Arithmetic {
        op: ArithmeticOp,
        left: Arc<ScalarCalc>,
        right: Arc<ScalarCalc>,
    },
    Negate(Arc<ScalarCalc>),
    Compare {
        op: CompareOp,
        left: Arc<ScalarCalc>,
        right: Arc<ScalarCalc>,
    },
    And(Arc<ScalarCalc>, Arc<ScalarCalc>),
    Or(Arc<ScalarCalc>, Arc<ScalarCalc>),
    Not(Arc<ScalarCalc>),
    IsEmpty(Arc<ScalarCalc>),
    Iif {
        condition: Arc<ScalarCalc>,
        then: Arc<ScalarCalc>,
        otherwise: Arc<ScalarCalc>,
    },
    /// Name of a member, level, hierarchy or dimension.
    Name(Calc),
    UniqueName(Calc),
    /// Number of members of a set.
    Count(Arc<MemberListCalc>),
    /// Aggregates `value` over the members of `list`, each made current in
    /// turn on a pushed evaluator.
    Aggregate {
        aggregator: Aggregator,
        list: Arc<MemberListCalc>,
        value: Arc<ScalarCalc>,
    },
    UserDefined {
        function: Arc<dyn UserDefinedFunction>,
        args: Vec<Calc>,
    },
}

impl ScalarCalc {
    pub(crate) fn new(ty: Type, expr: Arc<Expr>, node: ScalarNode) -> Self {
        ScalarCalc { ty, expr, node }
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn expr(&self) -> &Arc<Expr> {
        &self.expr
    }

    /// The constant result, if this calc is a constant.
    pub fn constant(&self) -> Option<&Value> {
        match &self.node {
            ScalarNode::Constant(v) => Some(v),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match &self.node {
            ScalarNode::Constant(v) => format!("Constant({})", v),
            ScalarNode::CurrentValue => "CurrentValue".to_string(),
            ScalarNode::MemberValue { .. } => "MemberValue".to_string(),
            ScalarNode::TupleValue { .. } => "TupleValue".to_string(),
            ScalarNode::Parameter(slot) => format!("Parameter({})", slot.parameter().name()),
            ScalarNode::Integer(_) => "Integer".to_string(),
            ScalarNode::Arithmetic { op, .. } => format!("Arithmetic({})", op.symbol()),
            ScalarNode::Negate(_) => "Negate".to_string(),
            ScalarNode::Compare { op, .. } => format!("Compare({})", op.symbol()),
            ScalarNode::And(..) => "And".to_string(),
            ScalarNode::Or(..) => "Or".to_string(),
            ScalarNode::Not(_) => "Not".to_string(),
            ScalarNode::IsEmpty(_) => "IsEmpty".to_string(),
            ScalarNode::Iif { .. } => "Iif".to_string(),
            ScalarNode::Name(_) => "Name".to_string(),
            ScalarNode::UniqueName(_) => "UniqueName".to_string(),
            ScalarNode::Count(_) => "Count".to_string(),
            ScalarNode::Aggregate { aggregator, .. } => aggregator.name().to_string(),
            ScalarNode::UserDefined { function, .. } => format!("UserDefined({})", function.name()),
        }
    }

    pub fn children(&self) -> Vec<Calc> {
        let scalar = |c: &Arc<ScalarCalc>| Calc::Scalar(Arc::clone(c));
        match &self.node {
            ScalarNode::Constant(_) | ScalarNode::CurrentValue | ScalarNode::Parameter(_) => vec![],
            ScalarNode::MemberValue { members } => {
                members.iter().map(|m| Calc::Member(Arc::clone(m))).collect()
            }
            ScalarNode::TupleValue { tuple } => vec![Calc::Tuple(Arc::clone(tuple))],
            ScalarNode::Integer(x)
            | ScalarNode::Negate(x)
            | ScalarNode::Not(x)
            | ScalarNode::IsEmpty(x) => vec![scalar(x)],
            ScalarNode::Arithmetic { left, right, .. }
            | ScalarNode::Compare { left, right, .. }
            | ScalarNode::And(left, right)
            | ScalarNode::Or(left, right) => vec![scalar(left), scalar(right)],
            ScalarNode::Iif {
                condition,
                then,
                otherwise,
            } => vec![scalar(condition), scalar(then), scalar(otherwise)],
            ScalarNode::Name(c) | ScalarNode::UniqueName(c) => vec![c.clone()],
            ScalarNode::Count(list) => vec![Calc::MemberList(Arc::clone(list))],
            ScalarNode::Aggregate { list, value, .. } => {
                vec![Calc::MemberList(Arc::clone(list)), scalar(value)]
            }
            ScalarNode::UserDefined { args, .. } => args.clone(),
        }
    }

    pub fn depends_on(&self, hierarchy: &Hierarchy) -> bool {
        match &self.node {
            ScalarNode::Constant(_) => false,
            // The measure lookup reads every hierarchy.
            ScalarNode::CurrentValue => true,
            ScalarNode::MemberValue { members } => {
                if members.iter().any(|m| m.depends_on(hierarchy)) {
                    return true;
                }
                // Stricter than the tuple rule below, which needs one element
                // to fix `hierarchy`: here every operand must. The cost is only
                // extra reported dependence.
                members.is_empty()
                    || !members
                        .iter()
                        .all(|m| m.ty().uses_hierarchy(hierarchy, true))
            }
            ScalarNode::TupleValue { tuple } => {
                tuple.depends_on(hierarchy) || !tuple.ty().uses_hierarchy(hierarchy, true)
            }
            ScalarNode::Parameter(slot) => slot.default_calc().depends_on(hierarchy),
            ScalarNode::Aggregate { .. } => any_depends_but_first(&self.children(), hierarchy),
            // Host functions may read anything.
            ScalarNode::UserDefined { .. } => true,
            _ => any_depends(&self.children(), hierarchy),
        }
    }

    pub fn evaluate(&self, ev: &mut Evaluator) -> Result<Value, EvalError> {
        match &self.node {
            ScalarNode::Constant(v) => Ok(v.clone()),
            ScalarNode::CurrentValue => ev.evaluate_current(),
            ScalarNode::MemberValue { members } => substitute_members(members, ev),
            ScalarNode::TupleValue { tuple } => match tuple.evaluate(ev)? {
                Some(members) => substitute(members.into_iter(), ev),
                None => Ok(Value::Null),
            },
            ScalarNode::Parameter(slot) => match ev.parameter_value(slot)? {
                ParameterValue::Scalar(v) => Ok(v),
                other => Err(EvalError::ParameterValue {
                    name: slot.parameter().name().to_string(),
                    expected: "scalar",
                    found: other.kind_name(),
                }),
            },
            ScalarNode::Integer(x) => Ok(x
                .evaluate(ev)?
                .as_integer()
                .map_or(Value::Null, Value::from)),
            ScalarNode::Arithmetic { op, left, right } => {
                let l = left.evaluate(ev)?;
                let r = right.evaluate(ev)?;
                Ok(arithmetic(*op, &l, &r))
            }
            ScalarNode::Negate(x) => Ok(x
                .evaluate(ev)?
                .as_number()
                .map_or(Value::Null, |n| Value::Number(-n))),
            ScalarNode::Compare { op, left, right } => {
                let l = left.evaluate(ev)?;
                let r = right.evaluate(ev)?;
                Ok(compare(*op, &l, &r))
            }
            ScalarNode::And(left, right) => {
                Ok(Value::Boolean(truthy(left, ev)? && truthy(right, ev)?))
            }
            ScalarNode::Or(left, right) => {
                Ok(Value::Boolean(truthy(left, ev)? || truthy(right, ev)?))
            }
            ScalarNode::Not(x) => Ok(Value::Boolean(!truthy(x, ev)?)),
            ScalarNode::IsEmpty(x) => Ok(Value::Boolean(x.evaluate(ev)?.is_null())),
            ScalarNode::Iif {
                condition,
                then,
                otherwise,
            } => {
                if truthy(condition, ev)? {
                    then.evaluate(ev)
                } else {
                    otherwise.evaluate(ev)
                }
            }
            ScalarNode::Name(c) => Ok(name_of(c.evaluate(ev)?, false)),
            ScalarNode::UniqueName(c) => Ok(name_of(c.evaluate(ev)?, true)),
            ScalarNode::Count(list) => Ok(Value::from(list.evaluate(ev)?.len() as i64)),
            ScalarNode::Aggregate {
                aggregator,
                list,
                value,
            } => {
                let members = list.evaluate(ev)?;
                let mut scoped = ev.push();
                let mut values = Vec::with_capacity(members.len());
                for member in members {
                    scoped.set_context(member);
                    if let Some(n) = value.evaluate(&mut scoped)?.as_number() {
                        values.push(n);
                    }
                }
                Ok(aggregate(*aggregator, &values))
            }
            ScalarNode::UserDefined { function, args } => {
                let values = args
                    .iter()
                    .map(|a| a.evaluate(ev))
                    .collect::<Result<Vec<_>, _>>()?;
                function.execute(&mut ev.push(), &values)
            }
        }
    }
}

/// The member-substitution algorithm.
///
/// Operands are evaluated left to right, each after the previous override
/// has been applied. An absent or null operand aborts: the overrides applied
/// so far are restored and the result is null.
fn substitute_members(members: &[Arc<MemberCalc>], ev: &mut Evaluator) -> Result<Value, EvalError> {
    let mut saved: SmallVec<[Member; 4]> = SmallVec::with_capacity(members.len());
    let mut applied: SmallVec<[Member; 4]> = SmallVec::with_capacity(members.len());
    for calc in members {
        let member = match calc.evaluate(ev) {
            Ok(member) => member,
            Err(err) => {
                ev.restore(saved);
                return Err(err);
            }
        };
        match member {
            Some(member) if !member.is_null() => {
                applied.push(member.clone());
                saved.push(ev.set_context(member));
            }
            _ => {
                trace!(operand = %calc.expr(), "null member operand");
                ev.restore(saved);
                return Ok(Value::Null);
            }
        }
    }
    evaluate_at(&applied, saved, ev)
}

/// Member substitution over already-evaluated members.
fn substitute(members: impl Iterator<Item = Member>, ev: &mut Evaluator) -> Result<Value, EvalError> {
    let mut saved: SmallVec<[Member; 4]> = SmallVec::new();
    let mut applied: SmallVec<[Member; 4]> = SmallVec::new();
    for member in members {
        if member.is_null() {
            ev.restore(saved);
            return Ok(Value::Null);
        }
        applied.push(member.clone());
        saved.push(ev.set_context(member));
    }
    evaluate_at(&applied, saved, ev)
}

fn evaluate_at(
    applied: &[Member],
    saved: SmallVec<[Member; 4]>,
    ev: &mut Evaluator,
) -> Result<Value, EvalError> {
    if ev.needs_null_for_unrelated_dimension(applied) {
        trace!("unrelated dimension");
        ev.restore(saved);
        return Ok(Value::Null);
    }
    let result = ev.evaluate_current();
    ev.restore(saved);
    result
}

/// Null counts as false.
fn truthy(calc: &ScalarCalc, ev: &mut Evaluator) -> Result<bool, EvalError> {
    Ok(calc.evaluate(ev)?.as_bool().unwrap_or(false))
}

fn arithmetic(op: ArithmeticOp, left: &Value, right: &Value) -> Value {
    let (l, r) = (left.as_number(), right.as_number());
    let result = match op {
        // One null operand counts as zero.
        ArithmeticOp::Add | ArithmeticOp::Subtract => {
            if l.is_none() && r.is_none() {
                return Value::Null;
            }
            let (l, r) = (l.unwrap_or(0.0), r.unwrap_or(0.0));
            if op == ArithmeticOp::Add { l + r } else { l - r }
        }
        ArithmeticOp::Multiply => match (l, r) {
            (Some(l), Some(r)) => l * r,
            _ => return Value::Null,
        },
        ArithmeticOp::Divide => match (l, r) {
            (Some(_), Some(r)) if r == 0.0 => return Value::Null,
            (Some(l), Some(r)) => l / r,
            _ => return Value::Null,
        },
    };
    Value::Number(result)
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> Value {
    let ordering = match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.partial_cmp(r),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Boolean(l), Value::Boolean(r)) => Some(l.cmp(r)),
        _ => None,
    };
    let Some(ordering) = ordering else {
        return Value::Null;
    };
    Value::Boolean(match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
    })
}

fn name_of(value: CalcValue, unique: bool) -> Value {
    let pick = |name: &str, unique_name: &str| Value::string(if unique { unique_name } else { name });
    match value {
        CalcValue::Member(Some(m)) if !m.is_null() => pick(m.name(), m.unique_name()),
        CalcValue::Hierarchy(Some(h)) => pick(h.name(), h.unique_name()),
        CalcValue::Level(Some(l)) => pick(l.name(), l.unique_name()),
        CalcValue::Dimension(Some(d)) => pick(d.name(), d.unique_name()),
        _ => Value::Null,
    }
}
