//! Built-in functions and their result-type rules.

use std::fmt;
use std::sync::Arc;

use olapcalc_types::{
    Category, DimensionType, HierarchyType, LevelType, MemberType, TupleType, Type,
};

use super::Expr;
use crate::evaluator::{EvalError, Evaluator};
use crate::values::{CalcValue, Value};

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Subtract => "-",
            ArithmeticOp::Multiply => "*",
            ArithmeticOp::Divide => "/",
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// Statistical aggregates over a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregator {
    Sum,
    Avg,
    /// Number of members in the set. Takes no value expression.
    Count,
    Min,
    Max,
    /// Sample variance.
    Var,
    /// Population variance.
    VarP,
    /// Sample standard deviation.
    Stddev,
    /// Population standard deviation.
    StddevP,
}

impl Aggregator {
    pub fn name(self) -> &'static str {
        match self {
            Aggregator::Sum => "Sum",
            Aggregator::Avg => "Avg",
            Aggregator::Count => "Count",
            Aggregator::Min => "Min",
            Aggregator::Max => "Max",
            Aggregator::Var => "Var",
            Aggregator::VarP => "VarP",
            Aggregator::Stddev => "Stddev",
            Aggregator::StddevP => "StddevP",
        }
    }
}

/// A function supplied by the host application.
///
/// Arguments are compiled in their natural category and evaluated before the
/// call. The function receives a scoped copy of the evaluator, so any context
/// it sets is discarded when it returns.
pub trait UserDefinedFunction: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Result type. [`Type::Void`] makes this a procedure evaluated only for
    /// its side effects.
    fn return_type(&self) -> Type;

    fn execute(&self, evaluator: &mut Evaluator, args: &[CalcValue]) -> Result<Value, EvalError>;
}

/// A function or operator applied to argument expressions.
#[derive(Debug, Clone)]
pub enum Function {
    /// `<Hierarchy>.CurrentMember`
    CurrentMember,
    /// `<Hierarchy>.DefaultMember`
    DefaultMember,
    /// `<Member>.Parent`
    Parent,
    /// `<Member>.Level`
    MemberLevel,
    /// `<Member>.Hierarchy`
    MemberHierarchy,
    /// `<Level>.Hierarchy`
    LevelHierarchy,
    /// `<Hierarchy>.Dimension`
    HierarchyDimension,
    /// `Dimensions(<Numeric>)`
    Dimensions,
    /// `<Member>.Name`
    Name,
    /// `<Member>.UniqueName`
    UniqueName,
    /// `(<Member>, ...)`
    Tuple,
    /// `<Tuple>.Item(<Index>)`
    Item,
    /// `{<Member>, ...}`
    Set,
    /// `Value()`: the current measure at the current position.
    Value,
    /// `Sum(<Set>[, <Numeric>])` and friends.
    Aggregate(Aggregator),
    Arithmetic(ArithmeticOp),
    Negate,
    Compare(CompareOp),
    And,
    Or,
    Not,
    IsEmpty,
    Iif,
    UserDefined(Arc<dyn UserDefinedFunction>),
}

impl Function {
    /// Display name, as it would appear in a plan or an error message.
    pub fn name(&self) -> &str {
        match self {
            Function::CurrentMember => "CurrentMember",
            Function::DefaultMember => "DefaultMember",
            Function::Parent => "Parent",
            Function::MemberLevel => "Level",
            Function::MemberHierarchy | Function::LevelHierarchy => "Hierarchy",
            Function::HierarchyDimension => "Dimension",
            Function::Dimensions => "Dimensions",
            Function::Name => "Name",
            Function::UniqueName => "UniqueName",
            Function::Tuple => "()",
            Function::Item => "Item",
            Function::Set => "{}",
            Function::Value => "Value",
            Function::Aggregate(agg) => agg.name(),
            Function::Arithmetic(op) => op.symbol(),
            Function::Negate => "-",
            Function::Compare(op) => op.symbol(),
            Function::And => "AND",
            Function::Or => "OR",
            Function::Not => "NOT",
            Function::IsEmpty => "IsEmpty",
            Function::Iif => "Iif",
            Function::UserDefined(udf) => udf.name(),
        }
    }

    /// Result type of a call with the given arguments.
    ///
    /// Never fails: a call with the wrong number of arguments is typed as if
    /// the missing arguments were unknown and rejected later by the compiler.
    pub fn result_type(&self, args: &[Arc<Expr>]) -> Type {
        let arg = |i: usize| args.get(i).map(|a| a.ty());
        match self {
            Function::CurrentMember | Function::DefaultMember => {
                Type::Member(member_type_of_hierarchy_arg(arg(0)))
            }
            Function::Parent => Type::Member(
                arg(0)
                    .and_then(Type::member_type)
                    .map_or(MemberType::UNKNOWN, MemberType::widen_to_hierarchy),
            ),
            Function::MemberLevel => Type::Level(
                arg(0)
                    .and_then(Type::hierarchy)
                    .map_or(LevelType::UNKNOWN, LevelType::for_hierarchy),
            ),
            Function::MemberHierarchy | Function::LevelHierarchy => {
                Type::Hierarchy(hierarchy_type_of(arg(0)))
            }
            Function::HierarchyDimension => Type::Dimension(
                arg(0)
                    .and_then(Type::dimension)
                    .map_or(DimensionType::UNKNOWN, DimensionType::for_dimension),
            ),
            Function::Dimensions => Type::Dimension(DimensionType::UNKNOWN),
            Function::Name | Function::UniqueName => Type::String,
            Function::Tuple => Type::Tuple(TupleType::new(
                args.iter()
                    .map(|a| a.ty().member_type().cloned().unwrap_or(MemberType::UNKNOWN))
                    .collect(),
            )),
            // The member could come from any position of the tuple.
            Function::Item => Type::Member(MemberType::UNKNOWN),
            Function::Set => Type::Set(common_member_type(args)),
            Function::Value => Type::Numeric,
            Function::Aggregate(Aggregator::Count) => Type::Integer,
            Function::Aggregate(_) | Function::Arithmetic(_) | Function::Negate => Type::Numeric,
            Function::Compare(_) | Function::And | Function::Or | Function::Not | Function::IsEmpty => {
                Type::Boolean
            }
            Function::Iif => iif_type(arg(1), arg(2)),
            Function::UserDefined(udf) => udf.return_type(),
        }
    }
}

fn member_type_of_hierarchy_arg(ty: Option<&Type>) -> MemberType {
    match ty {
        Some(Type::Hierarchy(h)) => match (h.hierarchy(), h.dimension()) {
            (Some(hierarchy), _) => MemberType::for_hierarchy(hierarchy),
            (None, Some(dimension)) => MemberType::for_dimension(dimension),
            (None, None) => MemberType::UNKNOWN,
        },
        Some(Type::Dimension(d)) => d
            .dimension()
            .map_or(MemberType::UNKNOWN, MemberType::for_dimension),
        Some(Type::Member(m)) => m.widen_to_hierarchy(),
        _ => MemberType::UNKNOWN,
    }
}

fn hierarchy_type_of(ty: Option<&Type>) -> HierarchyType {
    match ty {
        Some(ty) => match (ty.hierarchy(), ty.dimension()) {
            (Some(hierarchy), _) => HierarchyType::for_hierarchy(hierarchy),
            (None, Some(dimension)) => HierarchyType::for_dimension(dimension),
            (None, None) => HierarchyType::UNKNOWN,
        },
        None => HierarchyType::UNKNOWN,
    }
}

fn common_member_type(args: &[Arc<Expr>]) -> MemberType {
    let mut hierarchies = args.iter().map(|a| a.ty().hierarchy());
    match hierarchies.next() {
        Some(Some(first)) if hierarchies.all(|h| h == Some(first)) => {
            MemberType::for_hierarchy(first)
        }
        _ => MemberType::UNKNOWN,
    }
}

fn iif_type(then: Option<&Type>, otherwise: Option<&Type>) -> Type {
    match (then, otherwise) {
        (Some(a), Some(b)) if a == b => a.clone(),
        (Some(Type::Null), Some(b)) => b.clone(),
        (Some(a), Some(Type::Null)) => a.clone(),
        (Some(a), Some(b)) if a.category().is_numeric() && b.category().is_numeric() => {
            Type::Numeric
        }
        (Some(a), _) if a.category() == Category::String => Type::String,
        (Some(a), _) => a.clone(),
        (None, _) => Type::Null,
    }
}
