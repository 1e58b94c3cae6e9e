//! Validated multidimensional expressions.
//!
//! An [`Expr`] is the input of the compiler: an immutable tree whose every
//! node carries its static [`Type`]. Trees are built by the (external)
//! validator and shared as `Arc<Expr>`; a sub-expression shared by several
//! parents, such as a named set, is compiled once.
//!
//! ```
//! use olapcalc_core::expr::{Expr, Function};
//! use olapcalc_types::CubeBuilder;
//!
//! let mut builder = CubeBuilder::new("Sales");
//! let store = builder.hierarchy("Store", &["Country"]);
//! builder.build();
//!
//! let current = Expr::call(Function::CurrentMember, vec![Expr::hierarchy(&store)]);
//! assert_eq!(current.to_string(), "[Store].CurrentMember");
//! assert_eq!(current.ty().hierarchy(), Some(&store));
//! ```

mod display;
mod function;

pub use function::{Aggregator, ArithmeticOp, CompareOp, Function, UserDefinedFunction};

use std::sync::Arc;

use olapcalc_types::{
    Dimension, DimensionType, Hierarchy, HierarchyType, Level, LevelType, Member, MemberType, Type,
};

use crate::parameters::Parameter;
use crate::values::Value;

/// A validated expression node.
#[derive(Debug)]
pub struct Expr {
    ty: Type,
    kind: ExprKind,
}

/// The shape of an expression node.
#[derive(Debug)]
pub enum ExprKind {
    /// A scalar literal, including the null literal.
    Literal(Value),
    Member(Member),
    Hierarchy(Hierarchy),
    Level(Level),
    Dimension(Dimension),
    Parameter(Arc<Parameter>),
    Call {
        function: Function,
        args: Vec<Arc<Expr>>,
    },
}

impl Expr {
    /// Creates a node whose type has been determined by the caller.
    pub fn with_type(kind: ExprKind, ty: Type) -> Arc<Expr> {
        Arc::new(Expr { ty, kind })
    }

    pub fn number(n: f64) -> Arc<Expr> {
        Expr::with_type(ExprKind::Literal(Value::Number(n)), Type::Numeric)
    }

    pub fn integer(n: i64) -> Arc<Expr> {
        Expr::with_type(ExprKind::Literal(Value::from(n)), Type::Integer)
    }

    pub fn string(s: &str) -> Arc<Expr> {
        Expr::with_type(ExprKind::Literal(Value::string(s)), Type::String)
    }

    pub fn boolean(b: bool) -> Arc<Expr> {
        Expr::with_type(ExprKind::Literal(Value::Boolean(b)), Type::Boolean)
    }

    pub fn null() -> Arc<Expr> {
        Expr::with_type(ExprKind::Literal(Value::Null), Type::Null)
    }

    pub fn member(member: &Member) -> Arc<Expr> {
        Expr::with_type(
            ExprKind::Member(member.clone()),
            Type::Member(MemberType::for_member(member)),
        )
    }

    pub fn hierarchy(hierarchy: &Hierarchy) -> Arc<Expr> {
        Expr::with_type(
            ExprKind::Hierarchy(hierarchy.clone()),
            Type::Hierarchy(HierarchyType::for_hierarchy(hierarchy)),
        )
    }

    pub fn level(level: &Level) -> Arc<Expr> {
        Expr::with_type(
            ExprKind::Level(level.clone()),
            Type::Level(LevelType::for_level(level)),
        )
    }

    pub fn dimension(dimension: &Dimension) -> Arc<Expr> {
        Expr::with_type(
            ExprKind::Dimension(dimension.clone()),
            Type::Dimension(DimensionType::for_dimension(dimension)),
        )
    }

    /// A reference to a query parameter. Its type is the parameter's type.
    pub fn parameter(parameter: &Arc<Parameter>) -> Arc<Expr> {
        Expr::with_type(
            ExprKind::Parameter(Arc::clone(parameter)),
            parameter.ty().clone(),
        )
    }

    /// A function call, typed by the function's result-type rule.
    pub fn call(function: Function, args: Vec<Arc<Expr>>) -> Arc<Expr> {
        let ty = function.result_type(&args);
        Expr::with_type(ExprKind::Call { function, args }, ty)
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn kind(&self) -> &ExprKind {
        &self.kind
    }

    /// Arguments of a call; empty for every other node.
    pub fn args(&self) -> &[Arc<Expr>] {
        match &self.kind {
            ExprKind::Call { args, .. } => args,
            _ => &[],
        }
    }
}
