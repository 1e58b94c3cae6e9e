//! Compiled calculators.
//!
//! A calculator ("calc") is the executable form of an expression: an
//! immutable tree built once by the [compiler](crate::compiler) and evaluated
//! many times, once per cell or tuple, against an [`Evaluator`].
//!
//! ## Taxonomy
//!
//! [`Calc`] is a closed set of tagged variants, one per result category. Each
//! variant wraps a category-specific node type ([`ScalarCalc`],
//! [`MemberCalc`], ...) that exposes exactly one `evaluate` entry point.
//! Asking a `Calc` for a category it does not produce (say, evaluating a
//! scalar calc as a tuple) is a compiler defect and fails with
//! [`EvalError::Unsupported`], which is never used on the null path.
//!
//! ## Contracts
//!
//! - `evaluate` leaves the evaluator exactly as it found it, on every exit
//!   path: normal return, null short-circuit, and error.
//! - `depends_on(h)` returns `false` only when the result provably cannot
//!   change if the current member of `h` changes. Composite nodes default to
//!   "any child depends"; leaf nodes that read a hierarchy answer from the
//!   type system; nodes that fix a hierarchy themselves may answer `false`
//!   for that hierarchy.

mod aggregate;
mod dimensional;
mod list;
mod member;
mod scalar;
mod tuple;
mod void;
mod writer;

pub use dimensional::{DimensionCalc, HierarchyCalc, LevelCalc};
pub use list::MemberListCalc;
pub use member::MemberCalc;
pub use scalar::ScalarCalc;
pub use tuple::TupleCalc;
pub use void::VoidCalc;
pub use writer::CalcWriter;

pub(crate) use dimensional::{DimensionNode, HierarchyNode, LevelNode};
pub(crate) use list::MemberListNode;
pub(crate) use member::MemberNode;
pub(crate) use scalar::ScalarNode;
pub(crate) use tuple::TupleNode;
pub(crate) use void::VoidNode;

use std::sync::Arc;

use olapcalc_types::{Category, Cube, Dimension, Hierarchy, Level, Member, Type};

use crate::evaluator::{EvalError, Evaluator};
use crate::expr::Expr;
use crate::values::{CalcValue, Tuple, Value};

/// A compiled calculator of any result category.
#[derive(Debug, Clone)]
pub enum Calc {
    Scalar(Arc<ScalarCalc>),
    Member(Arc<MemberCalc>),
    Tuple(Arc<TupleCalc>),
    MemberList(Arc<MemberListCalc>),
    Hierarchy(Arc<HierarchyCalc>),
    Level(Arc<LevelCalc>),
    Dimension(Arc<DimensionCalc>),
    Void(Arc<VoidCalc>),
}

macro_rules! dispatch {
    ($self:expr, $calc:ident => $body:expr) => {
        match $self {
            Calc::Scalar($calc) => $body,
            Calc::Member($calc) => $body,
            Calc::Tuple($calc) => $body,
            Calc::MemberList($calc) => $body,
            Calc::Hierarchy($calc) => $body,
            Calc::Level($calc) => $body,
            Calc::Dimension($calc) => $body,
            Calc::Void($calc) => $body,
        }
    };
}

impl Calc {
    /// Result category. Scalar calcs report the category of their type.
    pub fn category(&self) -> Category {
        match self {
            Calc::Scalar(c) => c.ty().category(),
            Calc::Member(_) => Category::Member,
            Calc::Tuple(_) => Category::Tuple,
            Calc::MemberList(_) => Category::Set,
            Calc::Hierarchy(_) => Category::Hierarchy,
            Calc::Level(_) => Category::Level,
            Calc::Dimension(_) => Category::Dimension,
            Calc::Void(_) => Category::Void,
        }
    }

    /// Static type of the result.
    pub fn ty(&self) -> &Type {
        dispatch!(self, c => c.ty())
    }

    /// The expression this calc was compiled from.
    pub fn expr(&self) -> &Arc<Expr> {
        dispatch!(self, c => c.expr())
    }

    /// Node name with its constant arguments, e.g. `CurrentMemberFixed([Store])`.
    pub fn describe(&self) -> String {
        dispatch!(self, c => c.describe())
    }

    /// Direct children, in evaluation order.
    pub fn children(&self) -> Vec<Calc> {
        dispatch!(self, c => c.children())
    }

    /// Whether the result may change when the current member of `hierarchy`
    /// changes.
    pub fn depends_on(&self, hierarchy: &Hierarchy) -> bool {
        dispatch!(self, c => c.depends_on(hierarchy))
    }

    /// Whether the result may change when the current member of any
    /// hierarchy of `dimension` changes.
    pub fn depends_on_dimension(&self, cube: &Cube, dimension: &Dimension) -> bool {
        cube.hierarchies_of(dimension).any(|h| self.depends_on(h))
    }

    /// Every hierarchy of `cube` this calc may depend on.
    pub fn dependent_hierarchies(&self, cube: &Cube) -> Vec<Hierarchy> {
        cube.hierarchies()
            .iter()
            .filter(|h| self.depends_on(h))
            .cloned()
            .collect()
    }

    /// Evaluates through the category-agnostic entry point.
    pub fn evaluate(&self, evaluator: &mut Evaluator) -> Result<CalcValue, EvalError> {
        Ok(match self {
            Calc::Scalar(c) => CalcValue::Scalar(c.evaluate(evaluator)?),
            Calc::Member(c) => CalcValue::Member(c.evaluate(evaluator)?),
            Calc::Tuple(c) => CalcValue::Tuple(c.evaluate(evaluator)?),
            Calc::MemberList(c) => CalcValue::MemberList(c.evaluate(evaluator)?),
            Calc::Hierarchy(c) => CalcValue::Hierarchy(c.evaluate(evaluator)?),
            Calc::Level(c) => CalcValue::Level(c.evaluate(evaluator)?),
            Calc::Dimension(c) => CalcValue::Dimension(c.evaluate(evaluator)?),
            Calc::Void(c) => {
                c.evaluate(evaluator)?;
                CalcValue::Void
            }
        })
    }

    pub fn evaluate_scalar(&self, evaluator: &mut Evaluator) -> Result<Value, EvalError> {
        match self {
            Calc::Scalar(c) => c.evaluate(evaluator),
            _ => Err(self.unsupported("evaluate_scalar")),
        }
    }

    pub fn evaluate_member(&self, evaluator: &mut Evaluator) -> Result<Option<Member>, EvalError> {
        match self {
            Calc::Member(c) => c.evaluate(evaluator),
            _ => Err(self.unsupported("evaluate_member")),
        }
    }

    pub fn evaluate_tuple(&self, evaluator: &mut Evaluator) -> Result<Option<Tuple>, EvalError> {
        match self {
            Calc::Tuple(c) => c.evaluate(evaluator),
            _ => Err(self.unsupported("evaluate_tuple")),
        }
    }

    pub fn evaluate_member_list(&self, evaluator: &mut Evaluator) -> Result<Vec<Member>, EvalError> {
        match self {
            Calc::MemberList(c) => c.evaluate(evaluator),
            _ => Err(self.unsupported("evaluate_member_list")),
        }
    }

    pub fn evaluate_hierarchy(
        &self,
        evaluator: &mut Evaluator,
    ) -> Result<Option<Hierarchy>, EvalError> {
        match self {
            Calc::Hierarchy(c) => c.evaluate(evaluator),
            _ => Err(self.unsupported("evaluate_hierarchy")),
        }
    }

    pub fn evaluate_level(&self, evaluator: &mut Evaluator) -> Result<Option<Level>, EvalError> {
        match self {
            Calc::Level(c) => c.evaluate(evaluator),
            _ => Err(self.unsupported("evaluate_level")),
        }
    }

    pub fn evaluate_dimension(
        &self,
        evaluator: &mut Evaluator,
    ) -> Result<Option<Dimension>, EvalError> {
        match self {
            Calc::Dimension(c) => c.evaluate(evaluator),
            _ => Err(self.unsupported("evaluate_dimension")),
        }
    }

    pub fn evaluate_void(&self, evaluator: &mut Evaluator) -> Result<(), EvalError> {
        match self {
            Calc::Void(c) => c.evaluate(evaluator),
            _ => Err(self.unsupported("evaluate_void")),
        }
    }

    fn unsupported(&self, entry: &'static str) -> EvalError {
        EvalError::Unsupported {
            calc: self.describe(),
            entry,
        }
    }

    pub fn as_scalar(&self) -> Option<&Arc<ScalarCalc>> {
        match self {
            Calc::Scalar(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_member(&self) -> Option<&Arc<MemberCalc>> {
        match self {
            Calc::Member(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&Arc<TupleCalc>> {
        match self {
            Calc::Tuple(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_member_list(&self) -> Option<&Arc<MemberListCalc>> {
        match self {
            Calc::MemberList(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_hierarchy(&self) -> Option<&Arc<HierarchyCalc>> {
        match self {
            Calc::Hierarchy(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_level(&self) -> Option<&Arc<LevelCalc>> {
        match self {
            Calc::Level(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_dimension(&self) -> Option<&Arc<DimensionCalc>> {
        match self {
            Calc::Dimension(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_void(&self) -> Option<&Arc<VoidCalc>> {
        match self {
            Calc::Void(c) => Some(c),
            _ => None,
        }
    }
}

/// Default dependency policy for composite nodes: any child depends.
pub(crate) fn any_depends(children: &[Calc], hierarchy: &Hierarchy) -> bool {
    children.iter().any(|c| c.depends_on(hierarchy))
}

/// Dependency policy for nodes that iterate over a set, setting each member
/// of the set as current while evaluating the remaining children.
///
/// If the set itself depends on `hierarchy`, so does the node. Otherwise, if
/// the set's members definitely belong to `hierarchy`, the iteration fixes it
/// and the node does not depend on it. Otherwise any other child decides.
pub(crate) fn any_depends_but_first(children: &[Calc], hierarchy: &Hierarchy) -> bool {
    let Some((first, rest)) = children.split_first() else {
        return false;
    };
    if first.depends_on(hierarchy) {
        return true;
    }
    if first.ty().uses_hierarchy(hierarchy, true) {
        return false;
    }
    any_depends(rest, hierarchy)
}

impl From<Arc<ScalarCalc>> for Calc {
    fn from(c: Arc<ScalarCalc>) -> Self {
        Calc::Scalar(c)
    }
}

impl From<Arc<MemberCalc>> for Calc {
    fn from(c: Arc<MemberCalc>) -> Self {
        Calc::Member(c)
    }
}

impl From<Arc<TupleCalc>> for Calc {
    fn from(c: Arc<TupleCalc>) -> Self {
        Calc::Tuple(c)
    }
}

impl From<Arc<MemberListCalc>> for Calc {
    fn from(c: Arc<MemberListCalc>) -> Self {
        Calc::MemberList(c)
    }
}

impl From<Arc<HierarchyCalc>> for Calc {
    fn from(c: Arc<HierarchyCalc>) -> Self {
        Calc::Hierarchy(c)
    }
}

impl From<Arc<LevelCalc>> for Calc {
    fn from(c: Arc<LevelCalc>) -> Self {
        Calc::Level(c)
    }
}

impl From<Arc<DimensionCalc>> for Calc {
    fn from(c: Arc<DimensionCalc>) -> Self {
        Calc::Dimension(c)
    }
}

impl From<Arc<VoidCalc>> for Calc {
    fn from(c: Arc<VoidCalc>) -> Self {
        Calc::Void(c)
    }
}
