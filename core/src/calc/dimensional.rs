//! Hierarchy, level and dimension calculators. `None` is the null sentinel.

use std::sync::Arc;

use olapcalc_types::{Dimension, Hierarchy, Level, Type};

use super::{Calc, MemberCalc, ScalarCalc, any_depends};
use crate::evaluator::{EvalError, Evaluator};
use crate::expr::Expr;

// ============================================================================
// Hierarchy
// ============================================================================

#[derive(Debug)]
pub struct HierarchyCalc {
    ty: Type,
    expr: Arc<Expr>,
    node: HierarchyNode,
}

#[derive(Debug)]
pub(crate) enum HierarchyNode {
    Constant(Hierarchy),
    OfMember(Arc<MemberCalc>),
    OfLevel(Arc<LevelCalc>),
    /// Default hierarchy of a dimension computed at run time.
    DefaultOfDimension(Arc<DimensionCalc>),
}

impl HierarchyCalc {
    pub(crate) fn new(ty: Type, expr: Arc<Expr>, node: HierarchyNode) -> Self {
        HierarchyCalc { ty, expr, node }
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn expr(&self) -> &Arc<Expr> {
        &self.expr
    }

    pub fn constant(&self) -> Option<&Hierarchy> {
        match &self.node {
            HierarchyNode::Constant(h) => Some(h),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match &self.node {
            HierarchyNode::Constant(h) => format!("Constant({})", h),
            HierarchyNode::OfMember(_) => "MemberHierarchy".to_string(),
            HierarchyNode::OfLevel(_) => "LevelHierarchy".to_string(),
            HierarchyNode::DefaultOfDimension(_) => "DimensionDefaultHierarchy".to_string(),
        }
    }

    pub fn children(&self) -> Vec<Calc> {
        match &self.node {
            HierarchyNode::Constant(_) => vec![],
            HierarchyNode::OfMember(m) => vec![Calc::Member(Arc::clone(m))],
            HierarchyNode::OfLevel(l) => vec![Calc::Level(Arc::clone(l))],
            HierarchyNode::DefaultOfDimension(d) => vec![Calc::Dimension(Arc::clone(d))],
        }
    }

    pub fn depends_on(&self, hierarchy: &Hierarchy) -> bool {
        any_depends(&self.children(), hierarchy)
    }

    pub fn evaluate(&self, ev: &mut Evaluator) -> Result<Option<Hierarchy>, EvalError> {
        Ok(match &self.node {
            HierarchyNode::Constant(h) => Some(h.clone()),
            HierarchyNode::OfMember(m) => m.evaluate(ev)?.and_then(|m| m.hierarchy().cloned()),
            HierarchyNode::OfLevel(l) => l.evaluate(ev)?.map(|l| l.hierarchy().clone()),
            HierarchyNode::DefaultOfDimension(d) => d
                .evaluate(ev)?
                .and_then(|d| ev.cube().default_hierarchy(&d)),
        })
    }
}

// ============================================================================
// Level
// ============================================================================

#[derive(Debug)]
pub struct LevelCalc {
    ty: Type,
    expr: Arc<Expr>,
    node: LevelNode,
}

#[derive(Debug)]
pub(crate) enum LevelNode {
    Constant(Level),
    OfMember(Arc<MemberCalc>),
}

impl LevelCalc {
    pub(crate) fn new(ty: Type, expr: Arc<Expr>, node: LevelNode) -> Self {
        LevelCalc { ty, expr, node }
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn expr(&self) -> &Arc<Expr> {
        &self.expr
    }

    pub fn describe(&self) -> String {
        match &self.node {
            LevelNode::Constant(l) => format!("Constant({})", l.unique_name()),
            LevelNode::OfMember(_) => "MemberLevel".to_string(),
        }
    }

    pub fn children(&self) -> Vec<Calc> {
        match &self.node {
            LevelNode::Constant(_) => vec![],
            LevelNode::OfMember(m) => vec![Calc::Member(Arc::clone(m))],
        }
    }

    pub fn depends_on(&self, hierarchy: &Hierarchy) -> bool {
        any_depends(&self.children(), hierarchy)
    }

    pub fn evaluate(&self, ev: &mut Evaluator) -> Result<Option<Level>, EvalError> {
        Ok(match &self.node {
            LevelNode::Constant(l) => Some(l.clone()),
            LevelNode::OfMember(m) => m.evaluate(ev)?.and_then(|m| m.level().cloned()),
        })
    }
}

// ============================================================================
// Dimension
// ============================================================================

#[derive(Debug)]
pub struct DimensionCalc {
    ty: Type,
    expr: Arc<Expr>,
    node: DimensionNode,
}

#[derive(Debug)]
pub(crate) enum DimensionNode {
    Constant(Dimension),
    OfHierarchy(Arc<HierarchyCalc>),
    /// `Dimensions(n)`: the dimension at ordinal `n` of the cube.
    ByOrdinal(Arc<ScalarCalc>),
}

impl DimensionCalc {
    pub(crate) fn new(ty: Type, expr: Arc<Expr>, node: DimensionNode) -> Self {
        DimensionCalc { ty, expr, node }
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn expr(&self) -> &Arc<Expr> {
        &self.expr
    }

    pub fn describe(&self) -> String {
        match &self.node {
            DimensionNode::Constant(d) => format!("Constant({})", d),
            DimensionNode::OfHierarchy(_) => "HierarchyDimension".to_string(),
            DimensionNode::ByOrdinal(_) => "Dimensions".to_string(),
        }
    }

    pub fn children(&self) -> Vec<Calc> {
        match &self.node {
            DimensionNode::Constant(_) => vec![],
            DimensionNode::OfHierarchy(h) => vec![Calc::Hierarchy(Arc::clone(h))],
            DimensionNode::ByOrdinal(n) => vec![Calc::Scalar(Arc::clone(n))],
        }
    }

    pub fn depends_on(&self, hierarchy: &Hierarchy) -> bool {
        any_depends(&self.children(), hierarchy)
    }

    pub fn evaluate(&self, ev: &mut Evaluator) -> Result<Option<Dimension>, EvalError> {
        Ok(match &self.node {
            DimensionNode::Constant(d) => Some(d.clone()),
            DimensionNode::OfHierarchy(h) => h.evaluate(ev)?.map(|h| h.dimension().clone()),
            DimensionNode::ByOrdinal(n) => n
                .evaluate(ev)?
                .as_integer()
                .and_then(|i| usize::try_from(i).ok())
                .and_then(|i| ev.cube().dimensions().get(i).cloned()),
        })
    }
}
