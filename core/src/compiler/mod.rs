//! Expression compiler.
//!
//! Turns a validated [`Expr`] into a tree of calculators. Every entry point
//! takes the category the calling context requires and either returns a calc
//! of that category, inserting an implicit conversion where the language
//! defines one, or fails with a [`CompileError`].
//!
//! ## Design
//!
//! - Each distinct expression node is compiled once per target category.
//!   Shared sub-expressions (named sets, parameter defaults) reuse the calc.
//! - When a function's hierarchy operand is statically known, the compiler
//!   selects a variant that captures the hierarchy directly
//!   (`CurrentMemberFixed`, constant `DefaultMember`, ...). Otherwise it
//!   selects a variant that resolves the hierarchy on every evaluation.
//! - Parameters get a slot in the statement's [`ParameterSlots`]; calc nodes
//!   that read a parameter hold the slot.

mod error;
mod functions;

#[cfg(test)]
mod tests;

pub use error::CompileError;

use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use olapcalc_types::{
    Category, Cube, DimensionType, HierarchyType, Member, MemberType, TupleType, Type,
};
use tracing::debug;

use crate::api::CompilationOptions;
use crate::calc::{
    Calc, DimensionCalc, DimensionNode, HierarchyCalc, HierarchyNode, LevelCalc, LevelNode,
    MemberCalc, MemberListCalc, MemberListNode, MemberNode, ScalarCalc, ScalarNode, TupleCalc,
    TupleNode, VoidCalc, VoidNode,
};
use crate::expr::{Expr, ExprKind, Function};
use crate::parameters::{Parameter, ParameterSlot, ParameterSlots};

type CacheKey = (usize, Category);

/// Compiles the expressions of one statement.
pub struct Compiler<'a> {
    cube: Cube,
    options: CompilationOptions,
    slots: ParameterSlots,
    previous: Option<&'a ParameterSlots>,
    /// Compiled calcs by expression identity and target category. The
    /// expression is kept alive so its address cannot be reused.
    cache: HashMap<CacheKey, (Arc<Expr>, Calc)>,
    /// Parameters whose default value is being compiled.
    registering: HashSet<String>,
}

impl<'a> Compiler<'a> {
    pub fn new(cube: &Cube, options: CompilationOptions) -> Self {
        Compiler {
            cube: cube.clone(),
            options,
            slots: ParameterSlots::new(),
            previous: None,
            cache: HashMap::new(),
            registering: HashSet::new(),
        }
    }

    /// Carries explicitly assigned parameter values over from a previous
    /// preparation of the same statement.
    pub fn with_previous(mut self, previous: &'a ParameterSlots) -> Self {
        self.previous = Some(previous);
        self
    }

    pub fn cube(&self) -> &Cube {
        &self.cube
    }

    pub fn options(&self) -> &CompilationOptions {
        &self.options
    }

    /// The statement's parameter slots, registered so far.
    pub fn parameters(&self) -> &ParameterSlots {
        &self.slots
    }

    /// Finishes compilation and hands over the parameter slots.
    pub fn into_parameters(self) -> ParameterSlots {
        self.slots
    }

    /// Compiles `expr` in its own category.
    pub fn compile(&mut self, expr: &Arc<Expr>) -> Result<Calc, CompileError> {
        let category = expr.ty().category();
        Ok(match category {
            c if c.is_scalar() => Calc::Scalar(self.compile_scalar(expr)?),
            Category::Member => Calc::Member(self.compile_member(expr)?),
            Category::Tuple => Calc::Tuple(self.compile_tuple(expr)?),
            Category::Set => Calc::MemberList(self.compile_member_list(expr)?),
            Category::Hierarchy => Calc::Hierarchy(self.compile_hierarchy(expr)?),
            Category::Level => Calc::Level(self.compile_level(expr)?),
            Category::Dimension => Calc::Dimension(self.compile_dimension(expr)?),
            Category::Void => Calc::Void(self.compile_void(expr)?),
            _ => {
                return Err(CompileError::NoCalc {
                    expr: expr.to_string(),
                    category,
                });
            }
        })
    }

    pub fn compile_scalar(&mut self, expr: &Arc<Expr>) -> Result<Arc<ScalarCalc>, CompileError> {
        self.cached(expr, Category::Numeric, Calc::as_scalar, |this, expr| {
            let node = match expr.ty().category() {
                c if c.is_scalar() => {
                    return match this.compile_natural(expr)? {
                        Calc::Scalar(calc) => Ok(calc),
                        _ => Err(mismatch(expr, Category::Numeric)),
                    };
                }
                Category::Member | Category::Hierarchy | Category::Dimension => {
                    ScalarNode::MemberValue {
                        members: vec![this.compile_member(expr)?],
                    }
                }
                Category::Tuple => match expr.kind() {
                    // A literal tuple substitutes its members directly.
                    ExprKind::Call {
                        function: Function::Tuple,
                        args,
                    } => ScalarNode::MemberValue {
                        members: args
                            .iter()
                            .map(|a| this.compile_member(a))
                            .collect::<Result<_, _>>()?,
                    },
                    _ => ScalarNode::TupleValue {
                        tuple: this.compile_tuple(expr)?,
                    },
                },
                _ => return Err(mismatch(expr, Category::Numeric)),
            };
            Ok(Arc::new(ScalarCalc::new(Type::Numeric, Arc::clone(expr), node)))
        })
    }

    /// Compiles a scalar whose value is used as an integer (an index or an
    /// ordinal). Numeric values are truncated toward zero.
    pub fn compile_integer(&mut self, expr: &Arc<Expr>) -> Result<Arc<ScalarCalc>, CompileError> {
        self.cached(expr, Category::Integer, Calc::as_scalar, |this, expr| {
            let scalar = this.compile_scalar(expr)?;
            if *scalar.ty() == Type::Integer {
                return Ok(scalar);
            }
            Ok(Arc::new(ScalarCalc::new(
                Type::Integer,
                Arc::clone(expr),
                ScalarNode::Integer(scalar),
            )))
        })
    }

    pub fn compile_member(&mut self, expr: &Arc<Expr>) -> Result<Arc<MemberCalc>, CompileError> {
        self.cached(expr, Category::Member, Calc::as_member, |this, expr| {
            match expr.ty().category() {
                Category::Member => match this.compile_natural(expr)? {
                    Calc::Member(calc) => Ok(calc),
                    _ => Err(mismatch(expr, Category::Member)),
                },
                // `[Store]` used as a member means `[Store].CurrentMember`.
                Category::Hierarchy | Category::Dimension => {
                    let hierarchy = this.compile_hierarchy(expr)?;
                    let ty = Function::CurrentMember.result_type(std::slice::from_ref(expr));
                    Ok(Arc::new(this.current_member(ty, expr, hierarchy)))
                }
                Category::Null => Ok(Arc::new(MemberCalc::new(
                    Type::Member(MemberType::UNKNOWN),
                    Arc::clone(expr),
                    MemberNode::Constant(Member::null(None)),
                ))),
                _ => Err(mismatch(expr, Category::Member)),
            }
        })
    }

    pub fn compile_tuple(&mut self, expr: &Arc<Expr>) -> Result<Arc<TupleCalc>, CompileError> {
        self.cached(expr, Category::Tuple, Calc::as_tuple, |this, expr| {
            match expr.ty().category() {
                Category::Tuple => match this.compile_natural(expr)? {
                    Calc::Tuple(calc) => Ok(calc),
                    _ => Err(mismatch(expr, Category::Tuple)),
                },
                Category::Member | Category::Hierarchy | Category::Dimension => {
                    let member = this.compile_member(expr)?;
                    let element = member_type_of(member.ty());
                    Ok(Arc::new(TupleCalc::new(
                        Type::Tuple(TupleType::new(vec![element])),
                        Arc::clone(expr),
                        TupleNode::FromMember(member),
                    )))
                }
                _ => Err(mismatch(expr, Category::Tuple)),
            }
        })
    }

    pub fn compile_member_list(
        &mut self,
        expr: &Arc<Expr>,
    ) -> Result<Arc<MemberListCalc>, CompileError> {
        self.cached(expr, Category::Set, Calc::as_member_list, |this, expr| {
            match expr.ty().category() {
                Category::Set => match this.compile_natural(expr)? {
                    Calc::MemberList(calc) => Ok(calc),
                    _ => Err(mismatch(expr, Category::Set)),
                },
                Category::Member | Category::Hierarchy | Category::Dimension => {
                    let member = this.compile_member(expr)?;
                    let element = member_type_of(member.ty());
                    Ok(Arc::new(MemberListCalc::new(
                        Type::Set(element),
                        Arc::clone(expr),
                        MemberListNode::FromMember(member),
                    )))
                }
                _ => Err(mismatch(expr, Category::Set)),
            }
        })
    }

    pub fn compile_hierarchy(
        &mut self,
        expr: &Arc<Expr>,
    ) -> Result<Arc<HierarchyCalc>, CompileError> {
        self.cached(expr, Category::Hierarchy, Calc::as_hierarchy, |this, expr| {
            match expr.ty().category() {
                Category::Hierarchy => match this.compile_natural(expr)? {
                    Calc::Hierarchy(calc) => Ok(calc),
                    _ => Err(mismatch(expr, Category::Hierarchy)),
                },
                Category::Member => {
                    let member = this.compile_member(expr)?;
                    let ty = Function::MemberHierarchy.result_type(std::slice::from_ref(expr));
                    Ok(Arc::new(this.member_hierarchy(ty, expr, member)))
                }
                Category::Level => {
                    let level = this.compile_level(expr)?;
                    let ty = Function::LevelHierarchy.result_type(std::slice::from_ref(expr));
                    Ok(Arc::new(this.level_hierarchy(ty, expr, level)))
                }
                Category::Dimension => {
                    let dimension = this.compile_dimension(expr)?;
                    Ok(Arc::new(this.default_hierarchy(expr, dimension)))
                }
                _ => Err(mismatch(expr, Category::Hierarchy)),
            }
        })
    }

    pub fn compile_level(&mut self, expr: &Arc<Expr>) -> Result<Arc<LevelCalc>, CompileError> {
        self.cached(expr, Category::Level, Calc::as_level, |this, expr| {
            match expr.ty().category() {
                Category::Level => match this.compile_natural(expr)? {
                    Calc::Level(calc) => Ok(calc),
                    _ => Err(mismatch(expr, Category::Level)),
                },
                Category::Member => {
                    let member = this.compile_member(expr)?;
                    let ty = Function::MemberLevel.result_type(std::slice::from_ref(expr));
                    Ok(Arc::new(this.member_level(ty, expr, member)))
                }
                _ => Err(mismatch(expr, Category::Level)),
            }
        })
    }

    pub fn compile_dimension(
        &mut self,
        expr: &Arc<Expr>,
    ) -> Result<Arc<DimensionCalc>, CompileError> {
        self.cached(expr, Category::Dimension, Calc::as_dimension, |this, expr| {
            match expr.ty().category() {
                Category::Dimension => match this.compile_natural(expr)? {
                    Calc::Dimension(calc) => Ok(calc),
                    _ => Err(mismatch(expr, Category::Dimension)),
                },
                Category::Hierarchy | Category::Member | Category::Level => {
                    let hierarchy = this.compile_hierarchy(expr)?;
                    Ok(Arc::new(this.hierarchy_dimension(expr, hierarchy)))
                }
                _ => Err(mismatch(expr, Category::Dimension)),
            }
        })
    }

    /// Compiles `expr` for its side effects. Any expression that has a calc
    /// qualifies; its result is discarded.
    pub fn compile_void(&mut self, expr: &Arc<Expr>) -> Result<Arc<VoidCalc>, CompileError> {
        self.cached(expr, Category::Void, Calc::as_void, |this, expr| {
            if expr.ty().category() == Category::Void {
                return match this.compile_natural(expr)? {
                    Calc::Void(calc) => Ok(calc),
                    _ => Err(mismatch(expr, Category::Void)),
                };
            }
            let calc = this.compile(expr)?;
            Ok(Arc::new(VoidCalc::new(
                Type::Void,
                Arc::clone(expr),
                VoidNode::Discard(calc),
            )))
        })
    }

    /// Returns the slot for `parameter`, creating it and compiling its
    /// default value on first use.
    pub fn register_parameter(
        &mut self,
        parameter: &Arc<Parameter>,
    ) -> Result<Arc<ParameterSlot>, CompileError> {
        if let Some(slot) = self.slots.get(parameter.name()) {
            return Ok(Arc::clone(slot));
        }
        if !parameter.has_supported_type() {
            return Err(CompileError::UnsupportedParameterType {
                name: parameter.name().to_string(),
                ty: parameter.ty().clone(),
            });
        }
        if !self.registering.insert(parameter.name().to_string()) {
            return Err(CompileError::RecursiveParameter {
                name: parameter.name().to_string(),
            });
        }

        let default = parameter.default_expr();
        let default_calc = match parameter.ty().category() {
            Category::Member => self.compile_member(default).map(Calc::Member),
            Category::Set => self.compile_member_list(default).map(Calc::MemberList),
            _ => self.compile_scalar(default).map(Calc::Scalar),
        };
        self.registering.remove(parameter.name());
        Ok(self.slots.register(parameter, default_calc?, self.previous))
    }

    fn cached<T>(
        &mut self,
        expr: &Arc<Expr>,
        target: Category,
        extract: fn(&Calc) -> Option<&Arc<T>>,
        build: impl FnOnce(&mut Self, &Arc<Expr>) -> Result<Arc<T>, CompileError>,
    ) -> Result<Arc<T>, CompileError>
    where
        Arc<T>: Into<Calc>,
    {
        let key = (Arc::as_ptr(expr) as usize, target);
        if let Some(calc) = self.cache.get(&key).and_then(|(_, calc)| extract(calc)) {
            return Ok(Arc::clone(calc));
        }
        let calc = build(self, expr)?;
        self.cache
            .insert(key, (Arc::clone(expr), Arc::clone(&calc).into()));
        Ok(calc)
    }

    /// Compiles `expr` in its own category, without conversions.
    fn compile_natural(&mut self, expr: &Arc<Expr>) -> Result<Calc, CompileError> {
        let ty = expr.ty().clone();
        let expr_ref = Arc::clone(expr);
        Ok(match expr.kind() {
            ExprKind::Literal(value) => Calc::Scalar(Arc::new(ScalarCalc::new(
                ty,
                expr_ref,
                ScalarNode::Constant(value.clone()),
            ))),
            ExprKind::Member(m) => Calc::Member(Arc::new(MemberCalc::new(
                ty,
                expr_ref,
                MemberNode::Constant(m.clone()),
            ))),
            ExprKind::Hierarchy(h) => Calc::Hierarchy(Arc::new(HierarchyCalc::new(
                ty,
                expr_ref,
                HierarchyNode::Constant(h.clone()),
            ))),
            ExprKind::Level(l) => Calc::Level(Arc::new(LevelCalc::new(
                ty,
                expr_ref,
                LevelNode::Constant(l.clone()),
            ))),
            ExprKind::Dimension(d) => Calc::Dimension(Arc::new(DimensionCalc::new(
                ty,
                expr_ref,
                DimensionNode::Constant(d.clone()),
            ))),
            ExprKind::Parameter(parameter) => {
                let slot = self.register_parameter(parameter)?;
                match parameter.ty().category() {
                    Category::Member => Calc::Member(Arc::new(MemberCalc::new(
                        ty,
                        expr_ref,
                        MemberNode::Parameter(slot),
                    ))),
                    Category::Set => Calc::MemberList(Arc::new(MemberListCalc::new(
                        ty,
                        expr_ref,
                        MemberListNode::Parameter(slot),
                    ))),
                    _ => Calc::Scalar(Arc::new(ScalarCalc::new(
                        ty,
                        expr_ref,
                        ScalarNode::Parameter(slot),
                    ))),
                }
            }
            ExprKind::Call { function, args } => self.compile_call(expr, function, args)?,
        })
    }

    /// Whether a statically known hierarchy may be captured by the calc.
    fn specialize(&self) -> bool {
        self.options.specialize_fixed_hierarchies
    }

    /// `CurrentMember` of a compiled hierarchy: fixed when the hierarchy is
    /// statically known, dynamic otherwise.
    fn current_member(&self, ty: Type, expr: &Arc<Expr>, hierarchy: Arc<HierarchyCalc>) -> MemberCalc {
        let node = match hierarchy.ty().hierarchy() {
            Some(h) if self.specialize() => {
                debug!(hierarchy = %h, "CurrentMember: fixed hierarchy");
                MemberNode::CurrentMemberFixed(h.clone())
            }
            _ => {
                debug!(expr = %expr, "CurrentMember: dynamic hierarchy");
                MemberNode::CurrentMember(hierarchy)
            }
        };
        MemberCalc::new(ty, Arc::clone(expr), node)
    }

    fn member_hierarchy(&self, ty: Type, expr: &Arc<Expr>, member: Arc<MemberCalc>) -> HierarchyCalc {
        let node = match member.ty().hierarchy() {
            Some(h) if self.specialize() => HierarchyNode::Constant(h.clone()),
            _ => HierarchyNode::OfMember(member),
        };
        HierarchyCalc::new(ty, Arc::clone(expr), node)
    }

    fn level_hierarchy(&self, ty: Type, expr: &Arc<Expr>, level: Arc<LevelCalc>) -> HierarchyCalc {
        let node = match level.ty().hierarchy() {
            Some(h) if self.specialize() => HierarchyNode::Constant(h.clone()),
            _ => HierarchyNode::OfLevel(level),
        };
        HierarchyCalc::new(ty, Arc::clone(expr), node)
    }

    /// The default hierarchy of a dimension.
    fn default_hierarchy(&self, expr: &Arc<Expr>, dimension: Arc<DimensionCalc>) -> HierarchyCalc {
        let known = dimension
            .ty()
            .dimension()
            .and_then(|d| self.cube.default_hierarchy(d));
        let ty = match (&known, dimension.ty().dimension()) {
            (Some(h), _) => Type::Hierarchy(HierarchyType::for_hierarchy(h)),
            (None, Some(d)) => Type::Hierarchy(HierarchyType::for_dimension(d)),
            (None, None) => Type::Hierarchy(HierarchyType::UNKNOWN),
        };
        let node = match known {
            Some(h) if self.specialize() => HierarchyNode::Constant(h),
            _ => HierarchyNode::DefaultOfDimension(dimension),
        };
        HierarchyCalc::new(ty, Arc::clone(expr), node)
    }

    fn member_level(&self, ty: Type, expr: &Arc<Expr>, member: Arc<MemberCalc>) -> LevelCalc {
        let node = match member.ty().member_type().and_then(MemberType::level) {
            Some(l) if self.specialize() => LevelNode::Constant(l.clone()),
            _ => LevelNode::OfMember(member),
        };
        LevelCalc::new(ty, Arc::clone(expr), node)
    }

    fn hierarchy_dimension(&self, expr: &Arc<Expr>, hierarchy: Arc<HierarchyCalc>) -> DimensionCalc {
        let ty = match hierarchy.ty().dimension() {
            Some(d) => Type::Dimension(DimensionType::for_dimension(d)),
            None => Type::Dimension(DimensionType::UNKNOWN),
        };
        let node = match hierarchy.ty().dimension() {
            Some(d) if self.specialize() => DimensionNode::Constant(d.clone()),
            _ => DimensionNode::OfHierarchy(hierarchy),
        };
        DimensionCalc::new(ty, Arc::clone(expr), node)
    }
}

fn mismatch(expr: &Expr, expected: Category) -> CompileError {
    CompileError::CategoryMismatch {
        expr: expr.to_string(),
        expected,
        found: expr.ty().clone(),
    }
}

fn member_type_of(ty: &Type) -> MemberType {
    ty.member_type().cloned().unwrap_or(MemberType::UNKNOWN)
}
