//! Compile rules for function calls.

use std::ops::RangeInclusive;
use std::sync::Arc;

use olapcalc_types::{Category, Member, Type};
use tracing::debug;

use super::{CompileError, Compiler, mismatch};
use crate::calc::{
    Calc, DimensionCalc, DimensionNode, MemberCalc, MemberListCalc, MemberListNode, MemberNode,
    ScalarCalc, ScalarNode, TupleCalc, TupleNode, VoidCalc, VoidNode,
};
use crate::expr::{Aggregator, Expr, Function};

impl Compiler<'_> {
    pub(super) fn compile_call(
        &mut self,
        expr: &Arc<Expr>,
        function: &Function,
        args: &[Arc<Expr>],
    ) -> Result<Calc, CompileError> {
        let ty = expr.ty().clone();
        let e = Arc::clone(expr);
        let scalar = |node: ScalarNode| -> Result<Calc, CompileError> {
            Ok(Calc::Scalar(Arc::new(ScalarCalc::new(ty.clone(), Arc::clone(expr), node))))
        };

        match function {
            Function::CurrentMember => {
                check_arity(function, args, 1..=1, "1")?;
                let hierarchy = self.compile_hierarchy(&args[0])?;
                Ok(Calc::Member(Arc::new(self.current_member(ty, expr, hierarchy))))
            }
            Function::DefaultMember => {
                check_arity(function, args, 1..=1, "1")?;
                let hierarchy = self.compile_hierarchy(&args[0])?;
                let node = match hierarchy.ty().hierarchy() {
                    Some(h) if self.specialize() => {
                        MemberNode::Constant(self.cube.default_member(h))
                    }
                    _ => MemberNode::DefaultMember(hierarchy),
                };
                Ok(Calc::Member(Arc::new(MemberCalc::new(ty, e, node))))
            }
            Function::Parent => {
                check_arity(function, args, 1..=1, "1")?;
                let member = self.compile_member(&args[0])?;
                Ok(Calc::Member(Arc::new(MemberCalc::new(
                    ty,
                    e,
                    MemberNode::Parent(member),
                ))))
            }
            Function::MemberLevel => {
                check_arity(function, args, 1..=1, "1")?;
                let member = self.compile_member(&args[0])?;
                Ok(Calc::Level(Arc::new(self.member_level(ty, expr, member))))
            }
            Function::MemberHierarchy => {
                check_arity(function, args, 1..=1, "1")?;
                let member = self.compile_member(&args[0])?;
                Ok(Calc::Hierarchy(Arc::new(self.member_hierarchy(ty, expr, member))))
            }
            Function::LevelHierarchy => {
                check_arity(function, args, 1..=1, "1")?;
                let level = self.compile_level(&args[0])?;
                Ok(Calc::Hierarchy(Arc::new(self.level_hierarchy(ty, expr, level))))
            }
            Function::HierarchyDimension => {
                check_arity(function, args, 1..=1, "1")?;
                let hierarchy = self.compile_hierarchy(&args[0])?;
                Ok(Calc::Dimension(Arc::new(self.hierarchy_dimension(expr, hierarchy))))
            }
            Function::Dimensions => {
                check_arity(function, args, 1..=1, "1")?;
                let ordinal = self.compile_integer(&args[0])?;
                Ok(Calc::Dimension(Arc::new(DimensionCalc::new(
                    ty,
                    e,
                    DimensionNode::ByOrdinal(ordinal),
                ))))
            }
            Function::Name | Function::UniqueName => {
                check_arity(function, args, 1..=1, "1")?;
                let operand = self.compile(&args[0])?;
                scalar(match function {
                    Function::Name => ScalarNode::Name(operand),
                    _ => ScalarNode::UniqueName(operand),
                })
            }
            Function::Tuple => {
                check_arity(function, args, 1..=usize::MAX, "at least 1")?;
                let members = self.compile_members(args)?;
                Ok(Calc::Tuple(Arc::new(TupleCalc::new(
                    ty,
                    e,
                    TupleNode::Constructor(members),
                ))))
            }
            Function::Item => {
                check_arity(function, args, 2..=2, "2")?;
                let index = self.compile_integer(&args[1])?;
                let node = match args[0].ty() {
                    Type::Member(_) => MemberNode::MemberItem {
                        member: self.compile_member(&args[0])?,
                        index,
                    },
                    Type::Tuple(tuple_type) => MemberNode::TupleItem {
                        null_members: tuple_type
                            .elements()
                            .iter()
                            .map(|m| Member::null(m.hierarchy().cloned()))
                            .collect(),
                        tuple: self.compile_tuple(&args[0])?,
                        index,
                    },
                    _ => return Err(mismatch(&args[0], Category::Tuple)),
                };
                Ok(Calc::Member(Arc::new(MemberCalc::new(ty, e, node))))
            }
            Function::Set => {
                let members = self.compile_members(args)?;
                Ok(Calc::MemberList(Arc::new(MemberListCalc::new(
                    ty,
                    e,
                    MemberListNode::Braces(members),
                ))))
            }
            Function::Value => {
                check_arity(function, args, 0..=1, "0 or 1")?;
                match args.first() {
                    Some(arg) => Ok(Calc::Scalar(self.compile_scalar(arg)?)),
                    None => scalar(ScalarNode::CurrentValue),
                }
            }
            Function::Aggregate(Aggregator::Count) => {
                check_arity(function, args, 1..=1, "1")?;
                let list = self.compile_member_list(&args[0])?;
                scalar(ScalarNode::Count(list))
            }
            Function::Aggregate(aggregator) => {
                check_arity(function, args, 1..=2, "1 or 2")?;
                let list = self.compile_member_list(&args[0])?;
                let value = match args.get(1) {
                    Some(arg) => self.compile_scalar(arg)?,
                    // Without a value expression, aggregate the current measure.
                    None => Arc::new(ScalarCalc::new(
                        Type::Numeric,
                        Arc::clone(expr),
                        ScalarNode::CurrentValue,
                    )),
                };
                scalar(ScalarNode::Aggregate {
                    aggregator: *aggregator,
                    list,
                    value,
                })
            }
            Function::Arithmetic(op) => {
                check_arity(function, args, 2..=2, "2")?;
                let (left, right) = self.compile_scalar_pair(args)?;
                scalar(ScalarNode::Arithmetic {
                    op: *op,
                    left,
                    right,
                })
            }
            Function::Negate => {
                check_arity(function, args, 1..=1, "1")?;
                scalar(ScalarNode::Negate(self.compile_scalar(&args[0])?))
            }
            Function::Compare(op) => {
                check_arity(function, args, 2..=2, "2")?;
                let (left, right) = self.compile_scalar_pair(args)?;
                scalar(ScalarNode::Compare {
                    op: *op,
                    left,
                    right,
                })
            }
            Function::And | Function::Or => {
                check_arity(function, args, 2..=2, "2")?;
                let (left, right) = self.compile_scalar_pair(args)?;
                scalar(match function {
                    Function::And => ScalarNode::And(left, right),
                    _ => ScalarNode::Or(left, right),
                })
            }
            Function::Not => {
                check_arity(function, args, 1..=1, "1")?;
                scalar(ScalarNode::Not(self.compile_scalar(&args[0])?))
            }
            Function::IsEmpty => {
                check_arity(function, args, 1..=1, "1")?;
                scalar(ScalarNode::IsEmpty(self.compile_scalar(&args[0])?))
            }
            Function::Iif => {
                check_arity(function, args, 3..=3, "3")?;
                if !ty.is_scalar() {
                    return Err(mismatch(expr, Category::Numeric));
                }
                let condition = self.compile_scalar(&args[0])?;
                let (then, otherwise) = self.compile_scalar_pair(&args[1..])?;
                scalar(ScalarNode::Iif {
                    condition,
                    then,
                    otherwise,
                })
            }
            Function::UserDefined(udf) => {
                let args = args
                    .iter()
                    .map(|a| self.compile(a))
                    .collect::<Result<Vec<_>, _>>()?;
                debug!(function = udf.name(), args = args.len(), "user-defined function");
                let function = Arc::clone(udf);
                match ty.category() {
                    Category::Void => Ok(Calc::Void(Arc::new(VoidCalc::new(
                        ty,
                        e,
                        VoidNode::UserDefined { function, args },
                    )))),
                    c if c.is_scalar() => scalar(ScalarNode::UserDefined { function, args }),
                    _ => Err(mismatch(expr, Category::Numeric)),
                }
            }
        }
    }

    fn compile_members(&mut self, args: &[Arc<Expr>]) -> Result<Vec<Arc<MemberCalc>>, CompileError> {
        args.iter().map(|a| self.compile_member(a)).collect()
    }

    fn compile_scalar_pair(
        &mut self,
        args: &[Arc<Expr>],
    ) -> Result<(Arc<ScalarCalc>, Arc<ScalarCalc>), CompileError> {
        Ok((self.compile_scalar(&args[0])?, self.compile_scalar(&args[1])?))
    }
}

fn check_arity(
    function: &Function,
    args: &[Arc<Expr>],
    allowed: RangeInclusive<usize>,
    expected: &'static str,
) -> Result<(), CompileError> {
    if allowed.contains(&args.len()) {
        Ok(())
    } else {
        Err(CompileError::ArgumentCount {
            function: function.name().to_string(),
            expected,
            found: args.len(),
        })
    }
}
