//! Randomized checks over generated expressions and cube positions.

mod common;

use std::sync::Arc;

use common::Sales;
use olapcalc_core::api::{Engine, Error, PreparedExpression};
use olapcalc_core::evaluator::Evaluator;
use olapcalc_core::expr::{Aggregator, ArithmeticOp, CompareOp, Expr, Function};
use olapcalc_core::parameters::{Parameter, ParameterValue};
use olapcalc_core::types::{Member, MemberType, Type};
use olapcalc_core::values::CalcValue;
use proptest::prelude::*;

const HIERARCHIES: usize = 4;
const STORE: usize = 1;
/// Member parameter over Store.
const ROW: &str = "Row";
/// Set parameter over Store.
const STORES: &str = "Stores";

#[derive(Debug, Clone)]
enum Base {
    Literal { ordinal: usize, index: usize },
    Current { ordinal: usize },
    /// Current member of a dimension picked by number.
    Dynamic { ordinal: usize },
    Default { ordinal: usize },
    /// The `Row` parameter.
    Parameter,
    /// `Item` over a tuple of literal or current members.
    Item {
        elements: Vec<(usize, Option<usize>)>,
        index: i8,
    },
}

#[derive(Debug, Clone)]
struct MemberShape {
    base: Base,
    parents: u8,
}

#[derive(Debug, Clone)]
enum Shape {
    Number(i8),
    CurrentValue,
    ValueOf(Vec<MemberShape>),
    Add(Box<Shape>, Box<Shape>),
    Multiply(Box<Shape>, Box<Shape>),
    IifEmpty(Box<Shape>, Box<Shape>, Box<Shape>),
    IifPositive(Box<Shape>, Box<Shape>, Box<Shape>),
    Sum(Vec<MemberShape>, Option<Box<Shape>>),
    Count(Vec<MemberShape>),
    /// Sum over the `Stores` parameter.
    SumStores(Option<Box<Shape>>),
}

/// Explicit parameter assignments; `None` keeps the default.
#[derive(Debug, Clone)]
struct Bindings {
    row: Option<usize>,
    /// Mostly Store members, sometimes members the parameter must refuse.
    stores: Option<Vec<(usize, usize)>>,
}

fn arb_member() -> impl Strategy<Value = MemberShape> {
    let ordinal = 0..HIERARCHIES;
    let base = prop_oneof![
        3 => (ordinal.clone(), 0usize..4)
            .prop_map(|(ordinal, index)| Base::Literal { ordinal, index }),
        2 => ordinal.clone().prop_map(|ordinal| Base::Current { ordinal }),
        1 => ordinal.clone().prop_map(|ordinal| Base::Dynamic { ordinal }),
        1 => ordinal.clone().prop_map(|ordinal| Base::Default { ordinal }),
        1 => Just(Base::Parameter),
        1 => (
            prop::collection::vec((ordinal, prop::option::of(0usize..4)), 1..=3),
            -1i8..4,
        )
            .prop_map(|(elements, index)| Base::Item { elements, index }),
    ];
    (base, prop_oneof![4 => Just(0u8), 1 => 1u8..3])
        .prop_map(|(base, parents)| MemberShape { base, parents })
}

fn arb_members() -> impl Strategy<Value = Vec<MemberShape>> {
    prop::collection::vec(arb_member(), 1..=3)
}

fn arb_shape() -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![
        (-3i8..=3).prop_map(Shape::Number),
        Just(Shape::CurrentValue),
        arb_members().prop_map(Shape::ValueOf),
        Just(Shape::SumStores(None)),
    ];
    leaf.prop_recursive(3, 24, 3, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| Shape::Add(Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| Shape::Multiply(Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone(), inner.clone()).prop_map(|(c, a, b)| {
                Shape::IifEmpty(Box::new(c), Box::new(a), Box::new(b))
            }),
            (inner.clone(), inner.clone(), inner.clone()).prop_map(|(c, a, b)| {
                Shape::IifPositive(Box::new(c), Box::new(a), Box::new(b))
            }),
            (arb_members(), prop::option::of(inner.clone()))
                .prop_map(|(set, value)| Shape::Sum(set, value.map(Box::new))),
            arb_members().prop_map(Shape::Count),
            inner.prop_map(|value| Shape::SumStores(Some(Box::new(value)))),
        ]
    })
}

fn arb_bindings() -> impl Strategy<Value = Bindings> {
    let member = (prop_oneof![3 => Just(STORE), 1 => 0..HIERARCHIES], 0usize..4);
    (
        prop::option::of(0usize..4),
        prop::option::of(prop::collection::vec(member, 0..=3)),
    )
        .prop_map(|(row, stores)| Bindings { row, stores })
}

fn arb_position() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0usize..4, HIERARCHIES)
}

fn member_expr(sales: &Sales, shape: &MemberShape) -> Arc<Expr> {
    let hierarchy = |ordinal: usize| Expr::hierarchy(&sales.cube.hierarchies()[ordinal]);
    let mut expr = match shape.base {
        Base::Literal { ordinal, index } => Expr::member(&pick(sales, ordinal, index)),
        Base::Current { ordinal } => Expr::call(Function::CurrentMember, vec![hierarchy(ordinal)]),
        Base::Dynamic { ordinal } => Expr::call(
            Function::CurrentMember,
            vec![Expr::call(
                Function::Dimensions,
                vec![Expr::integer(ordinal as i64)],
            )],
        ),
        Base::Default { ordinal } => Expr::call(Function::DefaultMember, vec![hierarchy(ordinal)]),
        Base::Parameter => Expr::parameter(&Parameter::new(
            ROW,
            Type::Member(MemberType::for_hierarchy(&sales.store)),
            Expr::member(&sales.usa),
        )),
        Base::Item { ref elements, index } => {
            let elements = elements
                .iter()
                .map(|&(ordinal, literal)| match literal {
                    Some(index) => Expr::member(&pick(sales, ordinal, index)),
                    None => Expr::call(Function::CurrentMember, vec![hierarchy(ordinal)]),
                })
                .collect();
            Expr::call(
                Function::Item,
                vec![
                    Expr::call(Function::Tuple, elements),
                    Expr::integer(i64::from(index)),
                ],
            )
        }
    };
    for _ in 0..shape.parents {
        expr = Expr::call(Function::Parent, vec![expr]);
    }
    expr
}

fn scalar_expr(sales: &Sales, shape: &Shape) -> Arc<Expr> {
    let binary = |op: ArithmeticOp, a: &Shape, b: &Shape| {
        Expr::call(
            Function::Arithmetic(op),
            vec![scalar_expr(sales, a), scalar_expr(sales, b)],
        )
    };
    let set = |members: &[MemberShape]| {
        Expr::call(
            Function::Set,
            members.iter().map(|m| member_expr(sales, m)).collect(),
        )
    };
    match shape {
        Shape::Number(n) => Expr::number(f64::from(*n)),
        Shape::CurrentValue => Expr::call(Function::Value, vec![]),
        Shape::ValueOf(members) => {
            let arg = match members.as_slice() {
                [single] => member_expr(sales, single),
                _ => Expr::call(
                    Function::Tuple,
                    members.iter().map(|m| member_expr(sales, m)).collect(),
                ),
            };
            Expr::call(Function::Value, vec![arg])
        }
        Shape::Add(a, b) => binary(ArithmeticOp::Add, a, b),
        Shape::Multiply(a, b) => binary(ArithmeticOp::Multiply, a, b),
        Shape::IifEmpty(c, a, b) => Expr::call(
            Function::Iif,
            vec![
                Expr::call(Function::IsEmpty, vec![scalar_expr(sales, c)]),
                scalar_expr(sales, a),
                scalar_expr(sales, b),
            ],
        ),
        Shape::IifPositive(c, a, b) => Expr::call(
            Function::Iif,
            vec![
                Expr::call(
                    Function::Compare(CompareOp::Gt),
                    vec![scalar_expr(sales, c), Expr::number(0.0)],
                ),
                scalar_expr(sales, a),
                scalar_expr(sales, b),
            ],
        ),
        Shape::Sum(members, value) => {
            let mut args = vec![set(members)];
            args.extend(value.as_deref().map(|v| scalar_expr(sales, v)));
            Expr::call(Function::Aggregate(Aggregator::Sum), args)
        }
        Shape::Count(members) => {
            Expr::call(Function::Aggregate(Aggregator::Count), vec![set(members)])
        }
        Shape::SumStores(value) => {
            let stores = Parameter::new(
                STORES,
                Type::Set(MemberType::for_hierarchy(&sales.store)),
                Expr::call(
                    Function::Set,
                    vec![Expr::member(&sales.usa), Expr::member(&sales.canada)],
                ),
            );
            let mut args = vec![Expr::parameter(&stores)];
            args.extend(value.as_deref().map(|v| scalar_expr(sales, v)));
            Expr::call(Function::Aggregate(Aggregator::Sum), args)
        }
    }
}

fn pick(sales: &Sales, ordinal: usize, index: usize) -> Member {
    let candidates = &sales.positions()[ordinal];
    candidates[index % candidates.len()].clone()
}

fn evaluator_at(sales: &Sales, position: &[usize]) -> Evaluator {
    let mut ev = sales.evaluator();
    for (ordinal, index) in position.iter().enumerate() {
        ev.set_context(pick(sales, ordinal, *index));
    }
    ev
}

/// Prepares `expr` and assigns the parameters it uses.
///
/// A `Stores` binding is accepted exactly when every member is a Store.
fn prepare(
    sales: &Sales,
    engine: &Engine,
    expr: &Arc<Expr>,
    bindings: &Bindings,
) -> Result<PreparedExpression, Error> {
    let prepared = engine.prepare(expr)?;
    if let (Some(index), Ok(_)) = (bindings.row, prepared.is_parameter_set(ROW)) {
        prepared.set_parameter_value(ROW, ParameterValue::Member(pick(sales, STORE, index)))?;
    }
    if let (Some(stores), Ok(_)) = (&bindings.stores, prepared.is_parameter_set(STORES)) {
        let members: Vec<Member> = stores
            .iter()
            .map(|&(ordinal, index)| pick(sales, ordinal, index))
            .collect();
        let fits = members.iter().all(|m| m.hierarchy() == Some(&sales.store));
        match prepared.set_parameter_value(STORES, ParameterValue::Members(members)) {
            Ok(()) => assert!(fits, "{} accepted members outside Store", STORES),
            Err(Error::Api(_)) if !fits => {}
            Err(other) => return Err(other),
        }
    }
    Ok(prepared)
}

fn run(
    sales: &Sales,
    engine: &Engine,
    expr: &Arc<Expr>,
    bindings: &Bindings,
    ev: &mut Evaluator,
) -> Result<CalcValue, Error> {
    prepare(sales, engine, expr, bindings)?.evaluate(ev)
}

proptest! {
    #[test]
    fn prop_evaluation_restores_context(
        shape in arb_shape(),
        bindings in arb_bindings(),
        position in arb_position(),
    ) {
        let sales = Sales::new();
        let expr = scalar_expr(&sales, &shape);

        for engine in [sales.engine(), sales.unspecialized_engine()] {
            let mut ev = evaluator_at(&sales, &position);
            let before = ev.members().to_vec();
            let result = run(&sales, &engine, &expr, &bindings, &mut ev);
            prop_assert!(result.is_ok(), "{} failed: {:?}", expr, result);
            prop_assert_eq!(ev.members(), &before[..]);
        }
    }

    #[test]
    fn prop_failure_restores_context(
        shape in arb_shape(),
        bindings in arb_bindings(),
        position in arb_position(),
    ) {
        let sales = Sales::build(|provider, fixture| {
            provider.fail_measure(&fixture.store_sales);
        });
        let expr = scalar_expr(&sales, &shape);

        let mut ev = evaluator_at(&sales, &position);
        let before = ev.members().to_vec();
        match run(&sales, &sales.engine(), &expr, &bindings, &mut ev) {
            Ok(_) | Err(Error::Runtime(_)) => {}
            Err(other) => prop_assert!(false, "{} failed: {}", expr, other),
        }
        prop_assert_eq!(ev.members(), &before[..]);
    }

    #[test]
    fn prop_specialization_preserves_results(
        shape in arb_shape(),
        bindings in arb_bindings(),
        position in arb_position(),
    ) {
        let sales = Sales::new();
        let expr = scalar_expr(&sales, &shape);

        let fixed = run(
            &sales,
            &sales.engine(),
            &expr,
            &bindings,
            &mut evaluator_at(&sales, &position),
        );
        let dynamic = run(
            &sales,
            &sales.unspecialized_engine(),
            &expr,
            &bindings,
            &mut evaluator_at(&sales, &position),
        );
        match (fixed, dynamic) {
            (Ok(fixed), Ok(dynamic)) => prop_assert_eq!(fixed, dynamic),
            (fixed, dynamic) => prop_assert!(false, "{}: {:?} vs {:?}", expr, fixed, dynamic),
        }
    }

    #[test]
    fn prop_independent_hierarchy_does_not_change_result(
        shape in arb_shape(),
        bindings in arb_bindings(),
        position in arb_position(),
        ordinal in 0..HIERARCHIES,
        alternative in 0usize..4,
    ) {
        let sales = Sales::new();
        let expr = scalar_expr(&sales, &shape);
        let hierarchy = sales.cube.hierarchies()[ordinal].clone();

        for engine in [sales.engine(), sales.unspecialized_engine()] {
            let prepared = prepare(&sales, &engine, &expr, &bindings).unwrap();
            if prepared.calc().depends_on(&hierarchy) {
                continue;
            }
            let mut moved = position.clone();
            moved[ordinal] = alternative;

            let here = prepared.evaluate(&mut evaluator_at(&sales, &position)).unwrap();
            let there = prepared.evaluate(&mut evaluator_at(&sales, &moved)).unwrap();
            prop_assert_eq!(here, there, "{} depends on {}", expr, hierarchy.unique_name());
        }
    }
}
