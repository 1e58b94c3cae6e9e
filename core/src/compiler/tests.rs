//! Tests for the compiler.

use std::sync::Arc;

use olapcalc_types::{Category, MemberType, Type};
use pretty_assertions::assert_eq;

use super::{CompileError, Compiler};
use crate::api::CompilationOptions;
use crate::calc::{Calc, CalcWriter};
use crate::expr::{Aggregator, ArithmeticOp, Expr, Function};
use crate::parameters::{Parameter, ParameterSlots, ParameterValue};
use crate::test_utils::{SalesCube, init_test_logging};
use crate::values::Value;

fn compiler(cube: &SalesCube) -> Compiler<'static> {
    Compiler::new(&cube.cube, CompilationOptions::default())
}

fn unspecialized(cube: &SalesCube) -> Compiler<'static> {
    Compiler::new(
        &cube.cube,
        CompilationOptions {
            specialize_fixed_hierarchies: false,
        },
    )
}

fn plan(calc: &Calc) -> String {
    CalcWriter::new().write(calc)
}

#[test]
fn test_current_member_of_literal_hierarchy_is_fixed() {
    init_test_logging();
    let cube = SalesCube::new();
    let expr = Expr::call(Function::CurrentMember, vec![Expr::hierarchy(&cube.store)]);

    let calc = compiler(&cube).compile(&expr).unwrap();

    assert_eq!(plan(&calc), "CurrentMemberFixed([Store])\n");
    assert!(calc.depends_on(&cube.store));
    assert!(!calc.depends_on(&cube.gender));
}

#[test]
fn test_current_member_without_specialization_is_dynamic() {
    let cube = SalesCube::new();
    let expr = Expr::call(Function::CurrentMember, vec![Expr::hierarchy(&cube.store)]);

    let calc = unspecialized(&cube).compile(&expr).unwrap();

    assert_eq!(plan(&calc), "CurrentMember\n  Constant([Store])\n");
    assert!(calc.depends_on(&cube.store));
    assert!(!calc.depends_on(&cube.time));
}

#[test]
fn test_current_member_of_computed_dimension_is_dynamic() {
    let cube = SalesCube::new();
    let dimension = Expr::call(Function::Dimensions, vec![Expr::integer(1)]);
    let expr = Expr::call(Function::CurrentMember, vec![dimension]);

    let calc = compiler(&cube).compile(&expr).unwrap();

    assert_eq!(
        plan(&calc),
        "CurrentMember\n  DimensionDefaultHierarchy\n    Dimensions\n      Constant(1)\n"
    );
    // The hierarchy is unknown, so every hierarchy might be read.
    for h in cube.cube.hierarchies() {
        assert!(calc.depends_on(h), "{} should be a dependency", h);
    }
}

#[test]
fn test_default_member_of_literal_hierarchy_is_constant() {
    let cube = SalesCube::new();
    let expr = Expr::call(Function::DefaultMember, vec![Expr::hierarchy(&cube.gender)]);

    let fixed = compiler(&cube).compile(&expr).unwrap();
    assert_eq!(plan(&fixed), "Constant([Gender].[All Genders])\n");
    assert!(!fixed.depends_on(&cube.gender));

    let dynamic = unspecialized(&cube).compile(&expr).unwrap();
    assert_eq!(plan(&dynamic), "DefaultMember\n  Constant([Gender])\n");
}

#[test]
fn test_member_as_scalar_is_member_value() {
    let cube = SalesCube::new();
    let expr = Expr::member(&cube.usa);

    let calc = compiler(&cube).compile_scalar(&expr).unwrap();

    assert_eq!(
        CalcWriter::new().write(&Calc::Scalar(Arc::clone(&calc))),
        "MemberValue\n  Constant([Store].[All Stores].[USA])\n"
    );
    let calc = Calc::Scalar(calc);
    assert!(!calc.depends_on(&cube.store));
    assert!(calc.depends_on(&cube.gender));
    assert!(calc.depends_on(&cube.cube.measures_hierarchy().clone()));
}

#[test]
fn test_literal_tuple_as_scalar_substitutes_members() {
    let cube = SalesCube::new();
    let tuple = Expr::call(
        Function::Tuple,
        vec![Expr::member(&cube.usa), Expr::member(&cube.male)],
    );

    let calc = Calc::Scalar(compiler(&cube).compile_scalar(&tuple).unwrap());

    assert_eq!(
        plan(&calc),
        "MemberValue\n  Constant([Store].[All Stores].[USA])\n  Constant([Gender].[All Genders].[M])\n"
    );
    assert!(!calc.depends_on(&cube.store));
    assert!(!calc.depends_on(&cube.gender));
    assert!(calc.depends_on(&cube.time));
}

#[test]
fn test_item_of_tuple() {
    let cube = SalesCube::new();
    let parameter = Parameter::new(
        "Row",
        Type::Member(MemberType::for_hierarchy(&cube.store)),
        Expr::member(&cube.usa),
    );
    let tuple = Expr::call(
        Function::Tuple,
        vec![Expr::parameter(&parameter), Expr::member(&cube.male)],
    );
    let item = Expr::call(Function::Item, vec![tuple, Expr::integer(0)]);

    let calc = compiler(&cube).compile(&item).unwrap();

    assert_eq!(
        plan(&calc),
        "TupleItem\n  Tuple\n    Parameter(Row)\n    Constant([Gender].[All Genders].[M])\n  Constant(0)\n"
    );
    // A parameter depends on what its default value depends on.
    assert!(!calc.depends_on(&cube.store));
}

#[test]
fn test_item_of_member() {
    let cube = SalesCube::new();
    let item = Expr::call(Function::Item, vec![Expr::member(&cube.usa), Expr::integer(0)]);

    let calc = compiler(&cube).compile(&item).unwrap();

    assert_eq!(
        plan(&calc),
        "MemberItem\n  Constant([Store].[All Stores].[USA])\n  Constant(0)\n"
    );
}

#[test]
fn test_hierarchy_as_scalar_reads_current_member() {
    let cube = SalesCube::new();
    let calc = Calc::Scalar(compiler(&cube).compile_scalar(&Expr::hierarchy(&cube.time)).unwrap());

    assert_eq!(plan(&calc), "MemberValue\n  CurrentMemberFixed([Time])\n");
    // Reading a hierarchy's current member depends on that hierarchy.
    assert!(calc.depends_on(&cube.time));
}

#[test]
fn test_shared_subexpression_compiles_once() {
    let cube = SalesCube::new();
    let shared = Expr::call(Function::Parent, vec![Expr::member(&cube.ca)]);
    let sum = Expr::call(
        Function::Arithmetic(ArithmeticOp::Add),
        vec![Arc::clone(&shared), Arc::clone(&shared)],
    );

    let mut compiler = compiler(&cube);
    let calc = compiler.compile(&sum).unwrap();
    let children = calc.children();
    let (Calc::Scalar(left), Calc::Scalar(right)) = (&children[0], &children[1]) else {
        panic!("expected scalar operands");
    };
    assert!(Arc::ptr_eq(left, right));

    let a = compiler.compile_member(&shared).unwrap();
    let b = compiler.compile_member(&shared).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_same_expression_in_different_categories_is_compiled_per_category() {
    let cube = SalesCube::new();
    let member = Expr::member(&cube.usa);
    let mut compiler = compiler(&cube);

    let as_member = compiler.compile_member(&member).unwrap();
    let as_scalar = compiler.compile_scalar(&member).unwrap();

    assert_eq!(as_member.describe(), "Constant([Store].[All Stores].[USA])");
    assert_eq!(as_scalar.describe(), "MemberValue");
}

#[test]
fn test_navigation_on_literals_folds_to_constants() {
    let cube = SalesCube::new();
    let level = Expr::call(Function::MemberLevel, vec![Expr::member(&cube.usa)]);
    let hierarchy = Expr::call(Function::LevelHierarchy, vec![Arc::clone(&level)]);
    let dimension = Expr::call(Function::HierarchyDimension, vec![hierarchy]);

    let mut compiler = compiler(&cube);
    assert_eq!(
        plan(&compiler.compile(&level).unwrap()),
        "Constant([Store].[Country])\n"
    );
    assert_eq!(plan(&compiler.compile(&dimension).unwrap()), "Constant([Store])\n");
}

#[test]
fn test_navigation_without_specialization_is_dynamic() {
    let cube = SalesCube::new();
    let hierarchy = Expr::call(Function::MemberHierarchy, vec![Expr::member(&cube.usa)]);
    let dimension = Expr::call(Function::HierarchyDimension, vec![hierarchy]);

    let calc = unspecialized(&cube).compile(&dimension).unwrap();

    assert_eq!(
        plan(&calc),
        "HierarchyDimension\n  MemberHierarchy\n    Constant([Store].[All Stores].[USA])\n"
    );
}

#[test]
fn test_aggregate_without_value_uses_current_measure() {
    let cube = SalesCube::new();
    let set = Expr::call(
        Function::Set,
        vec![Expr::member(&cube.usa), Expr::member(&cube.canada)],
    );
    let sum = Expr::call(Function::Aggregate(Aggregator::Sum), vec![Arc::clone(&set)]);
    let count = Expr::call(Function::Aggregate(Aggregator::Count), vec![set]);

    let mut compiler = compiler(&cube);
    let sum = compiler.compile(&sum).unwrap();
    assert_eq!(
        plan(&sum),
        "Sum\n  Set\n    Constant([Store].[All Stores].[USA])\n    Constant([Store].[All Stores].[Canada])\n  CurrentValue\n"
    );
    // The set members override the store hierarchy; the measure is read
    // under every other hierarchy.
    assert!(!sum.depends_on(&cube.store));
    assert!(sum.depends_on(&cube.gender));

    let count = compiler.compile(&count).unwrap();
    assert_eq!(count.ty(), &Type::Integer);
    assert!(!count.depends_on(&cube.gender));
}

#[test]
fn test_compile_integer_wraps_numeric() {
    let cube = SalesCube::new();
    let mut compiler = compiler(&cube);

    let wrapped = compiler.compile_integer(&Expr::number(2.7)).unwrap();
    assert_eq!(wrapped.describe(), "Integer");
    assert_eq!(wrapped.ty(), &Type::Integer);

    let integer = compiler.compile_integer(&Expr::integer(3)).unwrap();
    assert_eq!(integer.constant(), Some(&Value::from(3_i64)));
}

#[test]
fn test_compile_void_discards_any_expression() {
    let cube = SalesCube::new();
    let calc = compiler(&cube).compile_void(&Expr::member(&cube.usa)).unwrap();
    assert_eq!(
        plan(&Calc::Void(calc)),
        "Discard\n  Constant([Store].[All Stores].[USA])\n"
    );
}

#[test]
fn test_null_literal_as_member() {
    let cube = SalesCube::new();
    let calc = compiler(&cube).compile_member(&Expr::null()).unwrap();
    assert_eq!(calc.describe(), "Constant([#null])");
}

#[test]
fn test_category_mismatch() {
    let cube = SalesCube::new();
    let err = compiler(&cube).compile_member(&Expr::number(1.0)).unwrap_err();
    match err {
        CompileError::CategoryMismatch { expected, found, .. } => {
            assert_eq!(expected, Category::Member);
            assert_eq!(found, Type::Numeric);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_argument_count_is_checked() {
    let cube = SalesCube::new();
    let expr = Expr::call(Function::Parent, vec![]);
    let err = compiler(&cube).compile(&expr).unwrap_err();
    assert!(matches!(
        err,
        CompileError::ArgumentCount { found: 0, expected: "1", .. }
    ));
}

#[test]
fn test_parameter_registration_is_idempotent() {
    let cube = SalesCube::new();
    let parameter = Parameter::new(
        "Store",
        Type::Member(MemberType::for_hierarchy(&cube.store)),
        Expr::member(&cube.usa),
    );
    let expr = Expr::call(
        Function::Tuple,
        vec![Expr::parameter(&parameter), Expr::parameter(&parameter)],
    );

    let mut compiler = compiler(&cube);
    compiler.compile(&expr).unwrap();
    let slot = compiler.register_parameter(&parameter).unwrap();
    let parameters = compiler.into_parameters();

    assert_eq!(parameters.len(), 1);
    assert_eq!(slot.index(), 0);
    assert_eq!(
        plan(slot.default_calc()),
        "Constant([Store].[All Stores].[USA])\n"
    );
}

#[test]
fn test_parameter_with_unsupported_type_is_rejected() {
    let cube = SalesCube::new();
    let parameter = Parameter::new(
        "Where",
        Type::Hierarchy(olapcalc_types::HierarchyType::for_hierarchy(&cube.store)),
        Expr::hierarchy(&cube.store),
    );
    let err = compiler(&cube).register_parameter(&parameter).unwrap_err();
    assert!(matches!(err, CompileError::UnsupportedParameterType { .. }));
}

#[test]
fn test_explicit_parameter_value_carries_over() {
    let cube = SalesCube::new();
    let parameter = Parameter::new("Threshold", Type::Numeric, Expr::number(1.0));

    let mut first = compiler(&cube);
    first.register_parameter(&parameter).unwrap();
    let previous: ParameterSlots = first.into_parameters();
    previous
        .get("Threshold")
        .unwrap()
        .set_value(ParameterValue::Scalar(Value::Number(5.0)), true);

    let mut second = Compiler::new(&cube.cube, CompilationOptions::default()).with_previous(&previous);
    let slot = second.register_parameter(&parameter).unwrap();

    assert!(slot.is_set());
    assert_eq!(slot.value(), Some(ParameterValue::Scalar(Value::Number(5.0))));
}

#[test]
fn test_user_defined_procedure_compiles_to_void() {
    use crate::evaluator::{EvalError, Evaluator};
    use crate::values::CalcValue;

    #[derive(Debug)]
    struct Log;

    impl crate::expr::UserDefinedFunction for Log {
        fn name(&self) -> &str {
            "Log"
        }

        fn return_type(&self) -> Type {
            Type::Void
        }

        fn execute(&self, _: &mut Evaluator, _: &[CalcValue]) -> Result<Value, EvalError> {
            Ok(Value::Null)
        }
    }

    let cube = SalesCube::new();
    let expr = Expr::call(Function::UserDefined(Arc::new(Log)), vec![Expr::string("hi")]);
    let calc = compiler(&cube).compile(&expr).unwrap();

    assert_eq!(calc.category(), Category::Void);
    assert_eq!(plan(&calc), "UserDefined(Log)\n  Constant(\"hi\")\n");
    // Host code may read any hierarchy.
    assert!(calc.depends_on(&cube.gender));
}
