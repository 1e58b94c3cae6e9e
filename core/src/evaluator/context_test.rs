//! Tests for the evaluation context.

use std::sync::Arc;

use olapcalc_types::{Hierarchy, Member, MemberType, Type};
use pretty_assertions::assert_eq;

use super::{CellValueProvider, EvalError, Evaluator, ProviderError};
use crate::api::CompilationOptions;
use crate::compiler::Compiler;
use crate::expr::{Expr, Function};
use crate::memory::InMemoryProvider;
use crate::parameters::{Parameter, ParameterValue};
use crate::test_utils::SalesCube;
use crate::values::Value;

fn evaluator(cube: &SalesCube) -> Evaluator {
    Evaluator::new(&cube.cube, Arc::new(InMemoryProvider::new(&cube.cube)))
}

#[test]
fn test_starts_at_default_members() {
    let cube = SalesCube::new();
    let ev = evaluator(&cube);
    assert_eq!(ev.get_context(&cube.store), &cube.all_stores);
    assert_eq!(ev.get_context(&cube.gender), &cube.all_genders);
    assert_eq!(ev.current_measure(), &cube.unit_sales);
}

#[test]
fn test_set_context_returns_prior_member() {
    let cube = SalesCube::new();
    let mut ev = evaluator(&cube);

    let prior = ev.set_context(cube.usa.clone());
    assert_eq!(prior, cube.all_stores);
    assert_eq!(ev.get_context(&cube.store), &cube.usa);

    // Setting the current member again is a no-op that returns it.
    let same = ev.set_context(cube.usa.clone());
    assert_eq!(same, cube.usa);

    ev.restore([prior, same]);
    assert_eq!(ev.get_context(&cube.store), &cube.all_stores);
}

#[test]
fn test_restore_undoes_repeated_overrides_of_one_hierarchy() {
    let cube = SalesCube::new();
    let mut ev = evaluator(&cube);
    let before = ev.members().to_vec();

    let saved = vec![
        ev.set_context(cube.usa.clone()),
        ev.set_context(cube.male.clone()),
        ev.set_context(cube.ca.clone()),
    ];
    assert_eq!(ev.get_context(&cube.store), &cube.ca);

    ev.restore(saved);
    assert_eq!(ev.members(), &before[..]);
}

#[test]
fn test_hierarchy_less_null_member_changes_nothing() {
    let cube = SalesCube::new();
    let mut ev = evaluator(&cube);
    let before = ev.members().to_vec();

    let null = Member::null(None);
    let returned = ev.set_context(null.clone());

    assert_eq!(returned, null);
    assert_eq!(ev.members(), &before[..]);
}

#[test]
fn test_push_is_independent() {
    let cube = SalesCube::new();
    let mut ev = evaluator(&cube);
    ev.set_context(cube.usa.clone());

    let mut scoped = ev.push();
    assert_eq!(scoped.get_context(&cube.store), &cube.usa);
    scoped.set_context(cube.canada.clone());
    scoped.set_context(cube.female.clone());

    assert_eq!(ev.get_context(&cube.store), &cube.usa);
    assert_eq!(ev.get_context(&cube.gender), &cube.all_genders);
}

#[test]
fn test_verify_restored_reports_first_leak() {
    let cube = SalesCube::new();
    let mut ev = evaluator(&cube);
    let snapshot = ev.members().to_vec();
    assert!(ev.verify_restored(&snapshot).is_ok());

    ev.set_context(cube.male.clone());
    match ev.verify_restored(&snapshot) {
        Err(EvalError::ContextLeak {
            hierarchy,
            expected,
            found,
        }) => {
            assert_eq!(hierarchy, "[Gender]");
            assert_eq!(expected, "[Gender].[All Genders]");
            assert_eq!(found, "[Gender].[All Genders].[M]");
        }
        other => panic!("expected a context leak, got {:?}", other),
    }
}

#[test]
fn test_parameter_default_is_memoized_without_marking_assigned() {
    let cube = SalesCube::new();
    let mut provider = InMemoryProvider::new(&cube.cube);
    provider.fact(&cube.unit_sales, &[cube.usa.clone()], 4.0);
    let provider = Arc::new(provider);

    let default = Expr::call(Function::Value, vec![Expr::member(&cube.usa)]);
    let parameter = Parameter::new("Base", Type::Numeric, default);
    let mut compiler = Compiler::new(&cube.cube, CompilationOptions::default());
    let slot = compiler.register_parameter(&parameter).unwrap();

    let mut ev = Evaluator::new(&cube.cube, provider.clone());
    let expected = ParameterValue::Scalar(Value::Number(4.0));
    assert_eq!(ev.parameter_value(&slot).unwrap(), expected);
    assert_eq!(ev.parameter_value(&slot).unwrap(), expected);

    assert_eq!(provider.evaluations(), 1);
    assert!(!slot.is_set());
    assert_eq!(slot.value(), Some(expected));
}

#[test]
fn test_parameter_default_outside_declared_hierarchy_fails() {
    let cube = SalesCube::new();
    let provider = Arc::new(InMemoryProvider::new(&cube.cube));
    let parameter = Parameter::new(
        "Stores",
        Type::Set(MemberType::for_hierarchy(&cube.store)),
        Expr::call(Function::Set, vec![Expr::member(&cube.male)]),
    );
    let mut compiler = Compiler::new(&cube.cube, CompilationOptions::default());
    let slot = compiler.register_parameter(&parameter).unwrap();

    let mut ev = Evaluator::new(&cube.cube, provider);
    assert!(matches!(
        ev.parameter_value(&slot),
        Err(EvalError::ParameterDefault { ref name, .. }) if name == "Stores"
    ));
    assert_eq!(slot.value(), None);
}

#[test]
fn test_explicit_parameter_value_wins() {
    let cube = SalesCube::new();
    let parameter = Parameter::new("Base", Type::Numeric, Expr::number(1.0));
    let mut compiler = Compiler::new(&cube.cube, CompilationOptions::default());
    let slot = compiler.register_parameter(&parameter).unwrap();
    slot.set_value(ParameterValue::Scalar(Value::Number(9.0)), true);

    let mut ev = evaluator(&cube);
    assert_eq!(
        ev.parameter_value(&slot).unwrap(),
        ParameterValue::Scalar(Value::Number(9.0))
    );
    assert!(slot.is_set());
}

/// Reports every store as seen from a fixed member.
#[derive(Debug)]
struct PinnedStore {
    store: Hierarchy,
    pinned: Member,
}

impl CellValueProvider for PinnedStore {
    fn evaluate_current_measure(&self, _: &Evaluator) -> Result<Value, ProviderError> {
        Err(ProviderError::new("no storage"))
    }

    fn get_context(&self, evaluator: &Evaluator, hierarchy: &Hierarchy) -> Member {
        if *hierarchy == self.store {
            self.pinned.clone()
        } else {
            evaluator.get_context(hierarchy).clone()
        }
    }
}

#[test]
fn test_current_member_goes_through_provider() {
    let cube = SalesCube::new();
    let provider = PinnedStore {
        store: cube.store.clone(),
        pinned: cube.canada.clone(),
    };
    let ev = Evaluator::new(&cube.cube, Arc::new(provider));

    assert_eq!(ev.get_context(&cube.store), &cube.all_stores);
    assert_eq!(ev.current_member(&cube.store), cube.canada);
    assert_eq!(ev.current_member(&cube.gender), cube.all_genders);
    assert!(matches!(ev.evaluate_current(), Err(EvalError::Provider(_))));
}
