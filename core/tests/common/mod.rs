//! Shared fixture: a small sales cube with facts.
#![allow(dead_code)]

use std::sync::Arc;

use olapcalc_core::api::{CompilationOptions, Engine, EngineOptions, ExecutionOptions};
use olapcalc_core::evaluator::Evaluator;
use olapcalc_core::memory::InMemoryProvider;
use olapcalc_core::types::{Cube, CubeBuilder, Hierarchy, Member};

/// Measures, Store (Country, State), Gender (Gender) and Time (Year,
/// Quarter), in that ordinal order. `Store Sales` is not related to Gender.
pub struct Sales {
    pub cube: Cube,
    pub provider: Arc<InMemoryProvider>,
    pub unit_sales: Member,
    pub store_sales: Member,
    pub store: Hierarchy,
    pub gender: Hierarchy,
    pub time: Hierarchy,
    pub all_stores: Member,
    pub usa: Member,
    pub canada: Member,
    pub ca: Member,
    pub all_genders: Member,
    pub male: Member,
    pub female: Member,
    pub all_times: Member,
    pub y1997: Member,
    pub q1: Member,
}

impl Sales {
    pub fn new() -> Self {
        Self::build(|_, _| {})
    }

    /// Builds the fixture, letting the caller adjust the provider.
    pub fn build(configure: impl FnOnce(&mut InMemoryProvider, &Self)) -> Self {
        let mut builder = CubeBuilder::new("Sales");
        let unit_sales = builder.measure("Unit Sales");
        let store_sales = builder.measure("Store Sales");
        let store = builder.hierarchy("Store", &["Country", "State"]);
        let gender = builder.hierarchy("Gender", &["Gender"]);
        let time = builder.hierarchy("Time", &["Year", "Quarter"]);
        let cube = builder.build();

        let all_stores = cube.default_member(&store);
        let usa = all_stores.child("USA").unwrap();
        let canada = all_stores.child("Canada").unwrap();
        let ca = usa.child("CA").unwrap();
        let all_genders = cube.default_member(&gender);
        let male = all_genders.child("M").unwrap();
        let female = all_genders.child("F").unwrap();
        let all_times = cube.default_member(&time);
        let y1997 = all_times.child("1997").unwrap();
        let q1 = y1997.child("Q1").unwrap();

        let mut fixture = Sales {
            provider: Arc::new(InMemoryProvider::new(&cube)),
            cube,
            unit_sales,
            store_sales,
            store,
            gender,
            time,
            all_stores,
            usa,
            canada,
            ca,
            all_genders,
            male,
            female,
            all_times,
            y1997,
            q1,
        };

        let mut provider = InMemoryProvider::new(&fixture.cube);
        provider
            .fact(
                &fixture.unit_sales,
                &[fixture.ca.clone(), fixture.male.clone(), fixture.q1.clone()],
                10.0,
            )
            .fact(
                &fixture.unit_sales,
                &[fixture.ca.clone(), fixture.female.clone(), fixture.q1.clone()],
                5.0,
            )
            .fact(
                &fixture.unit_sales,
                &[fixture.canada.clone(), fixture.male.clone(), fixture.y1997.clone()],
                2.0,
            )
            .fact(
                &fixture.store_sales,
                &[fixture.ca.clone(), fixture.q1.clone()],
                20.0,
            )
            .fact(
                &fixture.store_sales,
                &[fixture.canada.clone(), fixture.y1997.clone()],
                7.0,
            )
            .relate(
                &fixture.store_sales,
                &[fixture.store.clone(), fixture.time.clone()],
            );
        configure(&mut provider, &fixture);
        fixture.provider = Arc::new(provider);
        fixture
    }

    pub fn engine(&self) -> Engine {
        Engine::new(&self.cube, verified_options(true))
    }

    pub fn unspecialized_engine(&self) -> Engine {
        Engine::new(&self.cube, verified_options(false))
    }

    pub fn evaluator(&self) -> Evaluator {
        Evaluator::new(&self.cube, self.provider.clone())
    }

    /// Every member a randomized position may pick, per hierarchy ordinal.
    pub fn positions(&self) -> Vec<Vec<Member>> {
        vec![
            vec![self.unit_sales.clone(), self.store_sales.clone()],
            vec![
                self.all_stores.clone(),
                self.usa.clone(),
                self.canada.clone(),
                self.ca.clone(),
            ],
            vec![
                self.all_genders.clone(),
                self.male.clone(),
                self.female.clone(),
            ],
            vec![self.all_times.clone(), self.y1997.clone(), self.q1.clone()],
        ]
    }
}

fn verified_options(specialize: bool) -> EngineOptions {
    EngineOptions {
        default_compilation_options: CompilationOptions {
            specialize_fixed_hierarchies: specialize,
        },
        default_execution_options: ExecutionOptions {
            verify_context_restoration: true,
        },
    }
}
