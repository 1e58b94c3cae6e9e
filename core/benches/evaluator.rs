//! Benchmarks for compiled calculators.
//!
//! Run with: `cargo bench` in the core/ directory.
//!
//! Benchmark groups:
//! 1. member_value: member substitution over tuples of growing width
//! 2. specialization: fixed versus dynamic current-member lookups
//! 3. aggregate: Sum over sets, each member made current on a pushed evaluator

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use olapcalc_core::api::{CompilationOptions, Engine, EngineOptions, ExecutionOptions};
use olapcalc_core::expr::{Aggregator, Expr, Function};
use olapcalc_core::memory::InMemoryProvider;
use olapcalc_core::types::{Cube, CubeBuilder, Member};

const WIDTH: usize = 8;

/// A cube with `WIDTH` two-level hierarchies and one fact per hierarchy.
fn cube() -> (Cube, Vec<Member>, Arc<InMemoryProvider>) {
    let mut builder = CubeBuilder::new("Bench");
    let measure = builder.measure("Amount");
    let hierarchies: Vec<_> = (0..WIDTH)
        .map(|i| builder.hierarchy(&format!("H{}", i), &["Group", "Leaf"]))
        .collect();
    let cube = builder.build();

    let mut provider = InMemoryProvider::new(&cube);
    let mut leaves = Vec::new();
    for hierarchy in &hierarchies {
        let Some(leaf) = cube
            .default_member(hierarchy)
            .child("A")
            .and_then(|group| group.child("1"))
        else {
            continue;
        };
        provider.fact(&measure, &[leaf.clone()], 1.0);
        leaves.push(leaf);
    }
    (cube, leaves, Arc::new(provider))
}

fn engine(cube: &Cube, specialize: bool) -> Engine {
    Engine::new(
        cube,
        EngineOptions {
            default_compilation_options: CompilationOptions {
                specialize_fixed_hierarchies: specialize,
            },
            default_execution_options: ExecutionOptions {
                verify_context_restoration: false,
            },
        },
    )
}

fn bench_member_value(c: &mut Criterion) {
    let (cube, leaves, provider) = cube();
    let engine = engine(&cube, true);
    let mut group = c.benchmark_group("member_value");

    for width in [1, 2, 4, WIDTH] {
        group.throughput(Throughput::Elements(width as u64));
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, &width| {
            let tuple = Expr::call(
                Function::Tuple,
                leaves[..width].iter().map(Expr::member).collect(),
            );
            let prepared = engine
                .prepare(&Expr::call(Function::Value, vec![tuple]))
                .expect("Prepare failed");
            let mut evaluator = prepared.evaluator(provider.clone());

            b.iter(|| black_box(prepared.evaluate_scalar(black_box(&mut evaluator))))
        });
    }

    group.finish();
}

fn bench_specialization(c: &mut Criterion) {
    let (cube, _, provider) = cube();
    let mut group = c.benchmark_group("specialization");
    let current = Expr::call(
        Function::Value,
        vec![Expr::call(
            Function::CurrentMember,
            vec![Expr::hierarchy(&cube.hierarchies()[1])],
        )],
    );

    for (name, specialize) in [("fixed", true), ("dynamic", false)] {
        let prepared = engine(&cube, specialize)
            .prepare(&current)
            .expect("Prepare failed");
        let mut evaluator = prepared.evaluator(provider.clone());
        group.bench_function(name, |b| {
            b.iter(|| black_box(prepared.evaluate_scalar(black_box(&mut evaluator))))
        });
    }

    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let (cube, leaves, provider) = cube();
    let engine = engine(&cube, true);
    let set = Expr::call(Function::Set, leaves.iter().map(Expr::member).collect());
    let sum = Expr::call(Function::Aggregate(Aggregator::Sum), vec![set]);
    let prepared = engine.prepare(&sum).expect("Prepare failed");
    let mut evaluator = prepared.evaluator(provider);

    c.bench_function("aggregate_sum", |b| {
        b.iter(|| black_box(prepared.evaluate_scalar(black_box(&mut evaluator))))
    });
}

criterion_group!(
    benches,
    bench_member_value,
    bench_specialization,
    bench_aggregate
);
criterion_main!(benches);
