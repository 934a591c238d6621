use RustedDiff::bindings;
use RustedDiff::symbolic::parse_brackets::parse_tree;
use RustedDiff::symbolic::symbolic_engine::SymbolicEngine;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

const EXPRESSION: &str =
    "{ { { { {x} ^ {3} } + { {2} * {x} } } sin } / { { {x} cos } + { {x} * {x} } } }";

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse bracketed text", |b| {
        b.iter(|| parse_tree(black_box(EXPRESSION)))
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let engine = SymbolicEngine::with_bindings(bindings! { "x" => 0.7 });
    let Ok(tree) = engine.parse(EXPRESSION) else {
        return;
    };
    c.bench_function("evaluate", |b| b.iter(|| engine.evaluate(black_box(&tree))));
}

fn bench_differentiate_and_simplify(c: &mut Criterion) {
    let mut engine = SymbolicEngine::with_bindings(bindings! { "x" => 0.7 });
    engine.set_stable_rounds(Some(16));
    let Ok(tree) = engine.parse(EXPRESSION) else {
        return;
    };
    c.bench_function("differentiate and simplify", |b| {
        b.iter(|| {
            let mut derivative = engine.differentiate(black_box(&tree), "x")?;
            engine.simplify(&mut derivative)?;
            Ok::<_, RustedDiff::symbolic::expr_error::ExprError>(derivative)
        })
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_evaluate,
    bench_differentiate_and_simplify
);
criterion_main!(benches);
