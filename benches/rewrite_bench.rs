//! Benchmarks for the virtime rewrite pipeline.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use virtime::domain::ast::{CommClause, Expr, File, ImportSpec, Stmt};
use virtime::domain::source_map::SourceMap;
use virtime::infrastructure::printer::print_file;
use virtime::{Pipeline, SourceUnit};

// ═══════════════════════════════════════════════════════════════════════════
// Synthetic Data Generators
// ═══════════════════════════════════════════════════════════════════════════

/// A file with `funcs` functions, each mixing plain statements, channel
/// operations, a select, a spawn and wall-clock calls.
fn synthetic_file(funcs: usize) -> File {
    let mut file = File::new("main")
        .with_import(ImportSpec::new("fmt"))
        .with_import(ImportSpec::new("time"));
    for i in 0..funcs {
        let ch = format!("ch{}", i);
        let body = vec![
            Stmt::expr(Expr::qualified_call("fmt", "Println", vec![Expr::int(i as i64)])),
            Stmt::send(Expr::ident(&ch), Expr::int(1)),
            Stmt::define(vec![Expr::ident("v")], vec![Expr::recv(Expr::ident(&ch))]),
            Stmt::go(
                Expr::func_lit(vec![
                    Stmt::expr(Expr::qualified_call("time", "Sleep", vec![Expr::int(10)])),
                    Stmt::send(Expr::ident(&ch), Expr::ident("v")),
                ]),
                vec![],
            ),
            Stmt::for_ever(vec![Stmt::select(vec![
                CommClause::case(Stmt::expr(Expr::recv(Expr::ident(&ch))), vec![]),
                CommClause::default_case(vec![Stmt::expr(Expr::qualified_call(
                    "time",
                    "Now",
                    vec![],
                ))]),
            ])]),
        ];
        file = file.with_func(&format!("worker{}", i), body);
    }
    file
}

// ═══════════════════════════════════════════════════════════════════════════
// Benchmarks
// ═══════════════════════════════════════════════════════════════════════════

fn bench_pipeline(c: &mut Criterion) {
    let pipeline = Pipeline::default();
    let mut group = c.benchmark_group("pipeline");

    for funcs in [10usize, 100, 1000] {
        let unit = SourceUnit::new(SourceMap::new("main.go"), synthetic_file(funcs));
        group.throughput(Throughput::Elements(funcs as u64));
        group.bench_with_input(BenchmarkId::new("funcs", funcs), &unit, |b, unit| {
            b.iter(|| {
                let mut unit = unit.clone();
                black_box(pipeline.rewrite(&mut unit))
            })
        });
    }
    group.finish();
}

fn bench_print(c: &mut Criterion) {
    let mut unit = SourceUnit::new(SourceMap::new("main.go"), synthetic_file(500));
    Pipeline::default().rewrite(&mut unit);
    c.bench_function("print_go_500_funcs", |b| b.iter(|| black_box(print_file(&unit.file))));
}

criterion_group!(benches, bench_pipeline, bench_print);
criterion_main!(benches);
