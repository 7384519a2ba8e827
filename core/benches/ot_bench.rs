use coedit_core::{Meta, Operation, Style};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// One character typed at `at` into a document of `len` characters
fn keystroke(at: usize, len: usize) -> Operation {
    let mut op = Operation::new();
    op.retain(at).insert("a").retain(len - at);
    op
}

/// Benchmark composing a run of keystrokes (simulates undo grouping)
fn bench_compose_typing(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose_typing");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut composed = Operation::identity(0);
                for i in 0..size {
                    composed = composed.compose(&keystroke(i, i)).unwrap();
                }
                black_box(composed)
            });
        });
    }

    group.finish();
}

/// Benchmark transforming concurrent edits on a large document
fn bench_transform(c: &mut Criterion) {
    let len = 10_000;
    let mut formatting = Operation::new();
    formatting
        .retain(100)
        .retain_with(5000, Meta::styled(Style::Bold, true))
        .retain(len - 5100);
    let typing = keystroke(2500, len);

    c.bench_function("transform_format_vs_keystroke_10k", |b| {
        b.iter(|| black_box(Operation::transform(&formatting, &typing).unwrap()));
    });
}

/// Benchmark inverting against a rich snapshot
fn bench_invert_against(c: &mut Criterion) {
    let mut snapshot = Operation::new();
    for i in 0..500 {
        snapshot.insert_with("abcdefghij", Meta::authored(i % 4 + 1));
    }
    let mut delete = Operation::new();
    delete.retain(1000).delete(2000).retain(2000);

    c.bench_function("invert_against_5k", |b| {
        b.iter(|| black_box(delete.invert_against(&snapshot).unwrap()));
    });
}

criterion_group!(benches, bench_compose_typing, bench_transform, bench_invert_against);
criterion_main!(benches);
