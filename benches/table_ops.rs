use arenapool::Table;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn bench_set_and_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_and_get");

    group.bench_function("set_then_get_single_key", |b| {
        b.iter(|| {
            let table = Table::new();
            table.set(black_box("Content-Type"), black_box("application/json"));
            black_box(table.get("content-type"));
        });
    });

    group.finish();
}

fn bench_add_many(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_many_entries");

    for count in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter(|| {
                let table = Table::new();
                for i in 0..count {
                    table.addn(black_box("X-Trace-Id"), black_box(format!("id-{i}")));
                }
                black_box(table.len());
            });
        });
    }

    group.finish();
}

fn bench_overlay(c: &mut Criterion) {
    let mut group = c.benchmark_group("overlay");

    group.bench_function("overlay_two_hundred_entry_tables", |b| {
        let base = Table::new();
        let overrides = Table::new();
        for i in 0..200 {
            base.setn(format!("key-{i}"), format!("base-{i}"));
            overrides.setn(format!("key-{i}"), format!("override-{i}"));
        }

        b.iter(|| black_box(base.overlay(black_box(&overrides))));
    });

    group.finish();
}

fn bench_case_insensitive_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("case_insensitive_lookup");

    group.bench_function("miss_at_the_end_of_a_hundred_entries", |b| {
        let table = Table::new();
        for i in 0..100 {
            table.addn(format!("header-{i}"), format!("value-{i}"));
        }

        b.iter(|| black_box(table.get(black_box("HEADER-99"))));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_set_and_get,
    bench_add_many,
    bench_overlay,
    bench_case_insensitive_lookup,
);
criterion_main!(benches);
