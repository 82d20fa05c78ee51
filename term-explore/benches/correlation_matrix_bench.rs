use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use term_explore::analyzers::correlation_matrix;
use term_explore::analyzers::stats::IqrBounds;

fn synthetic_columns(columns: usize, rows: usize) -> Vec<(String, Vec<Option<f64>>)> {
    (0..columns)
        .map(|c| {
            let values = (0..rows)
                .map(|r| {
                    if (r + c) % 17 == 0 {
                        None
                    } else {
                        Some(((r * (c + 3)) % 101) as f64 + c as f64 * 0.5)
                    }
                })
                .collect();
            (format!("col_{c}"), values)
        })
        .collect()
}

fn benchmark_correlation_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("correlation_matrix");

    for columns in [2, 8, 16].iter() {
        for rows in [1_000, 10_000, 100_000].iter() {
            let data = synthetic_columns(*columns, *rows);
            group.throughput(Throughput::Elements((*columns * *rows) as u64));

            group.bench_with_input(
                BenchmarkId::from_parameter(format!("c{columns}_r{rows}")),
                &data,
                |b, data| {
                    b.iter(|| correlation_matrix(std::hint::black_box(data)));
                },
            );
        }
    }

    group.finish();
}

fn benchmark_iqr_bounds(c: &mut Criterion) {
    let mut group = c.benchmark_group("iqr_bounds");

    for rows in [1_000, 10_000, 100_000].iter() {
        let (_, values) = synthetic_columns(1, *rows).remove(0);
        group.throughput(Throughput::Elements(*rows as u64));

        group.bench_with_input(BenchmarkId::from_parameter(rows), &values, |b, values| {
            b.iter(|| {
                let bounds = IqrBounds::compute(std::hint::black_box(values), 1.5);
                bounds.map(|b| b.count_outliers(values))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_correlation_matrix, benchmark_iqr_bounds);
criterion_main!(benches);
