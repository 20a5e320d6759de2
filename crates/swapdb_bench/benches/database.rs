//! Database operation benchmarks on the embedded backend.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use swapdb_bench::{payload, sample, Sample};
use swapdb_codec::{BinaryCodec, FieldCodec};
use swapdb_core::{
    BackendConfig, Column, ColumnKind, CoreError, Config, Schema, SubstitutableDatabase, Table,
};
use tempfile::TempDir;

const INSERT: &str = "INSERT INTO bench (data) VALUES ($1)";

fn bench_schema() -> Arc<dyn Schema> {
    Arc::new(
        Table::new("bench")
            .column(Column::id("id"))
            .column(Column::new("data", ColumnKind::Binary).not_null()),
    )
}

/// Opens a SQLite database in a fresh directory, ignoring the environment.
fn open() -> (TempDir, SubstitutableDatabase) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bench.db");
    let db = SubstitutableDatabase::open_with_config(
        &path,
        vec![bench_schema()],
        BackendConfig::embedded(&path),
        Config::default(),
    )
    .unwrap();
    (dir, db)
}

/// Benchmark single autocommit inserts.
fn bench_single_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_write");
    let codec = BinaryCodec::<Vec<u8>>::new();

    for size in [64usize, 1024, 4096].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let (_dir, mut db) = open();
            let stored = codec.encode(&payload(size)).unwrap();

            b.iter(|| {
                db.execute(INSERT, black_box(std::slice::from_ref(&stored)))
                    .unwrap();
            });
        });
    }
    group.finish();
}

/// Benchmark batches of inserts inside one atomic block.
fn bench_batch_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_write");
    let codec = BinaryCodec::<Sample>::new();

    for batch_size in [10usize, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*batch_size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            batch_size,
            |b, &batch_size| {
                let (_dir, mut db) = open();
                let rows: Vec<_> = (0..batch_size)
                    .map(|i| codec.encode(&sample(i % 32)).unwrap())
                    .collect();

                b.iter(|| {
                    db.run_atomic(|scope| {
                        for row in &rows {
                            scope.execute(INSERT, std::slice::from_ref(row))?;
                        }
                        Ok::<_, CoreError>(())
                    })
                    .unwrap();
                });
            },
        );
    }
    group.finish();
}

/// Benchmark reading and decoding every row.
fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");
    let codec = BinaryCodec::<Sample>::new();

    for count in [100usize, 1000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let (_dir, mut db) = open();
            db.run_atomic(|scope| {
                for i in 0..count {
                    scope.execute(INSERT, &[codec.encode(&sample(i % 32)).unwrap()])?;
                }
                Ok::<_, CoreError>(())
            })
            .unwrap();

            b.iter(|| {
                let rs = db.execute("SELECT data FROM bench", &[]).unwrap();
                for row in &rs {
                    black_box(codec.decode(&row[0]).unwrap());
                }
            });
        });
    }
    group.finish();
}

/// Benchmark rebinding to another file.
fn bench_rebind(c: &mut Criterion) {
    c.bench_function("rebind", |b| {
        let (dir, mut db) = open();
        let paths = [dir.path().join("a.db"), dir.path().join("b.db")];
        let mut next = 0;

        b.iter(|| {
            let path = &paths[next % 2];
            db.change_path_with(path, BackendConfig::embedded(path))
                .unwrap();
            next += 1;
        });
    });
}

criterion_group!(
    benches,
    bench_single_write,
    bench_batch_write,
    bench_scan,
    bench_rebind
);
criterion_main!(benches);
