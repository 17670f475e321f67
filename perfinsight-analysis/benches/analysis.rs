use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use perfinsight_analysis::{AnalysisEngine, RecordNormalizer};
use perfinsight_common::{CellValue, RawTable};

/// Ten thousand requests over roughly three hours across four endpoints
fn synthetic_table(rows: usize) -> RawTable {
    let endpoints = ["/home", "/search", "/cart", "/checkout"];
    let mut response_times = Vec::with_capacity(rows);
    let mut statuses = Vec::with_capacity(rows);
    let mut timestamps = Vec::with_capacity(rows);
    let mut urls = Vec::with_capacity(rows);

    for i in 0..rows {
        let jitter = ((i * 7919) % 97) as f64;
        let spike = if i % 250 == 0 { 2500.0 } else { 0.0 };
        response_times.push(CellValue::Float(120.0 + jitter + spike));
        statuses.push(CellValue::Int(if i % 53 == 0 { 503 } else { 200 }));
        timestamps.push(CellValue::Int(1_700_000_000 + i as i64));
        urls.push(CellValue::from(endpoints[i % endpoints.len()]));
    }

    let mut table = RawTable::new();
    for (name, cells) in [
        ("Response Time", response_times),
        ("Status", statuses),
        ("Timestamp", timestamps),
        ("URL", urls),
    ] {
        if let Err(e) = table.push_column(name, cells) {
            panic!("invalid bench table: {e}");
        }
    }
    table
}

fn benchmark_analysis(c: &mut Criterion) {
    let table = synthetic_table(10_000);
    let engine = AnalysisEngine::default();
    let normalizer = RecordNormalizer::default();

    c.bench_function("normalize_10k", |b| {
        b.iter(|| std::hint::black_box(normalizer.normalize(&table)))
    });

    c.bench_function("analyze_table_10k", |b| {
        b.iter(|| std::hint::black_box(engine.analyze_table(&table)))
    });

    let mut group = c.benchmark_group("analyze_by_size");
    for rows in [1_000, 10_000, 50_000] {
        let table = synthetic_table(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &table, |b, table| {
            b.iter(|| std::hint::black_box(engine.analyze_table(table)))
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_analysis);
criterion_main!(benches);
