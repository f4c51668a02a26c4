//! Benchmarks for plantdata conformance stages

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use plantdata::filters::flag_stuck;
use plantdata::{Fingerprint, Pipeline, PipelineConfig, PlantContract, RawSources, RawTable};
use plantdata_testdata::{generate_plant, CsvTable, PlantGeneratorConfig};

fn raw_table(name: &str, table: &CsvTable) -> RawTable {
    RawTable {
        name: name.to_string(),
        headers: table.headers.clone(),
        rows: table.rows.clone(),
    }
}

fn synthetic(days: usize) -> (PlantContract, RawSources) {
    let plant = generate_plant(&PlantGeneratorConfig::new().with_days(days).with_seed(1)).unwrap();
    let contract: PlantContract = serde_json::from_value(plant.contract.clone()).unwrap();

    let raw = RawSources {
        scada: raw_table("scada", &plant.scada),
        plant: raw_table("plant", &plant.plant),
        reanalysis: plant
            .reanalysis
            .iter()
            .map(|(product, table)| (product.clone(), raw_table(product, table)))
            .collect(),
        assets: raw_table("assets", &plant.assets),
    };
    (contract, raw)
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(20);

    for days in [1usize, 7, 30] {
        let (contract, raw) = synthetic(days);
        let pipeline = Pipeline::new(contract, PipelineConfig::default()).unwrap();

        group.throughput(Throughput::Elements(raw.scada.len() as u64));
        group.bench_with_input(BenchmarkId::new("run", days), &raw, |b, raw| {
            b.iter(|| black_box(pipeline.run(raw).unwrap()))
        });
    }

    group.finish();
}

fn bench_stuck_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("stuck");

    // a year of 10-minute samples with a short flat run every 100 samples
    let values: Vec<Option<f64>> = (0..52_560)
        .map(|i| {
            if i % 100 < 5 {
                Some(1.0)
            } else {
                Some((i as f64 * 0.37).sin())
            }
        })
        .collect();

    group.throughput(Throughput::Elements(values.len() as u64));
    group.bench_function("flag_one_year", |b| {
        b.iter(|| black_box(flag_stuck(&values, 3)))
    });

    group.finish();
}

fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");
    let (contract, raw) = synthetic(7);
    let config = PipelineConfig::default();

    group.bench_function("seven_days", |b| {
        b.iter(|| black_box(Fingerprint::of(&raw, &contract, &config).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_pipeline, bench_stuck_detection, bench_fingerprint);
criterion_main!(benches);
