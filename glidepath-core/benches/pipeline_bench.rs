//! Criterion benchmarks for Glidepath hot paths.
//!
//! Benchmarks:
//! 1. Single-year synthesis (12 months)
//! 2. Asset path synthesis over a multi-year horizon
//! 3. Portfolio compounding against shared paths

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use glidepath_core::domain::{AnnualReturnTable, AssetId, Horizon, PortfolioWeights};
use glidepath_core::rng::SeedStrategy;
use glidepath_core::{compound, synthesize, AssetPaths};

// ── Helpers ──────────────────────────────────────────────────────────

const ASSETS: [&str; 6] = ["us_growth", "us_value", "dev_equity", "us_bond", "kr_bond", "gold"];

fn make_table(years: i32) -> AnnualReturnTable {
    let mut table = AnnualReturnTable::new();
    for (i, asset) in ASSETS.iter().enumerate() {
        for y in 0..years {
            let pct = ((y as f64 * 0.7 + i as f64).sin()) * 20.0 + 5.0;
            table.insert(*asset, 2000 + y, pct);
        }
    }
    table
}

fn make_weights() -> PortfolioWeights {
    PortfolioWeights::from_pairs([
        ("us_growth", 30.0),
        ("us_value", 15.0),
        ("dev_equity", 15.0),
        ("us_bond", 20.0),
        ("kr_bond", 15.0),
        ("gold", 5.0),
    ])
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_synthesize(c: &mut Criterion) {
    c.bench_function("synthesize_12_months", |b| {
        b.iter(|| synthesize(black_box(12.5), black_box(0.04), black_box(4242)))
    });
}

fn bench_asset_paths(c: &mut Criterion) {
    let mut group = c.benchmark_group("asset_paths");
    for years in [5, 20, 50] {
        let table = make_table(years);
        let horizon = Horizon::new(2000, 2000 + years - 1, 6).unwrap();
        let assets: Vec<AssetId> = ASSETS.iter().map(|a| AssetId::new(*a)).collect();
        group.bench_with_input(BenchmarkId::from_parameter(years), &years, |b, _| {
            b.iter(|| {
                AssetPaths::synthesize(
                    assets.iter(),
                    &table,
                    &horizon,
                    |_| 0.04,
                    &SeedStrategy::default(),
                )
            })
        });
    }
    group.finish();
}

fn bench_compound(c: &mut Criterion) {
    let table = make_table(30);
    let horizon = Horizon::full_years(2000, 2029).unwrap();
    let assets: Vec<AssetId> = ASSETS.iter().map(|a| AssetId::new(*a)).collect();
    let paths =
        AssetPaths::synthesize(assets.iter(), &table, &horizon, |_| 0.04, &SeedStrategy::default())
            .unwrap();
    let weights = make_weights();

    c.bench_function("compound_30y", |b| {
        b.iter(|| compound(black_box(&paths), "bench", black_box(&weights)))
    });
}

criterion_group!(benches, bench_synthesize, bench_asset_paths, bench_compound);
criterion_main!(benches);
