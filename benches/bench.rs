// Criterion benchmarks for Civic Lifeline

use civic_lifeline::core::{hash_key, Bbox, CacheKey};
use civic_lifeline::sources::{filter_by_store_types, normalize_bls_timeseries, transform_arcgis_to_snap_items};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Value};

fn arcgis_features(count: usize) -> Value {
    let features: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "attributes": {
                    "Store_Name": format!("Store {}", i),
                    "Store_Street_Address": format!("{} Main St", i),
                    "City": "Jackson",
                    "State": "MS",
                    "Zip5": "39201",
                    "Store_Type": if i % 3 == 0 { "Supermarket" } else { "Convenience Store" }
                },
                "geometry": { "x": -90.18 + (i as f64) * 0.0001, "y": 32.30 }
            })
        })
        .collect();
    json!({ "features": features })
}

fn bls_response(months: usize) -> Value {
    let data: Vec<Value> = (0..months)
        .map(|i| {
            json!({
                "year": (2000 + i / 12).to_string(),
                "period": format!("M{:02}", i % 12 + 1),
                "value": format!("{:.1}", 4.0 + (i % 7) as f64 * 0.3)
            })
        })
        .collect();
    json!({
        "status": "REQUEST_SUCCEEDED",
        "Results": { "series": [{ "seriesID": "LAUCN280490000000003", "data": data }] }
    })
}

fn bench_cache_keys(c: &mut Criterion) {
    c.bench_function("hash_key", |b| {
        b.iter(|| {
            hash_key(black_box([
                ("bbox", Some("-90.3,32.25,-90.1,32.4")),
                ("types", Some("supermarket")),
                ("limit", Some("300")),
            ]))
        })
    });

    c.bench_function("cache_key_snap", |b| {
        b.iter(|| CacheKey::snap(black_box("-90.3,32.25,-90.1,32.4"), None, black_box(300)))
    });

    c.bench_function("bbox_parse", |b| b.iter(|| Bbox::parse(black_box("-90.30, 32.25, -90.10, 32.40"))));
}

fn bench_normalizers(c: &mut Criterion) {
    let mut group = c.benchmark_group("snap_normalize");
    for size in [50, 300, 500] {
        let json = arcgis_features(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &json, |b, json| {
            b.iter(|| {
                let items = transform_arcgis_to_snap_items(black_box(json)).unwrap_or_default();
                filter_by_store_types(items, Some("supermarket"))
            })
        });
    }
    group.finish();

    let bls = bls_response(240);
    c.bench_function("bls_normalize_20y", |b| {
        b.iter(|| normalize_bls_timeseries(black_box(&bls), "LAUCN280490000000003"))
    });
}

criterion_group!(benches, bench_cache_keys, bench_normalizers);
criterion_main!(benches);
