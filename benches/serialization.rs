use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde::{Deserialize, Serialize};
use serde_boa::{json5, toml, Literal, Number};

#[derive(Serialize, Deserialize, Clone)]
struct Server {
    host: String,
    port: u16,
    tls: bool,
}

#[derive(Serialize, Deserialize, Clone)]
struct Product {
    sku: String,
    name: String,
    price: f64,
    quantity: u32,
}

#[derive(Serialize, Deserialize, Clone)]
struct Catalog {
    title: String,
    products: Vec<Product>,
}

fn catalog(size: u32) -> Catalog {
    Catalog {
        title: "inventory".to_string(),
        products: (0..size)
            .map(|i| Product {
                sku: format!("SKU{}", i),
                name: format!("Product {}", i),
                price: 9.99 + f64::from(i),
                quantity: i,
            })
            .collect(),
    }
}

fn benchmark_serialize_simple(c: &mut Criterion) {
    let server = Server {
        host: "0.0.0.0".to_string(),
        port: 8080,
        tls: true,
    };

    c.bench_function("toml_serialize_simple_struct", |b| {
        b.iter(|| toml::to_string(black_box(&server)))
    });
    c.bench_function("json5_serialize_simple_struct", |b| {
        b.iter(|| json5::to_string(black_box(&server)))
    });
}

fn benchmark_deserialize_simple(c: &mut Criterion) {
    let text = "# listener\nhost = \"0.0.0.0\"\nport = 8080 # http\ntls = true\n";

    c.bench_function("toml_deserialize_simple_struct", |b| {
        b.iter(|| toml::from_str::<Server>(black_box(text)))
    });

    let text = "{\n  // listener\n  host: '0.0.0.0',\n  port: 8080,\n  tls: true,\n}\n";
    c.bench_function("json5_deserialize_simple_struct", |b| {
        b.iter(|| json5::from_str::<Server>(black_box(text)))
    });
}

fn benchmark_catalog(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog");

    for size in [10, 100, 500].iter() {
        let data = catalog(*size);
        let toml_text = toml::to_string(&data).unwrap();
        let json5_text = json5::to_string(&data).unwrap();

        group.bench_with_input(BenchmarkId::new("toml_serialize", size), &data, |b, data| {
            b.iter(|| toml::to_string(black_box(data)))
        });
        group.bench_with_input(BenchmarkId::new("toml_deserialize", size), &toml_text, |b, text| {
            b.iter(|| toml::from_str::<Catalog>(black_box(text)))
        });
        group.bench_with_input(BenchmarkId::new("json5_deserialize", size), &json5_text, |b, text| {
            b.iter(|| json5::from_str::<Catalog>(black_box(text)))
        });
    }
    group.finish();
}

fn benchmark_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay");

    let text = toml::to_string(&catalog(100)).unwrap();
    group.bench_function("toml_parse", |b| b.iter(|| toml::parse(black_box(&text))));

    let doc = toml::parse(&text).unwrap();
    group.bench_function("toml_replay", |b| b.iter(|| black_box(&doc).to_string()));

    group.bench_function("toml_edit_and_replay", |b| {
        b.iter(|| {
            let mut doc = doc.clone();
            if let Some(id) = doc.find(&["title"]) {
                let _ = doc.set_scalar(id, Literal::String("renamed".to_string()));
            }
            doc.to_string()
        })
    });

    let text = json5::to_string(&catalog(100)).unwrap();
    group.bench_function("json5_parse", |b| b.iter(|| json5::parse(black_box(&text))));

    let doc = json5::parse(&text).unwrap();
    group.bench_function("json5_replay_json", |b| {
        b.iter(|| json5::replay_json(black_box(&doc)))
    });

    group.finish();
}

fn benchmark_comparison_with_json(c: &mut Criterion) {
    let data = catalog(100);
    let mut group = c.benchmark_group("format_comparison");

    group.bench_function("toml", |b| b.iter(|| toml::to_string(black_box(&data))));
    group.bench_function("json5", |b| b.iter(|| json5::to_string(black_box(&data))));
    group.bench_function("json5_strict", |b| {
        b.iter(|| json5::to_string_json(black_box(&data)))
    });
    group.bench_function("serde_json", |b| {
        b.iter(|| serde_json::to_string_pretty(black_box(&data)))
    });

    let numbers: Vec<Number> = (0..100i64).map(|i| Number::from(i * 1_000_003)).collect();
    group.bench_function("json5_numbers", |b| {
        b.iter(|| json5::to_string(black_box(&numbers)))
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_serialize_simple,
    benchmark_deserialize_simple,
    benchmark_catalog,
    benchmark_replay,
    benchmark_comparison_with_json
);
criterion_main!(benches);
