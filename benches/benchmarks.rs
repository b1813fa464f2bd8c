//! Benchmarks for commit-gate.

#![allow(missing_docs)]

use commit_gate::core::classify::{files_for_category, Category, MemoryFirstLineReader};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::path::PathBuf;

fn benchmark_classification(c: &mut Criterion) {
    let files: Vec<PathBuf> = (0..200)
        .map(|i| PathBuf::from(format!("lib/module_{i}/index.js")))
        .chain((0..50).map(|i| PathBuf::from(format!("test/spec_{i}.js"))))
        .chain((0..20).map(|i| PathBuf::from(format!("src/unit_{i}.c"))))
        .chain((0..10).map(|i| PathBuf::from(format!("doc/guide_{i}.md"))))
        .collect();
    let reader = MemoryFirstLineReader::new();

    c.bench_function("classification", |b| {
        b.iter(|| {
            for category in Category::dispatchable() {
                let matched = files_for_category(category, black_box(&files), &reader);
                black_box(matched);
            }
        });
    });
}

fn benchmark_config_parsing(c: &mut Criterion) {
    let toml_content = r#"
[checkers.markdown]
command = "remark"
args = ["--quiet"]
fix = true
optional = true

[checkers.shell]
command = "shellcheck"
timeout = "30s"
"#;

    c.bench_function("config_parsing", |b| {
        b.iter(|| {
            let result: toml::Value =
                toml::from_str(black_box(toml_content)).expect("parse config");
            black_box(result)
        });
    });
}

criterion_group!(benches, benchmark_classification, benchmark_config_parsing);
criterion_main!(benches);
