//! Filename encoding benchmarks for mmapio
//!
//! Measures the two-pass UTF-8 to UTF-16 decoder used for wide-character
//! file APIs, on ASCII and mixed-script names.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mmapio::name::utf8::{encode_utf16, utf8_to_utf16};
use mmapio::MapMode;

fn names() -> Vec<(&'static str, String)> {
    vec![
        ("ascii", "C:/data/tables/users_pk.idx".to_string()),
        ("latin", "C:/donn\u{e9}es/r\u{e9}sum\u{e9}-\u{e0}-jour.bin".to_string()),
        ("cjk", "D:/\u{6570}\u{636e}/\u{8868}\u{683c}/\u{7d22}\u{5f15}.bin".to_string()),
        ("emoji", "E:/\u{1F4C1}/\u{1F4C4}\u{1F600}.bin".to_string()),
        ("long_ascii", "x/".repeat(128)),
    ]
}

fn bench_encode_utf16(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_utf16");

    for (name, text) in names() {
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("two_pass", name), &text, |b, text| {
            b.iter(|| black_box(encode_utf16(black_box(text.as_bytes())).unwrap()));
        });
    }

    group.finish();
}

fn bench_count_only(c: &mut Criterion) {
    let mut group = c.benchmark_group("utf8_to_utf16_count");

    for (name, text) in names() {
        group.bench_with_input(BenchmarkId::new("count", name), &text, |b, text| {
            b.iter(|| black_box(utf8_to_utf16(black_box(text.as_bytes()), None).unwrap()));
        });
    }

    group.finish();
}

fn bench_mode_parse(c: &mut Criterion) {
    c.bench_function("mode_parse", |b| {
        b.iter(|| black_box(MapMode::parse(black_box("wepi"))));
    });
}

criterion_group!(benches, bench_encode_utf16, bench_count_only, bench_mode_parse);
criterion_main!(benches);
