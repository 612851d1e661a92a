//! Criterion benchmarks for quantity arithmetic.
//!
//! Three benchmark groups:
//! - `accumulate`: 10k additions into one accumulator (energy buffer tick)
//! - `multiply_divide`: mixed products and quotients (heat transfer math)
//! - `text_and_wire`: Display/parse and binary encode/decode

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use reactorium_core::{Quantity, QuantityAccumulator};

fn inputs(count: u64) -> Vec<Quantity> {
    (0..count)
        .map(|i| Quantity::from_raw(i * 7_919 % 100_000, (i * 31 % 10_000) as u16))
        .collect()
}

fn bench_accumulate(c: &mut Criterion) {
    let values = inputs(10_000);
    c.bench_function("accumulate", |b| {
        b.iter(|| {
            let mut total = QuantityAccumulator::new();
            for v in &values {
                total += *v;
            }
            black_box(total.value())
        })
    });
}

fn bench_multiply_divide(c: &mut Criterion) {
    let values = inputs(1_000);
    let factor = Quantity::new(3, 1_415);
    c.bench_function("multiply_divide", |b| {
        b.iter(|| {
            values
                .iter()
                .map(|v| (*v * factor).checked_div(factor).unwrap_or(Quantity::ZERO))
                .fold(Quantity::ZERO, |acc, v| acc + v)
        })
    });
}

fn bench_text_and_wire(c: &mut Criterion) {
    let values = inputs(1_000);
    let mut group = c.benchmark_group("text_and_wire");
    group.bench_function("display_parse", |b| {
        b.iter(|| {
            for v in &values {
                let parsed: Quantity = v.to_string().parse().unwrap_or(Quantity::ZERO);
                black_box(parsed);
            }
        })
    });
    group.bench_function("encode_decode", |b| {
        let mut buf = Vec::with_capacity(values.len() * 11);
        b.iter(|| {
            buf.clear();
            for v in &values {
                v.write_to(&mut buf);
            }
            let mut input = buf.as_slice();
            while let Ok(v) = Quantity::read_from(&mut input) {
                black_box(v);
            }
        })
    });
    group.finish();
}

criterion_group!(benches, bench_accumulate, bench_multiply_divide, bench_text_and_wire);
criterion_main!(benches);
