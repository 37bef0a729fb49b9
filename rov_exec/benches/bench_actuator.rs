//! # Actuator Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use comms_if::vehicle::InputChannel;
use rov_lib::actuator::{self, NormalizedInputs, RawChannelValues};

fn actuator_benchmark(c: &mut Criterion) {
    // Typical steering command, every axis set
    let inputs: NormalizedInputs = InputChannel::ALL
        .iter()
        .enumerate()
        .map(|(i, &ch)| (ch, (i as f64 - 2.5) / 3.0))
        .collect();

    let pwms: RawChannelValues = (1..=18).map(|id| (id, 1100 + id * 40)).collect();

    c.bench_function("actuator::normalized_to_rc_override", |b| {
        b.iter(|| actuator::normalized_to_rc_override(black_box(&inputs)).unwrap())
    });

    c.bench_function("actuator::raw_to_rc_override", |b| {
        b.iter(|| actuator::raw_to_rc_override(black_box(&pwms)).unwrap())
    });
}

criterion_group!(benches, actuator_benchmark);
criterion_main!(benches);
