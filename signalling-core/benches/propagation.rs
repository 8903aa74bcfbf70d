//! Propagation Benchmarks
//!
//! Measures the cost of one pass after a single producer toggles:
//! - along a long cable, where the pass is dominated by the distance search
//! - across a wide grid of short lines, where only one line is dirty

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use signalling_core::{
    ConductorDef, ConsumerDef, ConsumerMode, FaceSet, Location, NullSink, ProducerDef,
    SignalConfig, SignalSystem, Strength,
};

fn long_cable(length: i32, strength: Strength) -> SignalSystem {
    let mut system = SignalSystem::new(SignalConfig::default());
    system.place_producer(Location::new(0, 0, 0), &ProducerDef::new(FaceSet::ALL, strength));
    system.load_conductors(
        (1..=length).map(|x| Location::new(x, 0, 0)),
        &ConductorDef::cable(),
    );
    system.place_consumer(
        Location::new(length + 1, 0, 0),
        &ConsumerDef::new(FaceSet::ALL, ConsumerMode::AtLeastOne),
    );
    system.recalculate(&mut NullSink);
    system
}

/// Toggle the producer of a long cable on and off.
fn bench_long_cable(c: &mut Criterion) {
    let mut group = c.benchmark_group("long_cable");

    for length in [100, 500, 2_000] {
        let on = Strength::Finite(length as u32 + 1);
        let mut system = long_cable(length, on);
        let mut lit = true;

        group.bench_with_input(BenchmarkId::from_parameter(length), &length, |b, _| {
            b.iter(|| {
                lit = !lit;
                let strength = if lit { on } else { Strength::OFF };
                system.set_producer_strength(Location::new(0, 0, 0), strength);
                black_box(system.recalculate(&mut NullSink))
            });
        });
    }

    group.finish();
}

/// Toggle one producer among many independent lines.
fn bench_wide_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("wide_grid");

    for lines in [16, 128, 512] {
        let mut system = SignalSystem::new(SignalConfig::default());
        for z in 0..lines {
            // Every other row, so neighbouring lines stay separate networks.
            let row = z * 2;
            system.place_producer(
                Location::new(0, 0, row),
                &ProducerDef::new(FaceSet::ALL, Strength::Finite(10)),
            );
            system.load_conductors(
                (1..=8).map(|x| Location::new(x, 0, row)),
                &ConductorDef::cable(),
            );
            system.place_consumer(
                Location::new(9, 0, row),
                &ConsumerDef::new(FaceSet::ALL, ConsumerMode::AtLeastOne),
            );
        }
        system.recalculate(&mut NullSink);
        let mut lit = true;

        group.bench_with_input(BenchmarkId::from_parameter(lines), &lines, |b, _| {
            b.iter(|| {
                lit = !lit;
                let strength = if lit { Strength::Finite(10) } else { Strength::OFF };
                system.set_producer_strength(Location::new(0, 0, 0), strength);
                black_box(system.recalculate(&mut NullSink))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_long_cable, bench_wide_grid);
criterion_main!(benches);
