//! Benchmarks for the ADSR envelope core.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use voicegraph::dsp::envelope::Envelope;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

fn render(env: &mut Envelope, buffer: &mut [f32]) {
    for sample in buffer.iter_mut() {
        env.next_sample(SAMPLE_RATE);
        *sample = env.level();
    }
}

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Attack phase (ramping up)
        let mut env = Envelope::adsr(10.0, 0.1, 0.7, 0.3);
        env.note_on(SAMPLE_RATE);
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| render(&mut env, black_box(&mut buffer)))
        });

        // Sustain phase (holding steady)
        let mut env = Envelope::adsr(0.001, 0.001, 0.7, 0.3);
        env.note_on(SAMPLE_RATE);
        for _ in 0..200 {
            env.next_sample(SAMPLE_RATE);
        }
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| render(&mut env, black_box(&mut buffer)))
        });

        // Kill ramp into a fresh attack, repeated
        let mut env = Envelope::adsr(0.001, 0.001, 0.7, 0.3);
        group.bench_with_input(BenchmarkId::new("retrigger", size), &size, |b, _| {
            b.iter(|| {
                env.note_on(SAMPLE_RATE);
                render(&mut env, black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
