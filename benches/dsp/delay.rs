//! Benchmarks for the fractional delay line.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use voicegraph::dsp::delay::{period_samples, DelayLine};
use voicegraph::MAX_FEEDBACK_SAMPLES;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/delay");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.05).sin()).collect();
        let mut buffer = vec![0.0f32; size];

        // Comb at a fixed pitch, as the oscillator feedback runs it
        let mut line = DelayLine::new(MAX_FEEDBACK_SAMPLES);
        let period = period_samples(1.0 / 110.0, SAMPLE_RATE, MAX_FEEDBACK_SAMPLES);
        group.bench_with_input(BenchmarkId::new("comb", size), &size, |b, _| {
            b.iter(|| {
                for (out, &x) in buffer.iter_mut().zip(&input) {
                    let delayed = line.read(black_box(period));
                    line.write(x + delayed * 0.9);
                    *out = 0.5 * (x + delayed);
                }
            })
        });
    }

    group.finish();
}
