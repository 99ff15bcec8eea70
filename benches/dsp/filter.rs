//! Benchmarks for the state-variable filter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use voicegraph::dsp::filter::{Coefficients, FilterType, SVFilter};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        // Generate a test signal (sawtooth-like ramp)
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();

        for (name, filter_type) in [
            ("lowpass", FilterType::LowPass),
            ("bandpass", FilterType::BandPass),
            ("band_shelf", FilterType::BandShelf),
        ] {
            let mut filter = SVFilter::with_coefficients(Coefficients::new(
                filter_type,
                1_000.0,
                2.0,
                2.0,
                SAMPLE_RATE,
            ));
            let mut buffer = input.clone();
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    buffer.copy_from_slice(&input);
                    filter.render(black_box(&mut buffer));
                })
            });
        }

        // Coefficient update, done once per block by the filter node
        group.bench_with_input(BenchmarkId::new("coefficients", size), &size, |b, _| {
            b.iter(|| {
                Coefficients::new(
                    black_box(FilterType::HighShelf),
                    black_box(2_500.0),
                    black_box(0.7),
                    black_box(4.0),
                    SAMPLE_RATE,
                )
            })
        });
    }

    group.finish();
}
