//! Benchmarks for the waveshapers.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use voicegraph::dsp::distortion::DistortionType;

use crate::BLOCK_SIZES;

pub fn bench_distortion(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/distortion");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size)
            .map(|i| ((i as f32 / size as f32) * 2.0 - 1.0) * 3.0)
            .collect();
        let mut buffer = vec![0.0f32; size];

        for shape in DistortionType::ALL {
            let name = format!("{shape:?}").to_lowercase();
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    for (out, &x) in buffer.iter_mut().zip(&input) {
                        *out = black_box(shape).apply(x, 0.5);
                    }
                })
            });
        }
    }

    group.finish();
}
