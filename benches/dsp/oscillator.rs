//! Benchmarks for waveform lookup.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use voicegraph::dsp::oscillator::{OscillatorBlock, Waveform};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");
    let increment = 440.0 / SAMPLE_RATE;

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for (name, waveform) in [
            ("sin", Waveform::Sin),
            ("down_saw", Waveform::DownSaw),
            ("nine_pyramid", Waveform::NinePyramid),
            ("white_noise", Waveform::WhiteNoise),
        ] {
            let mut osc = OscillatorBlock::new();
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    for sample in buffer.iter_mut() {
                        *sample = osc.value(black_box(waveform), 0.0);
                        osc.advance(increment);
                    }
                })
            });
        }
    }

    group.finish();
}
