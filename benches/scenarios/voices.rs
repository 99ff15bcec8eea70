//! Benchmarks for complete voices.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use voicegraph::{SynthConfig, VoiceHandler};

use crate::BLOCK_SIZES;

fn handler(max_block_size: usize, polyphony: usize) -> VoiceHandler {
    VoiceHandler::new(
        SynthConfig::default()
            .with_max_block_size(max_block_size)
            .with_polyphony(polyphony),
    )
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");

    for &size in BLOCK_SIZES {
        let mut out = vec![0.0f32; size];

        // === IDLE ===
        // eight voices, none sounding: only the global graph runs
        let mut idle = handler(size, 8);
        group.bench_with_input(BenchmarkId::new("idle_x8", size), &size, |b, &n| {
            b.iter(|| {
                idle.process(black_box(n));
            })
        });

        // === SINGLE VOICE ===
        // one held note through the full chain, formant stage engaged
        let mut single = handler(size, 1);
        single.set_control("formant_bypass", 0.0).ok();
        single.set_control("amp_release", 100.0).ok();
        if let Some(voice) = single.voice_mut(0) {
            voice.note_on(48.0, 0.9);
        }
        group.bench_with_input(BenchmarkId::new("held", size), &size, |b, &n| {
            b.iter(|| {
                single.process(black_box(n));
                out.fill(0.0);
                single.mix_into(&mut out);
            })
        });

        // === MODULATED CHORD ===
        // eight voices with LFO, envelope and wheel routings live
        let mut chord = handler(size, 8);
        for (source, destination) in [
            ("lfo_1", "cutoff"),
            ("filter_env", "pitch"),
            ("lfo_2", "formant_x"),
            ("mod_wheel", "osc_mix"),
        ] {
            let scale = chord.create_scale(0.2);
            chord.connect_modulation(source, destination, scale);
        }
        for (index, note) in [48.0, 52.0, 55.0, 59.0, 60.0, 64.0, 67.0, 71.0].into_iter().enumerate() {
            if let Some(voice) = chord.voice_mut(index) {
                voice.note_on(note, 0.8);
            }
        }
        group.bench_with_input(BenchmarkId::new("chord_x8", size), &size, |b, &n| {
            b.iter(|| {
                chord.process(black_box(n));
                out.fill(0.0);
                chord.mix_into(&mut out);
            })
        });
    }

    group.finish();
}
