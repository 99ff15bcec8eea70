//! Offline measurements of a rendered note.
//!
//! Windowed FFT for the dominant frequency, and peak/RMS per segment.

use rustfft::{num_complex::Complex, FftPlanner};

/// Level of one stretch of audio.
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub start_seconds: f32,
    pub peak: f32,
    pub rms: f32,
}

pub fn segments(audio: &[f32], sample_rate: f32, segment_seconds: f32) -> Vec<Segment> {
    let len = ((segment_seconds * sample_rate) as usize).max(1);
    audio
        .chunks(len)
        .enumerate()
        .map(|(i, chunk)| {
            let peak = chunk.iter().fold(0.0f32, |acc, x| acc.max(x.abs()));
            let power = chunk.iter().map(|x| x * x).sum::<f32>() / chunk.len() as f32;
            Segment {
                start_seconds: (i * len) as f32 / sample_rate,
                peak,
                rms: power.sqrt(),
            }
        })
        .collect()
}

/// Frequency of the strongest bin of a Hann-windowed FFT over `audio`.
///
/// The FFT size is the largest power of two that fits. Returns `None` when
/// there is too little audio or it is silent.
pub fn dominant_frequency(audio: &[f32], sample_rate: f32) -> Option<f32> {
    if audio.len() < 64 {
        return None;
    }
    let size = 1usize << (usize::BITS - 1 - audio.len().leading_zeros());
    let audio = &audio[audio.len() - size..];

    // Hann window - reduces spectral leakage
    let denom = (size - 1) as f32;
    let mut scratch: Vec<Complex<f32>> = audio
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let window = 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / denom).cos());
            Complex::new(x * window, 0.0)
        })
        .collect();

    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(size).process(&mut scratch);

    let (index, power) = scratch[1..size / 2]
        .iter()
        .map(|bin| bin.re * bin.re + bin.im * bin.im)
        .enumerate()
        .fold((0, 0.0f32), |best, (i, p)| if p > best.1 { (i + 1, p) } else { best });

    if power <= 1e-12 {
        return None;
    }
    Some(index as f32 * sample_rate / size as f32)
}
