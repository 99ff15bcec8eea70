use std::f32::consts::TAU;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const NOISE_SEED: u64 = 0x5eed_0f_a0d10;

/// Every shape an oscillator or LFO can produce, in control-value order.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sin,
    Triangle,
    Square,
    DownSaw,
    UpSaw,
    ThreeStep,
    FourStep,
    EightStep,
    ThreePyramid,
    FivePyramid,
    NinePyramid,
    WhiteNoise,
}

impl Waveform {
    pub const ALL: [Waveform; 12] = [
        Waveform::Sin,
        Waveform::Triangle,
        Waveform::Square,
        Waveform::DownSaw,
        Waveform::UpSaw,
        Waveform::ThreeStep,
        Waveform::FourStep,
        Waveform::EightStep,
        Waveform::ThreePyramid,
        Waveform::FivePyramid,
        Waveform::NinePyramid,
        Waveform::WhiteNoise,
    ];

    /// Resolve a control value; rounded and clamped into range.
    pub fn from_value(value: f32) -> Self {
        if !value.is_finite() {
            return Waveform::Sin;
        }
        let index = value.round().clamp(0.0, (Self::ALL.len() - 1) as f32) as usize;
        Self::ALL[index]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Value of a deterministic waveform at `phase` in [0, 1).
    /// Noise has no phase and reads as silence here.
    pub fn lookup(self, phase: f32) -> f32 {
        let phase = phase - phase.floor();
        match self {
            Waveform::Sin => (TAU * phase).sin(),
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::DownSaw => 1.0 - 2.0 * phase,
            Waveform::UpSaw => 2.0 * phase - 1.0,
            Waveform::ThreeStep => step(phase, 3),
            Waveform::FourStep => step(phase, 4),
            Waveform::EightStep => step(phase, 8),
            Waveform::ThreePyramid => pyramid(phase, 3),
            Waveform::FivePyramid => pyramid(phase, 5),
            Waveform::NinePyramid => pyramid(phase, 9),
            Waveform::WhiteNoise => 0.0,
        }
    }
}

/// Rising staircase with `steps` levels spread over [-1, 1].
#[inline]
fn step(phase: f32, steps: u32) -> f32 {
    let level = ((phase * steps as f32).floor() as u32).min(steps - 1);
    quantized(level, steps)
}

/// Staircase up then down: a triangle quantised to `steps` levels.
#[inline]
fn pyramid(phase: f32, steps: u32) -> f32 {
    let rise = 1.0 - (2.0 * phase - 1.0).abs();
    let level = ((rise * steps as f32).floor() as u32).min(steps - 1);
    quantized(level, steps)
}

#[inline]
fn quantized(level: u32, steps: u32) -> f32 {
    2.0 * level as f32 / (steps - 1) as f32 - 1.0
}

/// Phase accumulator plus a noise source.
#[derive(Debug, Clone)]
pub struct OscillatorBlock {
    phase: f32,
    rng: SmallRng,
}

impl Default for OscillatorBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl OscillatorBlock {
    pub fn new() -> Self {
        Self {
            phase: 0.0,
            rng: SmallRng::seed_from_u64(NOISE_SEED),
        }
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Current output, with `phase_offset` (in cycles) added for phase modulation.
    #[inline]
    pub fn value(&mut self, waveform: Waveform, phase_offset: f32) -> f32 {
        match waveform {
            Waveform::WhiteNoise => self.rng.gen_range(-1.0..=1.0),
            shape => {
                let offset = if phase_offset.is_finite() { phase_offset } else { 0.0 };
                shape.lookup(self.phase + offset)
            }
        }
    }

    /// Move the phase forward by `increment` cycles, wrapping into [0, 1).
    #[inline]
    pub fn advance(&mut self, increment: f32) {
        if !increment.is_finite() {
            return;
        }
        self.phase += increment;
        self.phase -= self.phase.floor();
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}
