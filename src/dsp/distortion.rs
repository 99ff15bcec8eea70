//! Distortion / Waveshaping
//!
//! A waveshaper applies a transfer function to each sample. The voice runs
//! its filter output through one of these at a fixed threshold; the threshold
//! is the level above which the signal enters the nonlinear region.
//!
//! # Transfer functions
//!
//! Tanh:
//!   f(x) = t * tanh(x / t)
//!   - Smooth saturation, never exceeds ±t
//!
//! Soft Clip:
//!   f(x) = x / (1 + |x|)
//!   - Cheaper, gentler knee than tanh
//!
//! Hard Clip:
//!   f(x) = clamp(x, -t, t)
//!   - Harsh, odd harmonics
//!
//! Foldback:
//!   Signal beyond ±t reflects back into range, as many times as needed
//!   - Metallic harmonics, still bounded by ±t

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Smallest threshold accepted by the threshold-based shapes.
pub const MIN_THRESHOLD: f32 = 1e-3;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistortionType {
    Tanh,
    SoftClip,
    HardClip,
    Foldback,
}

impl DistortionType {
    pub const ALL: [DistortionType; 4] = [
        DistortionType::Tanh,
        DistortionType::SoftClip,
        DistortionType::HardClip,
        DistortionType::Foldback,
    ];

    pub fn from_value(value: f32) -> Self {
        if !value.is_finite() {
            return DistortionType::Tanh;
        }
        let index = value.round().clamp(0.0, (Self::ALL.len() - 1) as f32) as usize;
        Self::ALL[index]
    }

    #[inline]
    pub fn apply(self, sample: f32, threshold: f32) -> f32 {
        let threshold = if threshold.is_finite() {
            threshold.max(MIN_THRESHOLD)
        } else {
            1.0
        };

        match self {
            DistortionType::Tanh => tanh_clip(sample, threshold),
            DistortionType::SoftClip => soft_clip(sample, 1.0 / threshold) * threshold,
            DistortionType::HardClip => hard_clip(sample, 1.0, threshold),
            DistortionType::Foldback => foldback(sample, 1.0, threshold),
        }
    }
}

/// Soft clipping using x / (1 + |x|) transfer function.
#[inline]
pub fn soft_clip(sample: f32, drive: f32) -> f32 {
    let x = sample * drive;
    x / (1.0 + x.abs())
}

/// Hard clipping - simply clamps the signal at a threshold.
#[inline]
pub fn hard_clip(sample: f32, drive: f32, threshold: f32) -> f32 {
    let x = sample * drive;
    if x.is_nan() {
        return 0.0;
    }
    x.clamp(-threshold, threshold)
}

/// Hyperbolic tangent saturation scaled to the threshold.
#[inline]
pub fn tanh_clip(sample: f32, threshold: f32) -> f32 {
    threshold * (sample / threshold).tanh()
}

/// Foldback distortion - signal folds back when exceeding threshold.
///
/// Closed form over a triangle of period 4t, so arbitrarily large input
/// folds in constant time.
#[inline]
pub fn foldback(sample: f32, drive: f32, threshold: f32) -> f32 {
    let x = sample * drive;
    if !x.is_finite() {
        return 0.0;
    }
    if (-threshold..=threshold).contains(&x) {
        return x;
    }

    let period = 4.0 * threshold;
    let y = (x + threshold).rem_euclid(period);
    if y < 2.0 * threshold {
        y - threshold
    } else {
        3.0 * threshold - y
    }
}
