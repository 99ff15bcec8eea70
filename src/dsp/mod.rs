//! Low-level DSP primitives used by the graph processors.
//!
//! These components are allocation-free and realtime-safe, making them safe to
//! embed directly inside processors. They intentionally stay focused on the
//! signal-processing math so the graph layer can handle wiring, rates and
//! trigger routing.

/// Fixed-capacity fractional delay line.
pub mod delay;
/// Waveshaping nonlinearities.
pub mod distortion;
/// Attack/decay/sustain/release state machine with a kill ramp.
pub mod envelope;
/// State-variable filter with pass, shelf and bell responses.
pub mod filter;
/// Linear and bilinear interpolation.
pub mod mix;
/// Waveform lookup and phase accumulation.
pub mod oscillator;
/// Unit conversions: MIDI note to Hz, decibels to magnitude, resonance to Q.
pub mod scale;

pub use envelope::EnvelopeState;
