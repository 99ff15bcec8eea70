//! Unit conversions shared by every pitch- and level-like parameter.
//!
//! Oscillator pitch, the feedback period and filter cutoff all pass through
//! [`midi_to_frequency`], so modulating any of them in note space behaves the
//! same way: one unit is one semitone.

/// Lowest Q the resonance control maps to.
pub const MIN_RESONANCE: f32 = 0.5;
/// Highest Q the resonance control maps to.
pub const MAX_RESONANCE: f32 = 16.0;

/// Convert a (fractional) MIDI note number to frequency in Hz.
/// A4 = 440 Hz = MIDI note 69
#[inline]
pub fn midi_to_frequency(note: f32) -> f32 {
    440.0 * 2.0_f32.powf((note - 69.0) / 12.0)
}

/// Convert decibels to a linear amplitude factor.
#[inline]
pub fn db_to_magnitude(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Map a 0..1 resonance control onto Q, exponentially so equal control steps
/// sound like equal changes. Out-of-range input is clamped.
#[inline]
pub fn resonance_to_q(resonance: f32) -> f32 {
    let amount = resonance.clamp(0.0, 1.0);
    MIN_RESONANCE * (MAX_RESONANCE / MIN_RESONANCE).powf(amount)
}
