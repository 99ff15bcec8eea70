//! The processor graph and the processors that live in it.
//!
//! A [`ProcessorGraph`](arena::ProcessorGraph) owns its processors in an
//! arena and evaluates them block by block in dependency order. Processors
//! read each other through [`OutputRef`](node::OutputRef)s; a voice graph may
//! also read the outputs of the shared global graph.

/// Multiply two signals together (amplitude or ring modulation).
pub mod amplify;
/// Node arena, evaluation order and block evaluation.
pub mod arena;
/// Feedback delay that resonates the oscillator mix at a pitch, and the
/// one-block feedback node that closes modulation loops.
pub mod delay;
/// Waveshaping after the voice filter.
pub mod distortion;
/// ADSR envelope node with kill, finished and reset pulses.
pub mod envelope;
/// State-variable filter node with multiple responses.
pub mod filter;
/// Parallel band-pass bank for vowel-like timbres.
pub mod formant;
/// Low frequency oscillators and the step sequencer.
pub mod lfo;
/// Linear and bilinear interpolation.
pub mod mix;
/// The accumulator every modulatable parameter is read from.
pub mod modulate;
/// Core types shared by all processors.
pub mod node;
/// Arithmetic and unit conversion operators.
pub mod operators;
/// The cross-modulated oscillator pair.
pub mod oscillator;
/// Linear glide towards a moving target (portamento).
pub mod slope;
/// Pulse routing: legato, portamento, sample-and-hold.
pub mod trigger;
/// Settable and smoothed constants.
pub mod value;
