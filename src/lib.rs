pub mod config;
pub mod dsp; // Allocation-free DSP math
pub mod error;
pub mod graph; // Processor arena and the processors that live in it
pub mod synth; // Voice assembly and the modulation matrix

pub use config::SynthConfig;
pub use error::Error;
pub use synth::{
    handler::VoiceHandler,
    matrix::{DestinationId, SourceId, ValueHandle},
    voice::Voice,
};

pub const MAX_BLOCK_SIZE: usize = 2048;

/// Number of MIDI notes. Cutoff and pitch math live in this note space.
pub const MIDI_SIZE: usize = 128;

/// Hard ceiling on the oscillator feedback delay, in samples.
pub const MAX_FEEDBACK_SAMPLES: usize = 20_000;

/// Input slots reserved up front on every modulation accumulator.
pub const MAX_MODULATION_CONNECTIONS: usize = 64;

pub const MAX_STEPS: usize = 32;
pub const NUM_FORMANTS: usize = 4;
