#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::MAX_BLOCK_SIZE;

/// Construction-time settings for a [`VoiceHandler`](crate::VoiceHandler).
///
/// Buffer sizes are fixed from `max_block_size` when the graph is built and
/// never resized afterwards, so any block handed to `process` must fit.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthConfig {
    pub sample_rate: f32,
    pub max_block_size: usize,
    pub polyphony: usize,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            max_block_size: 128,
            polyphony: 8,
        }
    }
}

impl SynthConfig {
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_max_block_size(mut self, max_block_size: usize) -> Self {
        self.max_block_size = max_block_size;
        self
    }

    pub fn with_polyphony(mut self, polyphony: usize) -> Self {
        self.polyphony = polyphony;
        self
    }

    /// Panics on settings no voice can be built from.
    pub(crate) fn validate(&self) {
        assert!(
            self.sample_rate.is_finite() && self.sample_rate > 0.0,
            "sample rate must be positive, got {}",
            self.sample_rate
        );
        assert!(
            (1..=MAX_BLOCK_SIZE).contains(&self.max_block_size),
            "max block size must be in 1..={MAX_BLOCK_SIZE}, got {}",
            self.max_block_size
        );
        assert!(self.polyphony > 0, "a voice handler needs at least one voice");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_setters_override_defaults() {
        let config = SynthConfig::default()
            .with_sample_rate(44_100.0)
            .with_max_block_size(256)
            .with_polyphony(2);

        assert_eq!(config.sample_rate, 44_100.0);
        assert_eq!(config.max_block_size, 256);
        assert_eq!(config.polyphony, 2);
        config.validate();
    }

    #[test]
    #[should_panic(expected = "max block size")]
    fn oversized_block_is_rejected() {
        SynthConfig::default()
            .with_max_block_size(MAX_BLOCK_SIZE + 1)
            .validate();
    }
}
