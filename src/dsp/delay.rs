/// Shortest delay the line will read, in samples.
pub const MIN_DELAY_SAMPLES: f32 = 1.0;

/// Circular buffer with a fixed capacity chosen at construction.
///
/// Reads are fractional (linear interpolation between the two neighbouring
/// samples) so a delay can track a pitch period exactly.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 4, "delay line needs at least 4 samples of storage");
        Self {
            buffer: vec![0.0; capacity],
            write_pos: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Longest delay that can be read without touching the slot being written.
    pub fn max_delay(&self) -> f32 {
        (self.buffer.len() - 2) as f32
    }

    /// Sample written `delay` samples ago. Out-of-range delays are clamped.
    #[inline]
    pub fn read(&self, delay: f32) -> f32 {
        let delay = if delay.is_finite() {
            delay.clamp(MIN_DELAY_SAMPLES, self.max_delay())
        } else {
            self.max_delay()
        };

        let len = self.buffer.len();
        let whole = delay.floor();
        let frac = delay - whole;
        let whole = whole as usize;

        // write_pos holds the most recent sample, one sample ago
        let newer = (self.write_pos + len + 1 - whole) % len;
        let older = (newer + len - 1) % len;

        self.buffer[newer] * (1.0 - frac) + self.buffer[older] * frac
    }

    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
        self.buffer[self.write_pos] = sample;
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

/// Length in samples of a period of `seconds`, clamped to what a line of
/// `capacity` samples can hold.
#[inline]
pub fn period_samples(seconds: f32, sample_rate: f32, capacity: usize) -> f32 {
    let max = (capacity.saturating_sub(2)).max(1) as f32;
    let samples = seconds * sample_rate;
    if samples.is_finite() {
        samples.clamp(MIN_DELAY_SAMPLES, max)
    } else {
        max
    }
}
