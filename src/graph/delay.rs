use crate::dsp::delay::{period_samples, DelayLine};
use crate::dsp::mix::{clamp_fraction, interpolate};
use crate::graph::node::{Output, ProcessCtx, Processor};
use crate::MAX_FEEDBACK_SAMPLES;

/// Largest feedback gain applied, in either polarity.
pub const MAX_FEEDBACK: f32 = 0.98;

/// Delay with feedback, used to resonate the oscillator mix at a pitch.
///
/// `DELAY_TIME` is in seconds and is usually the inverse of a frequency, so
/// the loop rings at that pitch. Times beyond the line's capacity are clamped
/// to the longest period it holds.
#[derive(Debug, Clone)]
pub struct FeedbackDelay {
    line: DelayLine,
}

impl Default for FeedbackDelay {
    fn default() -> Self {
        Self::new(MAX_FEEDBACK_SAMPLES)
    }
}

impl FeedbackDelay {
    pub const AUDIO: usize = 0;
    pub const WET: usize = 1;
    pub const DELAY_TIME: usize = 2;
    pub const FEEDBACK: usize = 3;
    pub const RESET: usize = 4;

    pub fn new(capacity: usize) -> Self {
        Self {
            line: DelayLine::new(capacity),
        }
    }
}

impl Processor for FeedbackDelay {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        let audio = ctx.input(Self::AUDIO);
        let wet = ctx.input(Self::WET);
        let delay_time = ctx.input(Self::DELAY_TIME);
        let feedback = ctx.input(Self::FEEDBACK);
        let reset_at = ctx.pulse(Self::RESET).map(|pulse| pulse.offset);
        let capacity = self.line.capacity();
        let out = &mut outputs[0];

        for i in 0..out.active_len(ctx.samples()) {
            if reset_at == Some(i) {
                self.line.reset();
            }

            let input = audio.at(i);
            let period = period_samples(delay_time.at(i), ctx.sample_rate, capacity);
            let delayed = self.line.read(period);

            let gain = feedback.at(i);
            let gain = if gain.is_nan() {
                0.0
            } else {
                gain.clamp(-MAX_FEEDBACK, MAX_FEEDBACK)
            };
            self.line.write(input + delayed * gain);

            out.set(i, interpolate(input, delayed, clamp_fraction(wet.at(i))));
        }
    }

    fn num_inputs(&self) -> usize {
        5
    }
}

/// One-block delay that closes a modulation loop.
///
/// Copies its input to its output and runs after every other node, so a
/// reader sees the block before the current one. A connection whose source
/// already depends on its destination is routed through one of these.
#[derive(Debug, Clone, Copy, Default)]
pub struct Feedback;

impl Processor for Feedback {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        let input = ctx.input(0);
        let out = &mut outputs[0];
        for i in 0..out.active_len(ctx.samples()) {
            out.set(i, input.at(i));
        }
    }

    fn num_inputs(&self) -> usize {
        1
    }

    fn is_feedback(&self) -> bool {
        true
    }
}
