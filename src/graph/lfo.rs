use crate::dsp::oscillator::{OscillatorBlock, Waveform};
use crate::graph::node::{Output, ProcessCtx, Processor};
use crate::MAX_STEPS;

/*
LFO (Low Frequency Oscillator)
==============================

An LFO runs at sub-audio frequencies to move parameters over time. Both
nodes here are control-rate: they produce one value per block and advance
by a whole block at a time. At 128 samples and 48 kHz that is an update
every 2.7 ms, far finer than anything an LFO is used for.

  Vibrato:    LFO → pitch         (small depth, 5-7 Hz)
  Tremolo:    LFO → amplitude
  Auto-wah:   LFO → cutoff

Output is bipolar (-1..1), except the step sequencer, which outputs the
step values exactly as set.

Step Sequencer
--------------

A sample-and-hold LFO that walks through up to 32 fixed step values at
`FREQUENCY` steps per second, wrapping after `NUM_STEPS`:

    step:   0    1    2    3    0    1 ...
    value: s0   s1   s2   s3   s0   s1 ...
*/

/// Control-rate oscillator with selectable waveform.
#[derive(Debug, Clone, Default)]
pub struct Lfo {
    osc: OscillatorBlock,
}

impl Lfo {
    pub const WAVEFORM: usize = 0;
    pub const FREQUENCY: usize = 1;
    pub const RESET: usize = 2;

    pub fn new() -> Self {
        Self::default()
    }
}

impl Processor for Lfo {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        if ctx.pulse(Self::RESET).is_some() {
            self.osc.reset();
        }

        let waveform = Waveform::from_value(ctx.value(Self::WAVEFORM));
        outputs[0].fill(self.osc.value(waveform, 0.0));

        let increment = ctx.value(Self::FREQUENCY) * ctx.samples() as f32 / ctx.sample_rate;
        self.osc.advance(increment);
    }

    fn num_inputs(&self) -> usize {
        3
    }
}

/// Cycles through a row of step values.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepSequencer {
    position: f32,
}

impl StepSequencer {
    pub const NUM_STEPS: usize = 0;
    pub const FREQUENCY: usize = 1;
    pub const RESET: usize = 2;
    /// First of `MAX_STEPS` consecutive step value slots.
    pub const STEPS: usize = 3;

    pub fn new() -> Self {
        Self::default()
    }
}

impl Processor for StepSequencer {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        let num_steps = ctx.value(Self::NUM_STEPS);
        let num_steps = if num_steps.is_finite() {
            num_steps.round().clamp(1.0, MAX_STEPS as f32)
        } else {
            1.0
        };

        if ctx.pulse(Self::RESET).is_some() {
            self.position = 0.0;
        }
        if self.position >= num_steps {
            self.position %= num_steps;
        }

        let step = (self.position as usize).min(MAX_STEPS - 1);
        outputs[0].fill(ctx.value(Self::STEPS + step));

        let advance = ctx.value(Self::FREQUENCY) * ctx.samples() as f32 / ctx.sample_rate;
        if advance.is_finite() && advance > 0.0 {
            self.position = (self.position + advance) % num_steps;
        }
    }

    fn num_inputs(&self) -> usize {
        Self::STEPS + MAX_STEPS
    }
}
