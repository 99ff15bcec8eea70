use crate::dsp::distortion::DistortionType;
use crate::graph::node::{Output, ProcessCtx, Processor};

/*
Distortion Node
===============

Waveshapes the filter output. The voice runs it with a fixed shape and
threshold, so it mostly acts as a safety saturator after a resonant filter:
quiet signals pass almost untouched, loud peaks are bent back under the
threshold.

Modes (the TYPE input, rounded):

  0 Tanh      smooth, never exceeds the threshold
  1 Soft      x / (1 + |x|), gentler knee
  2 Hard      clamps at the threshold
  3 Foldback  reflects overs back into range, metallic

See `dsp/distortion.rs` for the transfer functions.
*/

#[derive(Debug, Clone, Copy, Default)]
pub struct Distortion;

impl Distortion {
    pub const AUDIO: usize = 0;
    pub const TYPE: usize = 1;
    pub const THRESHOLD: usize = 2;

    pub fn new() -> Self {
        Self
    }
}

impl Processor for Distortion {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        let shape = DistortionType::from_value(ctx.value(Self::TYPE));
        let audio = ctx.input(Self::AUDIO);
        let threshold = ctx.input(Self::THRESHOLD);
        let out = &mut outputs[0];

        for i in 0..out.active_len(ctx.samples()) {
            out.set(i, shape.apply(audio.at(i), threshold.at(i)));
        }
    }

    fn num_inputs(&self) -> usize {
        3
    }
}
