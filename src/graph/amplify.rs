use crate::graph::node::{Output, ProcessCtx, Processor};

/// Product of two signals (amplitude control, ring modulation, modulation
/// depth scaling).
#[derive(Debug, Clone, Copy, Default)]
pub struct Multiply;

impl Multiply {
    pub const SIGNAL: usize = 0;
    pub const MODULATOR: usize = 1;
}

impl Processor for Multiply {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        let signal = ctx.input(Self::SIGNAL);
        let modulator = ctx.input(Self::MODULATOR);
        let out = &mut outputs[0];

        for i in 0..out.active_len(ctx.samples()) {
            out.set(i, signal.at(i) * modulator.at(i));
        }
    }

    fn num_inputs(&self) -> usize {
        2
    }
}
