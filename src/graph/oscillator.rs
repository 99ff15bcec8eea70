use crate::dsp::oscillator::{OscillatorBlock, Waveform};
use crate::graph::node::{Output, ProcessCtx, Processor};

/*
Oscillator Pair
===============

The voice's two audio oscillators run as one node because each one phase
modulates the other:

    phase_1 += f1 / sr          out_1 = wave_1(phase_1 + CROSS_MOD_1 × last out_2)
    phase_2 += f2 / sr          out_2 = wave_2(phase_2 + CROSS_MOD_2 × last out_1)

"last" is the previous sample, so the loop has one sample of delay and no
ordering problem. The cross-modulation inputs are modulation accumulators
seeded with the `cross_modulation` control; at zero the oscillators are
independent.

A pulse on RESET zeroes both phases at its offset, so a retriggered note
starts every cycle from the same point.
*/

#[derive(Debug, Clone, Default)]
pub struct OscillatorPair {
    first: OscillatorBlock,
    second: OscillatorBlock,
    last_first: f32,
    last_second: f32,
}

impl OscillatorPair {
    pub const WAVEFORM_1: usize = 0;
    pub const FREQUENCY_1: usize = 1;
    pub const CROSS_MOD_1: usize = 2;
    pub const WAVEFORM_2: usize = 3;
    pub const FREQUENCY_2: usize = 4;
    pub const CROSS_MOD_2: usize = 5;
    pub const RESET: usize = 6;

    pub const OSC_1: usize = 0;
    pub const OSC_2: usize = 1;

    pub fn new() -> Self {
        Self::default()
    }
}

impl Processor for OscillatorPair {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        let wave_1 = Waveform::from_value(ctx.value(Self::WAVEFORM_1));
        let wave_2 = Waveform::from_value(ctx.value(Self::WAVEFORM_2));
        let frequency_1 = ctx.input(Self::FREQUENCY_1);
        let frequency_2 = ctx.input(Self::FREQUENCY_2);
        let cross_1 = ctx.input(Self::CROSS_MOD_1);
        let cross_2 = ctx.input(Self::CROSS_MOD_2);
        let reset_at = ctx.pulse(Self::RESET).map(|pulse| pulse.offset);
        let period = 1.0 / ctx.sample_rate;

        for i in 0..outputs[Self::OSC_1].active_len(ctx.samples()) {
            if reset_at == Some(i) {
                self.first.reset();
                self.second.reset();
                self.last_first = 0.0;
                self.last_second = 0.0;
            }

            let out_1 = self.first.value(wave_1, cross_1.at(i) * self.last_second);
            let out_2 = self.second.value(wave_2, cross_2.at(i) * self.last_first);

            self.first.advance(frequency_1.at(i) * period);
            self.second.advance(frequency_2.at(i) * period);

            self.last_first = out_1;
            self.last_second = out_2;
            outputs[Self::OSC_1].set(i, out_1);
            outputs[Self::OSC_2].set(i, out_2);
        }
    }

    fn num_inputs(&self) -> usize {
        7
    }

    fn num_outputs(&self) -> usize {
        2
    }
}
