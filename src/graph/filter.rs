use crate::dsp::filter::{Coefficients, FilterType, SVFilter};
use crate::graph::node::{Output, ProcessCtx, Processor};

/*
State-Variable Filter (SVF)
===========================

The voice filter. In subtractive synthesis you start with a harmonically rich
waveform and filter out frequencies to sculpt the timbre.

Filter Types (the TYPE control, rounded):
-----------------------------------------

  0 Lowpass     passes below the cutoff
  1 Highpass    passes above the cutoff
  2 Bandpass    passes around the cutoff
  3 Notch       rejects at the cutoff
  4 Allpass     passes everything, shifts phase
  5 Low shelf   boosts or cuts below the cutoff by GAIN
  6 High shelf  boosts or cuts above the cutoff by GAIN
  7 Band shelf  boosts or cuts around the cutoff by GAIN

Inputs:
-------

  CUTOFF     Hz. The voice derives it in MIDI-note space and converts it
             with the same scale as oscillator pitch.
  RESONANCE  Q, already through the resonance scale.
  GAIN       Linear magnitude; only the shelf types use it.
  RESET      A pulse clears the integrators (on note reset).

Coefficients are computed once per block from the first sample of each
parameter input. The audio itself is filtered per sample.
*/

#[derive(Debug, Clone, Default)]
pub struct Filter {
    svf: SVFilter,
}

impl Filter {
    pub const AUDIO: usize = 0;
    pub const TYPE: usize = 1;
    pub const RESET: usize = 2;
    pub const CUTOFF: usize = 3;
    pub const RESONANCE: usize = 4;
    pub const GAIN: usize = 5;

    pub fn new() -> Self {
        Self::default()
    }
}

impl Processor for Filter {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        let coefficients = Coefficients::new(
            FilterType::from_value(ctx.value(Self::TYPE)),
            ctx.value(Self::CUTOFF),
            ctx.value(Self::RESONANCE),
            ctx.value(Self::GAIN),
            ctx.sample_rate,
        );
        self.svf.set_coefficients(coefficients);

        let audio = ctx.input(Self::AUDIO);
        let reset_at = ctx.pulse(Self::RESET).map(|pulse| pulse.offset);
        let out = &mut outputs[0];

        for i in 0..out.active_len(ctx.samples()) {
            if reset_at == Some(i) {
                self.svf.reset();
            }
            out.set(i, self.svf.tick(audio.at(i)));
        }
    }

    fn num_inputs(&self) -> usize {
        6
    }
}
