use crate::dsp::envelope::{Envelope as EnvelopeCore, EnvelopeState, Transition};
use crate::graph::node::{Event, Output, ProcessCtx, Processor};

/// ADSR envelope driven by trigger pulses.
///
/// `VoiceOn` starts a note (through the kill ramp if still sounding),
/// `VoiceOff` releases, `Reset` restarts from zero at once. The shape is read
/// from the parameter inputs every sample, so modulated times take effect
/// mid-stage.
#[derive(Debug, Clone, Default)]
pub struct Envelope {
    core: EnvelopeCore,
}

impl Envelope {
    pub const ATTACK: usize = 0;
    pub const DECAY: usize = 1;
    pub const SUSTAIN: usize = 2;
    pub const RELEASE: usize = 3;
    pub const TRIGGER: usize = 4;

    pub const VALUE: usize = 0;
    pub const FINISHED: usize = 1;
    pub const RESET: usize = 2;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EnvelopeState {
        self.core.state()
    }

    pub fn level(&self) -> f32 {
        self.core.level()
    }
}

impl Processor for Envelope {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        let attack = ctx.input(Self::ATTACK);
        let decay = ctx.input(Self::DECAY);
        let sustain = ctx.input(Self::SUSTAIN);
        let release = ctx.input(Self::RELEASE);
        let trigger = ctx.pulse(Self::TRIGGER);
        let sample_rate = ctx.sample_rate;

        for i in 0..outputs[Self::VALUE].active_len(ctx.samples()) {
            self.core
                .set_adsr(attack.at(i), decay.at(i), sustain.at(i), release.at(i));

            if let Some(pulse) = trigger.filter(|pulse| pulse.offset == i) {
                let started = match pulse.event {
                    Event::VoiceOn => self.core.note_on(sample_rate),
                    Event::Reset => {
                        self.core.restart();
                        Transition::Reset
                    }
                    Event::VoiceOff => {
                        self.core.note_off(sample_rate);
                        Transition::None
                    }
                    Event::Finished | Event::Jump => Transition::None,
                };
                if started == Transition::Reset {
                    outputs[Self::RESET].fire(i, Event::Reset);
                }
            }

            match self.core.next_sample(sample_rate) {
                Transition::Reset => outputs[Self::RESET].fire(i, Event::Reset),
                Transition::Finished => outputs[Self::FINISHED].fire(i, Event::Finished),
                Transition::None => {}
            }

            outputs[Self::VALUE].set(i, self.core.level());
        }
    }

    fn num_inputs(&self) -> usize {
        5
    }

    fn num_outputs(&self) -> usize {
        3
    }
}
