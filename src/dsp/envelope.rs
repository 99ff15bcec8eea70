/*
ADSR Envelope Implementation
============================

A linear ADSR envelope generator driven by discrete voice events instead of a
gate level. The graph wrapper (`graph::envelope`) feeds it one event at a time
and reports the transitions it returns as pulses.

Vocabulary
----------

  level       The envelope's current output value (0.0 to 1.0).

  stage       Which phase of the envelope we're in. A state machine governs
              transitions.

  kill        A short forced ramp to zero. A voice-on that arrives while the
              envelope is still sounding kills first, so the note and the
              oscillator phases can change while the output is silent.

  reset       The instant the envelope is silent and starts a fresh attack.
              Reported to the caller so note-change logic can latch.

  finished    The instant a release reaches zero. Reported exactly once per
              release; this is what tells a voice pool the voice is free.


The State Machine
-----------------

    ┌──────┐ voice-on (silent) ┌────────┐  level=1  ┌───────┐  level=S  ┌─────────┐
    │ Idle │ ────────────────→ │ Attack │ ────────→ │ Decay │ ────────→ │ Sustain │
    └──────┘                   └────────┘           └───────┘           └─────────┘
                                 ↑    │ voice-off       │ voice-off          │ voice-off
       voice-on (sounding)       │    ↓                 ↓                    ↓
    ┌──────┐   level=0 (reset)   │  ┌──────────────────────────────────────────┐
    │ Kill │ ────────────────────┘  │                 Release                  │
    └──────┘                        └──────────────────────────────────────────┘
                                                       │ level=0 (finished)
                                                       ↓
                                                  ┌──────────┐
                                                  │ Finished │
                                                  └──────────┘

Finished behaves like Idle for a following voice-on: the level is already
exactly zero, so attack starts (and reset is reported) immediately.

Release is special: we snapshot the starting level and total samples at
voice-off time, then interpolate linearly. This ensures we hit exactly 0.0.
*/

/// Ramp time used when a sounding envelope is retriggered.
pub const KILL_TIME: f32 = 0.005;

/// The current stage of the envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,     // Never triggered, level = 0
    Attack,   // Ramping up to 1.0
    Decay,    // Reached peak, ramping down to sustain level
    Sustain,  // Holding at sustain level until voice-off
    Release,  // Ramping down to 0
    Kill,     // Forced ramp to 0 before a retrigger
    Finished, // Release completed, level = 0
}

/// Edge reported by [`Envelope::next_sample`] and [`Envelope::note_on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    /// Silent and starting a new attack.
    Reset,
    /// Release reached zero.
    Finished,
}

#[derive(Debug, Clone)]
pub struct Envelope {
    // ADSR parameters, refreshed from the graph every sample
    attack_time: f32,
    decay_time: f32,
    sustain_level: f32,
    release_time: f32,

    stage: EnvelopeState,
    level: f32,

    decay_start_level: f32,
    kill_decrement: f32,

    release_start_level: f32,
    release_total_samples: u32,
    release_elapsed_samples: u32,
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new()
    }
}

impl Envelope {
    pub fn new() -> Self {
        Self::adsr(0.01, 0.1, 0.7, 0.3)
    }

    pub fn adsr(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        let mut env = Self {
            attack_time: 0.0,
            decay_time: 0.0,
            sustain_level: 0.0,
            release_time: 0.0,

            stage: EnvelopeState::Idle,
            level: 0.0,
            decay_start_level: 0.0,
            kill_decrement: 0.0,
            release_start_level: 0.0,
            release_total_samples: 1,
            release_elapsed_samples: 0,
        };
        env.set_adsr(attack, decay, sustain, release);
        env
    }

    /// Update the shape. Negative times count as zero, sustain is clamped
    /// to 0..1. Every stage lasts at least one sample at whatever rate the
    /// envelope is run.
    pub fn set_adsr(&mut self, attack: f32, decay: f32, sustain: f32, release: f32) {
        self.attack_time = attack.max(0.0);
        self.decay_time = decay.max(0.0);
        self.sustain_level = sustain.clamp(0.0, 1.0);
        self.release_time = release.max(0.0);
    }

    /// Voice-on. Returns [`Transition::Reset`] when the envelope was already
    /// silent and attack starts right away; otherwise the kill ramp runs first
    /// and the reset is reported by `next_sample` once it lands.
    pub fn note_on(&mut self, sample_rate: f32) -> Transition {
        if self.level <= 0.0 {
            self.restart();
            return Transition::Reset;
        }

        self.kill_decrement = self.level / (KILL_TIME * sample_rate).max(1.0);
        self.stage = EnvelopeState::Kill;
        Transition::None
    }

    /// Voice-off: start the release phase from the current level.
    pub fn note_off(&mut self, sample_rate: f32) {
        if matches!(self.stage, EnvelopeState::Idle | EnvelopeState::Finished) {
            return;
        }

        self.release_start_level = self.level;
        self.release_total_samples = stage_samples(self.release_time, sample_rate).round() as u32;
        self.release_elapsed_samples = 0;
        self.stage = EnvelopeState::Release;
    }

    /// Hard restart from zero, without a kill ramp.
    pub fn restart(&mut self) {
        self.level = 0.0;
        self.stage = EnvelopeState::Attack;
        self.release_elapsed_samples = 0;
    }

    /// Advance the envelope by one sample.
    pub fn next_sample(&mut self, sample_rate: f32) -> Transition {
        match self.stage {
            EnvelopeState::Idle | EnvelopeState::Finished => {
                self.level = 0.0;
            }

            EnvelopeState::Attack => {
                let increment = 1.0 / stage_samples(self.attack_time, sample_rate);
                self.level += increment;

                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.decay_start_level = 1.0;
                    self.stage = EnvelopeState::Decay;
                }
            }

            EnvelopeState::Decay => {
                let target = self.sustain_level;
                let total_drop = self.decay_start_level - target;
                let decrement = total_drop / stage_samples(self.decay_time, sample_rate);
                self.level -= decrement;

                if self.level <= target {
                    self.level = target;
                    self.stage = EnvelopeState::Sustain;
                }
            }

            EnvelopeState::Sustain => {
                self.level = self.sustain_level;
            }

            EnvelopeState::Release => {
                let progress =
                    self.release_elapsed_samples as f32 / self.release_total_samples as f32;
                self.level = (self.release_start_level * (1.0 - progress)).max(0.0);

                self.release_elapsed_samples = self.release_elapsed_samples.saturating_add(1);

                if self.release_elapsed_samples >= self.release_total_samples {
                    self.level = 0.0;
                    self.stage = EnvelopeState::Finished;
                    return Transition::Finished;
                }
            }

            EnvelopeState::Kill => {
                self.level -= self.kill_decrement;

                if self.level <= 0.0 {
                    self.restart();
                    return Transition::Reset;
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        Transition::None
    }

    /// Returns true while the envelope can still produce output.
    pub fn is_active(&self) -> bool {
        !matches!(self.stage, EnvelopeState::Idle | EnvelopeState::Finished)
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn state(&self) -> EnvelopeState {
        self.stage
    }
}

/// Length of a stage in samples, never shorter than one.
fn stage_samples(time: f32, sample_rate: f32) -> f32 {
    (time * sample_rate).max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn render_samples(env: &mut Envelope, samples: usize) -> Vec<Transition> {
        (0..samples)
            .map(|_| env.next_sample(SAMPLE_RATE))
            .filter(|t| *t != Transition::None)
            .collect()
    }

    #[test]
    fn attack_reaches_full_level() {
        let mut env = Envelope::adsr(0.01, 0.1, 0.7, 0.2);

        assert_eq!(env.note_on(SAMPLE_RATE), Transition::Reset);
        render_samples(&mut env, (0.01 * SAMPLE_RATE) as usize);

        assert!(env.level() > 0.99, "expected attack to reach full level");
        assert_ne!(env.state(), EnvelopeState::Attack);
    }

    #[test]
    fn sustain_holds_target_level() {
        let sustain = 0.6;
        let mut env = Envelope::adsr(0.01, 0.05, sustain, 0.2);

        env.note_on(SAMPLE_RATE);
        let attack_decay_samples = ((0.01 + 0.05) * SAMPLE_RATE) as usize + 5;
        render_samples(&mut env, attack_decay_samples);

        assert_eq!(env.state(), EnvelopeState::Sustain);
        assert!((env.level() - sustain).abs() < 0.05, "sustain level should be held");
    }

    #[test]
    fn release_reports_finished_once() {
        let release = 0.03;
        let mut env = Envelope::adsr(0.01, 0.05, 0.5, release);

        env.note_on(SAMPLE_RATE);
        render_samples(&mut env, (0.02 * SAMPLE_RATE) as usize);

        env.note_off(SAMPLE_RATE);
        let transitions = render_samples(&mut env, (release * SAMPLE_RATE) as usize + 20);

        assert_eq!(transitions, vec![Transition::Finished]);
        assert_eq!(env.level(), 0.0);
        assert_eq!(env.state(), EnvelopeState::Finished);
    }

    #[test]
    fn retrigger_while_sounding_kills_before_reset() {
        let mut env = Envelope::adsr(0.001, 0.05, 0.8, 0.2);
        env.note_on(SAMPLE_RATE);
        render_samples(&mut env, 20);
        assert!(env.level() > 0.5);

        assert_eq!(env.note_on(SAMPLE_RATE), Transition::None);
        assert_eq!(env.state(), EnvelopeState::Kill);

        let transitions = render_samples(&mut env, (KILL_TIME * SAMPLE_RATE) as usize + 2);
        assert_eq!(transitions, vec![Transition::Reset]);
        assert!(matches!(
            env.state(),
            EnvelopeState::Attack | EnvelopeState::Decay
        ));
    }

    #[test]
    fn zero_times_take_one_sample_each_at_any_rate() {
        let sample_rate = 96_000.0;
        let mut env = Envelope::adsr(0.0, 0.0, 0.4, 0.0);

        assert_eq!(env.note_on(sample_rate), Transition::Reset);
        env.next_sample(sample_rate);
        assert_eq!(env.level(), 1.0);
        assert_eq!(env.state(), EnvelopeState::Decay);

        env.next_sample(sample_rate);
        assert_eq!(env.level(), 0.4);
        assert_eq!(env.state(), EnvelopeState::Sustain);

        env.note_off(sample_rate);
        assert_eq!(env.next_sample(sample_rate), Transition::Finished);
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn attack_length_follows_the_sample_rate() {
        let sample_rate = 96_000.0;
        let mut env = Envelope::adsr(1.0 / 48_000.0, 0.1, 0.5, 0.1);
        env.note_on(sample_rate);

        env.next_sample(sample_rate);
        assert!((env.level() - 0.5).abs() < 1e-4);
        assert_eq!(env.state(), EnvelopeState::Attack);
        env.next_sample(sample_rate);
        env.next_sample(sample_rate);
        assert_eq!(env.state(), EnvelopeState::Decay);
    }

    #[test]
    fn voice_off_while_idle_is_ignored() {
        let mut env = Envelope::new();
        env.note_off(SAMPLE_RATE);
        assert_eq!(env.state(), EnvelopeState::Idle);
        assert!(!env.is_active());
    }
}
