use std::collections::HashMap;

use crate::config::SynthConfig;
use crate::dsp::distortion::DistortionType;
use crate::dsp::filter::FilterType;
use crate::dsp::oscillator::Waveform;
use crate::graph::amplify::Multiply;
use crate::graph::arena::ProcessorGraph;
use crate::graph::delay::FeedbackDelay;
use crate::graph::distortion::Distortion;
use crate::graph::envelope::Envelope;
use crate::graph::filter::Filter;
use crate::graph::formant::FormantFilter;
use crate::graph::lfo::{Lfo, StepSequencer};
use crate::graph::mix::{BilinearInterpolate, Interpolate};
use crate::graph::modulate::VariableAdd;
use crate::graph::node::{Event, NodeId, OutputRef, Processor, Rate, Scope};
use crate::graph::operators::{Add, Clamp, Inverse, MagnitudeScale, MidiScale, ResonanceScale};
use crate::graph::oscillator::OscillatorPair;
use crate::graph::slope::LinearSlope;
use crate::graph::trigger::{LegatoFilter, PortamentoFilter, TriggerCombiner, TriggerFilter, TriggerInput, TriggerWait};
use crate::graph::value::{SmoothValue, Value};
use crate::synth::matrix::ModulationMatrix;
use crate::{MAX_FEEDBACK_SAMPLES, MAX_MODULATION_CONNECTIONS, MAX_STEPS, MIDI_SIZE, NUM_FORMANTS};

/*
Voice Layout
============

One voice, left to right (every box is a processor in the voice graph;
controls and LFO 1 live in the global graph):

  events ─► legato ─► amp env ─┬──────────────────────────────────┐
                │              └─ reset ─┐                        │
                └─ remain ─► note change ┴► note/velocity latches │
                                                │                 │
              portamento glide ◄────────────────┘                 │
                    │                                             │
                    ▼                                             ▼
  pitch ─► osc 1 / osc 2 ─► mix ─► feedback delay ─► saturation ─► filter
                                                                  │
                              output ◄─ × amplitude ◄─ formant ◄─ distortion

Pitch is built in MIDI-note space: glided note + pitch bend + the `pitch`
destination (a full-scale value shifts by an octave). Cutoff is too: the
smoothed `cutoff` control + keytrack + filter envelope + the `cutoff`
destination, converted to Hz once at the end.

Every modulatable control is read through an accumulator seeded with the
control's global value, so connections never touch the controls
themselves. The accumulator is per voice, except for `lfo_1_frequency`
whose LFO is shared and so lives in the global graph.
*/

/// Semitones covered by a full-scale `pitch` modulation.
pub const PITCH_MOD_RANGE: f32 = 12.0;
/// Notes covered by a full-scale `cutoff` modulation.
pub const CUTOFF_MOD_RANGE: f32 = (MIDI_SIZE / 2) as f32;
pub const MIN_GAIN_DB: f32 = -24.0;
pub const MAX_GAIN_DB: f32 = 24.0;

const DISTORTION_THRESHOLD: f32 = 0.5;
const FEEDBACK_WET: f32 = 0.5;

#[derive(Debug, Clone, Copy)]
struct FormantPreset {
    gain: f32,
    resonance: f32,
    frequency: f32,
}

const fn preset(gain: f32, resonance: f32, frequency: f32) -> FormantPreset {
    FormantPreset {
        gain,
        resonance,
        frequency,
    }
}

// Corners of the formant pad, one row per band.
const TOP_LEFT_FORMANTS: [FormantPreset; NUM_FORMANTS] = [
    preset(1.0, 6.0, 270.0),
    preset(1.0, 10.0, 2300.0),
    preset(1.0, 8.0, 3000.0),
    preset(0.2, 15.0, 500.0),
];
const TOP_RIGHT_FORMANTS: [FormantPreset; NUM_FORMANTS] = [
    preset(1.0, 6.0, 270.0),
    preset(1.0, 12.0, 500.0),
    preset(1.0, 8.0, 2000.0),
    preset(1.0, 9.0, 1500.0),
];
const BOTTOM_LEFT_FORMANTS: [FormantPreset; NUM_FORMANTS] = [
    preset(1.0, 6.0, 270.0),
    preset(1.0, 4.0, 2300.0),
    preset(1.0, 8.0, 3000.0),
    preset(0.2, 0.5, 500.0),
];
const BOTTOM_RIGHT_FORMANTS: [FormantPreset; NUM_FORMANTS] = [
    preset(0.0, 6.0, 270.0),
    preset(0.0, 12.0, 500.0),
    preset(0.0, 8.0, 3000.0),
    preset(0.0, 9.0, 3500.0),
];

/// A host control living in the global graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Control {
    Plain(NodeId),
    Smooth(NodeId),
}

/// Voice nodes the voice itself drives or reads.
#[derive(Debug, Clone, Copy)]
pub(crate) struct VoicePorts {
    pub events: NodeId,
    pub note: NodeId,
    pub velocity: NodeId,
    pub aftertouch: NodeId,
    pub amplitude_env: NodeId,
    pub output: NodeId,
}

/// Everything `VoiceHandler::new` needs: the global graph, one voice
/// template and the name tables.
pub(crate) struct Blueprint {
    pub globals: ProcessorGraph,
    pub voice: ProcessorGraph,
    pub ports: VoicePorts,
    pub controls: HashMap<String, Control>,
    pub matrix: ModulationMatrix,
    pub pitch_wheel: NodeId,
    pub mod_wheel: NodeId,
}

/// Outputs of the articulation stage used further down the voice.
struct Articulation {
    glided_note: OutputRef,
    note_from_center: OutputRef,
    amplitude: OutputRef,
    reset: OutputRef,
}

pub(crate) struct VoiceBuilder {
    globals: ProcessorGraph,
    voice: ProcessorGraph,
    controls: HashMap<String, Control>,
    matrix: ModulationMatrix,
}

impl VoiceBuilder {
    pub(crate) fn new(config: &SynthConfig) -> Self {
        Self {
            globals: ProcessorGraph::new(Scope::Global, config.sample_rate, config.max_block_size),
            voice: ProcessorGraph::new(Scope::Voice, config.sample_rate, config.max_block_size),
            controls: HashMap::new(),
            matrix: ModulationMatrix::default(),
        }
    }

    pub(crate) fn build(mut self) -> Blueprint {
        let pitch_wheel = self.globals.add(SmoothValue::new(0.0), Rate::Audio, &[]);
        let mod_wheel = self.globals.add(SmoothValue::new(0.0), Rate::Audio, &[]);
        let pitch_wheel_ref = self.globals.output_ref(pitch_wheel);
        self.source("pitch_wheel", pitch_wheel_ref);
        let mod_wheel_ref = self.globals.output_ref(mod_wheel);
        self.source("mod_wheel", mod_wheel_ref);

        let events = self.voice.add(TriggerInput::new(), Rate::Control, &[]);
        let note = self.voice.add(Value::new(0.0), Rate::Control, &[]);
        let velocity = self.voice.add(Value::new(0.0), Rate::Control, &[]);
        let aftertouch = self.voice.add(Value::new(0.0), Rate::Control, &[]);
        let aftertouch_ref = self.voice.output_ref(aftertouch);
        self.source("aftertouch", aftertouch_ref);

        let (articulation, amplitude_env) = self.articulation(events, note, velocity);
        let feedback = self.oscillators(articulation.glided_note, pitch_wheel_ref, articulation.reset);
        self.modulators(articulation.reset);
        let events = self.voice.output_ref(events);
        let formant = self.filter(
            feedback,
            articulation.note_from_center,
            articulation.reset,
            events,
        );

        let output = self.voice.add(
            Multiply,
            Rate::Audio,
            &[Some(formant), Some(articulation.amplitude)],
        );

        self.voice.reserve(MAX_MODULATION_CONNECTIONS);
        self.globals.reserve(MAX_MODULATION_CONNECTIONS);

        Blueprint {
            globals: self.globals,
            voice: self.voice,
            ports: VoicePorts {
                events: events.node,
                note,
                velocity,
                aftertouch,
                amplitude_env,
                output,
            },
            controls: self.controls,
            matrix: self.matrix,
            pitch_wheel,
            mod_wheel,
        }
    }

    fn articulation(&mut self, events: NodeId, note: NodeId, velocity: NodeId) -> (Articulation, NodeId) {
        let events = self.voice.output_ref(events);

        // Legato.
        let legato = self.control("legato", 0.0);
        let legato_filter = self.voice.add(
            LegatoFilter::new(),
            Rate::Control,
            &[Some(legato), Some(events)],
        );
        let retrigger = self.voice.output_ref_at(legato_filter, LegatoFilter::RETRIGGER);
        let remain = self.voice.output_ref_at(legato_filter, LegatoFilter::REMAIN);

        // Amplitude envelope.
        let attack = self.mod_control("amp_attack", 0.01, Rate::Audio);
        let decay = self.mod_control("amp_decay", 0.7, Rate::Control);
        let sustain = self.mod_control("amp_sustain", 0.5, Rate::Audio);
        let release = self.mod_control("amp_release", 0.3, Rate::Control);
        let amplitude_env = self.voice.add(
            Envelope::new(),
            Rate::Audio,
            &[Some(attack), Some(decay), Some(sustain), Some(release), Some(retrigger)],
        );
        let envelope_value = self.voice.output_ref_at(amplitude_env, Envelope::VALUE);
        let reset = self.voice.output_ref_at(amplitude_env, Envelope::RESET);
        let finished = self.voice.output_ref_at(amplitude_env, Envelope::FINISHED);

        // Note changes: latch the new note and velocity.
        let note_change = self.node(
            TriggerCombiner::new(3),
            Rate::Control,
            &[Some(remain), Some(reset), Some(finished)],
        );
        let note = self.voice.output_ref(note);
        let current_note = self.node(TriggerWait::new(), Rate::Control, &[Some(note), Some(note_change)]);
        let velocity = self.voice.output_ref(velocity);
        let current_velocity = self.node(
            TriggerWait::new(),
            Rate::Control,
            &[Some(velocity), Some(note_change)],
        );

        let max_midi_invert = self.constant(1.0 / (MIDI_SIZE - 1) as f32);
        let note_percentage = self.node(
            Multiply,
            Rate::Control,
            &[Some(current_note), Some(max_midi_invert)],
        );

        // Key tracking.
        let center_adjust = self.constant(-((MIDI_SIZE / 2) as f32));
        let note_from_center = self.node(Add, Rate::Control, &[Some(current_note), Some(center_adjust)]);

        // Velocity tracking.
        let one = self.constant(1.0);
        let velocity_track = self.mod_control("velocity_track", 0.3, Rate::Audio);
        let velocity_scale = self.node(
            Interpolate,
            Rate::Audio,
            &[Some(one), Some(current_velocity), Some(velocity_track)],
        );
        let amplitude = self.node(
            Multiply,
            Rate::Audio,
            &[Some(envelope_value), Some(velocity_scale)],
        );

        // Portamento.
        let portamento = self.control("portamento", 0.01);
        let portamento_type = self.control("portamento_type", 0.0);
        let portamento_filter = self.node(
            PortamentoFilter::new(),
            Rate::Control,
            &[Some(portamento_type), Some(note_change), Some(events)],
        );
        let glided_note = self.node(
            LinearSlope::new(),
            Rate::Audio,
            &[Some(current_note), Some(portamento), Some(portamento_filter)],
        );

        self.source("amplitude_env", envelope_value);
        self.source("note", note_percentage);
        self.source("velocity", current_velocity);

        let articulation = Articulation {
            glided_note,
            note_from_center,
            amplitude,
            reset,
        };
        (articulation, amplitude_env)
    }

    /// Returns the output of the feedback delay.
    fn oscillators(&mut self, midi: OutputRef, pitch_wheel: OutputRef, reset: OutputRef) -> OutputRef {
        // Pitch bend and pitch modulation.
        let bend_range = self.control("pitch_bend_range", 2.0);
        let bend = self
            .globals
            .add(Multiply, Rate::Audio, &[Some(pitch_wheel), Some(bend_range)]);
        let bend = self.globals.output_ref(bend);
        let bent = self.node(Add, Rate::Audio, &[Some(midi), Some(bend)]);

        let pitch = self.accumulator("pitch", Rate::Audio);
        let pitch_range = self.constant(PITCH_MOD_RANGE);
        let pitch_offset = self.node(Multiply, Rate::Audio, &[Some(pitch), Some(pitch_range)]);
        let bent_midi = self.node(Add, Rate::Audio, &[Some(bent), Some(pitch_offset)]);

        // Oscillator pair.
        let waveform_1 = self.mod_control(
            "osc_1_waveform",
            Waveform::DownSaw.index() as f32,
            Rate::Control,
        );
        let frequency_1 = self.tuned_frequency(bent_midi, "osc_1", 0.0, 0.0);
        let waveform_2 = self.mod_control(
            "osc_2_waveform",
            Waveform::DownSaw.index() as f32,
            Rate::Control,
        );
        let frequency_2 = self.tuned_frequency(bent_midi, "osc_2", -12.0, 0.08);
        let cross_mod = self.mod_control("cross_modulation", 0.15, Rate::Audio);

        let oscillators = self.voice.add(
            OscillatorPair::new(),
            Rate::Audio,
            &[
                Some(waveform_1),
                Some(frequency_1),
                Some(cross_mod),
                Some(waveform_2),
                Some(frequency_2),
                Some(cross_mod),
                Some(reset),
            ],
        );
        let osc_1 = self.voice.output_ref_at(oscillators, OscillatorPair::OSC_1);
        let osc_2 = self.voice.output_ref_at(oscillators, OscillatorPair::OSC_2);

        // Mix.
        let mix_amount = self.smooth_mod_control("osc_mix", 0.5, Rate::Audio);
        let clamped_mix = self.node(Clamp::new(0.0, 1.0), Rate::Audio, &[Some(mix_amount)]);
        let mix = self.node(
            Interpolate,
            Rate::Audio,
            &[Some(osc_1), Some(osc_2), Some(clamped_mix)],
        );

        // Feedback comb, tuned like a third oscillator.
        let amount = self.mod_control("osc_feedback_amount", 0.0, Rate::Audio);
        let feedback_frequency = self.tuned_frequency(bent_midi, "osc_feedback", -12.0, 0.0);
        let period = self.node(Inverse, Rate::Audio, &[Some(feedback_frequency)]);
        let wet = self.constant(FEEDBACK_WET);
        let feedback = self.node(
            FeedbackDelay::new(MAX_FEEDBACK_SAMPLES),
            Rate::Audio,
            &[Some(mix), Some(wet), Some(period), Some(amount), None],
        );

        self.source("osc_1", osc_1);
        self.source("osc_2", osc_2);
        feedback
    }

    /// `midi + <prefix>_transpose + <prefix>_tune`, in Hz.
    fn tuned_frequency(&mut self, midi: OutputRef, prefix: &str, transpose: f32, tune: f32) -> OutputRef {
        let transpose = self.mod_control(&format!("{prefix}_transpose"), transpose, Rate::Audio);
        let tune = self.mod_control(&format!("{prefix}_tune"), tune, Rate::Audio);
        let transposed = self.node(Add, Rate::Audio, &[Some(midi), Some(transpose)]);
        let tuned = self.node(Add, Rate::Audio, &[Some(transposed), Some(tune)]);
        self.node(MidiScale, Rate::Audio, &[Some(tuned)])
    }

    fn modulators(&mut self, reset: OutputRef) {
        // LFO 1, shared by every voice.
        let lfo_1_waveform = self.control("lfo_1_waveform", Waveform::Sin.index() as f32);
        let lfo_1_frequency = self.global_mod_control("lfo_1_frequency", 2.0);
        let lfo_1 = self.globals.add(
            Lfo::new(),
            Rate::Control,
            &[Some(lfo_1_waveform), Some(lfo_1_frequency), None],
        );
        let lfo_1 = self.globals.output_ref(lfo_1);

        // LFO 2, restarted with each note.
        let lfo_2_waveform = self.control("lfo_2_waveform", Waveform::Sin.index() as f32);
        let lfo_2_frequency = self.mod_control("lfo_2_frequency", 2.0, Rate::Control);
        let lfo_2 = self.node(
            Lfo::new(),
            Rate::Control,
            &[Some(lfo_2_waveform), Some(lfo_2_frequency), Some(reset)],
        );

        // Step sequencer.
        let num_steps = self.control("num_steps", 16.0);
        let step_frequency = self.mod_control("step_frequency", 5.0, Rate::Control);
        let mut inputs = vec![Some(num_steps), Some(step_frequency), None];
        for step in 0..MAX_STEPS {
            inputs.push(Some(self.control(&format!("step_seq_{step:02}"), 0.0)));
        }
        let step_sequencer = self.node(StepSequencer::new(), Rate::Control, &inputs);

        self.source("lfo_1", lfo_1);
        self.source("lfo_2", lfo_2);
        self.source("step_sequencer", step_sequencer);
    }

    /// Returns the output of the formant stage.
    fn filter(
        &mut self,
        audio: OutputRef,
        note_from_center: OutputRef,
        reset: OutputRef,
        events: OutputRef,
    ) -> OutputRef {
        // Filter envelope: released by voice-off, restarted by note reset.
        let attack = self.mod_control("fil_attack", 0.01, Rate::Audio);
        let decay = self.mod_control("fil_decay", 0.3, Rate::Control);
        let sustain = self.mod_control("fil_sustain", 0.3, Rate::Audio);
        let release = self.mod_control("fil_release", 0.3, Rate::Control);

        let note_off = self.node(TriggerFilter::new(Event::VoiceOff), Rate::Control, &[Some(events)]);
        let trigger = self.node(TriggerCombiner::new(2), Rate::Control, &[Some(note_off), Some(reset)]);
        let filter_env = self.node(
            Envelope::new(),
            Rate::Audio,
            &[Some(attack), Some(decay), Some(sustain), Some(release), Some(trigger)],
        );

        let depth = self.mod_control("fil_env_depth", 48.0, Rate::Audio);
        let scaled_env = self.node(Multiply, Rate::Control, &[Some(filter_env), Some(depth)]);

        // Cutoff, in MIDI-note space until the last step.
        let filter_type = self.control("filter_type", FilterType::LowPass.index() as f32);
        let keytrack = self.mod_control("keytrack", 0.0, Rate::Audio);
        let current_keytrack = self.node(
            Multiply,
            Rate::Control,
            &[Some(note_from_center), Some(keytrack)],
        );

        let base_cutoff = self.smooth_control("cutoff", 80.0);
        let cutoff_mod = self.accumulator("cutoff", Rate::Control);
        let cutoff_range = self.constant(CUTOFF_MOD_RANGE);
        let cutoff_offset = self.node(Multiply, Rate::Control, &[Some(cutoff_mod), Some(cutoff_range)]);

        let keytracked = self.node(Add, Rate::Control, &[Some(base_cutoff), Some(current_keytrack)]);
        let enveloped = self.node(Add, Rate::Control, &[Some(keytracked), Some(scaled_env)]);
        let midi_cutoff = self.node(Add, Rate::Control, &[Some(enveloped), Some(cutoff_offset)]);
        let cutoff = self.node(MidiScale, Rate::Control, &[Some(midi_cutoff)]);

        // Resonance sets both the Q and the shelf gain.
        let resonance = self.mod_control("resonance", 0.5, Rate::Control);
        let q = self.node(ResonanceScale, Rate::Control, &[Some(resonance)]);
        let min_db = self.constant(MIN_GAIN_DB);
        let max_db = self.constant(MAX_GAIN_DB);
        let decibels = self.node(
            Interpolate,
            Rate::Control,
            &[Some(min_db), Some(max_db), Some(resonance)],
        );
        let gain = self.node(MagnitudeScale, Rate::Control, &[Some(decibels)]);

        // Drive into the filter.
        let saturation = self.mod_control("filter_saturation", 0.0, Rate::Audio);
        let saturation_magnitude = self.node(MagnitudeScale, Rate::Audio, &[Some(saturation)]);
        let saturated = self.node(Multiply, Rate::Audio, &[Some(audio), Some(saturation_magnitude)]);

        let filter = self.node(
            Filter::new(),
            Rate::Audio,
            &[
                Some(saturated),
                Some(filter_type),
                Some(reset),
                Some(cutoff),
                Some(q),
                Some(gain),
            ],
        );

        let distortion_type = self.constant(DistortionType::Tanh as u8 as f32);
        let threshold = self.constant(DISTORTION_THRESHOLD);
        let distorted = self.node(
            Distortion::new(),
            Rate::Audio,
            &[Some(filter), Some(distortion_type), Some(threshold)],
        );

        self.source("filter_env", filter_env);
        self.formant(distorted, reset)
    }

    fn formant(&mut self, audio: OutputRef, reset: OutputRef) -> OutputRef {
        let bypass = self.control("formant_bypass", 1.0);
        let passthrough = self.control("formant_passthrough", 0.0);
        let x = self.smooth_mod_control("formant_x", 0.0, Rate::Audio);
        let y = self.smooth_mod_control("formant_y", 0.0, Rate::Audio);

        let mut inputs = vec![Some(audio), Some(bypass), Some(passthrough), Some(reset)];
        for band in 0..NUM_FORMANTS {
            let corners = [
                TOP_LEFT_FORMANTS[band],
                TOP_RIGHT_FORMANTS[band],
                BOTTOM_LEFT_FORMANTS[band],
                BOTTOM_RIGHT_FORMANTS[band],
            ];
            inputs.push(Some(self.formant_parameter(corners.map(|c| c.gain), x, y)));
            inputs.push(Some(self.formant_parameter(corners.map(|c| c.resonance), x, y)));
            inputs.push(Some(self.formant_parameter(corners.map(|c| c.frequency), x, y)));
        }
        debug_assert_eq!(inputs.len(), FormantFilter::band_input(NUM_FORMANTS, 0));

        self.node(FormantFilter::new(), Rate::Audio, &inputs)
    }

    fn formant_parameter(&mut self, corners: [f32; 4], x: OutputRef, y: OutputRef) -> OutputRef {
        let [top_left, top_right, bottom_left, bottom_right] = corners.map(|c| Some(self.constant(c)));
        self.node(
            BilinearInterpolate,
            Rate::Control,
            &[top_left, top_right, bottom_left, bottom_right, Some(x), Some(y)],
        )
    }

    fn node<P: Processor + 'static>(&mut self, processor: P, rate: Rate, inputs: &[Option<OutputRef>]) -> OutputRef {
        let id = self.voice.add(processor, rate, inputs);
        self.voice.output_ref(id)
    }

    /// A fixed global value.
    fn constant(&mut self, value: f32) -> OutputRef {
        let id = self.globals.add(Value::new(value), Rate::Control, &[]);
        self.globals.output_ref(id)
    }

    fn control(&mut self, name: &str, value: f32) -> OutputRef {
        let id = self.globals.add(Value::new(value), Rate::Control, &[]);
        self.insert_control(name, Control::Plain(id));
        self.globals.output_ref(id)
    }

    fn smooth_control(&mut self, name: &str, value: f32) -> OutputRef {
        let id = self.globals.add(SmoothValue::new(value), Rate::Audio, &[]);
        self.insert_control(name, Control::Smooth(id));
        self.globals.output_ref(id)
    }

    fn insert_control(&mut self, name: &str, control: Control) {
        let previous = self.controls.insert(name.to_owned(), control);
        assert!(previous.is_none(), "control `{name}` is registered twice");
    }

    /// A control read through a per-voice accumulator registered as a
    /// modulation destination of the same name.
    fn mod_control(&mut self, name: &str, value: f32, rate: Rate) -> OutputRef {
        let base = self.control(name, value);
        self.seeded_accumulator(name, base, rate)
    }

    fn smooth_mod_control(&mut self, name: &str, value: f32, rate: Rate) -> OutputRef {
        let base = self.smooth_control(name, value);
        self.seeded_accumulator(name, base, rate)
    }

    /// Like `mod_control`, but the accumulator is shared by every voice.
    fn global_mod_control(&mut self, name: &str, value: f32) -> OutputRef {
        let base = self.control(name, value);
        let id = self.globals.add(VariableAdd::new(), Rate::Control, &[Some(base)]);
        let output = self.globals.output_ref(id);
        self.matrix.destinations.insert(name, output);
        output
    }

    fn seeded_accumulator(&mut self, name: &str, base: OutputRef, rate: Rate) -> OutputRef {
        let id = self.voice.add(VariableAdd::new(), rate, &[Some(base)]);
        let output = self.voice.output_ref(id);
        self.matrix.destinations.insert(name, output);
        output
    }

    /// A destination with no base value; it reads zero until connected.
    fn accumulator(&mut self, name: &str, rate: Rate) -> OutputRef {
        let id = self.voice.add(VariableAdd::new(), rate, &[]);
        let output = self.voice.output_ref(id);
        self.matrix.destinations.insert(name, output);
        output
    }

    fn source(&mut self, name: &str, output: OutputRef) {
        self.matrix.sources.insert(name, output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blueprint() -> Blueprint {
        VoiceBuilder::new(&SynthConfig::default()).build()
    }

    fn registered_names(blueprint: &Blueprint) -> (Vec<&str>, Vec<&str>) {
        (
            blueprint.matrix.sources.names().collect(),
            blueprint.matrix.destinations.names().collect(),
        )
    }

    #[test]
    fn registers_every_source() {
        let blueprint = blueprint();
        let (sources, _) = registered_names(&blueprint);
        for name in [
            "pitch_wheel",
            "mod_wheel",
            "lfo_1",
            "aftertouch",
            "lfo_2",
            "step_sequencer",
            "amplitude_env",
            "filter_env",
            "note",
            "velocity",
            "osc_1",
            "osc_2",
        ] {
            assert!(sources.contains(&name), "missing source {name}");
        }
        assert_eq!(sources.len(), 12);
    }

    #[test]
    fn registers_every_destination() {
        let blueprint = blueprint();
        let (_, destinations) = registered_names(&blueprint);
        for name in [
            "amp_attack",
            "amp_decay",
            "amp_sustain",
            "amp_release",
            "fil_attack",
            "fil_decay",
            "fil_sustain",
            "fil_release",
            "fil_env_depth",
            "osc_1_transpose",
            "osc_1_tune",
            "osc_2_transpose",
            "osc_2_tune",
            "cross_modulation",
            "osc_mix",
            "osc_feedback_transpose",
            "osc_feedback_tune",
            "osc_feedback_amount",
            "lfo_2_frequency",
            "step_frequency",
            "keytrack",
            "resonance",
            "filter_saturation",
            "formant_x",
            "formant_y",
            "velocity_track",
            "pitch",
            "cutoff",
            "osc_1_waveform",
            "osc_2_waveform",
            "lfo_1_frequency",
        ] {
            assert!(destinations.contains(&name), "missing destination {name}");
        }
        assert_eq!(destinations.len(), 31);
    }

    #[test]
    fn only_the_shared_lfo_rate_is_a_global_destination() {
        let blueprint = blueprint();
        let matrix = &blueprint.matrix;
        for name in matrix.destinations.names() {
            let id = matrix.destination_id(name).unwrap();
            let scope = matrix.destination_output(id).unwrap().scope;
            let expected = if name == "lfo_1_frequency" {
                Scope::Global
            } else {
                Scope::Voice
            };
            assert_eq!(scope, expected, "{name}");
        }
    }

    #[test]
    fn step_controls_are_zero_padded() {
        let blueprint = blueprint();
        assert!(blueprint.controls.contains_key("step_seq_00"));
        assert!(blueprint.controls.contains_key("step_seq_31"));
        assert!(!blueprint.controls.contains_key("step_seq_32"));
    }

    #[test]
    fn cutoff_control_is_smoothed() {
        let blueprint = blueprint();
        assert!(matches!(blueprint.controls.get("cutoff"), Some(Control::Smooth(_))));
        assert!(matches!(blueprint.controls.get("legato"), Some(Control::Plain(_))));
    }
}
