use crate::graph::arena::ProcessorGraph;
use crate::graph::envelope::Envelope;
use crate::graph::node::{Event, NodeId, Output};
use crate::graph::trigger::TriggerInput;
use crate::graph::value::Value;
use crate::synth::build::VoicePorts;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Silent, graph not evaluated
    Active,    // Note held
    Releasing, // Note released, amplitude envelope still sounding
}

/// One voice: a private copy of the voice graph plus its note state.
///
/// Notes go in through `note_on`/`note_off` and take effect at the start of
/// the next block. Once the amplitude envelope finishes the voice stops
/// evaluating its graph and reports silence until the next note-on.
#[derive(Clone)]
pub struct Voice {
    graph: ProcessorGraph,
    ports: VoicePorts,
    state: VoiceState,
    note: f32,
    velocity: f32,
    rendered: bool,
    finished: bool,
    samples: usize,
    silence: Vec<f32>,
}

impl Voice {
    pub(crate) fn new(graph: ProcessorGraph, ports: VoicePorts) -> Self {
        let silence = vec![0.0; graph.max_block_size()];
        Self {
            graph,
            ports,
            state: VoiceState::Free,
            note: 0.0,
            velocity: 0.0,
            rendered: false,
            finished: false,
            samples: 0,
            silence,
        }
    }

    /// Start `note` (a MIDI note number) at `velocity` in [0, 1].
    ///
    /// A voice that is still sounding is killed quickly first; the new note
    /// starts once the old one has faded out.
    pub fn note_on(&mut self, note: f32, velocity: f32) {
        self.note = note;
        self.velocity = velocity;
        self.state = VoiceState::Active;

        self.set_value(self.ports.note, note);
        self.set_value(self.ports.velocity, velocity);
        self.push_event(Event::VoiceOn);
    }

    pub fn note_off(&mut self) {
        if self.state == VoiceState::Active {
            self.state = VoiceState::Releasing;
            self.push_event(Event::VoiceOff);
        }
    }

    pub fn set_aftertouch(&mut self, value: f32) {
        self.set_value(self.ports.aftertouch, value);
    }

    /// Evaluate one block against the already processed global graph.
    pub(crate) fn process(&mut self, samples: usize, globals: &ProcessorGraph) {
        self.samples = samples;
        self.finished = false;
        self.rendered = self.state != VoiceState::Free;
        if !self.rendered {
            return;
        }

        self.graph.process(samples, Some(globals));

        let finished = self
            .graph
            .output(self.graph.output_ref_at(self.ports.amplitude_env, Envelope::FINISHED))
            .and_then(Output::pulse)
            .is_some();
        if finished {
            self.finished = true;
            self.state = VoiceState::Free;
        }
    }

    /// Audio of the last processed block.
    pub fn output(&self) -> &[f32] {
        let samples = self.samples;
        if !self.rendered {
            return &self.silence[..samples];
        }
        self.graph
            .output(self.graph.output_ref(self.ports.output))
            .map(|output| &output.buffer()[..samples])
            .unwrap_or(&self.silence[..samples])
    }

    /// Whether the voice finished during the last processed block.
    pub fn finished(&self) -> bool {
        self.finished
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn is_free(&self) -> bool {
        self.state == VoiceState::Free
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, VoiceState::Active | VoiceState::Releasing)
    }

    pub fn note(&self) -> f32 {
        self.note
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Current level of the amplitude envelope.
    pub fn envelope_level(&self) -> f32 {
        self.graph
            .processor::<Envelope>(self.ports.amplitude_env)
            .map_or(0.0, Envelope::level)
    }

    pub(crate) fn graph(&self) -> &ProcessorGraph {
        &self.graph
    }

    pub(crate) fn graph_mut(&mut self) -> &mut ProcessorGraph {
        &mut self.graph
    }

    fn set_value(&mut self, node: NodeId, value: f32) {
        if let Some(target) = self.graph.processor_mut::<Value>(node) {
            target.set(value);
        }
    }

    fn push_event(&mut self, event: Event) {
        if let Some(events) = self.graph.processor_mut::<TriggerInput>(self.ports.events) {
            events.push(0, event);
        }
    }
}
