use crate::graph::node::{Event, Output, ProcessCtx, Processor, Pulse};

/*
Trigger Routing
===============

Voice events travel through the graph as pulses: at most one per output per
block, each tagged with an `Event` and the sample offset it happened at.
The nodes in this module never produce audio; they decide which pulses
reach which envelopes and latches.

The articulation chain of a voice:

    events ──► LegatoFilter ──RETRIGGER──► amplitude envelope
                    │                         │ RESET     │ FINISHED
                    │ REMAIN                  ▼           ▼
                    └──────────────────► TriggerCombiner (note change)
                                                │
                         ┌──────────────────────┼─────────────────┐
                         ▼                      ▼                 ▼
                  TriggerWait(note)   TriggerWait(velocity)   PortamentoFilter
                                                                  │ JUMP
                                                                  ▼
                                                             LinearSlope

Legato decides whether a new note restarts the envelope (retrigger) or
only moves the pitch (remain). Either way the note change reaches the
latches, so the oscillators pick up the new note exactly when the envelope
restarts, or immediately under legato.
*/

/// Entry point for externally supplied voice events.
///
/// `push` stores one event for the next block; it is fired at its offset when
/// the graph runs. A second push before the block runs replaces the first.
#[derive(Debug, Clone, Default)]
pub struct TriggerInput {
    pending: Option<Pulse>,
}

impl TriggerInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, offset: usize, event: Event) {
        self.pending = Some(Pulse { offset, event });
    }
}

impl Processor for TriggerInput {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        if let Some(pulse) = self.pending.take() {
            let offset = pulse.offset.min(ctx.samples().saturating_sub(1));
            outputs[0].fire(offset, pulse.event);
        }
    }

    fn num_inputs(&self) -> usize {
        0
    }
}

/// Passes only pulses carrying one kind of event.
#[derive(Debug, Clone, Copy)]
pub struct TriggerFilter {
    event: Event,
}

impl TriggerFilter {
    pub fn new(event: Event) -> Self {
        Self { event }
    }
}

impl Processor for TriggerFilter {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        if let Some(pulse) = ctx.pulse(0) {
            if pulse.event == self.event {
                outputs[0].fire(pulse.offset, pulse.event);
            }
        }
    }

    fn num_inputs(&self) -> usize {
        1
    }
}

/// Fires when any input fires. The earliest pulse wins.
#[derive(Debug, Clone, Copy)]
pub struct TriggerCombiner {
    inputs: usize,
}

impl TriggerCombiner {
    pub fn new(inputs: usize) -> Self {
        Self { inputs }
    }
}

impl Processor for TriggerCombiner {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        for slot in 0..self.inputs {
            if let Some(pulse) = ctx.pulse(slot) {
                outputs[0].fire(pulse.offset, pulse.event);
            }
        }
    }

    fn num_inputs(&self) -> usize {
        self.inputs
    }
}

/// Sample-and-hold: latches `WAIT` at the instant `TRIGGER` fires.
///
/// The latch is block-granular. `WAIT` is sampled at the pulse offset, but
/// the new value is output for the whole block, so samples before the
/// offset already carry it. Blocks are short enough that this lands within
/// a few milliseconds of the event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerWait {
    held: f32,
}

impl TriggerWait {
    pub const WAIT: usize = 0;
    pub const TRIGGER: usize = 1;

    pub fn new() -> Self {
        Self::default()
    }
}

impl Processor for TriggerWait {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        if let Some(pulse) = ctx.pulse(Self::TRIGGER) {
            self.held = ctx.at(Self::WAIT, pulse.offset);
        }
        outputs[0].fill(self.held);
    }

    fn num_inputs(&self) -> usize {
        2
    }
}

/// Splits voice events into envelope retriggers and legato note changes.
#[derive(Debug, Clone, Copy)]
pub struct LegatoFilter {
    last: Event,
}

impl Default for LegatoFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl LegatoFilter {
    pub const LEGATO: usize = 0;
    pub const TRIGGER: usize = 1;

    pub const RETRIGGER: usize = 0;
    pub const REMAIN: usize = 1;

    pub fn new() -> Self {
        Self {
            last: Event::VoiceOff,
        }
    }
}

impl Processor for LegatoFilter {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        let Some(pulse) = ctx.pulse(Self::TRIGGER) else {
            return;
        };

        let legato = ctx.value(Self::LEGATO) >= 0.5;
        if legato && pulse.event == Event::VoiceOn && self.last == Event::VoiceOn {
            outputs[Self::REMAIN].fire(pulse.offset, pulse.event);
        } else {
            outputs[Self::RETRIGGER].fire(pulse.offset, pulse.event);
        }
        self.last = pulse.event;
    }

    fn num_inputs(&self) -> usize {
        2
    }

    fn num_outputs(&self) -> usize {
        2
    }
}

/// How a new note reaches its pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortamentoType {
    /// Always jump.
    Off,
    /// Glide only when the previous note was still held.
    Auto,
    /// Always glide.
    On,
}

impl PortamentoType {
    pub fn from_value(value: f32) -> Self {
        match value.round() as i32 {
            i32::MIN..=0 => PortamentoType::Off,
            1 => PortamentoType::Auto,
            _ => PortamentoType::On,
        }
    }
}

/// Decides per note change whether the pitch glide jumps to its target.
#[derive(Debug, Clone, Copy)]
pub struct PortamentoFilter {
    last: Event,
    before_note: Event,
}

impl Default for PortamentoFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl PortamentoFilter {
    pub const PORTAMENTO_TYPE: usize = 0;
    pub const FREQUENCY_TRIGGER: usize = 1;
    pub const VOICE_TRIGGER: usize = 2;

    pub fn new() -> Self {
        Self {
            last: Event::VoiceOff,
            before_note: Event::VoiceOff,
        }
    }
}

impl Processor for PortamentoFilter {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        if let Some(pulse) = ctx.pulse(Self::VOICE_TRIGGER) {
            if pulse.event == Event::VoiceOn {
                self.before_note = self.last;
            }
            self.last = pulse.event;
        }

        let Some(pulse) = ctx.pulse(Self::FREQUENCY_TRIGGER) else {
            return;
        };

        let jump = match PortamentoType::from_value(ctx.value(Self::PORTAMENTO_TYPE)) {
            PortamentoType::Off => true,
            PortamentoType::Auto => self.before_note == Event::VoiceOff,
            PortamentoType::On => false,
        };
        if jump {
            outputs[0].fire(pulse.offset, Event::Jump);
        }
    }

    fn num_inputs(&self) -> usize {
        3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::arena::ProcessorGraph;
    use crate::graph::node::{NodeId, Rate, Scope};
    use crate::graph::value::Value;

    struct Rig {
        graph: ProcessorGraph,
        events: NodeId,
        legato: NodeId,
        filter: NodeId,
    }

    impl Rig {
        fn new(legato: bool) -> Self {
            let mut graph = ProcessorGraph::new(Scope::Voice, 48_000.0, 32);
            let events = graph.add(TriggerInput::new(), Rate::Control, &[]);
            let legato_value = graph.add(Value::new(legato as u8 as f32), Rate::Control, &[]);
            let filter = graph.add(
                LegatoFilter::new(),
                Rate::Control,
                &[
                    Some(graph.output_ref(legato_value)),
                    Some(graph.output_ref(events)),
                ],
            );
            Self {
                graph,
                events,
                legato: legato_value,
                filter,
            }
        }

        fn send(&mut self, event: Event) -> (Option<Pulse>, Option<Pulse>) {
            if let Some(input) = self.graph.processor_mut::<TriggerInput>(self.events) {
                input.push(3, event);
            }
            self.graph.process(32, None);
            let retrigger = self
                .graph
                .output(self.graph.output_ref_at(self.filter, LegatoFilter::RETRIGGER))
                .and_then(Output::pulse);
            let remain = self
                .graph
                .output(self.graph.output_ref_at(self.filter, LegatoFilter::REMAIN))
                .and_then(Output::pulse);
            (retrigger, remain)
        }
    }

    #[test]
    fn without_legato_every_event_retriggers() {
        let mut rig = Rig::new(false);

        for event in [Event::VoiceOn, Event::VoiceOn, Event::VoiceOff, Event::VoiceOn] {
            let (retrigger, remain) = rig.send(event);
            assert_eq!(retrigger, Some(Pulse { offset: 3, event }));
            assert_eq!(remain, None);
        }
    }

    #[test]
    fn legato_note_change_remains() {
        let mut rig = Rig::new(true);

        let (retrigger, remain) = rig.send(Event::VoiceOn);
        assert!(retrigger.is_some() && remain.is_none(), "first note always retriggers");

        let (retrigger, remain) = rig.send(Event::VoiceOn);
        assert!(retrigger.is_none(), "held note should not retrigger under legato");
        assert_eq!(remain.map(|p| p.event), Some(Event::VoiceOn));

        let (retrigger, _) = rig.send(Event::VoiceOff);
        assert_eq!(retrigger.map(|p| p.event), Some(Event::VoiceOff));
    }

    #[test]
    fn legato_switch_is_read_live() {
        let mut rig = Rig::new(true);
        rig.send(Event::VoiceOn);

        if let Some(value) = rig.graph.processor_mut::<Value>(rig.legato) {
            value.set(0.0);
        }
        let (retrigger, remain) = rig.send(Event::VoiceOn);
        assert!(retrigger.is_some() && remain.is_none());
    }

    #[test]
    fn quiet_block_fires_nothing() {
        let mut rig = Rig::new(false);
        rig.send(Event::VoiceOn);
        rig.graph.process(32, None);
        let retrigger = rig
            .graph
            .output(rig.graph.output_ref(rig.filter))
            .and_then(Output::pulse);
        assert_eq!(retrigger, None);
    }

    #[test]
    fn wait_latches_at_trigger_only() {
        let mut graph = ProcessorGraph::new(Scope::Voice, 48_000.0, 8);
        let note = graph.add(Value::new(60.0), Rate::Control, &[]);
        let events = graph.add(TriggerInput::new(), Rate::Control, &[]);
        let latch = graph.add(
            TriggerWait::new(),
            Rate::Control,
            &[Some(graph.output_ref(note)), Some(graph.output_ref(events))],
        );
        let read = |graph: &ProcessorGraph| graph.output(graph.output_ref(latch)).map(Output::value);

        graph.process(8, None);
        assert_eq!(read(&graph), Some(0.0));

        if let Some(input) = graph.processor_mut::<TriggerInput>(events) {
            input.push(0, Event::VoiceOn);
        }
        graph.process(8, None);
        assert_eq!(read(&graph), Some(60.0));

        if let Some(value) = graph.processor_mut::<Value>(note) {
            value.set(72.0);
        }
        graph.process(8, None);
        assert_eq!(read(&graph), Some(60.0), "held until the next trigger");
    }

    #[test]
    fn latch_holds_for_the_whole_block() {
        let mut graph = ProcessorGraph::new(Scope::Voice, 48_000.0, 8);
        let ramp = graph.add(Value::new(0.0), Rate::Audio, &[]);
        let events = graph.add(TriggerInput::new(), Rate::Control, &[]);
        let latch = graph.add(
            TriggerWait::new(),
            Rate::Audio,
            &[Some(graph.output_ref(ramp)), Some(graph.output_ref(events))],
        );

        if let Some(value) = graph.processor_mut::<Value>(ramp) {
            value.set(5.0);
        }
        if let Some(input) = graph.processor_mut::<TriggerInput>(events) {
            input.push(5, Event::VoiceOn);
        }
        graph.process(8, None);

        let held = graph.output(graph.output_ref(latch)).map(|o| o.buffer().to_vec());
        assert_eq!(held, Some(vec![5.0; 8]));
    }

    #[test]
    fn combiner_and_filter_route_events() {
        let mut graph = ProcessorGraph::new(Scope::Voice, 48_000.0, 8);
        let a = graph.add(TriggerInput::new(), Rate::Control, &[]);
        let b = graph.add(TriggerInput::new(), Rate::Control, &[]);
        let any = graph.add(
            TriggerCombiner::new(2),
            Rate::Control,
            &[Some(graph.output_ref(a)), Some(graph.output_ref(b))],
        );
        let offs = graph.add(
            TriggerFilter::new(Event::VoiceOff),
            Rate::Control,
            &[Some(graph.output_ref(any))],
        );

        if let Some(input) = graph.processor_mut::<TriggerInput>(a) {
            input.push(5, Event::VoiceOn);
        }
        if let Some(input) = graph.processor_mut::<TriggerInput>(b) {
            input.push(2, Event::VoiceOff);
        }
        graph.process(8, None);

        let combined = graph.output(graph.output_ref(any)).and_then(Output::pulse);
        assert_eq!(
            combined,
            Some(Pulse {
                offset: 2,
                event: Event::VoiceOff
            })
        );
        let filtered = graph.output(graph.output_ref(offs)).and_then(Output::pulse);
        assert_eq!(filtered.map(|p| p.event), Some(Event::VoiceOff));
    }

    fn portamento_jumps(portamento_type: f32, events: &[(Event, bool)]) -> Vec<bool> {
        let mut graph = ProcessorGraph::new(Scope::Voice, 48_000.0, 8);
        let kind = graph.add(Value::new(portamento_type), Rate::Control, &[]);
        let voice = graph.add(TriggerInput::new(), Rate::Control, &[]);
        let note_change = graph.add(TriggerInput::new(), Rate::Control, &[]);
        let filter = graph.add(
            PortamentoFilter::new(),
            Rate::Control,
            &[
                Some(graph.output_ref(kind)),
                Some(graph.output_ref(note_change)),
                Some(graph.output_ref(voice)),
            ],
        );

        let mut jumps = Vec::new();
        for &(event, changes_note) in events {
            if let Some(input) = graph.processor_mut::<TriggerInput>(voice) {
                input.push(0, event);
            }
            if changes_note {
                if let Some(input) = graph.processor_mut::<TriggerInput>(note_change) {
                    input.push(0, Event::Reset);
                }
            }
            graph.process(8, None);
            if changes_note {
                let pulse = graph.output(graph.output_ref(filter)).and_then(Output::pulse);
                jumps.push(pulse.map(|p| p.event) == Some(Event::Jump));
            }
        }
        jumps
    }

    #[test]
    fn portamento_modes_decide_jumps() {
        let overlapping = [
            (Event::VoiceOn, true),
            (Event::VoiceOn, true),
            (Event::VoiceOff, false),
            (Event::VoiceOn, true),
        ];

        assert_eq!(portamento_jumps(0.0, &overlapping), vec![true, true, true]);
        assert_eq!(portamento_jumps(1.0, &overlapping), vec![true, false, true]);
        assert_eq!(portamento_jumps(2.0, &overlapping), vec![false, false, false]);
    }
}
