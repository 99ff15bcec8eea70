use std::any::Any;

use crate::graph::arena::{Node, ProcessorGraph};

/// Stable index of a node inside one [`ProcessorGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Which arena an [`OutputRef`] points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Private to one voice.
    Voice,
    /// Shared by every voice, evaluated once per block.
    Global,
}

/// Address of one output of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputRef {
    pub scope: Scope,
    pub node: NodeId,
    pub index: usize,
}

/// Update rate of a node. Decides the length of its output buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rate {
    /// One value per sample.
    Audio,
    /// One value per block, held for every sample of it.
    Control,
}

/// Discrete event carried by a [`Pulse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    VoiceOn,
    VoiceOff,
    /// An envelope went silent and restarted its attack.
    Reset,
    /// An envelope finished its release.
    Finished,
    /// A glide should land on its target immediately.
    Jump,
}

/// A single-sample trigger at `offset` within the current block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse {
    pub offset: usize,
    pub event: Event,
}

/// Buffered signal produced by a node, plus at most one pulse per block.
#[derive(Debug, Clone)]
pub struct Output {
    buffer: Vec<f32>,
    pulse: Option<Pulse>,
}

impl Output {
    pub fn new(rate: Rate, max_block_size: usize) -> Self {
        let len = match rate {
            Rate::Audio => max_block_size,
            Rate::Control => 1,
        };
        Self {
            buffer: vec![0.0; len],
            pulse: None,
        }
    }

    /// Value at sample `i`. Control-rate outputs return their single value
    /// for every sample.
    #[inline]
    pub fn at(&self, i: usize) -> f32 {
        if self.buffer.len() == 1 {
            self.buffer[0]
        } else {
            self.buffer[i]
        }
    }

    /// First (for control-rate, only) value.
    #[inline]
    pub fn value(&self) -> f32 {
        self.buffer[0]
    }

    pub fn is_control_rate(&self) -> bool {
        self.buffer.len() == 1
    }

    /// Number of values to write for a block of `samples`.
    #[inline]
    pub fn active_len(&self, samples: usize) -> usize {
        self.buffer.len().min(samples)
    }

    #[inline]
    pub fn buffer(&self) -> &[f32] {
        &self.buffer
    }

    #[inline]
    pub fn buffer_mut(&mut self) -> &mut [f32] {
        &mut self.buffer
    }

    #[inline]
    pub fn set(&mut self, i: usize, value: f32) {
        self.buffer[i] = value;
    }

    pub fn fill(&mut self, value: f32) {
        self.buffer.fill(value);
    }

    #[inline]
    pub fn pulse(&self) -> Option<Pulse> {
        self.pulse
    }

    /// Fire `event` at `offset`. If a pulse already fired this block the
    /// earlier one is kept.
    #[inline]
    pub fn fire(&mut self, offset: usize, event: Event) {
        match self.pulse {
            Some(existing) if existing.offset <= offset => {}
            _ => self.pulse = Some(Pulse { offset, event }),
        }
    }

    #[inline]
    pub(crate) fn clear_pulse(&mut self) {
        self.pulse = None;
    }
}

/// Everything a processor can see while it runs: its inputs, the block
/// length and the sample rate.
pub struct ProcessCtx<'a> {
    pub sample_rate: f32,
    pub(crate) samples: usize,
    pub(crate) inputs: &'a [Option<OutputRef>],
    pub(crate) local: &'a [Option<Node>],
    pub(crate) local_scope: Scope,
    pub(crate) shared: Option<&'a ProcessorGraph>,
    pub(crate) silence: &'a Output,
}

impl<'a> ProcessCtx<'a> {
    /// Samples in the current block.
    #[inline]
    pub fn samples(&self) -> usize {
        self.samples
    }

    #[inline]
    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Output plugged into `slot`, or silence when the slot is empty.
    #[inline]
    pub fn input(&self, slot: usize) -> &'a Output {
        match self.inputs.get(slot).copied().flatten() {
            Some(source) => self.resolve(source),
            None => self.silence,
        }
    }

    #[inline]
    pub fn at(&self, slot: usize, i: usize) -> f32 {
        self.input(slot).at(i)
    }

    #[inline]
    pub fn value(&self, slot: usize) -> f32 {
        self.input(slot).value()
    }

    #[inline]
    pub fn pulse(&self, slot: usize) -> Option<Pulse> {
        self.input(slot).pulse()
    }

    /// Every plugged input, in slot order.
    pub fn plugged(&self) -> impl Iterator<Item = &'a Output> + '_ {
        self.inputs
            .iter()
            .flatten()
            .map(move |source| self.resolve(*source))
    }

    fn resolve(&self, source: OutputRef) -> &'a Output {
        let found = if source.scope == self.local_scope {
            self.local
                .get(source.node.index())
                .and_then(Option::as_ref)
                .and_then(|node| node.outputs.get(source.index))
        } else {
            self.shared.and_then(|graph| graph.output(source))
        };
        found.unwrap_or(self.silence)
    }
}

/// Clone and downcast support for boxed processors.
pub trait ProcessorBox {
    fn clone_box(&self) -> Box<dyn Processor>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Processor + Clone + 'static> ProcessorBox for T {
    fn clone_box(&self) -> Box<dyn Processor> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Core trait for graph nodes.
///
/// `process` runs once per block for every node regardless of rate. Audio-rate
/// nodes write `ctx.samples()` values, control-rate nodes write one. Pulses on
/// `outputs` have already been cleared when `process` is called.
pub trait Processor: ProcessorBox + Send {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]);

    /// Fixed input slot count. For accumulators, the number of inputs to
    /// reserve room for; the list itself starts with what it is built with.
    fn num_inputs(&self) -> usize;

    fn num_outputs(&self) -> usize {
        1
    }

    /// True for nodes whose inputs form a variable-length list.
    fn is_accumulator(&self) -> bool {
        false
    }

    /// True for nodes that hand their input to readers one block later.
    /// They run after every other node, so their readers never wait on them.
    fn is_feedback(&self) -> bool {
        false
    }
}

impl Clone for Box<dyn Processor> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
