use crate::graph::node::{Output, ProcessCtx, Processor};

/// Settable constant with no inputs. Used for every host control and for
/// fixed presets wired into the graph.
#[derive(Debug, Clone, Copy)]
pub struct Value {
    value: f32,
}

impl Value {
    pub fn new(value: f32) -> Self {
        Self { value }
    }

    pub fn get(&self) -> f32 {
        self.value
    }

    pub fn set(&mut self, value: f32) {
        self.value = value;
    }
}

impl Processor for Value {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        let out = &mut outputs[0];
        let n = out.active_len(ctx.samples());
        out.buffer_mut()[..n].fill(self.value);
    }

    fn num_inputs(&self) -> usize {
        0
    }
}

/// Time for a [`SmoothValue`] to cover ~63% of a jump.
pub const SMOOTHING_TIME: f32 = 0.02;

/// Settable target approached by a one-pole smoother, per sample.
///
/// The first block after construction starts at the target, so a freshly
/// built graph does not glide in from zero.
#[derive(Debug, Clone, Copy)]
pub struct SmoothValue {
    target: f32,
    current: f32,
}

impl SmoothValue {
    pub fn new(value: f32) -> Self {
        Self {
            target: value,
            current: value,
        }
    }

    pub fn get(&self) -> f32 {
        self.target
    }

    pub fn set(&mut self, value: f32) {
        self.target = value;
    }
}

impl Processor for SmoothValue {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        let coefficient = 1.0 - (-1.0 / (SMOOTHING_TIME * ctx.sample_rate)).exp();
        let out = &mut outputs[0];

        for i in 0..out.active_len(ctx.samples()) {
            self.current += (self.target - self.current) * coefficient;
            out.set(i, self.current);
        }
    }

    fn num_inputs(&self) -> usize {
        0
    }
}
