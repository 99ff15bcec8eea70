//! Per-sample arithmetic and unit conversions.
//!
//! Every operator here works at either rate: it writes as many values as its
//! own output holds and reads its inputs at the same positions.

use crate::dsp::scale::{db_to_magnitude, midi_to_frequency, resonance_to_q};
use crate::graph::node::{Output, ProcessCtx, Processor};

/// Below this magnitude [`Inverse`] outputs zero instead of a huge value.
pub const MIN_INVERTIBLE: f32 = 1e-6;

#[inline]
fn map_input(ctx: &ProcessCtx, outputs: &mut [Output], f: impl Fn(f32) -> f32) {
    let input = ctx.input(0);
    let out = &mut outputs[0];
    for i in 0..out.active_len(ctx.samples()) {
        out.set(i, f(input.at(i)));
    }
}

/// Sum of two signals.
#[derive(Debug, Clone, Copy, Default)]
pub struct Add;

impl Processor for Add {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        let (left, right) = (ctx.input(0), ctx.input(1));
        let out = &mut outputs[0];
        for i in 0..out.active_len(ctx.samples()) {
            out.set(i, left.at(i) + right.at(i));
        }
    }

    fn num_inputs(&self) -> usize {
        2
    }
}

/// Limits a signal to `[min, max]`. NaN becomes `min`.
#[derive(Debug, Clone, Copy)]
pub struct Clamp {
    min: f32,
    max: f32,
}

impl Clamp {
    pub fn new(min: f32, max: f32) -> Self {
        assert!(min <= max, "clamp range is inverted: {min} > {max}");
        Self { min, max }
    }
}

impl Processor for Clamp {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        let (min, max) = (self.min, self.max);
        map_input(ctx, outputs, |x| if x.is_nan() { min } else { x.clamp(min, max) });
    }

    fn num_inputs(&self) -> usize {
        1
    }
}

/// `1 / x`, or zero when `x` is too close to zero to invert.
#[derive(Debug, Clone, Copy, Default)]
pub struct Inverse;

impl Processor for Inverse {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        map_input(ctx, outputs, |x| {
            if x.abs() < MIN_INVERTIBLE || !x.is_finite() {
                0.0
            } else {
                1.0 / x
            }
        });
    }

    fn num_inputs(&self) -> usize {
        1
    }
}

/// MIDI note number to Hz.
#[derive(Debug, Clone, Copy, Default)]
pub struct MidiScale;

impl Processor for MidiScale {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        map_input(ctx, outputs, midi_to_frequency);
    }

    fn num_inputs(&self) -> usize {
        1
    }
}

/// Decibels to linear magnitude.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagnitudeScale;

impl Processor for MagnitudeScale {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        map_input(ctx, outputs, db_to_magnitude);
    }

    fn num_inputs(&self) -> usize {
        1
    }
}

/// 0..1 resonance amount to filter Q.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResonanceScale;

impl Processor for ResonanceScale {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        map_input(ctx, outputs, resonance_to_q);
    }

    fn num_inputs(&self) -> usize {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::arena::ProcessorGraph;
    use crate::graph::node::{NodeId, Rate, Scope};
    use crate::graph::value::Value;

    fn run<P: Processor + 'static>(processor: P, input: f32) -> f32 {
        let mut graph = ProcessorGraph::new(Scope::Voice, 48_000.0, 4);
        let source = graph.add(Value::new(input), Rate::Control, &[]);
        let op: NodeId = graph.add(processor, Rate::Control, &[Some(graph.output_ref(source))]);
        graph.process(4, None);
        graph.output(graph.output_ref(op)).map(Output::value).unwrap_or(f32::NAN)
    }

    #[test]
    fn inverse_of_small_values_is_zero() {
        assert_eq!(run(Inverse, 0.0), 0.0);
        assert_eq!(run(Inverse, 1e-9), 0.0);
        assert!((run(Inverse, 4.0) - 0.25).abs() < 1e-7);
        assert!((run(Inverse, -2.0) + 0.5).abs() < 1e-7);
    }

    #[test]
    fn clamp_bounds_out_of_range_sums() {
        let clamp = Clamp::new(0.0, 1.0);
        assert_eq!(run(clamp, 1.7), 1.0);
        assert_eq!(run(clamp, -0.2), 0.0);
        assert_eq!(run(clamp, 0.4), 0.4);
        assert_eq!(run(clamp, f32::NAN), 0.0);
    }

    #[test]
    fn scales_convert_units() {
        assert!((run(MidiScale, 69.0) - 440.0).abs() < 1e-3);
        assert!((run(MagnitudeScale, 20.0) - 10.0).abs() < 1e-4);
        assert!(run(ResonanceScale, 1.0) > run(ResonanceScale, 0.0));
    }

    #[test]
    fn add_sums_two_inputs() {
        let mut graph = ProcessorGraph::new(Scope::Voice, 48_000.0, 4);
        let a = graph.add(Value::new(60.0), Rate::Control, &[]);
        let b = graph.add(Value::new(-64.0), Rate::Control, &[]);
        let sum = graph.add(
            Add,
            Rate::Control,
            &[Some(graph.output_ref(a)), Some(graph.output_ref(b))],
        );
        graph.process(4, None);
        assert_eq!(graph.output(graph.output_ref(sum)).map(Output::value), Some(-4.0));
    }
}
