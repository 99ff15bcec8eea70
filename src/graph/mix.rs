use crate::dsp::mix::{bilinear, clamp_fraction, interpolate};
use crate::graph::node::{Output, ProcessCtx, Processor};

/*
Interpolation Nodes
===================

`Interpolate` crossfades two signals by a fraction. The fraction normally
comes out of a modulation accumulator, so it can be anywhere; it is clamped
to [0, 1] here so the blend never extrapolates past either end:

    fraction = 0.0  →  FROM only
    fraction = 1.0  →  TO only

`BilinearInterpolate` blends four corner values at a 2D position (x, y),
each in [-1, 1]. The formant stage builds one per band parameter, with the
corners wired to fixed preset values. See `dsp/mix.rs` for the math.
*/

/// Linear crossfade from `FROM` to `TO`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interpolate;

impl Interpolate {
    pub const FROM: usize = 0;
    pub const TO: usize = 1;
    pub const FRACTION: usize = 2;
}

impl Processor for Interpolate {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        let from = ctx.input(Self::FROM);
        let to = ctx.input(Self::TO);
        let fraction = ctx.input(Self::FRACTION);
        let out = &mut outputs[0];

        for i in 0..out.active_len(ctx.samples()) {
            let t = clamp_fraction(fraction.at(i));
            out.set(i, interpolate(from.at(i), to.at(i), t));
        }
    }

    fn num_inputs(&self) -> usize {
        3
    }
}

/// Blend of four corners at position (`X`, `Y`).
#[derive(Debug, Clone, Copy, Default)]
pub struct BilinearInterpolate;

impl BilinearInterpolate {
    pub const TOP_LEFT: usize = 0;
    pub const TOP_RIGHT: usize = 1;
    pub const BOTTOM_LEFT: usize = 2;
    pub const BOTTOM_RIGHT: usize = 3;
    pub const X: usize = 4;
    pub const Y: usize = 5;
}

impl Processor for BilinearInterpolate {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        let out = &mut outputs[0];

        for i in 0..out.active_len(ctx.samples()) {
            let value = bilinear(
                ctx.at(Self::TOP_LEFT, i),
                ctx.at(Self::TOP_RIGHT, i),
                ctx.at(Self::BOTTOM_LEFT, i),
                ctx.at(Self::BOTTOM_RIGHT, i),
                ctx.at(Self::X, i),
                ctx.at(Self::Y, i),
            );
            out.set(i, value);
        }
    }

    fn num_inputs(&self) -> usize {
        6
    }
}
