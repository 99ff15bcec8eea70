use crate::graph::node::{Output, ProcessCtx, Processor};
use crate::MAX_MODULATION_CONNECTIONS;

/*
Accumulator
===========

Every modulatable parameter is read from exactly one `VariableAdd`. Its
first input is the parameter's base value (the host control); every
modulation connection appends one more input, a `Multiply` of the source
by the connection's scale:

    base ──────────────────────────┐
    lfo_1 × scale_a ── Multiply ───┼──► VariableAdd ──► parameter
    velocity × scale_b ─ Multiply ─┘

Connections come and go while the voice runs, so the input list has no
fixed length. Its storage is reserved up front so connecting does not
allocate until the reserve is used up.
*/

/// Sum of a variable number of inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct VariableAdd;

impl VariableAdd {
    pub fn new() -> Self {
        Self
    }
}

impl Processor for VariableAdd {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        let out = &mut outputs[0];
        let n = out.active_len(ctx.samples());
        let sum = &mut out.buffer_mut()[..n];
        sum.fill(0.0);

        for input in ctx.plugged() {
            for (i, s) in sum.iter_mut().enumerate() {
                *s += input.at(i);
            }
        }
    }

    fn num_inputs(&self) -> usize {
        MAX_MODULATION_CONNECTIONS
    }

    fn is_accumulator(&self) -> bool {
        true
    }
}
