use crate::dsp::filter::{Coefficients, FilterType, SVFilter};
use crate::graph::node::{Output, ProcessCtx, Processor};
use crate::NUM_FORMANTS;

/*
Formant Filter
==============

A bank of parallel band-pass filters, one per formant. Vowels are mostly
told apart by where their first few resonances sit, so moving the band
frequencies together sweeps between vowel-like timbres.

    audio ──┬──────────────────────────── × PASSTHROUGH ──┐
            ├── band 0 (freq, Q) ── × gain 0 ─────────────┤
            ├── band 1 (freq, Q) ── × gain 1 ─────────────┼──► out
            ├── band 2 (freq, Q) ── × gain 2 ─────────────┤
            └── band 3 (freq, Q) ── × gain 3 ─────────────┘

With BYPASS on (>= 0.5) the input is copied through untouched and the bands
are not run, so the rest of the voice always sees a single audio output.

Each band's gain, Q and frequency arrive as inputs. The voice feeds them
from bilinear blends of four corner presets, positioned by formant_x and
formant_y.
*/

#[derive(Debug, Clone, Default)]
pub struct FormantFilter {
    bands: [SVFilter; NUM_FORMANTS],
}

impl FormantFilter {
    pub const AUDIO: usize = 0;
    pub const BYPASS: usize = 1;
    pub const PASSTHROUGH: usize = 2;
    pub const RESET: usize = 3;
    /// First band parameter slot; band `b` uses `BANDS + 3 * b` onward.
    pub const BANDS: usize = 4;

    pub const GAIN: usize = 0;
    pub const RESONANCE: usize = 1;
    pub const FREQUENCY: usize = 2;

    pub fn new() -> Self {
        Self::default()
    }

    /// Input slot of `parameter` (GAIN, RESONANCE or FREQUENCY) of `band`.
    pub const fn band_input(band: usize, parameter: usize) -> usize {
        Self::BANDS + 3 * band + parameter
    }
}

impl Processor for FormantFilter {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        let audio = ctx.input(Self::AUDIO);
        let out = &mut outputs[0];
        let n = out.active_len(ctx.samples());

        if ctx.value(Self::BYPASS) >= 0.5 {
            for i in 0..n {
                out.set(i, audio.at(i));
            }
            return;
        }

        let mut gains = [0.0; NUM_FORMANTS];
        for (band, filter) in self.bands.iter_mut().enumerate() {
            gains[band] = ctx.value(Self::band_input(band, Self::GAIN));
            filter.set_coefficients(Coefficients::new(
                FilterType::BandPass,
                ctx.value(Self::band_input(band, Self::FREQUENCY)),
                ctx.value(Self::band_input(band, Self::RESONANCE)),
                1.0,
                ctx.sample_rate,
            ));
        }

        let passthrough = ctx.input(Self::PASSTHROUGH);
        let reset_at = ctx.pulse(Self::RESET).map(|pulse| pulse.offset);

        for i in 0..n {
            if reset_at == Some(i) {
                self.bands.iter_mut().for_each(SVFilter::reset);
            }

            let input = audio.at(i);
            let mut sum = passthrough.at(i) * input;
            for (filter, gain) in self.bands.iter_mut().zip(gains) {
                sum += gain * filter.tick(input);
            }
            out.set(i, sum);
        }
    }

    fn num_inputs(&self) -> usize {
        Self::BANDS + 3 * NUM_FORMANTS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::Waveform;
    use crate::graph::arena::ProcessorGraph;
    use crate::graph::node::{NodeId, OutputRef, Rate, Scope};
    use crate::graph::oscillator::OscillatorPair;
    use crate::graph::value::Value;

    fn constant(graph: &mut ProcessorGraph, value: f32) -> Option<OutputRef> {
        let id = graph.add(Value::new(value), Rate::Control, &[]);
        Some(graph.output_ref(id))
    }

    fn rig(bypass: f32, passthrough: f32, band_gain: f32) -> (ProcessorGraph, NodeId, NodeId) {
        let mut graph = ProcessorGraph::new(Scope::Voice, 48_000.0, 128);
        let osc_inputs = [
            constant(&mut graph, Waveform::Sin.index() as f32),
            constant(&mut graph, 700.0),
            None,
            None,
            None,
            None,
            None,
        ];
        let osc = graph.add(OscillatorPair::new(), Rate::Audio, &osc_inputs);

        let mut inputs = vec![
            Some(graph.output_ref(osc)),
            constant(&mut graph, bypass),
            constant(&mut graph, passthrough),
            None,
        ];
        for band in 0..NUM_FORMANTS {
            inputs.push(constant(&mut graph, band_gain));
            inputs.push(constant(&mut graph, 4.0));
            inputs.push(constant(&mut graph, 700.0 * (band + 1) as f32));
        }
        let formant = graph.add(FormantFilter::new(), Rate::Audio, &inputs);
        (graph, osc, formant)
    }

    fn buffer(graph: &ProcessorGraph, node: NodeId) -> Vec<f32> {
        graph
            .output(graph.output_ref(node))
            .map(|o| o.buffer().to_vec())
            .unwrap_or_default()
    }

    #[test]
    fn bypass_copies_input() {
        let (mut graph, osc, formant) = rig(1.0, 0.0, 1.0);
        graph.process(128, None);
        assert_eq!(buffer(&graph, formant), buffer(&graph, osc));
    }

    #[test]
    fn passthrough_alone_scales_input() {
        let (mut graph, osc, formant) = rig(0.0, 0.5, 0.0);
        graph.process(128, None);

        let dry = buffer(&graph, osc);
        let wet = buffer(&graph, formant);
        for (d, w) in dry.iter().zip(&wet) {
            assert!((w - 0.5 * d).abs() < 1e-6);
        }
    }

    #[test]
    fn band_at_tone_resonates() {
        let (mut graph, _, formant) = rig(0.0, 0.0, 1.0);
        let mut peak = 0.0f32;
        for _ in 0..32 {
            graph.process(128, None);
            peak = buffer(&graph, formant).iter().fold(peak, |acc, x| acc.max(x.abs()));
        }
        // the first band sits on the tone at unity gain
        assert!(peak > 0.8 && peak.is_finite(), "got {peak}");
    }
}
