use crate::dsp::mix::interpolate;
use crate::graph::node::{Output, ProcessCtx, Processor};

/// Linear glide toward `TARGET`, taking `RUN_SECONDS` from wherever it was
/// when the target last changed. A pulse on `JUMP` lands on the target at
/// that sample. The very first sample starts on the target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearSlope {
    current: f32,
    start: f32,
    goal: f32,
    progress: f32,
    primed: bool,
}

impl LinearSlope {
    pub const TARGET: usize = 0;
    pub const RUN_SECONDS: usize = 1;
    pub const JUMP: usize = 2;

    pub fn new() -> Self {
        Self::default()
    }

    fn land(&mut self, target: f32) {
        self.current = target;
        self.start = target;
        self.goal = target;
        self.progress = 1.0;
    }
}

impl Processor for LinearSlope {
    fn process(&mut self, ctx: &ProcessCtx, outputs: &mut [Output]) {
        let target = ctx.input(Self::TARGET);
        let run_seconds = ctx.input(Self::RUN_SECONDS);
        let jump_at = ctx.pulse(Self::JUMP).map(|pulse| pulse.offset);
        let out = &mut outputs[0];

        for i in 0..out.active_len(ctx.samples()) {
            let goal = target.at(i);

            if !self.primed || jump_at == Some(i) {
                self.primed = true;
                self.land(goal);
            } else {
                if goal != self.goal {
                    self.start = self.current;
                    self.goal = goal;
                    self.progress = 0.0;
                }

                let run_samples = run_seconds.at(i) * ctx.sample_rate;
                if run_samples <= 1.0 || !run_samples.is_finite() {
                    self.land(goal);
                } else if self.progress < 1.0 {
                    self.progress = (self.progress + 1.0 / run_samples).min(1.0);
                    self.current = interpolate(self.start, self.goal, self.progress);
                }
            }

            out.set(i, self.current);
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
    use crate::graph::node::{Event, NodeId, Rate, Scope};
    use crate::graph::trigger::TriggerInput;
    use crate::graph::value::Value;

    struct Rig {
        graph: ProcessorGraph,
        target: NodeId,
        jump: NodeId,
        slope: NodeId,
    }

    fn rig(run_seconds: f32) -> Rig {
        let mut graph = ProcessorGraph::new(Scope::Voice, 1_000.0, 10);
        let target = graph.add(Value::new(60.0), Rate::Control, &[]);
        let run = graph.add(Value::new(run_seconds), Rate::Control, &[]);
        let jump = graph.add(TriggerInput::new(), Rate::Control, &[]);
        let slope = graph.add(
            LinearSlope::new(),
            Rate::Audio,
            &[
                Some(graph.output_ref(target)),
                Some(graph.output_ref(run)),
                Some(graph.output_ref(jump)),
            ],
        );
        Rig {
            graph,
            target,
            jump,
            slope,
        }
    }

    fn block(rig: &mut Rig) -> Vec<f32> {
        rig.graph.process(10, None);
        rig.graph
            .output(rig.graph.output_ref(rig.slope))
            .map(|o| o.buffer().to_vec())
            .unwrap_or_default()
    }

    #[test]
    fn starts_on_target() {
        let mut rig = rig(0.01);
        assert_eq!(block(&mut rig), vec![60.0; 10]);
    }

    #[test]
    fn glides_linearly_over_run_time() {
        let mut rig = rig(0.01);
        block(&mut rig);

        if let Some(target) = rig.graph.processor_mut::<Value>(rig.target) {
            target.set(70.0);
        }
        let glide = block(&mut rig);

        assert!((glide[0] - 61.0).abs() < 1e-4);
        assert!((glide[4] - 65.0).abs() < 1e-4);
        assert!((glide[9] - 70.0).abs() < 1e-4);
    }

    #[test]
    fn jump_lands_immediately() {
        let mut rig = rig(1.0);
        block(&mut rig);

        if let Some(target) = rig.graph.processor_mut::<Value>(rig.target) {
            target.set(48.0);
        }
        if let Some(jump) = rig.graph.processor_mut::<TriggerInput>(rig.jump) {
            jump.push(0, Event::Jump);
        }

        assert_eq!(block(&mut rig), vec![48.0; 10]);
    }
}
