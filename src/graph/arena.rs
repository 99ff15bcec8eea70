use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::graph::node::{NodeId, Output, OutputRef, ProcessCtx, Processor, Rate, Scope};

/// One registered processor with its wiring and output buffers.
#[derive(Clone)]
pub(crate) struct Node {
    pub(crate) processor: Box<dyn Processor>,
    pub(crate) inputs: Vec<Option<OutputRef>>,
    pub(crate) outputs: Vec<Output>,
    pub(crate) rate: Rate,
}

/// Arena of processors evaluated in registration order until `sort`
/// reorders them by dependency.
///
/// A voice owns one of these for its private nodes; the handler owns one
/// more for the nodes every voice shares. Voice graphs may read global
/// outputs, never the other way around.
///
/// Removing a node frees its slot; the next node added reuses the most
/// recently freed slot. Two graphs that see the same sequence of `add`,
/// `remove` and `sort` calls therefore hand out the same ids and run them in
/// the same order.
#[derive(Clone)]
pub struct ProcessorGraph {
    scope: Scope,
    sample_rate: f32,
    max_block_size: usize,
    nodes: Vec<Option<Node>>,
    free: Vec<NodeId>,
    order: Vec<NodeId>,
    silence: Output,
}

impl ProcessorGraph {
    pub fn new(scope: Scope, sample_rate: f32, max_block_size: usize) -> Self {
        Self {
            scope,
            sample_rate,
            max_block_size,
            nodes: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
            silence: Output::new(Rate::Audio, max_block_size),
        }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Reserve room for `additional` more nodes without reallocating.
    pub fn reserve(&mut self, additional: usize) {
        self.nodes.reserve(additional);
        self.order.reserve(additional);
        self.free.reserve(additional);
    }

    /// Register `processor` after every node already in the graph.
    ///
    /// Panics if an input refers to a node that is not registered.
    pub fn add<P: Processor + 'static>(
        &mut self,
        processor: P,
        rate: Rate,
        inputs: &[Option<OutputRef>],
    ) -> NodeId {
        let id = self.allocate(Box::new(processor), rate, inputs);
        self.order.push(id);
        id
    }

    /// Unregister `id`, dropping its processor and buffers.
    ///
    /// Panics if the node is unknown or another node still reads it.
    pub fn remove(&mut self, id: NodeId) {
        let position = self.position(id);
        assert!(
            !self.nodes.iter().flatten().any(|node| {
                node.inputs
                    .iter()
                    .flatten()
                    .any(|source| source.scope == self.scope && source.node == id)
            }),
            "node {id:?} is still plugged into another node"
        );

        self.order.remove(position);
        self.nodes[id.index()] = None;
        self.free.push(id);
    }

    /// Append `source` to an accumulator's input list.
    pub fn plug_next(&mut self, node: NodeId, source: OutputRef) -> usize {
        self.check_source(source);
        let target = self.node_mut(node);
        assert!(
            target.processor.is_accumulator(),
            "node {node:?} does not take a variable number of inputs"
        );
        target.inputs.push(Some(source));
        target.inputs.len() - 1
    }

    /// Detach `source` from `node`. Accumulators drop the entry, fixed
    /// slots are left empty. Returns false if `source` was not plugged.
    pub fn unplug(&mut self, node: NodeId, source: OutputRef) -> bool {
        let target = self.node_mut(node);
        let Some(slot) = target.inputs.iter().position(|s| *s == Some(source)) else {
            return false;
        };

        if target.processor.is_accumulator() {
            target.inputs.remove(slot);
        } else {
            target.inputs[slot] = None;
        }
        true
    }

    /// Reference to output `index` of `node` in this graph.
    pub fn output_ref_at(&self, node: NodeId, index: usize) -> OutputRef {
        OutputRef {
            scope: self.scope,
            node,
            index,
        }
    }

    /// Reference to the first output of `node` in this graph.
    pub fn output_ref(&self, node: NodeId) -> OutputRef {
        self.output_ref_at(node, 0)
    }

    /// Output addressed by `source`, if it lives in this graph.
    pub fn output(&self, source: OutputRef) -> Option<&Output> {
        if source.scope != self.scope {
            return None;
        }
        self.nodes
            .get(source.node.index())?
            .as_ref()?
            .outputs
            .get(source.index)
    }

    pub fn rate(&self, node: NodeId) -> Rate {
        self.node(node).rate
    }

    pub fn processor<T: Processor + 'static>(&self, node: NodeId) -> Option<&T> {
        self.nodes
            .get(node.index())?
            .as_ref()?
            .processor
            .as_any()
            .downcast_ref::<T>()
    }

    pub fn processor_mut<T: Processor + 'static>(&mut self, node: NodeId) -> Option<&mut T> {
        self.nodes
            .get_mut(node.index())?
            .as_mut()?
            .processor
            .as_any_mut()
            .downcast_mut::<T>()
    }

    /// Whether `node` reads `on`, directly or through other nodes of this
    /// graph. Reads through a feedback node do not count.
    pub fn depends_on(&self, node: NodeId, on: NodeId) -> bool {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if id == on {
                return true;
            }
            if std::mem::replace(&mut visited[id.index()], true) {
                continue;
            }
            let current = self.node(id);
            if current.processor.is_feedback() {
                continue;
            }
            stack.extend(
                current
                    .inputs
                    .iter()
                    .flatten()
                    .filter(|source| source.scope == self.scope)
                    .map(|source| source.node),
            );
        }
        false
    }

    /// Reorder so every node runs after the nodes it reads, keeping the
    /// current order wherever the wiring allows. Feedback nodes run last and
    /// their readers are not held back by them.
    ///
    /// Panics if the wiring contains a cycle that no feedback node breaks.
    pub fn sort(&mut self) {
        let count = self.order.len();
        let mut position = vec![usize::MAX; self.nodes.len()];
        for (p, id) in self.order.iter().enumerate() {
            position[id.index()] = p;
        }

        let mut pending = vec![0usize; count];
        let mut readers: Vec<Vec<usize>> = vec![Vec::new(); count];
        let mut feedback = Vec::new();
        for (p, &id) in self.order.iter().enumerate() {
            let node = self.node(id);
            if node.processor.is_feedback() {
                feedback.push(id);
                continue;
            }
            for source in node.inputs.iter().flatten() {
                if source.scope != self.scope || self.node(source.node).processor.is_feedback() {
                    continue;
                }
                let q = position[source.node.index()];
                if q != p {
                    readers[q].push(p);
                    pending[p] += 1;
                }
            }
        }

        let mut ready: BinaryHeap<Reverse<usize>> = (0..count)
            .filter(|&p| pending[p] == 0 && !self.node(self.order[p]).processor.is_feedback())
            .map(Reverse)
            .collect();
        let mut sorted = Vec::with_capacity(count);
        while let Some(Reverse(p)) = ready.pop() {
            sorted.push(self.order[p]);
            for &reader in &readers[p] {
                pending[reader] -= 1;
                if pending[reader] == 0 {
                    ready.push(Reverse(reader));
                }
            }
        }

        if let Some(stuck) = (0..count).find(|&p| pending[p] > 0) {
            panic!(
                "processor graph has a cycle through node {:?}",
                self.order[stuck]
            );
        }
        sorted.extend(feedback);
        self.order = sorted;
    }

    /// Evaluate every node once, in order, for a block of `samples`.
    ///
    /// `shared` is the global graph voice nodes may read from; it must
    /// already have been processed for this block.
    pub fn process(&mut self, samples: usize, shared: Option<&ProcessorGraph>) {
        assert!(
            samples <= self.max_block_size,
            "block of {samples} samples exceeds max block size {}",
            self.max_block_size
        );

        for position in 0..self.order.len() {
            let id = self.order[position];
            let Some(mut node) = self.nodes[id.index()].take() else {
                continue;
            };

            for output in node.outputs.iter_mut() {
                output.clear_pulse();
            }

            {
                let ctx = ProcessCtx {
                    sample_rate: self.sample_rate,
                    samples,
                    inputs: &node.inputs,
                    local: &self.nodes,
                    local_scope: self.scope,
                    shared,
                    silence: &self.silence,
                };
                node.processor.process(&ctx, &mut node.outputs);
            }

            self.nodes[id.index()] = Some(node);
        }
    }

    fn allocate(
        &mut self,
        processor: Box<dyn Processor>,
        rate: Rate,
        inputs: &[Option<OutputRef>],
    ) -> NodeId {
        for source in inputs.iter().flatten() {
            self.check_source(*source);
        }

        let slots = processor.num_inputs();
        let mut wired = Vec::with_capacity(slots.max(inputs.len()));
        wired.extend_from_slice(inputs);
        if !processor.is_accumulator() {
            assert!(
                inputs.len() <= slots,
                "{} inputs given to a node with {slots} slots",
                inputs.len()
            );
            wired.resize(slots, None);
        }

        let outputs = (0..processor.num_outputs())
            .map(|_| Output::new(rate, self.max_block_size))
            .collect();

        let node = Node {
            processor,
            inputs: wired,
            outputs,
            rate,
        };

        match self.free.pop() {
            Some(id) => {
                self.nodes[id.index()] = Some(node);
                id
            }
            None => {
                let id = NodeId(self.nodes.len() as u32);
                self.nodes.push(Some(node));
                id
            }
        }
    }

    fn check_source(&self, source: OutputRef) {
        match (self.scope, source.scope) {
            (Scope::Global, Scope::Voice) => {
                panic!("global node cannot read voice output {source:?}")
            }
            (local, scope) if local == scope => {
                assert!(
                    self.output(source).is_some(),
                    "input {source:?} is not a registered output"
                );
            }
            _ => {}
        }
    }

    fn position(&self, id: NodeId) -> usize {
        self.order
            .iter()
            .position(|&n| n == id)
            .unwrap_or_else(|| panic!("node {id:?} is not registered"))
    }

    fn node(&self, id: NodeId) -> &Node {
        self.nodes
            .get(id.index())
            .and_then(Option::as_ref)
            .unwrap_or_else(|| panic!("node {id:?} is not registered"))
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("node {id:?} is not registered"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::amplify::Multiply;
    use crate::graph::delay::Feedback;
    use crate::graph::modulate::VariableAdd;
    use crate::graph::value::Value;

    fn graph() -> ProcessorGraph {
        ProcessorGraph::new(Scope::Voice, 48_000.0, 16)
    }

    #[test]
    fn evaluates_in_registration_order() {
        let mut graph = graph();
        let a = graph.add(Value::new(2.0), Rate::Control, &[]);
        let b = graph.add(Value::new(3.0), Rate::Control, &[]);
        let product = graph.add(
            Multiply,
            Rate::Control,
            &[Some(graph.output_ref(a)), Some(graph.output_ref(b))],
        );

        graph.process(16, None);

        let out = graph.output(graph.output_ref(product)).map(Output::value);
        assert_eq!(out, Some(6.0));
    }

    #[test]
    #[should_panic(expected = "not a registered output")]
    fn unregistered_input_is_fatal() {
        let mut graph = graph();
        let dangling = OutputRef {
            scope: Scope::Voice,
            node: NodeId(7),
            index: 0,
        };
        graph.add(Multiply, Rate::Control, &[Some(dangling), None]);
    }

    #[test]
    #[should_panic(expected = "global node cannot read voice output")]
    fn global_cannot_read_voice() {
        let mut globals = ProcessorGraph::new(Scope::Global, 48_000.0, 16);
        let voice_ref = OutputRef {
            scope: Scope::Voice,
            node: NodeId(0),
            index: 0,
        };
        globals.add(Multiply, Rate::Control, &[Some(voice_ref), None]);
    }

    #[test]
    fn freed_slots_are_reused_last_in_first_out() {
        let mut graph = graph();
        let _keep = graph.add(Value::new(0.0), Rate::Control, &[]);
        let first = graph.add(Value::new(0.0), Rate::Control, &[]);
        let second = graph.add(Value::new(0.0), Rate::Control, &[]);

        graph.remove(first);
        graph.remove(second);

        assert_eq!(graph.add(Value::new(0.0), Rate::Control, &[]), second);
        assert_eq!(graph.add(Value::new(0.0), Rate::Control, &[]), first);
    }

    #[test]
    fn sort_runs_late_sources_in_the_same_block() {
        let mut graph = graph();
        let base = graph.add(Value::new(1.0), Rate::Control, &[]);
        let sum = graph.add(VariableAdd::new(), Rate::Control, &[Some(graph.output_ref(base))]);
        let extra = graph.add(Value::new(0.5), Rate::Control, &[]);

        let scaled = graph.add(
            Multiply,
            Rate::Control,
            &[Some(graph.output_ref(extra)), Some(graph.output_ref(base))],
        );
        graph.plug_next(sum, graph.output_ref(scaled));
        graph.sort();
        graph.process(16, None);

        let total = graph.output(graph.output_ref(sum)).map(Output::value);
        assert_eq!(total, Some(1.5));

        assert!(graph.unplug(sum, graph.output_ref(scaled)));
        graph.remove(scaled);
        graph.process(16, None);

        let total = graph.output(graph.output_ref(sum)).map(Output::value);
        assert_eq!(total, Some(1.0));
    }

    #[test]
    fn sort_keeps_a_valid_order_untouched() {
        let mut graph = graph();
        let a = graph.add(Value::new(2.0), Rate::Control, &[]);
        let b = graph.add(Value::new(3.0), Rate::Control, &[]);
        let product = graph.add(
            Multiply,
            Rate::Control,
            &[Some(graph.output_ref(a)), Some(graph.output_ref(b))],
        );
        let before = graph.order.clone();
        graph.sort();
        assert_eq!(graph.order, before);
        assert_eq!(graph.order.last(), Some(&product));
    }

    #[test]
    fn dependencies_are_followed_transitively() {
        let mut graph = graph();
        let a = graph.add(Value::new(1.0), Rate::Control, &[]);
        let sum = graph.add(VariableAdd::new(), Rate::Control, &[Some(graph.output_ref(a))]);
        let product = graph.add(Multiply, Rate::Control, &[Some(graph.output_ref(sum)), None]);

        assert!(graph.depends_on(product, a));
        assert!(!graph.depends_on(a, product));

        let delayed = graph.add(Feedback, Rate::Control, &[Some(graph.output_ref(product))]);
        let reader = graph.add(Multiply, Rate::Control, &[Some(graph.output_ref(delayed)), None]);
        assert!(!graph.depends_on(reader, product), "feedback breaks the chain");
    }

    #[test]
    fn feedback_closes_a_loop_one_block_late() {
        let mut graph = graph();
        let one = graph.add(Value::new(1.0), Rate::Control, &[]);
        let sum = graph.add(VariableAdd::new(), Rate::Control, &[Some(graph.output_ref(one))]);
        let delayed = graph.add(Feedback, Rate::Control, &[Some(graph.output_ref(sum))]);
        graph.plug_next(sum, graph.output_ref(delayed));
        graph.sort();

        let mut totals = Vec::new();
        for _ in 0..3 {
            graph.process(16, None);
            totals.extend(graph.output(graph.output_ref(sum)).map(Output::value));
        }
        assert_eq!(totals, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    #[should_panic(expected = "has a cycle")]
    fn unbroken_cycles_are_fatal() {
        let mut graph = graph();
        let one = graph.add(Value::new(1.0), Rate::Control, &[]);
        let sum = graph.add(VariableAdd::new(), Rate::Control, &[Some(graph.output_ref(one))]);
        let echo = graph.add(Multiply, Rate::Control, &[Some(graph.output_ref(sum)), None]);
        graph.plug_next(sum, graph.output_ref(echo));
        graph.sort();
    }

    #[test]
    #[should_panic(expected = "still plugged")]
    fn removing_a_read_node_is_fatal() {
        let mut graph = graph();
        let a = graph.add(Value::new(1.0), Rate::Control, &[]);
        graph.add(Multiply, Rate::Control, &[Some(graph.output_ref(a)), None]);
        graph.remove(a);
    }

    #[test]
    #[should_panic(expected = "exceeds max block size")]
    fn oversized_block_is_fatal() {
        let mut graph = graph();
        graph.process(17, None);
    }
}
