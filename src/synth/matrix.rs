use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::Error;
use crate::graph::amplify::Multiply;
use crate::graph::arena::ProcessorGraph;
use crate::graph::delay::Feedback;
use crate::graph::node::{NodeId, OutputRef, Scope};
use crate::synth::voice::Voice;

/*
Modulation Matrix
=================

A connection routes one source, scaled by a live depth, into one
destination accumulator:

    source ──┐
             ├── Multiply ──► VariableAdd (destination) ──► parameter
    scale ───┘

The scale is a global `Value` created with `create_scale`; its handle is
the identity of the connection. Disconnecting names only the destination
and the scale.

Most destinations live in the voice graph and every voice gets its own
`Multiply`. A few (`lfo_1_frequency`) live in the global graph and are
wired once; only global sources may reach them.

After wiring, the graph is re-sorted so the source runs before the
accumulator and everything downstream of it, and the new term is summed in
the same block. If the source itself depends on the destination (an
oscillator modulating its own pitch) the loop is closed through a
`Feedback` node and the source is read one block late.

All voices are clones of one template and see the same sequence of adds,
removals and sorts, so the node ids allocated for a connection are the same
in every voice. The arena reuses freed ids last-in-first-out, which keeps
that true across any mix of connects and disconnects.
*/

/// A modulation source resolved from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub(crate) usize);

/// A modulation destination resolved from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DestinationId(pub(crate) usize);

/// A live depth value. Also identifies the connection it drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueHandle(pub(crate) NodeId);

/// Name → value table with stable indices.
#[derive(Debug, Clone)]
pub(crate) struct Registry<T> {
    index: HashMap<String, usize>,
    entries: Vec<(String, T)>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<T: Copy> Registry<T> {
    pub(crate) fn insert(&mut self, name: &str, value: T) -> usize {
        assert!(
            !self.index.contains_key(name),
            "`{name}` is registered twice"
        );
        let position = self.entries.len();
        self.index.insert(name.to_owned(), position);
        self.entries.push((name.to_owned(), value));
        position
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub(crate) fn get(&self, position: usize) -> Option<T> {
        self.entries.get(position).map(|(_, value)| *value)
    }

    pub(crate) fn name(&self, position: usize) -> Option<&str> {
        self.entries.get(position).map(|(name, _)| name.as_str())
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

/// Nodes one connection added to a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Wiring {
    multiply: NodeId,
    feedback: Option<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Connection {
    source: SourceId,
    destination: DestinationId,
    wiring: Wiring,
}

/// Sources, destinations and the live connections between them.
///
/// Both registries hold output references: a destination's `scope` says
/// which graph its accumulator lives in.
#[derive(Debug, Clone, Default)]
pub(crate) struct ModulationMatrix {
    pub(crate) sources: Registry<OutputRef>,
    pub(crate) destinations: Registry<OutputRef>,
    scales: HashSet<ValueHandle>,
    connections: HashMap<ValueHandle, Connection>,
}

impl ModulationMatrix {
    pub(crate) fn source_id(&self, name: &str) -> Result<SourceId, Error> {
        self.sources
            .position(name)
            .map(SourceId)
            .ok_or_else(|| Error::UnknownSource(name.to_owned()))
    }

    pub(crate) fn destination_id(&self, name: &str) -> Result<DestinationId, Error> {
        self.destinations
            .position(name)
            .map(DestinationId)
            .ok_or_else(|| Error::UnknownDestination(name.to_owned()))
    }

    pub(crate) fn source_output(&self, source: SourceId) -> Option<OutputRef> {
        self.sources.get(source.0)
    }

    pub(crate) fn destination_output(&self, destination: DestinationId) -> Option<OutputRef> {
        self.destinations.get(destination.0)
    }

    pub(crate) fn add_scale(&mut self, scale: ValueHandle) {
        self.scales.insert(scale);
    }

    pub(crate) fn has_scale(&self, scale: ValueHandle) -> bool {
        self.scales.contains(&scale)
    }

    /// Forget `scale`. The caller removes its node.
    pub(crate) fn remove_scale(&mut self, scale: ValueHandle) -> Result<(), Error> {
        if !self.has_scale(scale) {
            return Err(Error::UnknownScale(scale));
        }
        if self.connections.contains_key(&scale) {
            return Err(Error::ScaleInUse(scale));
        }
        self.scales.remove(&scale);
        Ok(())
    }

    pub(crate) fn num_connections(&self) -> usize {
        self.connections.len()
    }

    pub(crate) fn connect(
        &mut self,
        voices: &mut [Voice],
        globals: &mut ProcessorGraph,
        source: SourceId,
        destination: DestinationId,
        scale: ValueHandle,
    ) -> Result<(), Error> {
        let source_ref = self
            .source_output(source)
            .ok_or_else(|| Error::UnknownSource(format!("{source:?}")))?;
        let accumulator = self
            .destination_output(destination)
            .ok_or_else(|| Error::UnknownDestination(format!("{destination:?}")))?;
        if !self.has_scale(scale) {
            return Err(Error::UnknownScale(scale));
        }
        if self.connections.contains_key(&scale) {
            return Err(Error::ScaleInUse(scale));
        }

        let scale_ref = globals.output_ref(scale.0);
        let wiring = match accumulator.scope {
            Scope::Global => {
                if source_ref.scope == Scope::Voice {
                    return Err(Error::VoiceSourceToGlobal {
                        source: self.source_name(source),
                        destination: self.destination_name(destination),
                    });
                }
                wire(globals, source_ref, scale_ref, accumulator.node)
            }
            Scope::Voice => {
                let mut wiring = None;
                for voice in voices.iter_mut() {
                    let wired = wire(voice.graph_mut(), source_ref, scale_ref, accumulator.node);
                    match wiring {
                        None => wiring = Some(wired),
                        Some(first) => assert_eq!(
                            first, wired,
                            "voices diverged while connecting modulation"
                        ),
                    }
                }
                let Some(wiring) = wiring else {
                    return Ok(());
                };
                wiring
            }
        };

        self.connections.insert(
            scale,
            Connection {
                source,
                destination,
                wiring,
            },
        );

        debug!(
            source = self.sources.name(source.0),
            destination = self.destinations.name(destination.0),
            ?scale,
            delayed = wiring.feedback.is_some(),
            "modulation connected"
        );
        Ok(())
    }

    pub(crate) fn disconnect(
        &mut self,
        voices: &mut [Voice],
        globals: &mut ProcessorGraph,
        destination: DestinationId,
        scale: ValueHandle,
    ) -> Result<(), Error> {
        let accumulator = self
            .destination_output(destination)
            .ok_or_else(|| Error::UnknownDestination(format!("{destination:?}")))?;

        let connection = match self.connections.get(&scale) {
            Some(c) if c.destination == destination => *c,
            _ => {
                return Err(Error::UnknownConnection {
                    destination: self.destination_name(destination),
                    scale,
                })
            }
        };

        match accumulator.scope {
            Scope::Global => unwire(globals, accumulator.node, connection.wiring),
            Scope::Voice => {
                for voice in voices.iter_mut() {
                    unwire(voice.graph_mut(), accumulator.node, connection.wiring);
                }
            }
        }
        self.connections.remove(&scale);

        debug!(
            source = self.sources.name(connection.source.0),
            destination = self.destinations.name(destination.0),
            ?scale,
            "modulation disconnected"
        );
        Ok(())
    }

    fn source_name(&self, source: SourceId) -> String {
        self.sources.name(source.0).unwrap_or_default().to_owned()
    }

    fn destination_name(&self, destination: DestinationId) -> String {
        self.destinations
            .name(destination.0)
            .unwrap_or_default()
            .to_owned()
    }
}

/// Add `source × scale` to `accumulator` and restore evaluation order.
fn wire(
    graph: &mut ProcessorGraph,
    source: OutputRef,
    scale: OutputRef,
    accumulator: NodeId,
) -> Wiring {
    let feedback = (source.scope == graph.scope() && graph.depends_on(source.node, accumulator))
        .then(|| {
            let rate = graph.rate(source.node);
            graph.add(Feedback, rate, &[Some(source)])
        });
    let input = feedback.map_or(source, |id| graph.output_ref(id));

    let rate = graph.rate(accumulator);
    let multiply = graph.add(Multiply, rate, &[Some(input), Some(scale)]);
    graph.plug_next(accumulator, graph.output_ref(multiply));
    graph.sort();

    Wiring { multiply, feedback }
}

fn unwire(graph: &mut ProcessorGraph, accumulator: NodeId, wiring: Wiring) {
    let unplugged = graph.unplug(accumulator, graph.output_ref(wiring.multiply));
    assert!(unplugged, "modulation multiply missing from its destination");
    graph.remove(wiring.multiply);
    if let Some(feedback) = wiring.feedback {
        graph.remove(feedback);
    }
}
