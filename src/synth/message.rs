#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer, RingBuffer};

use crate::synth::matrix::{DestinationId, SourceId, ValueHandle};
#[cfg(feature = "rtrb")]
use crate::error::Error;

/// A structural change to the modulation matrix, applied between blocks.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ModulationCommand {
    Connect {
        source: SourceId,
        destination: DestinationId,
        scale: ValueHandle,
    },
    /// The scale identifies the connection; the destination must match it.
    Disconnect {
        destination: DestinationId,
        scale: ValueHandle,
    },
    SetScale {
        scale: ValueHandle,
        value: f32,
    },
    ReleaseScale(ValueHandle),
}

pub trait CommandReceiver {
    fn pop(&mut self) -> Option<ModulationCommand>;
}

#[cfg(feature = "rtrb")]
impl CommandReceiver for Consumer<ModulationCommand> {
    fn pop(&mut self) -> Option<ModulationCommand> {
        Consumer::pop(self).ok()
    }
}

/// Control-thread end of the modulation command queue.
///
/// Names are resolved to ids on the handler before sending, so draining
/// the queue never looks up a string. Connecting re-sorts each graph, which
/// takes scratch space proportional to its node count.
#[cfg(feature = "rtrb")]
pub struct ModulationSender {
    tx: Producer<ModulationCommand>,
}

#[cfg(feature = "rtrb")]
impl ModulationSender {
    pub(crate) fn channel(capacity: usize) -> (Self, Consumer<ModulationCommand>) {
        let (tx, rx) = RingBuffer::new(capacity);
        (Self { tx }, rx)
    }

    pub fn connect(
        &mut self,
        source: SourceId,
        destination: DestinationId,
        scale: ValueHandle,
    ) -> Result<(), Error> {
        self.send(ModulationCommand::Connect {
            source,
            destination,
            scale,
        })
    }

    pub fn disconnect(
        &mut self,
        destination: DestinationId,
        scale: ValueHandle,
    ) -> Result<(), Error> {
        self.send(ModulationCommand::Disconnect { destination, scale })
    }

    pub fn set_scale(&mut self, scale: ValueHandle, value: f32) -> Result<(), Error> {
        self.send(ModulationCommand::SetScale { scale, value })
    }

    pub fn release_scale(&mut self, scale: ValueHandle) -> Result<(), Error> {
        self.send(ModulationCommand::ReleaseScale(scale))
    }

    pub fn send(&mut self, command: ModulationCommand) -> Result<(), Error> {
        self.tx.push(command).map_err(|_| Error::QueueFull)
    }
}
