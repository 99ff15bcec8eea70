use std::fmt;

use crate::synth::matrix::ValueHandle;

/// Failures of host-facing lookups.
///
/// Wiring defects inside the voice builder are not represented here; those
/// panic. These variants cover names and handles arriving from outside (a
/// host, a UI, a queued command) that the caller may want to reject softly.
// `Display`/`Error` are implemented by hand: `thiserror` treats any field
// named `source` as the underlying error, which a `String` cannot be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    UnknownControl(String),
    UnknownSource(String),
    UnknownDestination(String),
    UnknownConnection {
        destination: String,
        scale: ValueHandle,
    },
    UnknownScale(ValueHandle),
    ScaleInUse(ValueHandle),
    VoiceSourceToGlobal { source: String, destination: String },
    QueueFull,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownControl(name) => write!(f, "unknown control `{name}`"),
            Error::UnknownSource(name) => write!(f, "unknown modulation source `{name}`"),
            Error::UnknownDestination(name) => {
                write!(f, "unknown modulation destination `{name}`")
            }
            Error::UnknownConnection { destination, scale } => write!(
                f,
                "no live connection into `{destination}` uses scale {scale:?}"
            ),
            Error::UnknownScale(scale) => {
                write!(f, "scale {scale:?} was not created by this voice handler")
            }
            Error::ScaleInUse(scale) => write!(f, "scale {scale:?} already drives a live connection"),
            Error::VoiceSourceToGlobal {
                source,
                destination,
            } => write!(
                f,
                "per-voice source `{source}` cannot drive global destination `{destination}`"
            ),
            Error::QueueFull => write!(f, "modulation command queue is full"),
        }
    }
}

impl std::error::Error for Error {}
