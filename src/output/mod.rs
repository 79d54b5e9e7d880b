//! Outbound control signals
//!
//! [`SignalRouter`] turns realized note events into [`Signal`]s and hands
//! them to an [`EventSink`], which republishes them to whatever drives the
//! lights.

mod router;
mod sinks;

pub use router::SignalRouter;
pub use sinks::{ChannelSink, ConsoleSink};

use std::fmt;
use std::sync::Arc;

/// A control signal for the external transport
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// Plain on/off channel switched on
    NoteOn { name: String, number: u8 },
    /// Dimmer cue lasting `length_ms`, covering `name` plus every channel in `same_notes`
    DimmerOn {
        name: String,
        number: u8,
        length_ms: Option<u64>,
        same_notes: Vec<String>,
        auto_off: bool,
    },
    NoteOff { name: String, number: u8 },
    StreamLoaded,
    StreamEnded,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::NoteOn { name, number } => write!(f, "NoteOn {} ({})", name, number),
            Signal::DimmerOn {
                name,
                number,
                length_ms,
                same_notes,
                auto_off,
            } => {
                write!(f, "NoteOn {} ({})", name, number)?;
                match length_ms {
                    Some(length) => write!(f, " length={}ms", length)?,
                    None => write!(f, " length=?")?,
                }
                if !same_notes.is_empty() {
                    write!(f, " with [{}]", same_notes.join(", "))?;
                }
                write!(f, " autoOff={}", u8::from(*auto_off))
            }
            Signal::NoteOff { name, number } => write!(f, "NoteOff {} ({})", name, number),
            Signal::StreamLoaded => write!(f, "StreamLoaded"),
            Signal::StreamEnded => write!(f, "StreamEnded"),
        }
    }
}

/// Receives every signal the engine produces, in order
pub trait EventSink: Send + Sync {
    fn emit(&self, signal: Signal);
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn emit(&self, signal: Signal) {
        (**self).emit(signal)
    }
}
