use super::{EventSink, Signal};
use crossbeam::channel::{Receiver, Sender};
use log::{debug, error};

/// Prints each signal on its own line
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        ConsoleSink
    }
}

impl EventSink for ConsoleSink {
    fn emit(&self, signal: Signal) {
        debug!("Signal: {}", signal);
        println!("{}", signal);
    }
}

/// Forwards signals to a channel, for a transport running on another thread
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<Signal>,
}

impl ChannelSink {
    /// Creates a sink together with the receiving end of its channel
    pub fn unbounded() -> (Self, Receiver<Signal>) {
        let (tx, rx) = crossbeam::channel::unbounded();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, signal: Signal) {
        if self.tx.send(signal).is_err() {
            error!("Failed to forward signal - receiver dropped");
        }
    }
}
