use super::Signal;
use crate::config::{EngineConfig, AUTO_OFF_VELOCITY};
use crate::midi::{NoteEvent, NoteKind};
use crate::timeline::Timeline;
use log::{debug, warn};
use std::sync::Arc;

/// Filters realized note events and correlates dimmable ones with the dimmer table
#[derive(Debug, Clone)]
pub struct SignalRouter {
    config: Arc<EngineConfig>,
}

impl SignalRouter {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The signal for one realized note event, if it produces any
    pub fn route(&self, event: &NoteEvent, timeline: &Timeline) -> Option<Signal> {
        if self.config.is_disabled(&event.name) {
            debug!("Suppressing disabled note {}", event.name);
            return None;
        }

        match event.kind {
            NoteKind::On if self.config.is_dimmable(event.number) => {
                self.dimmer_signal(event, timeline)
            }
            NoteKind::On => Some(Signal::NoteOn {
                name: event.name.clone(),
                number: event.number,
            }),
            NoteKind::Off => Some(Signal::NoteOff {
                name: event.name.clone(),
                number: event.number,
            }),
        }
    }

    fn dimmer_signal(&self, event: &NoteEvent, timeline: &Timeline) -> Option<Signal> {
        let Some(candidate) = timeline.dimmers.find(event.tick, event.number) else {
            match timeline.dimmers.merged_into(event.tick, &event.name) {
                Some(survivor) => debug!(
                    "{} at tick {} is carried by {}",
                    event.name, event.tick, survivor.name
                ),
                None => warn!(
                    "No dimmer cue for {} ({}) at tick {}",
                    event.name, event.number, event.tick
                ),
            }
            return None;
        };

        Some(Signal::DimmerOn {
            name: event.name.clone(),
            number: event.number,
            length_ms: candidate.length_ms,
            same_notes: candidate.same_notes.clone(),
            auto_off: event.velocity >= AUTO_OFF_VELOCITY,
        })
    }
}
