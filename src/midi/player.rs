use super::event::{MidiStream, StreamEvent};
use std::sync::Arc;

/// Receives the events a player realizes, in stream order
pub trait StreamHandler: Send + Sync {
    fn on_event(&self, event: &StreamEvent);

    /// Called once each time playback runs off the end of the stream
    fn on_end(&self);
}

/// Trait defining the interface for MIDI stream players
pub trait StreamPlayer: Send {
    /// Registers the handler that receives realized events
    fn set_handler(&mut self, handler: Arc<dyn StreamHandler>);

    /// Replaces the loaded stream and rewinds to the start
    fn load(&mut self, stream: Arc<MidiStream>);

    fn play(&mut self);

    /// Halts playback and rewinds to the start
    fn stop(&mut self);

    /// Moves the cursor so that the next realized events are those with a tick after `tick`
    fn skip_to_tick(&mut self, tick: i64);

    fn set_tempo(&mut self, bpm: f64);

    fn is_playing(&self) -> bool;

    fn current_tick(&self) -> i64;
}

/// Index of the first event strictly after `tick`
pub(crate) fn first_event_after(events: &[StreamEvent], tick: i64) -> usize {
    events.partition_point(|event| (event.tick() as i64) <= tick)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::NoteEvent;

    #[test]
    fn test_first_event_after() {
        let events = vec![
            StreamEvent::Note(NoteEvent::on(0, 60, 100)),
            StreamEvent::Note(NoteEvent::on(10, 62, 100)),
            StreamEvent::Note(NoteEvent::off(10, 60)),
            StreamEvent::Note(NoteEvent::off(20, 62)),
        ];

        assert_eq!(first_event_after(&events, -1), 0);
        assert_eq!(first_event_after(&events, 0), 1);
        assert_eq!(first_event_after(&events, 9), 1);
        assert_eq!(first_event_after(&events, 10), 3);
        assert_eq!(first_event_after(&events, 20), 4);
    }
}
