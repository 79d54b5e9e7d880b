use super::event::MidiStream;
use super::player::{first_event_after, StreamHandler, StreamPlayer};
use std::sync::Arc;

/// Synchronous player: `play` realizes every remaining event, then the end of stream
#[derive(Default)]
pub struct MockPlayer {
    handler: Option<Arc<dyn StreamHandler>>,
    stream: Option<Arc<MidiStream>>,
    tick: i64,
    next_index: usize,
    playing: bool,
    /// Every tempo passed to `set_tempo`, in order
    pub tempo_history: Vec<f64>,
    /// Every tick passed to `skip_to_tick`, in order
    pub skip_history: Vec<i64>,
    pub play_count: u32,
}

impl MockPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    fn rewind(&mut self) {
        self.tick = 0;
        self.next_index = 0;
    }
}

impl StreamPlayer for MockPlayer {
    fn set_handler(&mut self, handler: Arc<dyn StreamHandler>) {
        self.handler = Some(handler);
    }

    fn load(&mut self, stream: Arc<MidiStream>) {
        self.stream = Some(stream);
        self.playing = false;
        self.rewind();
    }

    fn play(&mut self) {
        let Some(stream) = self.stream.clone() else {
            return;
        };
        self.play_count += 1;
        self.playing = true;

        while let Some(event) = stream.events.get(self.next_index) {
            self.next_index += 1;
            self.tick = event.tick() as i64;
            if let Some(handler) = &self.handler {
                handler.on_event(event);
            }
        }

        self.playing = false;
        self.rewind();
        if let Some(handler) = &self.handler {
            handler.on_end();
        }
    }

    fn stop(&mut self) {
        self.playing = false;
        self.rewind();
    }

    fn skip_to_tick(&mut self, tick: i64) {
        self.skip_history.push(tick);
        self.tick = tick;
        self.next_index = self
            .stream
            .as_ref()
            .map(|stream| first_event_after(&stream.events, tick))
            .unwrap_or(0);
    }

    fn set_tempo(&mut self, bpm: f64) {
        self.tempo_history.push(bpm);
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn current_tick(&self) -> i64 {
        self.tick
    }
}
