//! Real-time stream player paced by the stream's own tempo

use super::event::{MidiStream, StreamEvent};
use super::player::{first_event_after, StreamHandler, StreamPlayer};
use crate::timeline::tick_duration_ms;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use log::{debug, info, trace, warn};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::thread::{self, JoinHandle};
use std::time::Duration;

struct Cursor {
    stream: Option<Arc<MidiStream>>,
    tick: i64,
    next_index: usize,
    tempo_bpm: f64,
    generation: u64,
}

impl Cursor {
    fn rewind(&mut self) {
        self.tick = 0;
        self.next_index = 0;
        self.tempo_bpm = self
            .stream
            .as_ref()
            .map(|stream| stream.default_tempo_bpm)
            .unwrap_or(crate::config::DEFAULT_TEMPO_BPM);
        self.generation += 1;
    }
}

struct Shared {
    cursor: Mutex<Cursor>,
    running: AtomicBool,
    handler: Mutex<Option<Arc<dyn StreamHandler>>>,
}

impl Shared {
    fn handler(&self) -> Option<Arc<dyn StreamHandler>> {
        self.handler.lock().ok().and_then(|handler| handler.clone())
    }
}

/// Plays a loaded stream on a dedicated thread, realizing each event when its tick comes due
pub struct ClockedPlayer {
    shared: Arc<Shared>,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
    thread_handle: Option<JoinHandle<()>>,
}

impl Default for ClockedPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockedPlayer {
    pub fn new() -> Self {
        let (wake_tx, wake_rx) = channel::unbounded();
        Self {
            shared: Arc::new(Shared {
                cursor: Mutex::new(Cursor {
                    stream: None,
                    tick: 0,
                    next_index: 0,
                    tempo_bpm: crate::config::DEFAULT_TEMPO_BPM,
                    generation: 0,
                }),
                running: AtomicBool::new(false),
                handler: Mutex::new(None),
            }),
            wake_tx,
            wake_rx,
            thread_handle: None,
        }
    }

    fn wake(&self) {
        let _ = self.wake_tx.send(());
    }

    fn join_finished_thread(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            // The playback thread may itself be the caller, e.g. from a handler
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

/// Returns the next due event and how long to wait for it, or None at the end of the stream
fn next_step(cursor: &Cursor) -> Option<(u64, Duration)> {
    let stream = cursor.stream.as_ref()?;
    let event = stream.events.get(cursor.next_index)?;
    let ticks = (event.tick() as i64 - cursor.tick).max(0);
    let tick_ms = tick_duration_ms(cursor.tempo_bpm, stream.ticks_per_beat);
    let wait_ms = tick_ms * ticks as f64;
    let wait = if wait_ms.is_finite() && wait_ms > 0.0 {
        Duration::from_secs_f64(wait_ms / 1000.0)
    } else {
        Duration::ZERO
    };
    Some((cursor.generation, wait))
}

fn run_playback(shared: Arc<Shared>, wake_rx: Receiver<()>) {
    info!("Playback thread started");

    while shared.running.load(Ordering::SeqCst) {
        let step = match shared.cursor.lock() {
            Ok(cursor) => next_step(&cursor),
            Err(_) => break,
        };

        let Some((generation, wait)) = step else {
            if let Ok(mut cursor) = shared.cursor.lock() {
                cursor.rewind();
            }
            shared.running.store(false, Ordering::SeqCst);
            info!("Reached end of stream");
            if let Some(handler) = shared.handler() {
                handler.on_end();
            }
            break;
        };

        if !wait.is_zero() {
            trace!("Waiting {:?} for next event", wait);
            match wake_rx.recv_timeout(wait) {
                // Woken by stop, seek or a tempo change; re-evaluate
                Ok(()) => continue,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        let event = {
            let Ok(mut cursor) = shared.cursor.lock() else {
                break;
            };
            if cursor.generation != generation || !shared.running.load(Ordering::SeqCst) {
                continue;
            }
            let Some(event) = cursor
                .stream
                .as_ref()
                .and_then(|stream| stream.events.get(cursor.next_index))
                .cloned()
            else {
                continue;
            };
            cursor.next_index += 1;
            cursor.tick = event.tick() as i64;
            if let StreamEvent::Tempo(change) = &event {
                debug!("Tempo change to {} BPM at tick {}", change.bpm, change.tick);
                cursor.tempo_bpm = change.bpm;
            }
            event
        };

        if let Some(handler) = shared.handler() {
            handler.on_event(&event);
        }
    }

    info!("Playback thread stopped");
}

impl StreamPlayer for ClockedPlayer {
    fn set_handler(&mut self, handler: Arc<dyn StreamHandler>) {
        if let Ok(mut slot) = self.shared.handler.lock() {
            *slot = Some(handler);
        }
    }

    fn load(&mut self, stream: Arc<MidiStream>) {
        self.stop();
        if let Ok(mut cursor) = self.shared.cursor.lock() {
            cursor.stream = Some(stream);
            cursor.rewind();
        }
    }

    fn play(&mut self) {
        if self.shared.running.load(Ordering::SeqCst) {
            return; // Already running
        }
        self.join_finished_thread();

        match self.shared.cursor.lock() {
            Ok(cursor) if cursor.stream.is_some() => {}
            _ => {
                warn!("Play requested with no stream loaded");
                return;
            }
        }

        // Discard wake-ups aimed at a previous run
        while self.wake_rx.try_recv().is_ok() {}

        self.shared.running.store(true, Ordering::SeqCst);
        let shared = Arc::clone(&self.shared);
        let wake_rx = self.wake_rx.clone();
        self.thread_handle = Some(thread::spawn(move || run_playback(shared, wake_rx)));
    }

    fn stop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        self.wake();
        self.join_finished_thread();
        if let Ok(mut cursor) = self.shared.cursor.lock() {
            cursor.rewind();
        }
    }

    fn skip_to_tick(&mut self, tick: i64) {
        if let Ok(mut cursor) = self.shared.cursor.lock() {
            let next_index = cursor
                .stream
                .as_ref()
                .map(|stream| first_event_after(&stream.events, tick))
                .unwrap_or(0);
            cursor.tick = tick;
            cursor.next_index = next_index;
            cursor.generation += 1;
            debug!("Skipped to tick {} (next event index {})", tick, next_index);
        }
        self.wake();
    }

    fn set_tempo(&mut self, bpm: f64) {
        if let Ok(mut cursor) = self.shared.cursor.lock() {
            cursor.tempo_bpm = if bpm > 0.0 {
                bpm
            } else {
                cursor
                    .stream
                    .as_ref()
                    .map(|stream| stream.default_tempo_bpm)
                    .unwrap_or(crate::config::DEFAULT_TEMPO_BPM)
            };
            debug!("Player tempo set to {} BPM", cursor.tempo_bpm);
        }
        self.wake();
    }

    fn is_playing(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    fn current_tick(&self) -> i64 {
        self.shared
            .cursor
            .lock()
            .map(|cursor| cursor.tick)
            .unwrap_or(0)
    }
}

impl Drop for ClockedPlayer {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        self.wake();
        self.join_finished_thread();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::{NoteEvent, TempoChange};
    use std::time::Instant;

    struct Recorder {
        events: Mutex<Vec<StreamEvent>>,
        ends: Mutex<u32>,
    }

    impl StreamHandler for Recorder {
        fn on_event(&self, event: &StreamEvent) {
            self.events.lock().unwrap().push(event.clone());
        }

        fn on_end(&self) {
            *self.ends.lock().unwrap() += 1;
        }
    }

    fn short_stream() -> Arc<MidiStream> {
        // 96 ticks per beat at 600 BPM: roughly 1ms per tick
        Arc::new(MidiStream {
            ticks_per_beat: 96,
            default_tempo_bpm: 600.0,
            tempo_changes: vec![TempoChange { tick: 0, bpm: 600.0 }],
            events: vec![
                StreamEvent::Tempo(TempoChange { tick: 0, bpm: 600.0 }),
                StreamEvent::Note(NoteEvent::on(0, 60, 100)),
                StreamEvent::Note(NoteEvent::off(10, 60)),
                StreamEvent::Note(NoteEvent::on(20, 62, 100)),
                StreamEvent::Note(NoteEvent::off(30, 62)),
            ],
        })
    }

    fn tempo(player: &ClockedPlayer) -> f64 {
        player.shared.cursor.lock().unwrap().tempo_bpm
    }

    fn wait_until_stopped(player: &mut ClockedPlayer) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while player.is_playing() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        // Joins the finished playback thread
        player.stop();
    }

    #[test]
    fn test_plays_every_event_then_ends() {
        let recorder = Arc::new(Recorder {
            events: Mutex::new(Vec::new()),
            ends: Mutex::new(0),
        });
        let mut player = ClockedPlayer::new();
        player.set_handler(recorder.clone());
        player.load(short_stream());

        player.play();
        wait_until_stopped(&mut player);

        assert!(!player.is_playing());
        assert_eq!(recorder.events.lock().unwrap().len(), 5);
        assert_eq!(*recorder.ends.lock().unwrap(), 1);
        assert_eq!(player.current_tick(), 0, "end of stream rewinds");
    }

    #[test]
    fn test_skip_plays_events_after_tick() {
        let recorder = Arc::new(Recorder {
            events: Mutex::new(Vec::new()),
            ends: Mutex::new(0),
        });
        let mut player = ClockedPlayer::new();
        player.set_handler(recorder.clone());
        player.load(short_stream());

        player.skip_to_tick(19);
        player.play();
        wait_until_stopped(&mut player);

        let events = recorder.events.lock().unwrap();
        let ticks: Vec<u64> = events.iter().map(StreamEvent::tick).collect();
        assert_eq!(ticks, vec![20, 30]);
    }

    #[test]
    fn test_non_positive_tempo_falls_back_to_stream_default() {
        let mut player = ClockedPlayer::new();
        player.load(short_stream());

        player.set_tempo(90.0);
        assert_eq!(tempo(&player), 90.0);
        player.set_tempo(0.0);
        assert_eq!(tempo(&player), 600.0);
        player.set_tempo(-30.0);
        assert_eq!(tempo(&player), 600.0);
    }

    #[test]
    fn test_tempo_events_change_pacing() {
        // 6000 BPM is about 0.1ms per tick; the tempo event at tick 10 drops to
        // 60 BPM, about 10.4ms per tick, for the last 10 ticks
        let stream = Arc::new(MidiStream {
            ticks_per_beat: 96,
            default_tempo_bpm: 6000.0,
            tempo_changes: vec![
                TempoChange { tick: 0, bpm: 6000.0 },
                TempoChange { tick: 10, bpm: 60.0 },
            ],
            events: vec![
                StreamEvent::Note(NoteEvent::on(0, 60, 100)),
                StreamEvent::Tempo(TempoChange { tick: 10, bpm: 60.0 }),
                StreamEvent::Note(NoteEvent::off(20, 60)),
            ],
        });
        let recorder = Arc::new(Recorder {
            events: Mutex::new(Vec::new()),
            ends: Mutex::new(0),
        });
        let mut player = ClockedPlayer::new();
        player.set_handler(recorder.clone());
        player.load(stream);

        let started = Instant::now();
        player.play();
        wait_until_stopped(&mut player);
        let elapsed = started.elapsed();

        assert_eq!(recorder.events.lock().unwrap().len(), 3);
        assert!(
            elapsed >= Duration::from_millis(90),
            "slower tempo should stretch the tail, took {:?}",
            elapsed
        );
        assert_eq!(tempo(&player), 6000.0, "end of stream restores the default");
    }

    #[test]
    fn test_play_without_stream_does_nothing() {
        let mut player = ClockedPlayer::new();
        player.play();
        assert!(!player.is_playing());
    }
}
