//! Playback control: load, play, stop, seek and looping

use crate::config::{EngineConfig, LOOP_RESTART_DELAY};
use crate::error::{Error, Result};
use crate::midi::{loader, MidiStream, NoteEvent, StreamEvent, StreamHandler, StreamPlayer};
use crate::output::{EventSink, Signal, SignalRouter};
use crate::scheduler::{ScheduledTask, Scheduler};
use crate::state::{PlayOptions, PlaybackPhase, PlaybackState};
use crate::timeline::Timeline;
use log::{debug, error, info, trace};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

type EndObserver = Arc<dyn Fn() + Send + Sync>;

/// Callbacks run when this engine's stream plays to its end
#[derive(Default)]
struct EndObservers {
    next_id: u64,
    entries: Vec<(u64, EndObserver)>,
}

impl EndObservers {
    fn subscribe(&mut self, observer: EndObserver) -> u64 {
        self.next_id += 1;
        self.entries.push((self.next_id, observer));
        self.next_id
    }

    fn unsubscribe(&mut self, id: u64) {
        self.entries.retain(|(entry_id, _)| *entry_id != id);
    }

    fn snapshot(&self) -> Vec<EndObserver> {
        self.entries.iter().map(|(_, observer)| observer.clone()).collect()
    }
}

struct Inner<P, S> {
    player: Mutex<P>,
    scheduler: S,
    router: SignalRouter,
    sink: Arc<dyn EventSink>,
    /// Snapshot of the loaded stream, replaced whole on every load
    timeline: RwLock<Option<Arc<Timeline>>>,
    state: PlaybackState,
    /// Serializes the public operations and scheduled loop restarts
    operation: Mutex<()>,
    end_observers: Mutex<EndObservers>,
    loop_observer: Mutex<Option<u64>>,
    pending_loop: Mutex<Option<ScheduledTask>>,
    loop_generation: AtomicU64,
}

/// Forwards player callbacks to the controller without keeping it alive
struct PlayerEvents<P, S> {
    inner: Weak<Inner<P, S>>,
}

impl<P, S> StreamHandler for PlayerEvents<P, S>
where
    P: StreamPlayer + 'static,
    S: Scheduler,
{
    fn on_event(&self, event: &StreamEvent) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        match event {
            StreamEvent::Note(note) => inner.handle_note(note),
            StreamEvent::Tempo(change) => {
                trace!("Tempo {} BPM at tick {}", change.bpm, change.tick)
            }
        }
    }

    fn on_end(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.handle_end();
        }
    }
}

impl<P, S> Inner<P, S>
where
    P: StreamPlayer + 'static,
    S: Scheduler,
{
    fn timeline(&self) -> Option<Arc<Timeline>> {
        self.timeline.read().ok().and_then(|timeline| timeline.clone())
    }

    fn handle_note(&self, note: &NoteEvent) {
        let Some(timeline) = self.timeline() else {
            return;
        };
        if let Some(signal) = self.router.route(note, &timeline) {
            self.sink.emit(signal);
        }
    }

    fn handle_end(&self) {
        self.state
            .transition(PlaybackPhase::Playing, PlaybackPhase::Stopped);
        info!("Stream ended");
        self.sink.emit(Signal::StreamEnded);

        let observers = match self.end_observers.lock() {
            Ok(observers) => observers.snapshot(),
            Err(_) => return,
        };
        for observer in observers {
            observer();
        }
    }

    fn with_player<R>(&self, f: impl FnOnce(&mut P) -> R) -> Option<R> {
        match self.player.lock() {
            Ok(mut player) => Some(f(&mut player)),
            Err(_) => {
                error!("Player lock poisoned");
                None
            }
        }
    }

    fn set_loop_observer(self: &Arc<Self>, options: PlayOptions) {
        let Ok(mut slot) = self.loop_observer.lock() else {
            return;
        };
        let Ok(mut observers) = self.end_observers.lock() else {
            return;
        };
        if let Some(id) = slot.take() {
            observers.unsubscribe(id);
        }
        if options.looping {
            let weak = Arc::downgrade(self);
            *slot = Some(observers.subscribe(Arc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.schedule_restart(options);
                }
            })));
        }
    }

    fn schedule_restart(self: &Arc<Self>, options: PlayOptions) {
        let generation = self.loop_generation.load(Ordering::SeqCst);
        let weak = Arc::downgrade(self);
        debug!("Restarting stream in {:?}", LOOP_RESTART_DELAY);

        let task = self.scheduler.schedule(LOOP_RESTART_DELAY, move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let Ok(_operation) = inner.operation.lock() else {
                return;
            };
            if inner.loop_generation.load(Ordering::SeqCst) != generation {
                debug!("Discarding stale loop restart");
                return;
            }
            if let Err(e) = inner.play(options) {
                error!("Loop restart failed: {}", e);
            }
        });

        if let Ok(mut pending) = self.pending_loop.lock() {
            *pending = Some(task);
        }
    }

    /// Drops the loop observer, halts the player and invalidates pending restarts
    fn halt(self: &Arc<Self>) {
        self.state.set_looping(false);
        self.set_loop_observer(PlayOptions::default());
        self.with_player(|player| player.stop());

        // After the player has stopped no further end-of-stream can schedule a restart
        self.loop_generation.fetch_add(1, Ordering::SeqCst);
        let pending = self.pending_loop.lock().ok().and_then(|mut pending| pending.take());
        if let Some(task) = pending {
            debug!("Cancelling pending loop restart");
            task.cancel();
        }
    }

    fn load(self: &Arc<Self>, stream: MidiStream) {
        self.halt();

        let timeline = Arc::new(Timeline::build(
            &stream,
            &self.router.config().dimmable_range,
        ));
        match self.timeline.write() {
            Ok(mut current) => *current = Some(timeline),
            Err(_) => {
                error!("Timeline lock poisoned, stream not published");
                return;
            }
        }

        self.with_player(|player| player.load(Arc::new(stream)));
        self.state.set_phase(PlaybackPhase::Loaded);
        info!("Stream loaded");
        self.sink.emit(Signal::StreamLoaded);
    }

    fn play(self: &Arc<Self>, options: PlayOptions) -> Result<()> {
        if self.timeline().is_none() {
            return Err(Error::NotLoaded);
        }

        self.state.set_looping(options.looping);
        self.set_loop_observer(options);
        self.state.set_phase(PlaybackPhase::Playing);
        info!("Playback started (loop: {})", options.looping);
        self.with_player(|player| player.play());
        Ok(())
    }

    fn stop(self: &Arc<Self>) {
        self.halt();
        self.state
            .transition(PlaybackPhase::Playing, PlaybackPhase::Stopped);
        info!("Playback stopped");
    }

    fn seek(&self, seconds: f64) -> Result<()> {
        let timeline = self.timeline().ok_or(Error::NotLoaded)?;
        let tick = timeline.tempo_map.tick_for_time(seconds);
        let tempo = timeline.tempo_map.tempo_at(seconds).tempo_bpm.unwrap_or(0.0);

        info!("Seeking to {}s: tick {}, {} BPM", seconds, tick, tempo);
        self.with_player(|player| {
            player.skip_to_tick(tick);
            player.set_tempo(tempo);
        });
        Ok(())
    }
}

/// Owns playback state and the published timeline of the loaded stream
pub struct PlaybackController<P, S>
where
    P: StreamPlayer + 'static,
    S: Scheduler,
{
    inner: Arc<Inner<P, S>>,
}

impl<P, S> PlaybackController<P, S>
where
    P: StreamPlayer + 'static,
    S: Scheduler,
{
    pub fn new(player: P, scheduler: S, config: EngineConfig, sink: Arc<dyn EventSink>) -> Self {
        let inner = Arc::new(Inner {
            player: Mutex::new(player),
            scheduler,
            router: SignalRouter::new(Arc::new(config)),
            sink,
            timeline: RwLock::new(None),
            state: PlaybackState::new(),
            operation: Mutex::new(()),
            end_observers: Mutex::new(EndObservers::default()),
            loop_observer: Mutex::new(None),
            pending_loop: Mutex::new(None),
            loop_generation: AtomicU64::new(0),
        });

        let handler = Arc::new(PlayerEvents {
            inner: Arc::downgrade(&inner),
        });
        inner.with_player(|player| player.set_handler(handler));

        Self { inner }
    }

    fn operation(&self) -> std::sync::MutexGuard<'_, ()> {
        // The guarded data is (), so a poisoned lock carries no broken state
        self.inner
            .operation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn load_file(&self, path: &Path) -> Result<()> {
        let stream = loader::load_file(path)?;
        self.load_stream(stream);
        Ok(())
    }

    pub fn load_bytes(&self, data: &[u8]) -> Result<()> {
        let stream = loader::parse(data)?;
        self.load_stream(stream);
        Ok(())
    }

    /// Builds and publishes the timeline of `stream`, replacing any previous one
    pub fn load_stream(&self, stream: MidiStream) {
        let _operation = self.operation();
        self.inner.load(stream);
    }

    pub fn play(&self, options: PlayOptions) -> Result<()> {
        let _operation = self.operation();
        self.inner.play(options)
    }

    pub fn stop(&self) {
        let _operation = self.operation();
        self.inner.stop();
    }

    pub fn seek(&self, seconds: f64) -> Result<()> {
        let _operation = self.operation();
        self.inner.seek(seconds)
    }

    pub fn is_playing(&self) -> bool {
        self.inner
            .with_player(|player| player.is_playing())
            .unwrap_or(false)
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.inner.state.phase()
    }

    pub fn is_looping(&self) -> bool {
        self.inner.state.is_looping()
    }

    pub fn timeline(&self) -> Option<Arc<Timeline>> {
        self.inner.timeline()
    }

    /// Elapsed milliseconds at the player's current tick
    pub fn position_ms(&self) -> f64 {
        let Some(timeline) = self.inner.timeline() else {
            return 0.0;
        };
        let tick = self
            .inner
            .with_player(|player| player.current_tick())
            .unwrap_or(0)
            .max(0) as u64;
        timeline.tempo_map.time_at_tick(tick)
    }

    /// Runs `f` with the player, e.g. to inspect a mock in tests
    pub fn with_player<R>(&self, f: impl FnOnce(&mut P) -> R) -> Option<R> {
        self.inner.with_player(f)
    }
}

impl<P, S> Drop for PlaybackController<P, S>
where
    P: StreamPlayer + 'static,
    S: Scheduler,
{
    fn drop(&mut self) {
        self.inner.halt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::{MockPlayer, TempoChange};
    use crate::output::ChannelSink;
    use crate::scheduler::ThreadScheduler;
    use std::thread;

    fn stream() -> MidiStream {
        let tempo = TempoChange { tick: 0, bpm: 120.0 };
        MidiStream {
            ticks_per_beat: 480,
            default_tempo_bpm: 120.0,
            tempo_changes: vec![tempo],
            events: vec![
                StreamEvent::Tempo(tempo),
                StreamEvent::Note(NoteEvent::on(0, 60, 100)),
                StreamEvent::Note(NoteEvent::off(480, 60)),
            ],
        }
    }

    #[test]
    fn test_poisoned_timeline_is_not_reported_loaded() {
        let (sink, rx) = ChannelSink::unbounded();
        let controller = PlaybackController::new(
            MockPlayer::new(),
            ThreadScheduler::new(),
            EngineConfig::default(),
            Arc::new(sink),
        );

        let inner = Arc::clone(&controller.inner);
        let _ = thread::spawn(move || {
            let _guard = inner.timeline.write().unwrap();
            panic!("writer died holding the timeline lock");
        })
        .join();

        controller.load_stream(stream());

        assert_eq!(controller.phase(), PlaybackPhase::Idle);
        assert!(controller.timeline().is_none());
        assert!(rx.try_recv().is_err(), "no StreamLoaded signal");
        assert!(matches!(
            controller.play(PlayOptions::default()),
            Err(Error::NotLoaded)
        ));
    }
}
