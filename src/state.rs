use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Lifecycle of the playback controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    Idle,
    Loaded,
    Playing,
    Stopped,
}

impl PlaybackPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => PlaybackPhase::Loaded,
            2 => PlaybackPhase::Playing,
            3 => PlaybackPhase::Stopped,
            _ => PlaybackPhase::Idle,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            PlaybackPhase::Idle => 0,
            PlaybackPhase::Loaded => 1,
            PlaybackPhase::Playing => 2,
            PlaybackPhase::Stopped => 3,
        }
    }
}

/// Options passed to `play`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayOptions {
    /// Restart from the beginning whenever the stream ends
    pub looping: bool,
}

pub struct PlaybackState {
    phase: AtomicU8,
    looping: AtomicBool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            phase: AtomicU8::new(PlaybackPhase::Idle.as_u8()),
            looping: AtomicBool::new(false),
        }
    }
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> PlaybackPhase {
        PlaybackPhase::from_u8(self.phase.load(Ordering::SeqCst))
    }

    pub fn set_phase(&self, phase: PlaybackPhase) {
        self.phase.store(phase.as_u8(), Ordering::SeqCst);
    }

    /// Moves to `to` only if currently in `from`; returns whether it moved
    pub fn transition(&self, from: PlaybackPhase, to: PlaybackPhase) -> bool {
        self.phase
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn is_looping(&self) -> bool {
        self.looping.load(Ordering::SeqCst)
    }

    pub fn set_looping(&self, looping: bool) {
        self.looping.store(looping, Ordering::SeqCst);
    }
}
