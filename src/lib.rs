pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod midi;
pub mod output;
pub mod playback;
pub mod scheduler;
pub mod state;
pub mod timeline;
pub mod ui;

pub use cli::{resolve_config, Args};
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use midi::{DefaultPlayer, MidiStream, StreamPlayer};
pub use output::{ChannelSink, ConsoleSink, EventSink, Signal};
pub use playback::PlaybackController;
pub use scheduler::{Scheduler, ThreadScheduler};
pub use state::{PlayOptions, PlaybackPhase};
pub use timeline::{DimmerTable, TempoMap, Timeline};

use std::sync::Arc;

/// Default scheduler type used by the application
pub fn create_scheduler() -> ThreadScheduler {
    ThreadScheduler::new()
}

/// Controller wired to the real-time player and thread scheduler
pub fn create_controller(
    config: EngineConfig,
    sink: Arc<dyn EventSink>,
) -> PlaybackController<DefaultPlayer, ThreadScheduler> {
    PlaybackController::new(DefaultPlayer::new(), create_scheduler(), config, sink)
}
