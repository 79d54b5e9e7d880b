//! User interface components
//!
//! This module provides terminal-based UI components for CueSync, including:
//! - A playback position bar
//! - A text dump of the tempo map and dimmer table
//!
//! The UI is built using the indicatif library for progress bars.

mod progress;
mod report;

pub use progress::{create_position_progress, format_position};
pub use report::timeline_report;

use crate::midi::StreamPlayer;
use crate::playback::PlaybackController;
use crate::scheduler::Scheduler;
use std::thread;
use std::time::Duration;

/// Redraws the position bar until playback stops and no loop restart is due
pub fn run_position_display<P, S>(controller: &PlaybackController<P, S>)
where
    P: StreamPlayer + 'static,
    S: Scheduler,
{
    let duration_ms = controller
        .timeline()
        .map(|timeline| timeline.duration_ms())
        .unwrap_or(0.0);
    let pb = create_position_progress(duration_ms.max(1.0) as u64);

    while controller.is_playing() || controller.is_looping() {
        let position = controller.position_ms();
        pb.set_position(position as u64);
        pb.set_message(format!(
            "{} / {}",
            format_position(position),
            format_position(duration_ms)
        ));
        thread::sleep(Duration::from_millis(100));
    }

    pb.finish_and_clear();
}
