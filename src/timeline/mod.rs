//! Timeline reconstruction for a loaded stream
//!
//! - [`TempoMap`] converts between ticks and elapsed time across tempo changes
//! - [`DimmerTable`] pairs and merges dimmable notes into timed dimmer cues
//!
//! Both are built together into an immutable [`Timeline`] snapshot.

mod dimmer;
mod tempo_map;

pub use dimmer::{DimmerCandidate, DimmerTable};
pub use tempo_map::{tick_duration_ms, TempoMap, TempoPosition, TempoSegment};

use crate::midi::MidiStream;
use log::info;
use std::collections::HashSet;

// Tick and millisecond quotients are floored; values within this distance of
// an integer are float noise (e.g. 999.9999999999999) and count as that integer.
const FLOOR_TOLERANCE: f64 = 1e-6;

pub(crate) fn snapped_floor(value: f64) -> i64 {
    let nearest = value.round();
    if (value - nearest).abs() < FLOOR_TOLERANCE {
        nearest as i64
    } else {
        value.floor() as i64
    }
}

/// Tempo map and dimmer table of one loaded stream
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub tempo_map: TempoMap,
    pub dimmers: DimmerTable,
    pub last_tick: u64,
}

impl Timeline {
    /// Builds the tempo map, then the dimmer table that depends on it
    pub fn build(stream: &MidiStream, dimmable_range: &HashSet<u8>) -> Self {
        let tempo_map = TempoMap::build(
            &stream.tempo_changes,
            stream.ticks_per_beat,
            stream.default_tempo_bpm,
        );
        let dimmers = DimmerTable::build(stream.notes(), &tempo_map, dimmable_range);
        let last_tick = stream.last_tick();

        info!(
            "Timeline built: {} tempo segments, {} dimmer cues, {:.1}s long",
            tempo_map.segments().len(),
            dimmers.len(),
            tempo_map.time_at_tick(last_tick) / 1000.0
        );

        Self {
            tempo_map,
            dimmers,
            last_tick,
        }
    }

    pub fn duration_ms(&self) -> f64 {
        self.tempo_map.time_at_tick(self.last_tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapped_floor() {
        assert_eq!(snapped_floor(239.99999999999994), 240);
        assert_eq!(snapped_floor(239.5), 239);
        assert_eq!(snapped_floor(-0.5), -1);
        assert_eq!(snapped_floor(3.0), 3);
    }
}
