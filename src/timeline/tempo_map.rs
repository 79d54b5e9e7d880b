use super::snapped_floor;
use crate::midi::TempoChange;
use log::{debug, warn};

/// Milliseconds per tick at a tempo: 60000 / (bpm * ticks_per_beat)
pub fn tick_duration_ms(tempo_bpm: f64, ticks_per_beat: u16) -> f64 {
    60_000.0 / (tempo_bpm * f64::from(ticks_per_beat))
}

/// A maximal run of ticks sharing one tempo
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoSegment {
    pub tick: u64,
    pub tick_duration_ms: f64,
    pub start_time_ms: f64,
    pub tempo_bpm: f64,
}

/// Position of the tempo segment in effect at a queried time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoPosition {
    pub time_ms: f64,
    pub tick: u64,
    pub tempo_bpm: Option<f64>,
}

impl TempoPosition {
    /// Returned when no segment starts before the queried time
    pub const NONE: TempoPosition = TempoPosition {
        time_ms: 0.0,
        tick: 0,
        tempo_bpm: None,
    };
}

/// Tick/time conversion table for a stream with piecewise-constant tempo
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TempoMap {
    segments: Vec<TempoSegment>,
}

impl TempoMap {
    /// Builds the segment table from the tempo changes of track 0
    pub fn build(changes: &[TempoChange], ticks_per_beat: u16, default_tempo_bpm: f64) -> Self {
        if changes.is_empty() {
            warn!("Building tempo map without tempo changes");
            return Self::default();
        }

        let mut changes = changes.to_vec();
        changes.sort_by_key(|change| change.tick);

        if changes[0].tick != 0 {
            debug!(
                "First tempo change at tick {}, adding {} BPM segment at tick 0",
                changes[0].tick, default_tempo_bpm
            );
            changes.insert(
                0,
                TempoChange {
                    tick: 0,
                    bpm: default_tempo_bpm,
                },
            );
        }

        let mut segments: Vec<TempoSegment> = Vec::with_capacity(changes.len());
        for change in changes {
            let start_time_ms = match segments.last() {
                Some(previous) => {
                    previous.start_time_ms
                        + previous.tick_duration_ms * (change.tick - previous.tick) as f64
                }
                None => 0.0,
            };
            segments.push(TempoSegment {
                tick: change.tick,
                tick_duration_ms: tick_duration_ms(change.bpm, ticks_per_beat),
                start_time_ms,
                tempo_bpm: change.bpm,
            });
        }

        debug!("Built tempo map with {} segments", segments.len());
        Self { segments }
    }

    pub fn segments(&self) -> &[TempoSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Latest segment starting strictly before `time_ms`
    fn segment_before_time(&self, time_ms: f64) -> Option<&TempoSegment> {
        self.segments
            .iter()
            .rev()
            .find(|segment| segment.start_time_ms < time_ms)
    }

    /// Tick to resume from when seeking to `seconds`.
    ///
    /// Lands one tick before the computed boundary so events on that tick are realized again.
    pub fn tick_for_time(&self, seconds: f64) -> i64 {
        let time_ms = seconds * 1000.0;
        match self.segment_before_time(time_ms) {
            Some(segment) => {
                let elapsed_ms = time_ms - segment.start_time_ms;
                snapped_floor(elapsed_ms / segment.tick_duration_ms) + segment.tick as i64 - 1
            }
            None => 0,
        }
    }

    pub fn tempo_at(&self, seconds: f64) -> TempoPosition {
        match self.segment_before_time(seconds * 1000.0) {
            Some(segment) => TempoPosition {
                time_ms: segment.start_time_ms,
                tick: segment.tick,
                tempo_bpm: Some(segment.tempo_bpm),
            },
            None => TempoPosition::NONE,
        }
    }

    /// Duration of one tick in the latest segment starting strictly before `tick`
    pub fn tick_duration_at(&self, tick: u64) -> Option<f64> {
        self.segments
            .iter()
            .rev()
            .find(|segment| segment.tick < tick)
            .map(|segment| segment.tick_duration_ms)
    }

    /// Elapsed milliseconds from the start of the stream to `tick`
    pub fn time_at_tick(&self, tick: u64) -> f64 {
        self.segments
            .iter()
            .rev()
            .find(|segment| segment.tick <= tick)
            .map(|segment| {
                segment.start_time_ms + segment.tick_duration_ms * (tick - segment.tick) as f64
            })
            .unwrap_or(0.0)
    }
}
