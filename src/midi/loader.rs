use super::event::{MidiStream, NoteEvent, StreamEvent, TempoChange};
use crate::config::DEFAULT_TEMPO_BPM;
use crate::error::{Error, Result};
use log::{debug, info, warn};
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::path::Path;

const MICROS_PER_MINUTE: f64 = 60_000_000.0;

/// Reads and parses a Standard MIDI File from disk
pub fn load_file(path: &Path) -> Result<MidiStream> {
    info!("Loading MIDI file: {}", path.display());
    let data = std::fs::read(path)?;
    parse(&data)
}

/// Parses Standard MIDI File bytes into a tick-ordered stream
pub fn parse(data: &[u8]) -> Result<MidiStream> {
    let smf = Smf::parse(data)?;

    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(tpb) => tpb.as_int(),
        Timing::Timecode(..) => return Err(Error::UnsupportedTiming),
    };
    if ticks_per_beat == 0 {
        return Err(Error::Parse("header declares zero ticks per beat".to_string()));
    }

    let mut tempo_changes = Vec::new();
    let mut events = Vec::new();

    for (track_index, track) in smf.tracks.iter().enumerate() {
        let mut tick: u64 = 0;
        for event in track {
            tick += u64::from(event.delta.as_int());
            match event.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(micros)) => {
                    let micros = micros.as_int();
                    if micros == 0 {
                        warn!("Ignoring zero tempo event at tick {}", tick);
                        continue;
                    }
                    let change = TempoChange {
                        tick,
                        bpm: MICROS_PER_MINUTE / f64::from(micros),
                    };
                    if track_index == 0 {
                        tempo_changes.push(change);
                    }
                    events.push(StreamEvent::Tempo(change));
                }
                TrackEventKind::Midi { message, .. } => match message {
                    MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                        events.push(StreamEvent::Note(NoteEvent::on(
                            tick,
                            key.as_int(),
                            vel.as_int(),
                        )));
                    }
                    // Note On with zero velocity is a Note Off
                    MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                        events.push(StreamEvent::Note(NoteEvent::off(tick, key.as_int())));
                    }
                    _ => {}
                },
                _ => {}
            }
        }
    }

    // Stable: track order breaks ties within a tick
    events.sort_by_key(StreamEvent::tick);

    if tempo_changes.is_empty() {
        debug!("Track 0 has no tempo events, using default tempo");
        tempo_changes.push(TempoChange {
            tick: 0,
            bpm: DEFAULT_TEMPO_BPM,
        });
    }

    info!(
        "Parsed MIDI stream: {} tracks, {} ticks per beat, {} events, {} tempo changes",
        smf.tracks.len(),
        ticks_per_beat,
        events.len(),
        tempo_changes.len()
    );

    Ok(MidiStream {
        ticks_per_beat,
        default_tempo_bpm: DEFAULT_TEMPO_BPM,
        tempo_changes,
        events,
    })
}
