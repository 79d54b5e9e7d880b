use cuesyncrs::midi::{loader, MockPlayer};
use cuesyncrs::{
    ChannelSink, EngineConfig, Error, PlayOptions, PlaybackController, Signal, ThreadScheduler,
    Timeline,
};
use std::collections::HashSet;
use std::sync::Arc;

fn track(events: &[(u8, Vec<u8>)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (delta, data) in events {
        // Deltas stay below 128, so each fits one VLQ byte
        body.push(*delta);
        body.extend(data);
    }
    body.extend([0x00, 0xFF, 0x2F, 0x00]);

    let mut chunk = b"MTrk".to_vec();
    chunk.extend((body.len() as u32).to_be_bytes());
    chunk.extend(body);
    chunk
}

fn smf(ticks_per_beat: u16, tracks: &[Vec<(u8, Vec<u8>)>]) -> Vec<u8> {
    let mut data = b"MThd".to_vec();
    data.extend(6u32.to_be_bytes());
    data.extend(1u16.to_be_bytes());
    data.extend((tracks.len() as u16).to_be_bytes());
    data.extend(ticks_per_beat.to_be_bytes());
    for events in tracks {
        data.extend(track(events));
    }
    data
}

/// Tempo meta event for `micros` microseconds per beat
fn tempo(micros: u32) -> Vec<u8> {
    vec![
        0xFF,
        0x51,
        0x03,
        (micros >> 16) as u8,
        (micros >> 8) as u8,
        micros as u8,
    ]
}

/// 96 ticks per beat at 125 BPM: 5ms per tick
fn cue_file() -> Vec<u8> {
    smf(
        96,
        &[
            vec![(0, tempo(480_000))],
            vec![
                (0, vec![0x90, 40, 127]),
                (0, vec![0x90, 45, 127]),
                (0, vec![0x90, 64, 90]),
                (100, vec![0x80, 40, 0]),
                (0, vec![0x90, 45, 0]),
                (20, vec![0x80, 64, 0]),
            ],
        ],
    )
}

fn dimmable() -> HashSet<u8> {
    (36..=59).collect()
}

#[test]
fn test_file_to_timeline() {
    let stream = loader::parse(&cue_file()).unwrap();
    let timeline = Timeline::build(&stream, &dimmable());

    assert_eq!(timeline.tempo_map.segments().len(), 1);
    assert!((timeline.tempo_map.segments()[0].tick_duration_ms - 5.0).abs() < 1e-9);
    assert_eq!(timeline.last_tick, 120);
    assert!((timeline.duration_ms() - 600.0).abs() < 1e-9);

    // Tick 0 has no segment strictly before it, so the cue has no length
    let cue = &timeline.dimmers.candidates()[0];
    assert_eq!(timeline.dimmers.len(), 1);
    assert_eq!(cue.name, "E2");
    assert_eq!(cue.length_ms, None);
    assert_eq!(cue.same_notes, vec!["A2".to_string()]);
}

#[test]
fn test_load_file_from_disk() {
    let path = std::env::temp_dir().join(format!("cuesyncrs-{}.mid", std::process::id()));
    std::fs::write(&path, cue_file()).unwrap();
    let stream = loader::load_file(&path);
    std::fs::remove_file(&path).unwrap();

    assert_eq!(stream.unwrap(), loader::parse(&cue_file()).unwrap());
}

#[test]
fn test_load_missing_file() {
    let result = loader::load_file(std::path::Path::new("/nonexistent/show.mid"));
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_timecode_files_are_rejected() {
    let mut data = smf(96, &[vec![(0, vec![0x90, 60, 100])]]);
    // -25 fps, 40 subframes
    data[12] = 0xE7;
    data[13] = 40;
    assert!(matches!(loader::parse(&data), Err(Error::UnsupportedTiming)));
}

#[test]
fn test_signals_through_channel_sink() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (sink, receiver) = ChannelSink::unbounded();
    let controller = PlaybackController::new(
        MockPlayer::new(),
        ThreadScheduler::new(),
        EngineConfig::new(Vec::new(), dimmable()),
        Arc::new(sink),
    );

    controller.load_bytes(&cue_file()).unwrap();
    controller.play(PlayOptions::default()).unwrap();

    let signals: Vec<Signal> = receiver.try_iter().collect();
    assert_eq!(signals.first(), Some(&Signal::StreamLoaded));
    assert_eq!(signals.last(), Some(&Signal::StreamEnded));
    assert_eq!(
        signals[1],
        Signal::DimmerOn {
            name: "E2".to_string(),
            number: 40,
            length_ms: None,
            same_notes: vec!["A2".to_string()],
            auto_off: true,
        }
    );
    assert_eq!(
        signals[2],
        Signal::NoteOn {
            name: "E4".to_string(),
            number: 64,
        }
    );
    assert_eq!(signals.len(), 7);
}
