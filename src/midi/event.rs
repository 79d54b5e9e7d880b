const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Returns the sharps-spelled name of a MIDI note number, e.g. 60 -> "C4"
pub fn note_name(number: u8) -> String {
    let octave = i32::from(number / 12) - 1;
    format!("{}{}", NOTE_NAMES[usize::from(number % 12)], octave)
}

/// Whether a note event starts or ends a note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    On,
    Off,
}

/// A note event at an absolute tick of the stream
#[derive(Debug, Clone, PartialEq)]
pub struct NoteEvent {
    pub kind: NoteKind,
    pub tick: u64,
    pub name: String,
    pub number: u8,
    pub velocity: u8,
}

impl NoteEvent {
    pub fn on(tick: u64, number: u8, velocity: u8) -> Self {
        Self {
            kind: NoteKind::On,
            tick,
            name: note_name(number),
            number,
            velocity,
        }
    }

    pub fn off(tick: u64, number: u8) -> Self {
        Self {
            kind: NoteKind::Off,
            tick,
            name: note_name(number),
            number,
            velocity: 0,
        }
    }

    pub fn is_on(&self) -> bool {
        self.kind == NoteKind::On
    }
}

/// A tempo change at an absolute tick of the stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoChange {
    pub tick: u64,
    pub bpm: f64,
}

/// Events realized by a stream player, in tick order
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Note(NoteEvent),
    Tempo(TempoChange),
}

impl StreamEvent {
    pub fn tick(&self) -> u64 {
        match self {
            StreamEvent::Note(note) => note.tick,
            StreamEvent::Tempo(change) => change.tick,
        }
    }
}

/// A fully parsed MIDI stream ready for timeline building and playback
#[derive(Debug, Clone, PartialEq)]
pub struct MidiStream {
    pub ticks_per_beat: u16,
    pub default_tempo_bpm: f64,
    /// Tempo changes of track 0, in tick order
    pub tempo_changes: Vec<TempoChange>,
    /// Note and tempo events of every track, merged in tick order
    pub events: Vec<StreamEvent>,
}

impl MidiStream {
    pub fn notes(&self) -> impl Iterator<Item = &NoteEvent> {
        self.events.iter().filter_map(|event| match event {
            StreamEvent::Note(note) => Some(note),
            StreamEvent::Tempo(_) => None,
        })
    }

    pub fn last_tick(&self) -> u64 {
        self.events.last().map(StreamEvent::tick).unwrap_or(0)
    }
}
