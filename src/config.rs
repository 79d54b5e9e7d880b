// config.rs

use crate::error::{Error, Result};
use log::{debug, info};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Tempo assumed until the stream sets one
pub const DEFAULT_TEMPO_BPM: f64 = 120.0;

/// Dimmable Note Ons at or above this velocity ask the receiver to switch off by itself
pub const AUTO_OFF_VELOCITY: u8 = 125;

/// Pause between the end of a looped stream and its restart
pub const LOOP_RESTART_DELAY: Duration = Duration::from_millis(100);

const ENV_PREFIX: &str = "CUESYNC";

/// Note numbers as written in a config file: a list or an inclusive range
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NoteSet {
    List(Vec<u8>),
    Range { from: u8, to: u8 },
}

impl NoteSet {
    pub fn to_set(&self) -> HashSet<u8> {
        match self {
            NoteSet::List(notes) => notes.iter().copied().collect(),
            NoteSet::Range { from, to } => (*from..=*to).collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    disabled_notes: Vec<String>,
    #[serde(default)]
    dimmable_notes: Option<NoteSet>,
}

/// Note filtering rules, fixed for the lifetime of an engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineConfig {
    /// Note names that never produce a signal
    pub disabled_notes: HashSet<String>,
    /// Note numbers treated as timed dimmer cues
    pub dimmable_range: HashSet<u8>,
}

impl EngineConfig {
    pub fn new(
        disabled_notes: impl IntoIterator<Item = String>,
        dimmable_range: impl IntoIterator<Item = u8>,
    ) -> Self {
        Self {
            disabled_notes: disabled_notes.into_iter().collect(),
            dimmable_range: dimmable_range.into_iter().collect(),
        }
    }

    /// Reads a config file (format chosen by extension) overlaid with CUESYNC_* variables
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading engine configuration from {}", path.display());
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()?;
        let file: ConfigFile = settings.try_deserialize()?;
        Ok(Self::from_file(file))
    }

    fn from_file(file: ConfigFile) -> Self {
        let config = Self::new(
            file.disabled_notes,
            file.dimmable_notes
                .map(|notes| notes.to_set())
                .unwrap_or_default(),
        );
        debug!(
            "Configuration: {} disabled notes, {} dimmable notes",
            config.disabled_notes.len(),
            config.dimmable_range.len()
        );
        config
    }

    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled_notes.contains(name)
    }

    pub fn is_dimmable(&self, number: u8) -> bool {
        self.dimmable_range.contains(&number)
    }
}

/// Parses a note range given as "36-59" or a single note number
pub fn parse_note_range(value: &str) -> Result<NoteSet> {
    let parse = |part: &str| {
        part.trim()
            .parse::<u8>()
            .ok()
            .filter(|number| *number <= 127)
            .ok_or_else(|| Error::Config(format!("invalid note number '{}'", part.trim())))
    };

    match value.split_once('-') {
        Some((from, to)) => {
            let (from, to) = (parse(from)?, parse(to)?);
            if from > to {
                return Err(Error::Config(format!(
                    "note range '{}' runs backwards",
                    value
                )));
            }
            Ok(NoteSet::Range { from, to })
        }
        None => Ok(NoteSet::List(vec![parse(value)?])),
    }
}
