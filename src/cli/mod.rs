use crate::config::{parse_note_range, EngineConfig, NoteSet};
use crate::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// MIDI file to play
    pub file: PathBuf,

    /// Engine configuration file (TOML, JSON or YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Start playback this many seconds into the file
    #[arg(short, long, value_name = "SECONDS")]
    pub seek: Option<f64>,

    /// Restart the file whenever it ends
    #[arg(short = 'l', long = "loop")]
    pub looping: bool,

    /// Print the tempo map and dimmer table instead of playing
    #[arg(long)]
    pub dump: bool,

    /// Note name that never produces a signal (repeatable)
    #[arg(long = "disable", value_name = "NOTE")]
    pub disabled_notes: Vec<String>,

    /// Dimmable note numbers, e.g. 36-59
    #[arg(long, value_name = "FROM-TO", value_parser = parse_dimmable)]
    pub dimmable: Option<NoteSet>,

    /// Hide the playback progress display
    #[arg(long)]
    pub no_progress: bool,

    /// Log debug output to the log file
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_dimmable(value: &str) -> std::result::Result<NoteSet, String> {
    parse_note_range(value).map_err(|e| e.to_string())
}

/// Config file settings, with command line notes added on top
pub fn resolve_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    config
        .disabled_notes
        .extend(args.disabled_notes.iter().cloned());
    if let Some(dimmable) = &args.dimmable {
        config.dimmable_range.extend(dimmable.to_set());
    }
    Ok(config)
}
