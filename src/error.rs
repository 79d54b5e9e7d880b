use std::error::Error as StdError;
use std::fmt;

/// Custom error type for loading and playback operations
#[derive(Debug)]
pub enum Error {
    /// Error when reading a MIDI or configuration file
    Io(std::io::Error),
    /// Error when the MIDI data cannot be parsed
    Parse(String),
    /// The file uses SMPTE timecode instead of ticks per beat
    UnsupportedTiming,
    /// Error when the engine configuration is invalid
    Config(String),
    /// Playback or seek requested before any stream was loaded
    NotLoaded,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Parse(msg) => write!(f, "MIDI parse error: {}", msg),
            Error::UnsupportedTiming => {
                write!(f, "MIDI parse error: timecode-based files are not supported")
            }
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::NotLoaded => write!(f, "No MIDI stream loaded"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<midly::Error> for Error {
    fn from(err: midly::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

/// Result type for loading and playback operations
pub type Result<T> = std::result::Result<T, Error>;
