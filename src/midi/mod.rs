//! MIDI stream functionality for CueSync
//!
//! This module provides everything on the stream side of the engine:
//! - Note, tempo and stream types
//! - Standard MIDI File loading via midly
//! - The player interface that realizes events in real time
//! - A threaded player and a synchronous mock for testing
//!
//! The main components are:
//! - [`MidiStream`] parsed output of [`loader::parse`]
//! - [`StreamPlayer`] trait for playing a stream
//! - [`ClockedPlayer`] for real-time playback
//! - [`MockPlayer`] for testing
//!
mod clocked_player;
mod event;
pub mod loader;
pub mod mock_player;
mod player;

pub use event::{note_name, MidiStream, NoteEvent, NoteKind, StreamEvent, TempoChange};
pub use player::{StreamHandler, StreamPlayer};

pub use clocked_player::ClockedPlayer;
pub use mock_player::MockPlayer;

// Set default player type
pub type DefaultPlayer = ClockedPlayer;
