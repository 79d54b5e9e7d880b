use cuesyncrs::state::{PlayOptions, PlaybackPhase, PlaybackState};
use std::sync::Arc;
use std::thread;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_initialization() {
        let state = PlaybackState::new();
        assert_eq!(state.phase(), PlaybackPhase::Idle);
        assert!(!state.is_looping());
        assert!(!PlayOptions::default().looping);
    }

    #[test]
    fn test_phase_transitions() {
        let state = PlaybackState::new();

        state.set_phase(PlaybackPhase::Loaded);
        assert_eq!(state.phase(), PlaybackPhase::Loaded);

        // Only moves from the expected phase
        assert!(!state.transition(PlaybackPhase::Playing, PlaybackPhase::Stopped));
        assert_eq!(state.phase(), PlaybackPhase::Loaded);

        state.set_phase(PlaybackPhase::Playing);
        assert!(state.transition(PlaybackPhase::Playing, PlaybackPhase::Stopped));
        assert_eq!(state.phase(), PlaybackPhase::Stopped);
    }

    #[test]
    fn test_looping_flag() {
        let state = PlaybackState::new();
        state.set_looping(true);
        assert!(state.is_looping());
        state.set_looping(false);
        assert!(!state.is_looping());
    }

    #[test]
    fn test_concurrent_end_transition() {
        let state = Arc::new(PlaybackState::new());
        state.set_phase(PlaybackPhase::Playing);

        // Exactly one of several racing end handlers wins the transition
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let state = Arc::clone(&state);
                thread::spawn(move || {
                    state.transition(PlaybackPhase::Playing, PlaybackPhase::Stopped)
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(state.phase(), PlaybackPhase::Stopped);
    }
}
