use super::snapped_floor;
use super::tempo_map::TempoMap;
use crate::midi::{NoteEvent, NoteKind};
use log::{debug, trace};
use std::collections::HashSet;

/// A dimmable Note On paired with its Note Off
#[derive(Debug, Clone, PartialEq)]
pub struct DimmerCandidate {
    pub tick: u64,
    pub name: String,
    pub number: u8,
    pub velocity: u8,
    /// None when no tempo segment precedes the note's tick
    pub length_ms: Option<u64>,
    /// Names of simultaneous notes with the same length folded into this one
    pub same_notes: Vec<String>,
    pub cancelled: bool,
}

impl DimmerCandidate {
    fn from_note(note: &NoteEvent) -> Self {
        Self {
            tick: note.tick,
            name: note.name.clone(),
            number: note.number,
            velocity: note.velocity,
            length_ms: None,
            same_notes: Vec::new(),
            cancelled: false,
        }
    }
}

/// Surviving dimmer candidates, ordered by (tick, length, note number)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DimmerTable {
    candidates: Vec<DimmerCandidate>,
}

impl DimmerTable {
    /// Pairs, measures and merges the dimmable notes of a stream
    pub fn build<'a>(
        notes: impl IntoIterator<Item = &'a NoteEvent>,
        tempo_map: &TempoMap,
        dimmable_range: &HashSet<u8>,
    ) -> Self {
        let mut candidates = pair_notes(notes, tempo_map, dimmable_range);
        candidates.sort_by_key(|candidate| (candidate.tick, candidate.length_ms, candidate.number));
        merge_simultaneous(&mut candidates);
        candidates.retain(|candidate| !candidate.cancelled);

        debug!("Built dimmer table with {} entries", candidates.len());
        Self { candidates }
    }

    pub fn candidates(&self) -> &[DimmerCandidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn find(&self, tick: u64, number: u8) -> Option<&DimmerCandidate> {
        self.candidates
            .iter()
            .find(|candidate| candidate.tick == tick && candidate.number == number)
    }

    /// The entry that absorbed the note `name` at `tick`, if it was merged away
    pub fn merged_into(&self, tick: u64, name: &str) -> Option<&DimmerCandidate> {
        self.candidates.iter().find(|candidate| {
            candidate.tick == tick && candidate.same_notes.iter().any(|same| same == name)
        })
    }
}

/// Pairs each Note Off with the most recently opened Note On of the same name.
///
/// Returns the paired Note Ons in arrival order; unmatched ones are dropped.
fn pair_notes<'a>(
    notes: impl IntoIterator<Item = &'a NoteEvent>,
    tempo_map: &TempoMap,
    dimmable_range: &HashSet<u8>,
) -> Vec<DimmerCandidate> {
    let mut candidates: Vec<DimmerCandidate> = Vec::new();
    let mut paired: Vec<bool> = Vec::new();
    // Indices into `candidates`, most recently opened last
    let mut open: Vec<usize> = Vec::new();

    for note in notes
        .into_iter()
        .filter(|note| dimmable_range.contains(&note.number))
    {
        match note.kind {
            NoteKind::On => {
                open.push(candidates.len());
                candidates.push(DimmerCandidate::from_note(note));
                paired.push(false);
            }
            NoteKind::Off => {
                let Some(position) = open
                    .iter()
                    .rposition(|&index| candidates[index].name == note.name)
                else {
                    trace!("Dropping unmatched Note Off {} at tick {}", note.name, note.tick);
                    continue;
                };
                let index = open.remove(position);
                paired[index] = true;

                let candidate = &mut candidates[index];
                if let Some(tick_ms) = tempo_map.tick_duration_at(candidate.tick) {
                    let span = note.tick.saturating_sub(candidate.tick);
                    candidate.length_ms = Some(snapped_floor(tick_ms * span as f64).max(0) as u64);
                }
            }
        }
    }

    if !open.is_empty() {
        debug!("{} dimmable notes were never released", open.len());
    }

    candidates
        .into_iter()
        .zip(paired)
        .filter_map(|(candidate, paired)| paired.then_some(candidate))
        .collect()
}

/// Folds notes sharing a tick and length into the first of their group.
///
/// Expects `candidates` sorted by (tick, length, note number).
fn merge_simultaneous(candidates: &mut [DimmerCandidate]) {
    let mut group_start = 0;
    while group_start < candidates.len() {
        let key = (candidates[group_start].tick, candidates[group_start].length_ms);
        let group_end = candidates[group_start..]
            .iter()
            .position(|candidate| (candidate.tick, candidate.length_ms) != key)
            .map_or(candidates.len(), |offset| group_start + offset);

        for current in group_start..group_end {
            if candidates[current].cancelled {
                continue;
            }
            let matches: Vec<usize> = (group_start..group_end)
                .filter(|&other| candidates[other].name != candidates[current].name)
                .collect();
            if matches.is_empty() {
                continue;
            }

            let same_notes: Vec<String> = matches
                .iter()
                .map(|&other| candidates[other].name.clone())
                .collect();
            for &other in &matches {
                candidates[other].cancelled = true;
            }
            debug!(
                "Merged {:?} into {} at tick {}",
                same_notes, candidates[current].name, candidates[current].tick
            );
            candidates[current].same_notes = same_notes;
        }

        group_start = group_end;
    }
}
