use super::format_position;
use crate::timeline::Timeline;
use std::fmt::Write;

/// Human-readable listing of the tempo segments and dimmer cues
pub fn timeline_report(timeline: &Timeline) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Tempo map:");
    for segment in timeline.tempo_map.segments() {
        let _ = writeln!(
            out,
            "  tick {:>8}  {:>8}  {:>7.2} BPM  {:.5} ms/tick",
            segment.tick,
            format_position(segment.start_time_ms),
            segment.tempo_bpm,
            segment.tick_duration_ms
        );
    }

    let _ = writeln!(out, "Dimmer cues:");
    for cue in timeline.dimmers.candidates() {
        let length = cue
            .length_ms
            .map(|length| format!("{}ms", length))
            .unwrap_or_else(|| "?".to_string());
        let _ = write!(
            out,
            "  tick {:>8}  {:<4} ({:>3})  {:>8}",
            cue.tick, cue.name, cue.number, length
        );
        if !cue.same_notes.is_empty() {
            let _ = write!(out, "  with {}", cue.same_notes.join(", "));
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "Duration: {}", format_position(timeline.duration_ms()));
    out
}
