use midi_score::{Score, Track};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::BasslineConfig;
use crate::emit::{emit_bass_track, WalkStep};
use crate::grid::build_beat_grid;
use crate::harmony::pitch_classes_in;
use crate::range::project_into_range;
use crate::select::{select_melody, select_track, SelectStrategy};
use crate::walk::WalkState;

/// Why a pass added no bass. Both are recoverable: the score comes
/// back playable, just without the extra track (or with an empty one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No track matched any selection strategy, or the match has no
    /// notes.
    NoHarmonyTrack,
    /// Fewer than two beat boundaries even after fallbacks.
    DegenerateGrid,
}

/// Result of one bass-generation pass over a score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub bass_notes_added: usize,
    pub skipped: Option<SkipReason>,
    /// Index of the track used as the harmonic source, when found.
    pub harmony_track: Option<usize>,
}

/// Generate a walking bass track from the score's chord track and
/// append it.
///
/// Pipeline: melody retarget (optional) → harmony track selection →
/// chord-line velocity rescale → beat grid → chord walk → range
/// projection → track emission. The walk is a single sequential fold:
/// each beat's decision depends on the state left by the previous one.
pub fn add_bassline(score: &mut Score, config: &BasslineConfig) -> Outcome {
    if config.retarget_melody {
        retarget_melody(score, &config.melody_hint, config.melody_program);
    }

    let strategies = [
        SelectStrategy::ExactPrefix(&config.chord_track_prefix),
        SelectStrategy::FuzzySubstring(&config.chord_fuzzy),
        SelectStrategy::MostPolyphonic,
    ];

    let harmony_index = match select_track(&score.tracks, &strategies) {
        Some(i) if !score.tracks[i].notes.is_empty() => i,
        _ => {
            let names: Vec<&str> = score
                .tracks
                .iter()
                .map(|t| t.name.as_deref().unwrap_or("<unnamed>"))
                .collect();
            warn!(?names, "no chord track found, leaving score unmodified");
            return Outcome {
                bass_notes_added: 0,
                skipped: Some(SkipReason::NoHarmonyTrack),
                harmony_track: None,
            };
        }
    };
    info!(
        track = harmony_index,
        name = score.tracks[harmony_index].name.as_deref().unwrap_or(""),
        "using chord track"
    );

    // Soften the chord line under the bass
    scale_track_velocity(&mut score.tracks[harmony_index], config.chord_velocity_scale);

    let grid = build_beat_grid(score, &score.tracks[harmony_index], config.note_density);
    if grid.len() < 2 {
        warn!("beat grid is degenerate, no bass notes emitted");
        return Outcome {
            bass_notes_added: 0,
            skipped: Some(SkipReason::DegenerateGrid),
            harmony_track: Some(harmony_index),
        };
    }

    let mut state = WalkState::new();
    let mut steps = Vec::new();

    for window in grid.windows(2) {
        let (start, end) = (window[0], window[1]);
        let observed = pitch_classes_in(&score.tracks[harmony_index], start, end);

        if let Some(pc) = state.step(&observed) {
            let pitch =
                project_into_range(pc, state.last_pitch, config.range_low, config.range_high);
            state.last_pitch = Some(pitch);
            steps.push(WalkStep {
                pitch,
                window_start: start,
                window_end: end,
            });
        }
    }

    let bass = emit_bass_track(&steps, config);
    let bass_notes_added = bass.notes.len();
    score.tracks.push(bass);

    info!(notes = bass_notes_added, "bass track appended");
    Outcome {
        bass_notes_added,
        skipped: None,
        harmony_track: Some(harmony_index),
    }
}

/// Clamp-scaled velocities for every note on a track.
fn scale_track_velocity(track: &mut Track, scale: f64) {
    for note in &mut track.notes {
        let scaled = (note.velocity as f64 * scale).round();
        note.velocity = scaled.clamp(1.0, 127.0) as u8;
    }
}

/// Reassign the melody track's program (lead-sheet exports label it;
/// otherwise the least polyphonic track stands in).
fn retarget_melody(score: &mut Score, hint: &str, program: u8) {
    if let Some(index) = select_melody(&score.tracks, hint) {
        let track = &mut score.tracks[index];
        info!(
            track = index,
            name = track.name.as_deref().unwrap_or(""),
            program,
            "retargeting melody"
        );
        track.program = program;
    }
}
