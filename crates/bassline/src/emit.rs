use midi_score::{Note, Track};

use crate::config::BasslineConfig;

/// Name given to the generated track.
pub const BASS_TRACK_NAME: &str = "Walking Bass (auto)";

/// Fraction of each beat window a bass note occupies. The gap keeps
/// adjacent notes from overlapping at the boundary.
const NOTE_LENGTH_RATIO: f64 = 0.98;

/// One resolved walk step: concrete pitch plus its beat window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkStep {
    pub pitch: u8,
    pub window_start: f64,
    pub window_end: f64,
}

/// Materialize walk steps as the generated bass track.
///
/// Notes are emitted in beat order, slightly shortened, at the
/// configured program and velocity. The caller appends the track to
/// the score once the whole walk has completed.
pub fn emit_bass_track(steps: &[WalkStep], config: &BasslineConfig) -> Track {
    let mut track = Track::new(Some(BASS_TRACK_NAME.to_string()), config.bass_program);
    track.notes = steps
        .iter()
        .map(|step| Note {
            pitch: step.pitch,
            start: step.window_start,
            end: step.window_start
                + NOTE_LENGTH_RATIO * (step.window_end - step.window_start),
            velocity: config.bass_velocity,
        })
        .collect();
    track
}
