use midi_score::{Score, Track};
use tracing::debug;

/// Beat step assumed when the timeline is unusable: 120 BPM quarters.
const FALLBACK_BEAT_SECONDS: f64 = 0.5;

/// Effective subdivision for a score: the configured density, doubled
/// when the first declared meter counts in half notes (cut time), so
/// the grid still lands on quarter-note-equivalent steps.
pub fn effective_density(score: &Score, density: u32) -> u32 {
    let density = density.max(1);
    match score.timeline.time_signatures.first() {
        Some(ts) if ts.denominator == 2 => density * 2,
        _ => density,
    }
}

/// Build the ordered beat boundary sequence for one score.
///
/// Native beats come from the tempo/meter timeline. When the timeline
/// yields fewer than two boundaries, downbeats are tried next, then a
/// fixed 0.5-second grid spanning the harmony track's notes. A result
/// with fewer than two boundaries means no bass can be generated.
pub fn build_beat_grid(score: &Score, harmony: &Track, density: u32) -> Vec<f64> {
    let mut beats = score.beat_seconds();

    if beats.len() < 2 {
        let downbeats = score.downbeat_seconds();
        if downbeats.len() >= 2 {
            debug!("timeline has no usable beats, falling back to downbeats");
            beats = downbeats;
        } else if let Some((t0, t1)) = harmony.note_span() {
            debug!("timeline unusable, synthesizing 120 BPM grid over note span");
            beats = synthesize_grid(t0, t1);
        } else {
            return Vec::new();
        }
    }

    let density = effective_density(score, density);
    if density > 1 {
        beats = subdivide(&beats, density);
    }

    beats
}

/// Boundaries every `FALLBACK_BEAT_SECONDS` from `t0` up to (not
/// including) `t1`.
fn synthesize_grid(t0: f64, t1: f64) -> Vec<f64> {
    let mut beats = Vec::new();
    let mut t = t0;
    while t < t1 {
        beats.push(t);
        t += FALLBACK_BEAT_SECONDS;
    }
    beats
}

/// Split each adjacent boundary pair into `density` equal sub-steps,
/// keeping the final boundary unchanged.
fn subdivide(beats: &[f64], density: u32) -> Vec<f64> {
    let mut out = Vec::with_capacity(beats.len() * density as usize);
    for pair in beats.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        for i in 0..density {
            out.push(a + (b - a) * i as f64 / density as f64);
        }
    }
    if let Some(&last) = beats.last() {
        out.push(last);
    }
    out
}
