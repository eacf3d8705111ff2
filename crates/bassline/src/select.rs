use midi_score::Track;

/// Sample points used for the simultaneity estimate.
const SIMULTANEITY_SAMPLES: usize = 512;

/// One way of picking a track out of the score.
///
/// Strategies are tried in the order given; the first hit wins. This
/// keeps each heuristic independently testable instead of burying the
/// fallback chain in nested conditionals.
#[derive(Debug, Clone, Copy)]
pub enum SelectStrategy<'a> {
    /// First track whose name starts with the prefix.
    ExactPrefix(&'a str),
    /// First track whose name contains the substring, case-insensitive.
    FuzzySubstring(&'a str),
    /// Track with the highest average simultaneity among tracks with
    /// at least one note.
    MostPolyphonic,
}

impl SelectStrategy<'_> {
    fn apply(&self, tracks: &[Track]) -> Option<usize> {
        match self {
            SelectStrategy::ExactPrefix(prefix) => tracks.iter().position(|t| {
                t.name.as_deref().is_some_and(|n| n.starts_with(prefix))
            }),
            SelectStrategy::FuzzySubstring(needle) => {
                let needle = needle.to_lowercase();
                tracks.iter().position(|t| {
                    t.name
                        .as_deref()
                        .is_some_and(|n| n.to_lowercase().contains(&needle))
                })
            }
            SelectStrategy::MostPolyphonic => tracks
                .iter()
                .enumerate()
                .filter(|(_, t)| !t.notes.is_empty())
                .max_by(|(_, a), (_, b)| {
                    simultaneity_score(a).total_cmp(&simultaneity_score(b))
                })
                .map(|(i, _)| i),
        }
    }
}

/// Try each strategy in order; `None` when nothing matches.
pub fn select_track(tracks: &[Track], strategies: &[SelectStrategy]) -> Option<usize> {
    strategies.iter().find_map(|s| s.apply(tracks))
}

/// Rough polyphony estimate: mean number of sounding notes across
/// equally spaced sample points over the track's note span. Higher
/// means more chordal.
pub fn simultaneity_score(track: &Track) -> f64 {
    let Some((t0, t1)) = track.note_span() else {
        return 0.0;
    };
    if t1 <= t0 {
        return 0.0;
    }

    let step = (t1 - t0) / (SIMULTANEITY_SAMPLES - 1) as f64;
    let mut total = 0usize;
    for i in 0..SIMULTANEITY_SAMPLES {
        let t = t0 + step * i as f64;
        total += track
            .notes
            .iter()
            .filter(|n| n.start <= t && t < n.end)
            .count();
    }
    total as f64 / SIMULTANEITY_SAMPLES as f64
}

/// Find the melody track: name hint first, then the *least* polyphonic
/// non-percussion track with notes.
pub fn select_melody(tracks: &[Track], hint: &str) -> Option<usize> {
    let hint_lower = hint.to_lowercase();
    let by_name = tracks.iter().position(|t| {
        t.name
            .as_deref()
            .is_some_and(|n| n.to_lowercase().contains(&hint_lower))
    });
    if by_name.is_some() {
        return by_name;
    }

    tracks
        .iter()
        .enumerate()
        .filter(|(_, t)| !t.is_percussion && !t.notes.is_empty())
        .min_by(|(_, a), (_, b)| simultaneity_score(a).total_cmp(&simultaneity_score(b)))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use midi_score::Note;
    use pretty_assertions::assert_eq;

    fn track_with_notes(name: Option<&str>, notes: Vec<(u8, f64, f64)>) -> Track {
        let mut track = Track::new(name.map(String::from), 0);
        track.notes = notes
            .into_iter()
            .map(|(pitch, start, end)| Note {
                pitch,
                start,
                end,
                velocity: 80,
            })
            .collect();
        track
    }

    fn chord_track(name: Option<&str>) -> Track {
        // Three-note chords held across 4 seconds
        track_with_notes(
            name,
            vec![(60, 0.0, 4.0), (64, 0.0, 4.0), (67, 0.0, 4.0)],
        )
    }

    fn melody_track(name: Option<&str>) -> Track {
        track_with_notes(
            name,
            vec![(72, 0.0, 1.0), (74, 1.0, 2.0), (76, 2.0, 3.0), (77, 3.0, 4.0)],
        )
    }

    #[test]
    fn exact_prefix_wins_over_later_strategies() {
        let tracks = vec![
            melody_track(Some("Piano, Melody:Voice")),
            chord_track(Some("Piano, Chords:")),
        ];
        let strategies = [
            SelectStrategy::ExactPrefix("Piano, Chords:"),
            SelectStrategy::FuzzySubstring("chords"),
            SelectStrategy::MostPolyphonic,
        ];
        assert_eq!(select_track(&tracks, &strategies), Some(1));
    }

    #[test]
    fn fuzzy_match_is_case_insensitive() {
        let tracks = vec![
            melody_track(Some("Lead")),
            chord_track(Some("Guitar CHORDS (comp)")),
        ];
        let strategies = [
            SelectStrategy::ExactPrefix("Piano, Chords:"),
            SelectStrategy::FuzzySubstring("chords"),
        ];
        assert_eq!(select_track(&tracks, &strategies), Some(1));
    }

    #[test]
    fn polyphony_fallback_picks_the_chordal_track() {
        let tracks = vec![melody_track(None), chord_track(None)];
        let strategies = [
            SelectStrategy::ExactPrefix("Piano, Chords:"),
            SelectStrategy::FuzzySubstring("chords"),
            SelectStrategy::MostPolyphonic,
        ];
        assert_eq!(select_track(&tracks, &strategies), Some(1));
    }

    #[test]
    fn no_candidates_yields_none() {
        let tracks = vec![Track::new(Some("Empty".into()), 0)];
        let strategies = [
            SelectStrategy::ExactPrefix("Piano, Chords:"),
            SelectStrategy::FuzzySubstring("chords"),
            SelectStrategy::MostPolyphonic,
        ];
        assert_eq!(select_track(&tracks, &strategies), None);
        assert_eq!(select_track(&[], &strategies), None);
    }

    #[test]
    fn simultaneity_reflects_polyphony() {
        let chords = chord_track(None);
        let melody = melody_track(None);

        let chord_score = simultaneity_score(&chords);
        let melody_score = simultaneity_score(&melody);

        assert!(chord_score > 2.5, "held triad should score near 3: {chord_score}");
        assert!(melody_score < 1.5, "monophonic line should score near 1: {melody_score}");
        assert_eq!(simultaneity_score(&Track::new(None, 0)), 0.0);
    }

    #[test]
    fn melody_selection_prefers_name_hint() {
        let tracks = vec![
            chord_track(Some("Piano, Chords:")),
            melody_track(Some("Piano, Melody:Voice")),
        ];
        assert_eq!(select_melody(&tracks, "Melody"), Some(1));
    }

    #[test]
    fn melody_selection_falls_back_to_least_polyphonic() {
        let tracks = vec![chord_track(None), melody_track(None)];
        assert_eq!(select_melody(&tracks, "Melody"), Some(1));
    }
}
