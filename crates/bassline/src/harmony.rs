use midi_score::Track;

/// Pitch classes sounding in the half-open window `[start, end)`.
///
/// A note counts when `note.start < end && note.end > start` (overlap,
/// not containment). Malformed notes (start >= end) are skipped.
/// Result is deduplicated and sorted ascending; empty means silence.
pub fn pitch_classes_in(track: &Track, start: f64, end: f64) -> Vec<u8> {
    let mut pcs: Vec<u8> = track
        .notes
        .iter()
        .filter(|n| !n.is_malformed() && n.start < end && n.end > start)
        .map(|n| n.pitch_class())
        .collect();
    pcs.sort_unstable();
    pcs.dedup();
    pcs
}

#[cfg(test)]
mod tests {
    use super::*;
    use midi_score::Note;
    use pretty_assertions::assert_eq;

    fn track(notes: Vec<(u8, f64, f64)>) -> Track {
        let mut track = Track::new(None, 0);
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

    #[test]
    fn overlap_is_half_open() {
        let t = track(vec![(60, 0.0, 1.0)]);

        // Note ending exactly at window start does not sound in it
        assert!(pitch_classes_in(&t, 1.0, 2.0).is_empty());
        // Note starting exactly at window end does not sound in it
        assert!(pitch_classes_in(&t, -1.0, 0.0).is_empty());
        // Any true overlap counts
        assert_eq!(pitch_classes_in(&t, 0.5, 1.5), vec![0]);
    }

    #[test]
    fn pitch_classes_deduplicated_and_sorted() {
        // C4, C5 (same class), G3, E4 all sounding together
        let t = track(vec![
            (60, 0.0, 1.0),
            (72, 0.0, 1.0),
            (55, 0.0, 1.0),
            (64, 0.0, 1.0),
        ]);
        assert_eq!(pitch_classes_in(&t, 0.0, 1.0), vec![0, 4, 7]);
    }

    #[test]
    fn malformed_notes_excluded() {
        let t = track(vec![(60, 0.5, 0.5), (64, 0.8, 0.2), (67, 0.0, 1.0)]);
        assert_eq!(pitch_classes_in(&t, 0.0, 1.0), vec![7]);
    }

    #[test]
    fn silence_is_an_empty_set() {
        let t = track(vec![(60, 0.0, 1.0)]);
        assert!(pitch_classes_in(&t, 2.0, 3.0).is_empty());
    }
}
