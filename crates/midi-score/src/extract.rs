use std::collections::HashMap;

use midly::{MetaMessage, MidiMessage, Smf, TrackEventKind};

use crate::note::{Note, Score, Track};
use crate::timeline::{TempoChange, TempoMap, TimeSignature, Timeline};
use crate::{Result, ScoreError};

/// A note still in ticks, before tempo-map conversion.
struct TickNote {
    onset_tick: u64,
    offset_tick: u64,
    pitch: u8,
    velocity: u8,
}

impl Score {
    /// Parse Standard MIDI File bytes into a score.
    ///
    /// Note-on/note-off events are paired per (channel, pitch) with a
    /// stack so overlapping re-strikes of the same key resolve in LIFO
    /// order; a vel=0 note-on counts as a note-off. Notes left open at
    /// the end of a track are closed at its final tick. Tempo and
    /// time-signature events from all tracks are merged, sorted, and
    /// deduplicated (format-1 files may repeat them per track).
    pub fn parse(bytes: &[u8]) -> Result<Score> {
        let smf = Smf::parse(bytes).map_err(|e| ScoreError::Parse(e.to_string()))?;

        let ppq = match smf.header.timing {
            midly::Timing::Metrical(ticks) => ticks.as_int(),
            midly::Timing::Timecode(_, _) => 480,
        };

        let mut tempo_changes = Vec::new();
        let mut time_signatures = Vec::new();
        let mut total_ticks: u64 = 0;
        let mut raw_tracks: Vec<(Option<String>, u8, bool, Vec<TickNote>)> = Vec::new();

        for track in &smf.tracks {
            let mut current_tick: u64 = 0;
            let mut name: Option<String> = None;
            let mut program: Option<u8> = None;
            let mut channels: Vec<u8> = Vec::new();
            let mut notes: Vec<TickNote> = Vec::new();
            let mut pending: HashMap<(u8, u8), Vec<(u64, u8)>> = HashMap::new();

            for event in track {
                current_tick += event.delta.as_int() as u64;

                match event.kind {
                    TrackEventKind::Meta(MetaMessage::TrackName(bytes)) => {
                        name = String::from_utf8(bytes.to_vec()).ok();
                    }
                    TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => {
                        let usec = tempo.as_int();
                        tempo_changes.push(TempoChange {
                            tick: current_tick,
                            microseconds_per_beat: usec,
                            bpm: 60_000_000.0 / usec as f64,
                        });
                    }
                    TrackEventKind::Meta(MetaMessage::TimeSignature(num, denom_pow, _, _)) => {
                        time_signatures.push(TimeSignature {
                            tick: current_tick,
                            numerator: num,
                            denominator: 1u8 << denom_pow,
                        });
                    }
                    TrackEventKind::Midi { channel, message } => {
                        let ch = channel.as_int();
                        if !channels.contains(&ch) {
                            channels.push(ch);
                        }
                        match message {
                            MidiMessage::ProgramChange { program: p } => {
                                if program.is_none() {
                                    program = Some(p.as_int());
                                }
                            }
                            MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                                pending
                                    .entry((ch, key.as_int()))
                                    .or_default()
                                    .push((current_tick, vel.as_int()));
                            }
                            MidiMessage::NoteOff { key, .. }
                            | MidiMessage::NoteOn { key, .. } => {
                                // vel=0 NoteOn is NoteOff
                                if let Some(stack) = pending.get_mut(&(ch, key.as_int())) {
                                    if let Some((onset, velocity)) = stack.pop() {
                                        notes.push(TickNote {
                                            onset_tick: onset,
                                            offset_tick: current_tick,
                                            pitch: key.as_int(),
                                            velocity,
                                        });
                                    }
                                }
                            }
                            _ => {}
                        }
                    }
                    _ => {}
                }

                total_ticks = total_ticks.max(current_tick);
            }

            // Close any unclosed notes at the track's final tick
            for ((_, pitch), stack) in &pending {
                for &(onset, velocity) in stack {
                    notes.push(TickNote {
                        onset_tick: onset,
                        offset_tick: current_tick,
                        pitch: *pitch,
                        velocity,
                    });
                }
            }

            // Sort by onset, then pitch for determinism
            notes.sort_by(|a, b| {
                a.onset_tick
                    .cmp(&b.onset_tick)
                    .then(a.pitch.cmp(&b.pitch))
            });

            let is_percussion = channels.contains(&9);
            raw_tracks.push((name, program.unwrap_or(0), is_percussion, notes));
        }

        tempo_changes.sort_by_key(|t| t.tick);
        tempo_changes
            .dedup_by(|a, b| a.tick == b.tick && a.microseconds_per_beat == b.microseconds_per_beat);

        time_signatures.sort_by_key(|t| t.tick);
        time_signatures.dedup_by(|a, b| a.tick == b.tick);

        let timeline = Timeline {
            tempo_changes,
            time_signatures,
            total_ticks,
        };
        let tempo_map = TempoMap::new(ppq, &timeline.tempo_changes);

        let tracks = raw_tracks
            .into_iter()
            .map(|(name, program, is_percussion, tick_notes)| Track {
                name,
                program,
                is_percussion,
                notes: tick_notes
                    .into_iter()
                    .map(|n| Note {
                        pitch: n.pitch,
                        start: tempo_map.tick_to_seconds(n.onset_tick),
                        end: tempo_map.tick_to_seconds(n.offset_tick),
                        velocity: n.velocity,
                    })
                    .collect(),
            })
            .collect();

        Ok(Score {
            tracks,
            timeline,
            ppq,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::test_midi;
    use crate::Score;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_names_programs_and_notes() {
        let bytes = test_midi::build(&[(
            Some("Piano, Chords:"),
            0,
            &[(60, 0, 480), (64, 0, 480), (67, 0, 480)],
        )]);

        let score = Score::parse(&bytes).unwrap();
        assert_eq!(score.ppq, 480);
        assert_eq!(score.tracks.len(), 2);

        let chords = &score.tracks[1];
        assert_eq!(chords.name.as_deref(), Some("Piano, Chords:"));
        assert_eq!(chords.program, 0);
        assert_eq!(chords.notes.len(), 3);

        // 480 ticks at 120 BPM = 0.5 seconds
        assert!((chords.notes[0].start - 0.0).abs() < 1e-9);
        assert!((chords.notes[0].end - 0.5).abs() < 1e-9);
    }

    #[test]
    fn parse_collects_timeline() {
        let bytes = test_midi::build(&[(None, 0, &[(60, 0, 960)])]);
        let score = Score::parse(&bytes).unwrap();

        assert_eq!(score.timeline.tempo_changes.len(), 1);
        assert!((score.timeline.tempo_changes[0].bpm - 120.0).abs() < 0.1);
        assert_eq!(score.timeline.time_signatures.len(), 1);
        assert_eq!(score.timeline.time_signatures[0].numerator, 4);
        assert_eq!(score.timeline.time_signatures[0].denominator, 4);
        assert_eq!(score.timeline.total_ticks, 960);
    }

    #[test]
    fn notes_sorted_by_onset_then_pitch() {
        let bytes = test_midi::build(&[(None, 0, &[(67, 0, 480), (60, 0, 480), (64, 480, 960)])]);
        let score = Score::parse(&bytes).unwrap();

        let pitches: Vec<u8> = score.tracks[1].notes.iter().map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![60, 67, 64]);
    }

    #[test]
    fn garbage_bytes_are_a_parse_error() {
        assert!(Score::parse(b"not a midi file").is_err());
    }
}
