use crate::note::{Score, Track};
use crate::timeline::TempoMap;

impl Score {
    /// Serialize the score to Standard MIDI File format 1 bytes.
    ///
    /// Track 0 carries the tempo map and time signatures; each score
    /// track becomes one MTrk with its name, program change, and note
    /// events. Note times are converted back to ticks through the
    /// tempo map, so a parse → serialize → parse round trip reproduces
    /// note timing to within half a tick.
    pub fn to_midi_bytes(&self) -> Vec<u8> {
        let tempo_map = self.tempo_map();

        let mut tracks: Vec<Vec<u8>> = Vec::new();
        tracks.push(build_tempo_track(self));

        // Assign channels sequentially, reserving 9 for percussion
        let mut channel_alloc = 0u8;
        for track in &self.tracks {
            let channel = if track.is_percussion {
                9
            } else {
                if channel_alloc == 9 {
                    channel_alloc += 1;
                }
                let ch = channel_alloc.min(15);
                channel_alloc = channel_alloc.saturating_add(1);
                ch
            };
            tracks.push(build_note_track(track, channel, &tempo_map));
        }

        build_midi_file(self.ppq, &tracks)
    }
}

/// Build the tempo/time-signature track.
fn build_tempo_track(score: &Score) -> Vec<u8> {
    let mut events: Vec<(u64, Vec<u8>)> = Vec::new();

    for tc in &score.timeline.tempo_changes {
        let usec = tc.microseconds_per_beat;
        events.push((
            tc.tick,
            vec![
                0xFF,
                0x51,
                0x03,
                (usec >> 16) as u8,
                (usec >> 8) as u8,
                usec as u8,
            ],
        ));
    }

    for ts in &score.timeline.time_signatures {
        let denom_pow = (ts.denominator as f64).log2() as u8;
        events.push((
            ts.tick,
            vec![0xFF, 0x58, 0x04, ts.numerator, denom_pow, 0x18, 0x08],
        ));
    }

    // If no tempo was provided, emit default 120 BPM
    if score.timeline.tempo_changes.is_empty() {
        let usec: u32 = 500_000;
        events.push((
            0,
            vec![
                0xFF,
                0x51,
                0x03,
                (usec >> 16) as u8,
                (usec >> 8) as u8,
                usec as u8,
            ],
        ));
    }

    events.sort_by_key(|(tick, _)| *tick);
    assemble_track(events)
}

/// Build one MTrk for a score track.
fn build_note_track(track: &Track, channel: u8, tempo_map: &TempoMap) -> Vec<u8> {
    let mut events: Vec<(u64, Vec<u8>)> = Vec::new();

    if let Some(name) = &track.name {
        let name_bytes = name.as_bytes();
        let mut name_event = vec![0xFF, 0x03];
        write_vlq(&mut name_event, name_bytes.len() as u32);
        name_event.extend_from_slice(name_bytes);
        events.push((0, name_event));
    }

    events.push((0, vec![0xC0 | (channel & 0x0F), track.program & 0x7F]));

    for note in &track.notes {
        let onset = tempo_map.seconds_to_tick(note.start);
        let offset = tempo_map.seconds_to_tick(note.end);
        events.push((
            onset,
            vec![
                0x90 | (channel & 0x0F),
                note.pitch & 0x7F,
                note.velocity.min(127),
            ],
        ));
        events.push((offset, vec![0x80 | (channel & 0x0F), note.pitch & 0x7F, 0]));
    }

    // Sort by tick, with note-offs before note-ons at the same tick
    events.sort_by(|a, b| {
        a.0.cmp(&b.0).then_with(|| {
            let a_is_off = a.1.first().is_some_and(|b| b & 0xF0 == 0x80);
            let b_is_off = b.1.first().is_some_and(|b| b & 0xF0 == 0x80);
            b_is_off.cmp(&a_is_off) // note-offs first
        })
    });

    assemble_track(events)
}

/// Delta-encode sorted (tick, event) pairs and append end-of-track.
fn assemble_track(events: Vec<(u64, Vec<u8>)>) -> Vec<u8> {
    let mut track_data = Vec::new();
    let mut last_tick = 0u64;

    for (tick, data) in events {
        let delta = tick.saturating_sub(last_tick);
        write_vlq(&mut track_data, delta as u32);
        track_data.extend_from_slice(&data);
        last_tick = tick;
    }

    write_vlq(&mut track_data, 0);
    track_data.extend_from_slice(&[0xFF, 0x2F, 0x00]);

    track_data
}

/// Assemble a complete MIDI file from track data blobs.
fn build_midi_file(ppq: u16, tracks: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = Vec::new();

    buf.extend_from_slice(b"MThd");
    buf.extend_from_slice(&6u32.to_be_bytes());
    buf.extend_from_slice(&1u16.to_be_bytes()); // format 1
    buf.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    buf.extend_from_slice(&ppq.to_be_bytes());

    for track_data in tracks {
        buf.extend_from_slice(b"MTrk");
        buf.extend_from_slice(&(track_data.len() as u32).to_be_bytes());
        buf.extend_from_slice(track_data);
    }

    buf
}

/// Write a variable-length quantity to a byte buffer.
fn write_vlq(buf: &mut Vec<u8>, mut value: u32) {
    if value == 0 {
        buf.push(0);
        return;
    }

    let mut bytes = Vec::new();
    bytes.push((value & 0x7F) as u8);
    value >>= 7;

    while value > 0 {
        bytes.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }

    bytes.reverse();
    buf.extend_from_slice(&bytes);
}
