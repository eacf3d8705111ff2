use serde::{Deserialize, Serialize};

use crate::timeline::{TempoMap, Timeline};

/// A single note with absolute wall-clock timing.
///
/// Times are in seconds, derived from the score's tempo map. A note
/// with `start >= end` is malformed; it is kept in the model but
/// excluded wherever overlap queries run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub pitch: u8,
    pub start: f64,
    pub end: f64,
    pub velocity: u8,
}

impl Note {
    /// Pitch class 0–11 (C=0).
    pub fn pitch_class(&self) -> u8 {
        self.pitch % 12
    }

    pub fn is_malformed(&self) -> bool {
        self.start >= self.end
    }
}

/// One instrument track: display name, GM program, and its notes in
/// onset order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub name: Option<String>,
    pub program: u8,
    pub is_percussion: bool,
    pub notes: Vec<Note>,
}

impl Track {
    pub fn new(name: Option<String>, program: u8) -> Self {
        Self {
            name,
            program,
            is_percussion: false,
            notes: Vec::new(),
        }
    }

    /// Time span from earliest note start to latest note end, or `None`
    /// for an empty track.
    pub fn note_span(&self) -> Option<(f64, f64)> {
        if self.notes.is_empty() {
            return None;
        }
        let start = self.notes.iter().map(|n| n.start).fold(f64::INFINITY, f64::min);
        let end = self.notes.iter().map(|n| n.end).fold(f64::NEG_INFINITY, f64::max);
        Some((start, end))
    }
}

/// An ordered collection of tracks plus the tempo/meter timeline they
/// share.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Score {
    pub tracks: Vec<Track>,
    pub timeline: Timeline,
    pub ppq: u16,
}

impl Score {
    pub fn tempo_map(&self) -> TempoMap {
        TempoMap::new(self.ppq, &self.timeline.tempo_changes)
    }

    /// Native beat boundaries in seconds, per the timeline's tempo and
    /// meter maps.
    pub fn beat_seconds(&self) -> Vec<f64> {
        let map = self.tempo_map();
        self.timeline
            .beat_ticks(self.ppq)
            .into_iter()
            .map(|t| map.tick_to_seconds(t))
            .collect()
    }

    /// Bar-start (downbeat) boundaries in seconds.
    pub fn downbeat_seconds(&self) -> Vec<f64> {
        let map = self.tempo_map();
        self.timeline
            .downbeat_ticks(self.ppq)
            .into_iter()
            .map(|t| map.tick_to_seconds(t))
            .collect()
    }
}
