use serde::{Deserialize, Serialize};

/// A tempo event on the shared timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempoChange {
    pub tick: u64,
    pub microseconds_per_beat: u32,
    pub bpm: f64,
}

/// A meter (time signature) event on the shared timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub tick: u64,
    pub numerator: u8,
    pub denominator: u8,
}

/// Tempo and meter maps for a score, in absolute ticks.
///
/// Events are kept sorted by tick and deduplicated at parse time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timeline {
    pub tempo_changes: Vec<TempoChange>,
    pub time_signatures: Vec<TimeSignature>,
    pub total_ticks: u64,
}

impl Timeline {
    /// Native beat boundaries in ticks.
    ///
    /// Beat length follows the active meter: whole-note / denominator,
    /// so 4/4 yields quarter-note beats and 2/2 yields half-note
    /// beats. Beats restart at each meter change. Scores without a
    /// meter event are treated as 4/4.
    pub fn beat_ticks(&self, ppq: u16) -> Vec<u64> {
        self.boundary_ticks(ppq, false)
    }

    /// Bar-start (downbeat) boundaries in ticks.
    pub fn downbeat_ticks(&self, ppq: u16) -> Vec<u64> {
        self.boundary_ticks(ppq, true)
    }

    fn boundary_ticks(&self, ppq: u16, bars: bool) -> Vec<u64> {
        if self.total_ticks == 0 || ppq == 0 {
            return Vec::new();
        }

        // Meter segments as (start_tick, numerator, denominator),
        // with an implicit 4/4 before the first declared meter.
        let mut segments: Vec<(u64, u8, u8)> = Vec::new();
        if self.time_signatures.first().map_or(true, |ts| ts.tick > 0) {
            segments.push((0, 4, 4));
        }
        for ts in &self.time_signatures {
            segments.push((ts.tick, ts.numerator, ts.denominator));
        }

        let mut out = Vec::new();
        for (i, &(start, num, den)) in segments.iter().enumerate() {
            let seg_end = segments
                .get(i + 1)
                .map(|s| s.0)
                .unwrap_or(self.total_ticks);
            if den == 0 {
                continue;
            }
            let beat_len = (ppq as u64 * 4) / den as u64;
            if beat_len == 0 {
                continue;
            }
            let step = if bars {
                beat_len * num.max(1) as u64
            } else {
                beat_len
            };

            let mut tick = start;
            while tick < seg_end {
                out.push(tick);
                tick += step;
            }
        }

        out.dedup();
        out
    }
}

#[derive(Debug, Clone, Copy)]
struct TempoSegment {
    start_tick: u64,
    start_seconds: f64,
    seconds_per_tick: f64,
}

/// Piecewise-linear tick ↔ seconds conversion over the tempo map.
///
/// A score without tempo events runs at the MIDI default of 120 BPM.
#[derive(Debug, Clone)]
pub struct TempoMap {
    segments: Vec<TempoSegment>,
}

const DEFAULT_USEC_PER_BEAT: f64 = 500_000.0;

impl TempoMap {
    /// Build from tempo changes sorted by tick.
    pub fn new(ppq: u16, tempo_changes: &[TempoChange]) -> Self {
        let ticks_per_beat = ppq.max(1) as f64;
        let mut segments = Vec::with_capacity(tempo_changes.len() + 1);

        let mut current = TempoSegment {
            start_tick: 0,
            start_seconds: 0.0,
            seconds_per_tick: DEFAULT_USEC_PER_BEAT / 1_000_000.0 / ticks_per_beat,
        };

        for tc in tempo_changes {
            let seconds_per_tick =
                tc.microseconds_per_beat as f64 / 1_000_000.0 / ticks_per_beat;
            if tc.tick <= current.start_tick {
                current.seconds_per_tick = seconds_per_tick;
                continue;
            }
            let elapsed =
                (tc.tick - current.start_tick) as f64 * current.seconds_per_tick;
            let next = TempoSegment {
                start_tick: tc.tick,
                start_seconds: current.start_seconds + elapsed,
                seconds_per_tick,
            };
            segments.push(current);
            current = next;
        }
        segments.push(current);

        Self { segments }
    }

    pub fn tick_to_seconds(&self, tick: u64) -> f64 {
        let idx = self
            .segments
            .partition_point(|s| s.start_tick <= tick)
            .saturating_sub(1);
        let seg = &self.segments[idx];
        seg.start_seconds + (tick.saturating_sub(seg.start_tick)) as f64 * seg.seconds_per_tick
    }

    pub fn seconds_to_tick(&self, seconds: f64) -> u64 {
        let idx = self
            .segments
            .partition_point(|s| s.start_seconds <= seconds)
            .saturating_sub(1);
        let seg = &self.segments[idx];
        let delta = (seconds - seg.start_seconds).max(0.0) / seg.seconds_per_tick;
        seg.start_tick + delta.round() as u64
    }
}
