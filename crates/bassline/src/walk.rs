/// Ping-pong traversal state over the tones of the active chord.
///
/// One instance is owned per score and threaded through a strictly
/// sequential pass over the beat windows; the state after beat *n*
/// feeds beat *n+1*.
#[derive(Debug, Clone)]
pub struct WalkState {
    /// Pitch-class set of the chord currently being walked.
    active_set: Option<Vec<u8>>,
    /// Chord tones in ascending order.
    order: Vec<u8>,
    /// Current position in `order`.
    index: usize,
    /// Traversal direction for the next advance.
    ascending: bool,
    /// Previously emitted concrete pitch, for range projection.
    pub last_pitch: Option<u8>,
}

impl WalkState {
    pub fn new() -> Self {
        Self {
            active_set: None,
            order: Vec::new(),
            index: 0,
            ascending: true,
            last_pitch: None,
        }
    }

    /// Process one beat's observation and return the pitch class to
    /// play, or `None` to stay silent.
    ///
    /// `observed` must be sorted ascending and deduplicated (as
    /// produced by the harmony extractor), so set equality reduces to
    /// slice equality.
    ///
    /// Silence before any chord has sounded skips the beat. Silence
    /// after a chord sustains it: the walk keeps stepping through the
    /// held chord tones. A changed non-empty set resets the walk to
    /// the bottom of the new chord, ascending.
    pub fn step(&mut self, observed: &[u8]) -> Option<u8> {
        if observed.is_empty() {
            // Sustain the held chord through silence; skip if nothing
            // has ever sounded.
            if self.active_set.is_none() {
                return None;
            }
        } else if self.active_set.as_deref() != Some(observed) {
            self.order = observed.to_vec();
            self.index = 0;
            self.ascending = true;
            self.active_set = Some(observed.to_vec());
        }

        let selected = self.order[self.index];
        self.advance();
        Some(selected)
    }

    /// Ping-pong advance: bounce at the ends instead of wrapping, so
    /// the top and bottom tones are never repeated (except for a
    /// single-tone chord, which stays pinned).
    fn advance(&mut self) {
        if self.ascending {
            if self.index + 1 < self.order.len() {
                self.index += 1;
            } else {
                self.ascending = false;
                if self.order.len() > 1 {
                    self.index -= 1;
                }
            }
        } else if self.index > 0 {
            self.index -= 1;
        } else {
            self.ascending = true;
            if self.order.len() > 1 {
                self.index += 1;
            }
        }
    }
}

impl Default for WalkState {
    fn default() -> Self {
        Self::new()
    }
}
