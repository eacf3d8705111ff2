pub mod extract;
pub mod note;
pub mod timeline;
pub mod writer;

pub use note::{Note, Score, Track};
pub use timeline::{TempoChange, TempoMap, TimeSignature, Timeline};

/// Errors from score parsing.
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    #[error("MIDI parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, ScoreError>;
