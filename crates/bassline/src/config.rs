use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Knobs for one bass-generation pass.
///
/// Defaults match the Real Book lead-sheet exports this was built for:
/// a chord track named "Piano, Chords:", quarter-note bass in C1–C3 on
/// acoustic bass, with the chord line softened underneath.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BasslineConfig {
    /// Exact name prefix identifying the chord track.
    pub chord_track_prefix: String,
    /// Case-insensitive substring fallback for the chord track.
    pub chord_fuzzy: String,
    /// Beats per native beat: 1 = quarter notes, 2 = eighth notes.
    pub note_density: u32,
    /// Lowest admissible bass pitch.
    pub range_low: u8,
    /// Highest admissible bass pitch.
    pub range_high: u8,
    /// GM program for the generated bass track.
    pub bass_program: u8,
    /// Velocity for generated bass notes (1–127).
    pub bass_velocity: u8,
    /// Velocity scale applied to the chord track (0–1).
    pub chord_velocity_scale: f64,
    /// Reassign the melody track's program before generating.
    pub retarget_melody: bool,
    /// Case-insensitive substring identifying the melody track.
    pub melody_hint: String,
    /// GM program the melody is retargeted to.
    pub melody_program: u8,
}

impl Default for BasslineConfig {
    fn default() -> Self {
        Self {
            chord_track_prefix: "Piano, Chords:".to_string(),
            chord_fuzzy: "chords".to_string(),
            note_density: 1,
            range_low: 24,  // C1
            range_high: 48, // C3
            bass_program: 33,
            bass_velocity: 85,
            chord_velocity_scale: 0.7,
            retarget_melody: true,
            melody_hint: "Melody".to_string(),
            melody_program: 65,
        }
    }
}

impl BasslineConfig {
    /// Load from a TOML file; absent keys fall back to defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn defaults_match_lead_sheet_conventions() {
        let config = BasslineConfig::default();
        assert_eq!(config.chord_track_prefix, "Piano, Chords:");
        assert_eq!(config.note_density, 1);
        assert_eq!((config.range_low, config.range_high), (24, 48));
        assert_eq!(config.bass_velocity, 85);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "note_density = 2\nrange_high = 60").unwrap();

        let config = BasslineConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.note_density, 2);
        assert_eq!(config.range_high, 60);
        // untouched keys keep their defaults
        assert_eq!(config.chord_track_prefix, "Piano, Chords:");
        assert_eq!(config.bass_program, 33);
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "note_density = \"lots\"").unwrap();

        let err = BasslineConfig::from_toml_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err =
            BasslineConfig::from_toml_file(Path::new("/nonexistent/bassline.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }
}
