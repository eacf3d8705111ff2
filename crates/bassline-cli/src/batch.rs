use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bassline::{add_bassline, BasslineConfig, SkipReason};
use midi_score::Score;
use serde::Serialize;
use tracing::{info, warn};

/// Per-file entry in the batch report.
#[derive(Debug, Serialize)]
pub struct FileReport {
    pub file: String,
    pub bass_notes_added: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of one batch run.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
    pub processed: usize,
    pub failed: usize,
    pub total_bass_notes: usize,
}

/// Collect MIDI inputs: the path itself when it is a file, otherwise
/// every `.mid`/`.midi` directly inside the directory, sorted by name.
pub fn discover_inputs(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let entries = std::fs::read_dir(input)
        .with_context(|| format!("reading input directory {}", input.display()))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("mid") || e.eq_ignore_ascii_case("midi"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Output path for one input: `<out_dir>/<stem>_with_bass.mid`.
///
/// Stems are unique per input file, so a batch never collides with
/// itself in the shared output directory.
pub fn output_path(input: &Path, out_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled");
    out_dir.join(format!("{stem}_with_bass.mid"))
}

/// Process every input sequentially. A file that fails to read, parse,
/// or write is reported and skipped; it never aborts the rest of the
/// batch.
pub fn run_batch(inputs: &[PathBuf], out_dir: &Path, config: &BasslineConfig) -> BatchReport {
    let mut files = Vec::with_capacity(inputs.len());
    let mut processed = 0;
    let mut failed = 0;
    let mut total_bass_notes = 0;

    for input in inputs {
        let display_path = input.display().to_string();
        match process_file(input, out_dir, config) {
            Ok(outcome) => {
                info!(
                    file = %display_path,
                    notes = outcome.bass_notes_added,
                    skipped = ?outcome.skipped,
                    "done"
                );
                processed += 1;
                total_bass_notes += outcome.bass_notes_added;
                files.push(FileReport {
                    file: display_path,
                    bass_notes_added: outcome.bass_notes_added,
                    skipped: outcome.skipped,
                    error: None,
                });
            }
            Err(e) => {
                warn!(file = %display_path, error = %e, "skipping file");
                failed += 1;
                files.push(FileReport {
                    file: display_path,
                    bass_notes_added: 0,
                    skipped: None,
                    error: Some(format!("{e:#}")),
                });
            }
        }
    }

    BatchReport {
        files,
        processed,
        failed,
        total_bass_notes,
    }
}

fn process_file(
    input: &Path,
    out_dir: &Path,
    config: &BasslineConfig,
) -> Result<bassline::Outcome> {
    let bytes =
        std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let mut score =
        Score::parse(&bytes).with_context(|| format!("parsing {}", input.display()))?;

    let outcome = add_bassline(&mut score, config);

    let out_path = output_path(input, out_dir);
    std::fs::write(&out_path, score.to_midi_bytes())
        .with_context(|| format!("writing {}", out_path.display()))?;

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use midi_score::{Note, TempoChange, TimeSignature, Timeline, Track};
    use pretty_assertions::assert_eq;

    /// Four beats of a held C major triad on a named chord track.
    fn test_score_bytes() -> Vec<u8> {
        let mut chords = Track::new(Some("Piano, Chords:".into()), 0);
        for pitch in [60u8, 64, 67] {
            chords.notes.push(Note {
                pitch,
                start: 0.0,
                end: 2.0,
                velocity: 100,
            });
        }

        Score {
            tracks: vec![chords],
            timeline: Timeline {
                tempo_changes: vec![TempoChange {
                    tick: 0,
                    microseconds_per_beat: 500_000,
                    bpm: 120.0,
                }],
                time_signatures: vec![TimeSignature {
                    tick: 0,
                    numerator: 4,
                    denominator: 4,
                }],
                total_ticks: 1920,
            },
            ppq: 480,
        }
        .to_midi_bytes()
    }

    #[test]
    fn discovers_only_midi_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.mid", "a.midi", "notes.txt", "c.MID"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let inputs = discover_inputs(dir.path()).unwrap();
        let names: Vec<String> = inputs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.midi", "b.mid", "c.MID"]);
    }

    #[test]
    fn single_file_input_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("song.mid");
        std::fs::write(&file, b"x").unwrap();

        assert_eq!(discover_inputs(&file).unwrap(), vec![file]);
    }

    #[test]
    fn output_names_derive_from_input_stem() {
        let out = output_path(Path::new("/in/openbook-7.midi"), Path::new("/out"));
        assert_eq!(out, PathBuf::from("/out/openbook-7_with_bass.mid"));
    }

    #[test]
    fn batch_survives_a_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();

        std::fs::write(dir.path().join("good.mid"), test_score_bytes()).unwrap();
        std::fs::write(dir.path().join("bad.mid"), b"not a midi file").unwrap();

        let inputs = discover_inputs(dir.path()).unwrap();
        let config = BasslineConfig {
            retarget_melody: false,
            ..BasslineConfig::default()
        };
        let report = run_batch(&inputs, out.path(), &config);

        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 1);
        assert!(report.total_bass_notes > 0);
        assert!(out.path().join("good_with_bass.mid").exists());
        assert!(!out.path().join("bad_with_bass.mid").exists());
    }

    #[test]
    fn processed_output_parses_and_contains_bass() {
        let dir = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("song.mid"), test_score_bytes()).unwrap();

        let config = BasslineConfig {
            retarget_melody: false,
            ..BasslineConfig::default()
        };
        let report = run_batch(&discover_inputs(dir.path()).unwrap(), out.path(), &config);
        assert_eq!(report.failed, 0);

        let bytes = std::fs::read(out.path().join("song_with_bass.mid")).unwrap();
        let score = Score::parse(&bytes).unwrap();
        assert!(score
            .tracks
            .iter()
            .any(|t| t.name.as_deref() == Some("Walking Bass (auto)")));
    }
}
