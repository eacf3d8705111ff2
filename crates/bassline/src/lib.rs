pub mod config;
pub mod emit;
pub mod grid;
pub mod harmony;
pub mod pipeline;
pub mod range;
pub mod select;
pub mod walk;

pub use config::{BasslineConfig, ConfigError};
pub use pipeline::{add_bassline, Outcome, SkipReason};
pub use range::project_into_range;
pub use select::{select_melody, select_track, simultaneity_score, SelectStrategy};
pub use walk::WalkState;
