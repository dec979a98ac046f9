//! Project and component classification of crashes and suspects.

pub mod component;
pub mod occurrence;
pub mod project;

pub use component::{ComponentClassifier, ComponentClassifierConfig, ComponentInfo};
pub use occurrence::{default_rank, rank_by_occurrence, Occurrence};
pub use project::{ProjectClassifier, ProjectClassifierConfig};

/// Number of top crash-stack frames consulted when no suspect is known
pub const DEFAULT_TOP_N: usize = 4;

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}
