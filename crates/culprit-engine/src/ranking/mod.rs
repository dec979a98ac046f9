//! Suspect scoring and the end-to-end culprit pipeline.

pub mod engine;
pub mod model;

pub use engine::{default_meta_feature, Collaborators, CulpritEngine};
pub use model::{LogLinearModel, PreparedModel};
