//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands wire the in-memory collaborators to the engine and handle I/O.

pub mod analyze;
pub mod models;
pub mod utils;

// Re-export main command functions
pub use analyze::{build_collaborators, execute_analyze, run_analysis, validate_args};
pub use models::AnalyzeArgs;
pub use utils::{display_schema, display_version, validate_config_file, validate_input_file};
