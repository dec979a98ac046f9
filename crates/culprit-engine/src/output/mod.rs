//! Output writers for culprit reports.
//!
//! This module handles:
//! - JSON culprit reports (and reading analysis input)
//! - Text summaries for the terminal

pub mod json;
pub mod summary;

// Re-export main functions
pub use json::{read_analysis_input, read_culprit_report, write_culprit, CulpritReport};
pub use summary::render_terminal_summary;

use crate::utils::error::OutputError;
use std::path::Path;

/// Common path validation for output files
pub fn validate_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.exists() && path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}
