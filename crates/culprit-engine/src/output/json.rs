//! JSON culprit output writer and analysis input reader.

use crate::model::{AnalysisInput, Culprit, CulpritResult, CulpritTags};
use crate::utils::config::SCHEMA_VERSION;
use crate::utils::error::{OutputError, ParseError};
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// The `(result, tags)` pair as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CulpritReport {
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub result: CulpritResult,
    pub tags: CulpritTags,
}

impl CulpritReport {
    pub fn new(culprit: &Culprit) -> Self {
        let (result, tags) = culprit.to_dicts();
        Self {
            version: SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            result,
            tags,
        }
    }
}

/// Write a culprit to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Arguments
/// * `culprit` - Analysis result to write
/// * `output_path` - Path to output JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_culprit(culprit: &Culprit, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing culprit to: {}", output_path.display());

    super::validate_path(output_path)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, &CulpritReport::new(culprit))
        .map_err(OutputError::SerializationFailed)?;

    info!(
        "Culprit written successfully ({} bytes)",
        calculate_file_size(output_path)
    );

    Ok(())
}

/// **Private** - internal utility
fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Read a written culprit report back
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_culprit_report(input_path: impl AsRef<Path>) -> Result<CulpritReport, OutputError> {
    let input_path = input_path.as_ref();
    debug!("Reading culprit report from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let report = serde_json::from_reader(BufReader::new(file))
        .map_err(OutputError::SerializationFailed)?;
    Ok(report)
}

/// Read an analysis input file
///
/// # Errors
/// * `ParseError::IoError` - File cannot be read
/// * `ParseError::JsonError` - Malformed JSON or unknown fields
pub fn read_analysis_input(input_path: impl AsRef<Path>) -> Result<AnalysisInput, ParseError> {
    let input_path = input_path.as_ref();
    debug!("Reading analysis input from: {}", input_path.display());

    let file = File::open(input_path)?;
    let input: AnalysisInput = serde_json::from_reader(BufReader::new(file))?;

    debug!(
        "Input loaded: {} stack(s), {} suspect(s)",
        input.stacktrace.len(),
        input.suspects.len()
    );

    Ok(input)
}
