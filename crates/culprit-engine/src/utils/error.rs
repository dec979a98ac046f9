//! Error types for the entire engine.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in commands and main.rs.
//!
//! Missing signals (no matched frame, empty corpus, unreachable collaborator)
//! are never errors: they degrade to a log-domain zero and a warning.

use thiserror::Error;

/// Programmer/configuration errors raised by the scoring engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Confidence ratio must be non-negative, got {0}")]
    InvalidRatio(f64),

    #[error("Weight and feature shapes disagree at key `{key}`")]
    WeightShapeMismatch { key: String },

    #[error("Invalid line range: start {start} is after end {end}")]
    InvalidLineRange { start: u32, end: u32 },

    #[error("Blame URLs do not match for {file}: {first:?} != {second:?}")]
    BlameUrlMismatch {
        file: String,
        first: Option<String>,
        second: Option<String>,
    },
}

/// Errors that can occur while loading engine configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors reported by external collaborators (repository, dependency
/// fetcher, inverted index)
#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while parsing crash and suspect input
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid crashed line spec: {0}")]
    InvalidLineSpec(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
