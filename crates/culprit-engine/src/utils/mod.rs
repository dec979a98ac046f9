//! Utility modules for configuration, error handling, and path heuristics.

pub mod config;
pub mod error;
pub mod paths;

// Re-export commonly used error types for convenience
pub use error::{CollaboratorError, ConfigError, EngineError, OutputError, ParseError};
