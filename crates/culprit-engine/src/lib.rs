//! Culprit Engine library
//!
//! Attributes a crash to the changelist most likely responsible for it.
//! Given a parsed stacktrace, a regression range and the candidate
//! changelists ("suspects") that landed in that range, the engine scores
//! every suspect with a log-linear model over crash/suspect features,
//! filters and ranks them, and classifies the suspected project and
//! components.
//!
//! Most users should go through the `culprit` CLI:
//!
//! ```bash
//! culprit analyze --input crash.json --config engine.toml --summary
//! ```

pub mod classifier;
pub mod collaborators;
pub mod commands;
pub mod dependency;
pub mod feature;
pub mod filters;
pub mod matcher;
pub mod model;
pub mod output;
pub mod ranking;
pub mod stacktrace;
pub mod utils;
pub mod weight;
