//! Analyze command implementation.
//!
//! The analyze command:
//! 1. Loads engine configuration (or defaults)
//! 2. Reads the analysis input
//! 3. Serves the input's repository data through in-memory collaborators
//! 4. Builds the crash report and finds the culprit
//! 5. Writes the culprit JSON

use crate::collaborators::{InMemoryRepository, InvertedIndex, StaticDependencyFetcher};
use crate::commands::models::AnalyzeArgs;
use crate::model::{AnalysisInput, Culprit};
use crate::output::{read_analysis_input, render_terminal_summary, write_culprit};
use crate::ranking::{Collaborators, CulpritEngine};
use crate::utils::config::{load_config, EngineConfig};
use anyhow::{Context, Result};
use log::{debug, info};
use std::sync::Arc;
use std::time::Instant;

/// Execute the analyze command
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `args` - Analyze command arguments
///
/// # Returns
/// The culprit that was written to `args.output`
///
/// # Errors
/// * Config load or validation failures
/// * Input parsing errors
/// * Weight/feature shape mismatches
/// * File write errors
pub fn execute_analyze(args: AnalyzeArgs) -> Result<Culprit> {
    let start_time = Instant::now();

    info!("Starting analysis of {}", args.input.display());

    let config = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load engine config {}", path.display()))?,
        None => {
            debug!("No config given, using defaults");
            EngineConfig::default()
        }
    };

    let input = read_analysis_input(&args.input)
        .with_context(|| format!("Failed to read analysis input {}", args.input.display()))?;

    let culprit = run_analysis(input, config)?;

    write_culprit(&culprit, &args.output)
        .with_context(|| format!("Failed to write culprit to {}", args.output.display()))?;

    if args.print_summary {
        println!("{}", render_terminal_summary(&culprit));
    }

    info!(
        "Analysis complete in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    Ok(culprit)
}

/// Run the engine over a fully loaded input
///
/// # Errors
/// * Config validation failures
/// * Weight/feature shape mismatches or conflicting blame URLs
pub fn run_analysis(input: AnalysisInput, config: EngineConfig) -> Result<Culprit> {
    let collaborators = build_collaborators(&input, &config);
    let engine = CulpritEngine::new(config, collaborators).context("Invalid engine config")?;

    let AnalysisInput {
        crashed_version,
        signature,
        platform,
        stacktrace,
        regression_range,
        suspects,
        ..
    } = input;

    let report = engine.build_report(
        &crashed_version,
        &signature,
        &platform,
        stacktrace,
        regression_range,
    );

    let culprit = engine
        .find_culprit(&report, suspects)
        .context("Culprit analysis failed")?;

    Ok(culprit)
}

/// Serve the repository data bundled in an input
///
/// The ignore-list text, if any, is published at the configured
/// ignore-list location.
pub fn build_collaborators(input: &AnalysisInput, config: &EngineConfig) -> Collaborators {
    let mut repository = input
        .suspects
        .iter()
        .fold(InMemoryRepository::new(), |repository, suspect| {
            repository.with_change_log(suspect.changelog.clone())
        });
    for blame in &input.blames {
        repository = repository.with_blame(blame.clone());
    }
    if let (Some(text), Some((path, revision))) = (
        &input.ignore_list,
        config.filters.ignore_list_location(),
    ) {
        repository = repository.with_source(path, revision, text.clone());
    }

    let inverted_index = input
        .inverted_index
        .clone()
        .map(|index| Arc::new(index) as Arc<dyn InvertedIndex>);

    Collaborators {
        repository: Arc::new(repository),
        dependency_fetcher: Arc::new(StaticDependencyFetcher::new(
            input.dependencies.clone(),
            input.dependency_rolls.clone(),
        )),
        inverted_index,
    }
}

/// Validate analyze arguments
///
/// **Public** - can be called before execute_analyze for early validation
pub fn validate_args(args: &AnalyzeArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Input path cannot be empty");
    }

    if !args.input.exists() {
        anyhow::bail!("Input file does not exist: {}", args.input.display());
    }

    if let Some(config) = &args.config {
        if !config.exists() {
            anyhow::bail!("Config file does not exist: {}", config.display());
        }
    }

    if args.output.as_os_str().is_empty() {
        anyhow::bail!("Output path cannot be empty");
    }

    Ok(())
}
