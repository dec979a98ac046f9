use crate::output::read_analysis_input;
use crate::utils::config::{load_config, SCHEMA_VERSION};
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Validate an analysis input JSON file
pub fn validate_input_file(file_path: PathBuf) -> Result<()> {
    println!("Validating analysis input: {}", file_path.display());

    let input = read_analysis_input(&file_path)
        .with_context(|| format!("Invalid analysis input {}", file_path.display()))?;

    println!("✓ Valid analysis input");
    println!("  Crashed version: {}", input.crashed_version);
    println!("  Signature: {}", input.signature);
    println!("  Call stacks: {}", input.stacktrace.len());
    println!("  Suspects: {}", input.suspects.len());
    match &input.regression_range {
        Some((good, bad)) => println!("  Regression range: {} .. {}", good, bad),
        None => println!("  Regression range: none"),
    }

    Ok(())
}

/// Validate an engine configuration TOML file
pub fn validate_config_file(file_path: PathBuf) -> Result<()> {
    println!("Validating engine config: {}", file_path.display());

    let config = load_config(&file_path)
        .with_context(|| format!("Invalid engine config {}", file_path.display()))?;

    println!("✓ Valid engine config");
    println!("  Top-level weights: {}", config.weights.len());
    println!("  Confidence ratio: {}", config.filters.confidence_ratio);
    println!("  Top N suspects: {}", config.top_n_suspects);
    println!(
        "  Project classifier: {}",
        if config.project_classifier.is_some() { "configured" } else { "none" }
    );
    println!(
        "  Component classifier: {}",
        if config.component_classifier.is_some() { "configured" } else { "none" }
    );

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("Culprit Report Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string              - Schema version (e.g., '1.0.0')");
        println!("  generated_at: string         - ISO 8601 timestamp");
        println!("  result: object");
        println!("    found: bool                - Anything was attributed");
        println!("    regression_range: array?   - [last good, first bad]");
        println!("    suspected_project: string? - Most suspected project");
        println!("    suspected_components: array? - Most suspected components");
        println!("    suspected_cls: array?      - Ranked suspects");
        println!("      revision, url, review_url?, project_path, author, time");
        println!("      reasons: array           - Per-feature explanations");
        println!("      changed_files: array     - file, blame_url?, info");
        println!("      confidence: number       - Linear-domain confidence");
        println!("  tags: object");
        println!("    found_suspects, has_regression_range, found_project,");
        println!("    found_components: bool; solution: string");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("Culprit v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Crash culprit attribution for stacktraces and regression ranges.");
}
