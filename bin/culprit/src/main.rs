//! Culprit CLI
//!
//! Attributes a crash to the changelists most likely responsible for it.
//! Reads a self-contained analysis input and writes a ranked culprit report.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use culprit_engine::commands::{
    display_schema, display_version, execute_analyze, validate_args, validate_config_file,
    validate_input_file, AnalyzeArgs,
};

/// Culprit - crash culprit attribution
#[derive(Parser, Debug)]
#[command(name = "culprit")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a crash and rank suspected changelists
    Analyze {
        /// Path to analysis input JSON
        #[arg(short, long)]
        input: PathBuf,

        /// Engine configuration file (TOML)
        #[arg(short, long, env = "CULPRIT_CONFIG")]
        config: Option<PathBuf>,

        /// Output path for culprit JSON (placed in artifacts/ by default)
        #[arg(short, long, default_value = "artifacts/culprit.json")]
        output: PathBuf,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Validate an analysis input or engine config file
    Validate {
        /// Path to analysis input JSON
        #[arg(short, long, required_unless_present = "config")]
        file: Option<PathBuf>,

        /// Path to engine config TOML
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Display report schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Analyze {
            input,
            config,
            mut output,
            summary,
        } => {
            // Ensure output goes to artifacts/ if no directory is specified
            if output.parent().map(|p| p.as_os_str().is_empty()).unwrap_or(true) {
                output = PathBuf::from("artifacts").join(output);
            }

            let args = AnalyzeArgs {
                input,
                config,
                output,
                print_summary: summary,
            };

            // Validate args first
            validate_args(&args)?;

            execute_analyze(args)?;
        }

        Commands::Validate { file, config } => {
            if let Some(file) = file {
                validate_input_file(file)?;
            }
            if let Some(config) = config {
                validate_config_file(config)?;
            }
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
