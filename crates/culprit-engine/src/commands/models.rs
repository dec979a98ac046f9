use std::path::PathBuf;

/// Arguments for the analyze command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    /// Path to the analysis input JSON
    pub input: PathBuf,

    /// Engine configuration file (TOML); defaults apply when absent
    pub config: Option<PathBuf>,

    /// Output path for the culprit JSON
    pub output: PathBuf,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for AnalyzeArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            config: None,
            output: PathBuf::from("culprit.json"),
            print_summary: false,
        }
    }
}
