//! Analysis value types: changelogs, suspects, crash reports and culprits.

pub mod analysis_input;
pub mod changelog;
pub mod crash_report;
pub mod culprit;
pub mod suspect;

// Re-export main types
pub use analysis_input::AnalysisInput;
pub use changelog::{ChangeLog, ChangeType, Contributor, FileChangeInfo};
pub use crash_report::CrashReport;
pub use culprit::{
    ChangedFileReport, Culprit, CulpritResult, CulpritTags, SuspectReport, ALGORITHM_BLAME,
    ALGORITHM_CORE,
};
pub use suspect::{AnalysisInfo, Suspect};
