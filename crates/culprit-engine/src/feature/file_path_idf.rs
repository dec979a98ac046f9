//! Rarity of the crashed files a suspect touched.
//!
//! A change to a file that few documents mention is stronger evidence than a
//! change to a file everybody touches.

use super::touch_crashed_file::CrashedFileMatcher;
use super::{log_regress_normalize, Feature, FeatureValue, PreparedFeature};
use crate::collaborators::InvertedIndex;
use crate::matcher::CrashMatches;
use crate::model::{CrashReport, Suspect};
use log::warn;
use std::sync::Arc;

pub const FILE_PATH_IDF: &str = "FilePathIdf";

/// `ln(total_docs / (1 + docs_containing_keyword))`
pub fn compute_idf(n_of_doc: u64, total_docs: u64) -> f64 {
    (total_docs as f64 / (1.0 + n_of_doc as f64)).ln()
}

/// Maximum IDF over matched touched files, squashed through a logistic
pub struct FilePathIdfFeature {
    inverted_index: Option<Arc<dyn InvertedIndex>>,
    match_renamed_old_path: bool,
}

impl FilePathIdfFeature {
    pub fn new(
        inverted_index: Option<Arc<dyn InvertedIndex>>,
        match_renamed_old_path: bool,
    ) -> Self {
        Self {
            inverted_index,
            match_renamed_old_path,
        }
    }
}

impl Feature for FilePathIdfFeature {
    fn name(&self) -> &str {
        FILE_PATH_IDF
    }

    fn prepare<'r>(&'r self, report: &'r CrashReport) -> Box<dyn PreparedFeature + 'r> {
        let total_docs = match self.inverted_index.as_deref() {
            Some(index) => index.get_root().filter(|total| *total > 0),
            None => None,
        };
        if total_docs.is_none() {
            warn!("No document corpus available, {} carries no signal", FILE_PATH_IDF);
        }

        Box::new(PreparedFilePathIdf {
            matcher: CrashedFileMatcher::new(report, self.match_renamed_old_path),
            inverted_index: self.inverted_index.as_deref(),
            total_docs,
        })
    }
}

struct PreparedFilePathIdf<'r> {
    matcher: CrashedFileMatcher<'r>,
    inverted_index: Option<&'r dyn InvertedIndex>,
    total_docs: Option<u64>,
}

impl PreparedFeature for PreparedFilePathIdf<'_> {
    fn score(&self, suspect: &Suspect, matches: Option<&CrashMatches>) -> FeatureValue {
        let matches = self.matcher.resolve(suspect, matches);
        if matches.is_empty() {
            return FeatureValue::new(FILE_PATH_IDF, 0.0);
        }

        let (Some(index), Some(total_docs)) = (self.inverted_index, self.total_docs) else {
            return FeatureValue::zero(FILE_PATH_IDF).with_reason("No document corpus available");
        };

        let max_idf = matches
            .values()
            .flat_map(|crash_match| crash_match.touched_files.iter())
            .map(|touched| compute_idf(index.get(touched.path()).unwrap_or(0), total_docs))
            .fold(f64::NEG_INFINITY, f64::max);

        FeatureValue::new(FILE_PATH_IDF, log_regress_normalize(max_idf).ln())
            .with_reason(format!("Maximum IDF of touched crashed files is {:.2}", max_idf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_idf() {
        assert_eq!(compute_idf(0, 1), 0.0);
        assert!((compute_idf(9, 100) - 10f64.ln()).abs() < 1e-12);
        assert!(compute_idf(200, 100) < 0.0);
    }
}
