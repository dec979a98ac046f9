//! The analysis pipeline: score, rank, filter and classify suspects.

use super::model::LogLinearModel;
use crate::classifier::{ComponentClassifier, ProjectClassifier};
use crate::collaborators::{InvertedIndex, Repository};
use crate::dependency::{DependencyAnalyzer, DependencyFetcher};
use crate::feature::{
    Feature, FeatureNode, FilePathIdfFeature, MinDistanceFeature, TopFrameIndexFeature,
    TouchCrashedComponentFeature, TouchCrashedDirectoryFeature, TouchCrashedFileFeature,
    TouchCrashedFileMetaFeature, WrapperMetaFeature, WRAPPER_META_FEATURE,
};
use crate::filters::{
    apply_filters, FilterIgnoredRevisions, FilterLessLikelySuspects, RobotAuthorFilter,
    SuspectFilter,
};
use crate::model::{CrashReport, Culprit, Suspect, ALGORITHM_BLAME, ALGORITHM_CORE};
use crate::stacktrace::Stacktrace;
use crate::utils::config::EngineConfig;
use crate::utils::error::{ConfigError, EngineError};
use crate::utils::paths::resolve_dep_path;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::sync::Arc;

/// External services the engine depends on
#[derive(Clone)]
pub struct Collaborators {
    pub repository: Arc<dyn Repository>,
    pub dependency_fetcher: Arc<dyn DependencyFetcher>,
    pub inverted_index: Option<Arc<dyn InvertedIndex>>,
}

/// Build the default feature tree
///
/// `WrapperMetaFeature` holds `TouchCrashedFileMeta` (MinDistance,
/// TopFrameIndex, TouchCrashedFile, FilePathIdf), `TouchCrashedDirectory`
/// and `TouchCrashedComponent`.
pub fn default_meta_feature(
    config: &EngineConfig,
    collaborators: &Collaborators,
    component_classifier: Arc<ComponentClassifier>,
) -> WrapperMetaFeature {
    let features = &config.features;
    let rename = features.match_renamed_old_path;

    let file_features: Vec<Box<dyn Feature>> = vec![
        Box::new(MinDistanceFeature::new(
            features.max_distance,
            Some(collaborators.repository.clone()),
            rename,
        )),
        Box::new(TopFrameIndexFeature::new(features.max_frame_index, rename)),
        Box::new(TouchCrashedFileFeature::new(rename)),
        Box::new(FilePathIdfFeature::new(
            collaborators.inverted_index.clone(),
            rename,
        )),
    ];
    let file_meta = TouchCrashedFileMetaFeature::new(file_features, rename);

    WrapperMetaFeature::new(
        WRAPPER_META_FEATURE,
        vec![
            FeatureNode::Meta(Box::new(file_meta)),
            FeatureNode::Leaf(Box::new(TouchCrashedDirectoryFeature::new(
                features.include_test_files,
            ))),
            FeatureNode::Leaf(Box::new(TouchCrashedComponentFeature::new(
                component_classifier,
            ))),
        ],
    )
}

/// Attributes crashes to suspects
pub struct CulpritEngine {
    config: EngineConfig,
    collaborators: Collaborators,
    model: LogLinearModel,
    project_classifier: ProjectClassifier,
    component_classifier: Arc<ComponentClassifier>,
    filters: Vec<Box<dyn SuspectFilter>>,
}

impl CulpritEngine {
    /// Build an engine from configuration and collaborators
    ///
    /// # Errors
    /// * `ConfigError` - The configuration fails validation
    pub fn new(config: EngineConfig, collaborators: Collaborators) -> Result<Self, ConfigError> {
        config.validate()?;

        let component_classifier =
            Arc::new(ComponentClassifier::new(config.component_classifier.clone()));
        let project_classifier = ProjectClassifier::new(config.project_classifier.clone());

        let meta_feature =
            default_meta_feature(&config, &collaborators, component_classifier.clone());
        let model = LogLinearModel::new(
            Box::new(meta_feature),
            config.weights.clone(),
            config.epsilon,
        );

        let mut filters: Vec<Box<dyn SuspectFilter>> = vec![Box::new(RobotAuthorFilter::new(
            &config.filters.robot_author_patterns,
        )?)];
        if let Some((path, revision)) = config.filters.ignore_list_location() {
            filters.push(Box::new(FilterIgnoredRevisions::new(
                collaborators.repository.clone(),
                path,
                revision,
            )));
        }
        filters.push(Box::new(
            FilterLessLikelySuspects::new(config.filters.confidence_ratio)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?,
        ));

        info!(
            "Engine ready: {} non-zero weights, {} filters",
            model.l0(),
            filters.len()
        );

        Ok(Self {
            config,
            collaborators,
            model,
            project_classifier,
            component_classifier,
            filters,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn model(&self) -> &LogLinearModel {
        &self.model
    }

    /// Assemble a crash report with in-scope dependencies and rolls
    ///
    /// Frames without a dependency are resolved against the full dependency
    /// set of `crashed_version` first.
    pub fn build_report(
        &self,
        crashed_version: &str,
        signature: &str,
        platform: &str,
        stacktrace: Stacktrace,
        regression_range: Option<(String, String)>,
    ) -> CrashReport {
        let analyzer = DependencyAnalyzer::new(
            platform,
            crashed_version,
            regression_range.clone(),
            self.collaborators.dependency_fetcher.clone(),
        );

        let stacktrace = if stacktrace.frames().any(|(frame, _)| frame.dep_path.is_empty()) {
            let all_dependencies = analyzer.full_dependencies();
            stacktrace.map_frames(|frame| {
                if !frame.dep_path.is_empty() {
                    return frame.clone();
                }
                let (dep_path, file_path, repo_url) =
                    resolve_dep_path(&frame.raw_file_path, all_dependencies);
                if dep_path.is_empty() {
                    frame.clone()
                } else {
                    frame.with_dependency(dep_path, file_path, repo_url)
                }
            })
        } else {
            stacktrace
        };

        let dependencies = analyzer.dependencies(&stacktrace.stacks);
        let dependency_rolls = analyzer.dependency_rolls(&stacktrace.stacks);
        debug!(
            "Report has {} dependencies and {} rolls",
            dependencies.len(),
            dependency_rolls.len()
        );

        CrashReport::new(
            crashed_version,
            signature,
            platform,
            stacktrace,
            regression_range,
        )
        .with_dependencies(dependencies)
        .with_dependency_rolls(dependency_rolls)
    }

    /// Score every suspect, in parallel when a pool can be built
    fn score_suspects(
        &self,
        report: &CrashReport,
        suspects: Vec<Suspect>,
    ) -> Result<Vec<Suspect>, EngineError> {
        let prepared = self.model.prepare(report);

        let score_one = |mut suspect: Suspect| -> Result<Option<Suspect>, EngineError> {
            let features = prepared.features(&suspect);
            let score = prepared.score(&features)?;
            debug!("{} scored {}", suspect.revision(), score);

            if score.is_nan() || score == f64::NEG_INFINITY {
                return Ok(None);
            }

            suspect.confidence = score.exp();
            suspect.reasons = prepared.format_reasons(&features);
            suspect.changed_files = prepared.aggregate_changed_files(&features)?;
            Ok(Some(suspect))
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .build();

        let scored: Vec<Result<Option<Suspect>, EngineError>> = match pool {
            Ok(pool) => pool.install(|| suspects.into_par_iter().map(score_one).collect()),
            Err(e) => {
                warn!("Falling back to sequential scoring: {}", e);
                suspects.into_iter().map(score_one).collect()
            }
        };

        let mut ranked = Vec::with_capacity(scored.len());
        for suspect in scored {
            if let Some(suspect) = suspect? {
                ranked.push(suspect);
            }
        }

        ranked.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
        });
        Ok(ranked)
    }

    /// Find the culprit of a crash among `suspects`
    ///
    /// # Arguments
    /// * `report` - Crash report, typically from [`CulpritEngine::build_report`]
    /// * `suspects` - Candidate changelists in the regression range
    ///
    /// # Returns
    /// Ranked, filtered suspects plus project and component classification
    ///
    /// # Errors
    /// * `EngineError::WeightShapeMismatch` - Weights do not fit the features
    /// * `EngineError::BlameUrlMismatch` - Features disagree on evidence
    pub fn find_culprit(
        &self,
        report: &CrashReport,
        suspects: Vec<Suspect>,
    ) -> Result<Culprit, EngineError> {
        info!(
            "Analyzing {} suspect(s) for {}",
            suspects.len(),
            report.signature
        );

        let ranked = self.score_suspects(report, suspects)?;
        let mut suspected_cls = apply_filters(&self.filters, ranked);
        suspected_cls.truncate(self.config.top_n_suspects);

        let crash_stack = report.stacktrace.crash_stack();
        let project = self.project_classifier.classify(&suspected_cls, crash_stack);
        let components = self
            .component_classifier
            .classify(&suspected_cls, crash_stack);

        let algorithm = if report.regression_range.is_some() {
            ALGORITHM_CORE
        } else {
            ALGORITHM_BLAME
        };

        info!(
            "Found {} suspect(s), project {:?}, components {:?}",
            suspected_cls.len(),
            project,
            components
        );

        Ok(Culprit {
            project,
            components,
            suspected_cls,
            regression_range: report.regression_range.clone(),
            algorithm: algorithm.to_string(),
        })
    }
}
