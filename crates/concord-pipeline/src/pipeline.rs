//! Pipeline orchestrator
//!
//! Drives one couple through Fetch, Normalize, Split, Compute-Relational,
//! Assemble, Submit and Persist. There is no internal retry: a failed run
//! is re-invoked from Fetch.

use crate::{BatchReport, PipelineConfig, PipelineError};
use concord_domain::narrative::{counseling_reasoning, risk_reasoning, rule_based_recommendations};
use concord_domain::traits::{ClassifierService, DataSource, ResultSink, ServiceFault};
use concord_domain::{
    AccessId, ClassificationRequest, Demographics, FeatureAssembler, FocusCategory,
    RelationalFeatures, RequestContext, Respondent, RespondentSequences, ResponseNormalizer,
    Verdict,
};
use futures::future;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::pin::pin;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// A Completed run
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// Identifies this invocation in logs
    pub run_id: Uuid,
    /// Couple that was classified
    pub access_id: AccessId,
    /// Verdict as persisted
    pub verdict: Verdict,
    /// Whether any narrative or recommendation was filled in locally
    pub narrative_completed: bool,
}

/// Feature pipeline for couples
///
/// Generic over its three collaborators so the same orchestration runs
/// against SQLite and HTTP in production and in-memory doubles in tests.
pub struct Pipeline<D, C, R> {
    source: D,
    classifier: C,
    sink: R,
    normalizer: ResponseNormalizer,
    assembler: FeatureAssembler,
    config: PipelineConfig,
}

impl<D, C, R> Pipeline<D, C, R>
where
    D: DataSource,
    D::Error: fmt::Display,
    C: ClassifierService,
    R: ResultSink,
    R::Error: fmt::Display,
{
    /// Create a pipeline after validating its configuration
    pub fn new(source: D, classifier: C, sink: R, config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let normalizer = ResponseNormalizer::new(config.layout.neutral);
        let assembler = FeatureAssembler::new(config.layout.clone(), config.category_map.clone());
        Ok(Self {
            source,
            classifier,
            sink,
            normalizer,
            assembler,
            config,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Classifier in use
    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Run Fetch through Assemble without submitting
    pub fn prepare(&self, access_id: &AccessId) -> Result<ClassificationRequest, PipelineError> {
        let record = self
            .source
            .get_couple_record(access_id)
            .map_err(|e| PipelineError::Source(e.to_string()))?
            .ok_or_else(|| PipelineError::NotFound(access_id.clone()))?;

        let missing = |respondent| PipelineError::MissingProfile {
            access_id: access_id.clone(),
            respondent,
        };
        let primary = record.primary.as_ref().ok_or_else(|| missing(Respondent::Primary))?;
        let secondary = record
            .secondary
            .as_ref()
            .ok_or_else(|| missing(Respondent::Secondary))?;
        debug!(access_id = %access_id, answers = record.answers.len(), "Fetched couple record");

        let normalized = self.normalizer.normalize_all(&record.answers);

        let mut sequences = RespondentSequences::split(&normalized);
        if self.config.midpoint_fallback && sequences.is_one_sided() && !normalized.is_empty() {
            warn!(
                access_id = %access_id,
                primary = sequences.primary.len(),
                secondary = sequences.secondary.len(),
                "Answers are one-sided, splitting at midpoint"
            );
            sequences = RespondentSequences::split_at_midpoint(&normalized);
        }

        let male_responses = sequences.primary_values();
        let female_responses = sequences.secondary_values();
        let relational = RelationalFeatures::compute(
            &male_responses,
            &female_responses,
            &sequences.combined_values(),
            self.assembler.layout(),
        );

        let demographics = Demographics::from_profiles(primary, secondary);
        let feature_vector = self.assembler.assemble(&demographics, &sequences, &relational);
        let questionnaire_responses = feature_vector
            .response_block()
            .iter()
            .map(|v| *v as i64)
            .collect();
        debug!(
            access_id = %access_id,
            features = feature_vector.len(),
            alignment = relational.alignment_score,
            "Assembled feature vector"
        );

        Ok(ClassificationRequest {
            feature_vector,
            context: RequestContext {
                couple_id: access_id.clone(),
                male_name: primary.name.clone(),
                female_name: secondary.name.clone(),
                demographics,
                male_responses,
                female_responses,
                questionnaire_responses,
                personalized_features: relational,
                category_map_version: self.config.category_map.version.clone(),
            },
        })
    }

    /// Run the full pipeline for one couple
    pub async fn run(&self, access_id: &AccessId) -> Result<RunOutcome, PipelineError> {
        let run_id = Uuid::now_v7();
        info!(%run_id, access_id = %access_id, "Starting pipeline run");

        let result = self.execute(run_id, access_id).await;
        match &result {
            Ok(outcome) => info!(
                %run_id,
                access_id = %access_id,
                risk_level = %outcome.verdict.risk_level,
                confidence = outcome.verdict.confidence,
                "Pipeline run completed"
            ),
            Err(e) => error!(%run_id, access_id = %access_id, error = %e, "Pipeline run failed"),
        }
        result
    }

    async fn execute(&self, run_id: Uuid, access_id: &AccessId) -> Result<RunOutcome, PipelineError> {
        let request = self.prepare(access_id)?;

        let mut verdict = self.classifier.classify(&request).await.map_err(|e| {
            let fault: ServiceFault = e.into();
            match fault {
                ServiceFault::Unavailable(message) => PipelineError::ServiceUnavailable {
                    access_id: access_id.clone(),
                    message,
                },
                ServiceFault::Rejected(message) => PipelineError::Service {
                    access_id: access_id.clone(),
                    message,
                },
            }
        })?;
        debug!(%run_id, risk_level = %verdict.risk_level, "Received verdict");

        let narrative_completed =
            self.config.complete_narrative && complete_narrative(&mut verdict, &request.context);

        self.sink
            .persist(access_id, &verdict)
            .map_err(|e| PipelineError::Sink(e.to_string()))?;

        Ok(RunOutcome {
            run_id,
            access_id: access_id.clone(),
            verdict,
            narrative_completed,
        })
    }

    /// Run every id, isolating failures
    pub async fn run_batch(&self, ids: &[AccessId]) -> BatchReport {
        self.run_batch_until(ids, future::pending::<()>()).await
    }

    /// Run every id until `shutdown` resolves
    ///
    /// At most `max_concurrency` couples are in flight at once and they
    /// finish in any order. Once `shutdown` resolves no further ids are
    /// dispatched; runs already in flight complete or fail on their own and
    /// the ids never dispatched are tallied as skipped.
    pub async fn run_batch_until<F: Future>(&self, ids: &[AccessId], shutdown: F) -> BatchReport {
        info!(
            total = ids.len(),
            max_concurrency = self.config.max_concurrency,
            "Starting batch"
        );

        let mut report = BatchReport::new();
        let mut dispatched = HashSet::new();

        let mut results = pin!(stream::iter(ids.iter().enumerate())
            .take_until(shutdown)
            .map(|(index, id)| async move { (index, id, self.run(id).await) })
            .buffer_unordered(self.config.max_concurrency));

        while let Some((index, id, result)) = results.next().await {
            dispatched.insert(index);
            match result {
                Ok(outcome) => report.record_success(outcome.verdict.risk_level),
                Err(e) => {
                    warn!(access_id = %id, error = %e, "Couple failed");
                    report.record_failure(id, &e.to_string(), e.is_retryable());
                }
            }
        }

        for (index, id) in ids.iter().enumerate() {
            if !dispatched.contains(&index) {
                report.record_skipped(id);
            }
        }
        if report.skipped > 0 {
            warn!(skipped = report.skipped, "Shutdown requested, remaining couples skipped");
        }

        report.record_batch();
        info!(
            total = report.total,
            success = report.success,
            failed = report.failed,
            skipped = report.skipped,
            "Batch finished"
        );
        report
    }
}

/// Fill in whatever the classifier left out of a verdict
///
/// Focus categories are derived from the category scores when absent, then
/// the risk and counseling reasoning and the recommendations are generated
/// from the couple's features. Returns whether anything was filled in.
pub fn complete_narrative(verdict: &mut Verdict, context: &RequestContext) -> bool {
    let mut completed = false;

    if verdict.focus_categories.is_empty() && !verdict.category_scores.is_empty() {
        let mut focus: Vec<FocusCategory> = verdict
            .category_scores
            .iter()
            .map(|(name, score)| FocusCategory::new(name.clone(), *score))
            .collect();
        focus.sort_by(|a, b| b.score.total_cmp(&a.score));
        verdict.focus_categories = focus;
        completed = true;
    }

    if verdict.risk_reasoning.is_none() {
        verdict.risk_reasoning = Some(risk_reasoning(
            &context.demographics,
            &context.personalized_features,
            verdict.risk_level,
        ));
        completed = true;
    }

    if verdict.counseling_reasoning.is_none() {
        verdict.counseling_reasoning = Some(counseling_reasoning(
            &verdict.focus_categories,
            verdict.confidence,
        ));
        completed = true;
    }

    if verdict.recommendations.is_empty() {
        verdict.recommendations = rule_based_recommendations(
            verdict.risk_level,
            &verdict.focus_categories,
            &context.personalized_features,
            &context.male_responses,
            &context.female_responses,
        );
        completed = true;
    }

    completed
}
