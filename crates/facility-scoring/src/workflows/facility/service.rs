use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{AnswerSet, FacilityCode};
use super::export::{export_csv, ExportError};
use super::payload::SubmissionPayload;
use super::repository::{
    AuditStatus, FacilityFilter, NewSubmission, ScoreAudit, StoreError, SubmissionId,
    SubmissionRecord, SubmissionStore, SubmissionSummary, UpsertOutcome,
};
use super::scoring::{ScoreResult, ScoringConfig, ScoringEngine};

/// Service composing the scoring engine with a submission store.
pub struct FacilityScoringService<S> {
    engine: Arc<ScoringEngine>,
    store: Arc<S>,
}

/// Acknowledgement returned once a submission is stored.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SubmissionReceipt {
    pub id: SubmissionId,
    pub was_update: bool,
    pub facility_code: Option<FacilityCode>,
    pub scores: ScoreResult,
}

impl<S> FacilityScoringService<S>
where
    S: SubmissionStore + 'static,
{
    pub fn new(store: Arc<S>, config: ScoringConfig) -> Self {
        Self {
            engine: Arc::new(ScoringEngine::new(config)),
            store,
        }
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Score without storing anything.
    pub fn score(&self, answers: &AnswerSet) -> ScoreResult {
        self.engine.score(answers)
    }

    /// Validate, score, and store a proposal; the latest submission per facility code wins.
    pub fn submit(&self, answers: AnswerSet) -> Result<SubmissionReceipt, SubmissionError> {
        let scores = self.engine.score(&answers);
        let submission = match validate(&answers, &scores) {
            Ok(submission) => submission,
            Err(err) => {
                warn!(error = %err, "submission rejected");
                return Err(err);
            }
        };

        let facility_code = submission.facility_code.clone();
        let payload = SubmissionPayload::new(&answers, &scores);
        let UpsertOutcome { id, was_update } = self.store.upsert(NewSubmission {
            facility_code: submission.facility_code,
            submitter_id: submission.submitter_id,
            latitude: submission.latitude,
            longitude: submission.longitude,
            reference_link: submission.reference_link,
            total_score: scores.total,
            answer_payload: Some(payload),
        })?;

        info!(
            id = id.0,
            facility_code = facility_code.as_ref().map(FacilityCode::as_str).unwrap_or(""),
            was_update,
            total_score = scores.total,
            "submission stored"
        );

        Ok(SubmissionReceipt {
            id,
            was_update,
            facility_code,
            scores,
        })
    }

    pub fn list(&self, filter: &FacilityFilter) -> Result<Vec<SubmissionRecord>, SubmissionError> {
        Ok(self.store.list_latest_per_facility(filter)?)
    }

    pub fn summaries(
        &self,
        filter: &FacilityFilter,
    ) -> Result<Vec<SubmissionSummary>, SubmissionError> {
        Ok(self
            .list(filter)?
            .iter()
            .map(SubmissionRecord::summary)
            .collect())
    }

    pub fn facility_codes(&self) -> Result<Vec<FacilityCode>, SubmissionError> {
        Ok(self.store.facility_codes()?)
    }

    pub fn get(&self, id: SubmissionId) -> Result<Option<SubmissionRecord>, SubmissionError> {
        Ok(self.store.get(id)?)
    }

    /// CSV of flattened payloads. An empty selection exports every listed record.
    pub fn export_csv(
        &self,
        filter: &FacilityFilter,
        selected: &BTreeSet<SubmissionId>,
    ) -> Result<String, SubmissionError> {
        let records: Vec<SubmissionRecord> = self
            .list(filter)?
            .into_iter()
            .filter(|record| selected.is_empty() || selected.contains(&record.id))
            .collect();
        Ok(export_csv(&records)?)
    }

    /// Re-score stored payloads to catch totals written under older rules.
    pub fn audit(&self, filter: &FacilityFilter) -> Result<Vec<ScoreAudit>, SubmissionError> {
        let audits: Vec<ScoreAudit> = self
            .list(filter)?
            .iter()
            .map(|record| record.audit(&self.engine))
            .collect();

        for audit in &audits {
            if let AuditStatus::Drifted { delta } = audit.status {
                warn!(id = audit.id.0, delta, "stored total differs from current scoring");
            }
        }

        Ok(audits)
    }
}

/// Submitter fields after the validation gate.
struct ValidSubmitter {
    facility_code: Option<FacilityCode>,
    submitter_id: String,
    latitude: f64,
    longitude: f64,
    reference_link: Option<String>,
}

fn validate(answers: &AnswerSet, scores: &ScoreResult) -> Result<ValidSubmitter, SubmissionError> {
    let submitter = &answers.submitter;

    let submitter_id = submitter
        .submitter_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(SubmissionError::MissingSubmitterId)?;
    let latitude = submitter
        .latitude
        .filter(|value| value.is_finite())
        .ok_or(SubmissionError::MissingCoordinate("latitude"))?;
    let longitude = submitter
        .longitude
        .filter(|value| value.is_finite())
        .ok_or(SubmissionError::MissingCoordinate("longitude"))?;

    if !scores.is_complete() {
        return Err(SubmissionError::IncompleteNeedIdentification);
    }

    Ok(ValidSubmitter {
        facility_code: submitter.facility_code(),
        submitter_id: submitter_id.to_string(),
        latitude,
        longitude,
        reference_link: submitter
            .reference_link
            .as_deref()
            .map(str::trim)
            .filter(|link| !link.is_empty())
            .map(str::to_string),
    })
}

/// Error raised by the scoring service.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("submitter id is required")]
    MissingSubmitterId,
    #[error("{0} is required and must be a number")]
    MissingCoordinate(&'static str),
    #[error("select a need identification scenario before submitting")]
    IncompleteNeedIdentification,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl SubmissionError {
    /// True when the caller sent something the gate refuses.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SubmissionError::MissingSubmitterId
                | SubmissionError::MissingCoordinate(_)
                | SubmissionError::IncompleteNeedIdentification
        )
    }
}
