use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::FacilityCode;
use super::payload::SubmissionPayload;
use super::scoring::ScoringEngine;

/// Identity assigned by the store; increases with every insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub i64);

/// A validated, scored submission ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubmission {
    pub facility_code: Option<FacilityCode>,
    pub submitter_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub reference_link: Option<String>,
    pub total_score: f64,
    pub answer_payload: Option<SubmissionPayload>,
}

/// Persisted submission row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: SubmissionId,
    pub facility_code: Option<FacilityCode>,
    pub submitter_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub reference_link: Option<String>,
    pub total_score: f64,
    pub created_at: DateTime<Utc>,
    /// Missing for legacy rows written before payloads were kept.
    pub answer_payload: Option<SubmissionPayload>,
}

impl SubmissionRecord {
    pub(crate) fn from_new(id: SubmissionId, submission: NewSubmission, now: DateTime<Utc>) -> Self {
        Self {
            id,
            facility_code: submission.facility_code,
            submitter_id: submission.submitter_id,
            latitude: submission.latitude,
            longitude: submission.longitude,
            reference_link: submission.reference_link,
            total_score: submission.total_score,
            created_at: now,
            answer_payload: submission.answer_payload,
        }
    }

    /// Overwrite every mutable field in place, keeping the identity.
    pub(crate) fn replace_with(&mut self, submission: NewSubmission, now: DateTime<Utc>) {
        let id = self.id;
        *self = Self::from_new(id, submission, now);
    }

    /// Ordering key for "most recent first": timestamp, then identity.
    pub fn recency(&self) -> (DateTime<Utc>, SubmissionId) {
        (self.created_at, self.id)
    }

    /// Dashboard row with the category scores lifted out of the payload.
    pub fn summary(&self) -> SubmissionSummary {
        let scores = self
            .answer_payload
            .as_ref()
            .map(SubmissionPayload::stored_scores)
            .unwrap_or_default();

        SubmissionSummary {
            id: self.id,
            facility_code: self.facility_code.clone(),
            submitter_id: self.submitter_id.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            created_at: self.created_at,
            need_score: scores.need_score,
            ops_score: scores.ops_score,
            loc_score: scores.loc_score,
            facility_score: scores.facility_score,
            total_score: scores.total_score.unwrap_or(self.total_score),
        }
    }

    /// Re-score the stored answers and compare against the stored total.
    pub fn audit(&self, engine: &ScoringEngine) -> ScoreAudit {
        let recomputed_total = self
            .answer_payload
            .as_ref()
            .map(|payload| engine.score(&payload.answers()).total);

        let status = match recomputed_total {
            None => AuditStatus::MissingPayload,
            Some(total) if (total - self.total_score).abs() <= AUDIT_TOLERANCE => {
                AuditStatus::Consistent
            }
            Some(total) => AuditStatus::Drifted {
                delta: total - self.total_score,
            },
        };

        ScoreAudit {
            id: self.id,
            facility_code: self.facility_code.clone(),
            stored_total: self.total_score,
            recomputed_total,
            status,
        }
    }
}

const AUDIT_TOLERANCE: f64 = 1e-6;

/// Sanitized listing row exposed to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionSummary {
    pub id: SubmissionId,
    pub facility_code: Option<FacilityCode>,
    pub submitter_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
    pub need_score: Option<f64>,
    pub ops_score: Option<f64>,
    pub loc_score: Option<f64>,
    pub facility_score: Option<f64>,
    /// Payload total when present, otherwise the stored column.
    pub total_score: f64,
}

/// Result of re-scoring a stored submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreAudit {
    pub id: SubmissionId,
    pub facility_code: Option<FacilityCode>,
    pub stored_total: f64,
    pub recomputed_total: Option<f64>,
    #[serde(flatten)]
    pub status: AuditStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditStatus {
    Consistent,
    Drifted { delta: f64 },
    MissingPayload,
}

/// Outcome of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpsertOutcome {
    pub id: SubmissionId,
    pub was_update: bool,
}

/// Facility codes to restrict a listing to; empty means everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacilityFilter {
    codes: BTreeSet<FacilityCode>,
}

impl FacilityFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn only<I>(codes: I) -> Self
    where
        I: IntoIterator<Item = FacilityCode>,
    {
        Self {
            codes: codes.into_iter().collect(),
        }
    }

    /// Parse a comma separated list, ignoring blank entries.
    pub fn parse_list(raw: &str) -> Self {
        Self::only(raw.split(',').filter_map(FacilityCode::parse))
    }

    pub fn is_all(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn codes(&self) -> impl Iterator<Item = &FacilityCode> {
        self.codes.iter()
    }

    /// Records without a code only appear in unfiltered listings.
    pub fn matches(&self, code: Option<&FacilityCode>) -> bool {
        if self.codes.is_empty() {
            return true;
        }
        code.is_some_and(|code| self.codes.contains(code))
    }
}

/// Storage abstraction so the service can run against memory or SQLite.
pub trait SubmissionStore: Send + Sync {
    /// Replace the latest record for the submission's facility code, or insert a new one.
    fn upsert(&self, submission: NewSubmission) -> Result<UpsertOutcome, StoreError>;

    /// One record per facility code plus every uncoded record, most recent first.
    fn list_latest_per_facility(
        &self,
        filter: &FacilityFilter,
    ) -> Result<Vec<SubmissionRecord>, StoreError>;

    /// Distinct non-empty facility codes, sorted.
    fn facility_codes(&self) -> Result<Vec<FacilityCode>, StoreError>;

    fn get(&self, id: SubmissionId) -> Result<Option<SubmissionRecord>, StoreError>;
}

/// Error enumeration for store failures. A failed write leaves no partial record.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("stored row {id} is unreadable: {reason}")]
    Corrupt { id: i64, reason: String },
}

/// Keep the most recent record per facility code and every uncoded record.
pub(crate) fn latest_per_facility<I>(records: I, filter: &FacilityFilter) -> Vec<SubmissionRecord>
where
    I: IntoIterator<Item = SubmissionRecord>,
{
    let mut latest: BTreeMap<FacilityCode, SubmissionRecord> = BTreeMap::new();
    let mut uncoded = Vec::new();

    for record in records {
        if !filter.matches(record.facility_code.as_ref()) {
            continue;
        }
        match record.facility_code.clone() {
            Some(code) => match latest.entry(code) {
                Entry::Vacant(slot) => {
                    slot.insert(record);
                }
                Entry::Occupied(mut slot) => {
                    if record.recency() > slot.get().recency() {
                        slot.insert(record);
                    }
                }
            },
            None => uncoded.push(record),
        }
    }

    let mut listing: Vec<SubmissionRecord> = latest.into_values().chain(uncoded).collect();
    listing.sort_by(|a, b| b.recency().cmp(&a.recency()));
    listing
}
