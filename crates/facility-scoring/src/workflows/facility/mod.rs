//! Facility proposal scoring and latest-wins submission storage.
//!
//! Answers are scored by a pure [`ScoringEngine`]; the [`FacilityScoringService`]
//! gates submissions on submitter identity and a chosen need scenario, then hands
//! the payload to a [`SubmissionStore`] that keeps one live record per facility code.

pub mod domain;
pub mod export;
pub mod memory;
pub mod payload;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use domain::{
    AnswerSet, ChangeNature, FacilityCode, FacilitySpecs, LocationStrategy, NeedIdentification,
    Operation, OperationsNetwork, RestructuringReason, Scenario, SubmitterIdentity,
};
pub use export::{ExportError, PREFERRED_COLUMNS};
pub use memory::InMemorySubmissionStore;
pub use payload::{StoredScores, SubmissionPayload};
pub use repository::{
    AuditStatus, FacilityFilter, NewSubmission, ScoreAudit, StoreError, SubmissionId,
    SubmissionRecord, SubmissionStore, SubmissionSummary, UpsertOutcome,
};
pub use router::facility_router;
pub use scoring::{
    CategoryWeights, CheckOutcome, ScoreCategory, ScoreResult, ScoringConfig, ScoringEngine,
};
pub use service::{FacilityScoringService, SubmissionError, SubmissionReceipt};
pub use sqlite::SqliteSubmissionStore;
