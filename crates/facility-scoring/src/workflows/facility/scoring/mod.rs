mod config;
mod rules;
mod specs;

pub use config::{CategoryWeights, ScoringConfig};
pub use specs::{recommended_docks, SCORED_SPEC_CHECKS};

use super::domain::AnswerSet;
use serde::{Deserialize, Serialize};

/// Stateless engine that turns an answer set into category scores.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score every category. Never fails: missing answers earn no credit.
    pub fn score(&self, answers: &AnswerSet) -> ScoreResult {
        let weights = &self.config.weights;

        let need = rules::need_identification(&answers.need_identification, &self.config);
        let operations = rules::operations_network(&answers.operations_network, &self.config);
        let location = rules::location_strategy(
            &answers.location_strategy,
            weights.location_strategy,
        );
        let facility = specs::facility_specs(&answers.facility_specs, weights.facility_specs);

        let total = need.score + operations.score + location.score + facility.score;

        let mut checks = need.checks;
        checks.extend(operations.checks);
        checks.extend(location.checks);
        checks.extend(facility.checks);

        ScoreResult {
            need_identification: need.score,
            operations_network: operations.score,
            location_strategy: location.score,
            facility_specs: facility.score,
            total,
            need_identification_complete: need.complete,
            checks,
        }
    }
}

/// The four scoring categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    NeedIdentification,
    OperationsNetwork,
    LocationStrategy,
    FacilitySpecs,
}

impl ScoreCategory {
    pub const fn label(self) -> &'static str {
        match self {
            ScoreCategory::NeedIdentification => "Need Identification",
            ScoreCategory::OperationsNetwork => "Operations/Network",
            ScoreCategory::LocationStrategy => "Location Strategy",
            ScoreCategory::FacilitySpecs => "Facility Specs",
        }
    }
}

/// Credit earned by a single check, kept so reviewers can audit a score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub category: ScoreCategory,
    pub check: String,
    /// Fraction of the check earned, in `[0, 1]`.
    pub credit: f64,
    /// False when the check was left out of its category's ratio.
    pub applies: bool,
}

impl CheckOutcome {
    pub(crate) fn new(category: ScoreCategory, check: &str, credit: f64, applies: bool) -> Self {
        Self {
            category,
            check: check.to_string(),
            credit,
            applies,
        }
    }
}

/// Category scores and their sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub need_identification: f64,
    pub operations_network: f64,
    pub location_strategy: f64,
    pub facility_specs: f64,
    pub total: f64,
    /// False until a scenario is chosen; such results must not be stored.
    pub need_identification_complete: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<CheckOutcome>,
}

impl ScoreResult {
    pub fn is_complete(&self) -> bool {
        self.need_identification_complete
    }

    pub fn category_scores(&self) -> [(ScoreCategory, f64); 4] {
        [
            (ScoreCategory::NeedIdentification, self.need_identification),
            (ScoreCategory::OperationsNetwork, self.operations_network),
            (ScoreCategory::LocationStrategy, self.location_strategy),
            (ScoreCategory::FacilitySpecs, self.facility_specs),
        ]
    }

    pub fn checks_for(&self, category: ScoreCategory) -> impl Iterator<Item = &CheckOutcome> {
        self.checks
            .iter()
            .filter(move |outcome| outcome.category == category)
    }
}

pub(crate) struct CategoryOutcome {
    pub score: f64,
    pub complete: bool,
    pub checks: Vec<CheckOutcome>,
}

/// Drop NaN and infinities so they behave like missing answers.
pub(crate) fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|value| value.is_finite())
}
