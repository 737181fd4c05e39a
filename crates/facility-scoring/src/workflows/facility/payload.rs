use serde::{Deserialize, Serialize};

use super::domain::{
    AnswerSet, FacilitySpecs, LocationStrategy, NeedIdentification, OperationsNetwork,
    SubmitterIdentity,
};
use super::scoring::ScoreResult;

/// Stored document: every answer grouped by section, with that section's score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    #[serde(default)]
    pub submitter: SubmitterIdentity,
    #[serde(default)]
    pub need_identification: NeedIdentificationSection,
    #[serde(default)]
    pub operations_network: OperationsNetworkSection,
    #[serde(default)]
    pub location_strategy: LocationStrategySection,
    #[serde(default)]
    pub facility_specs: FacilitySpecsSection,
    #[serde(default)]
    pub totals: PayloadTotals,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NeedIdentificationSection {
    #[serde(flatten)]
    pub answers: NeedIdentification,
    #[serde(default)]
    pub need_score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationsNetworkSection {
    #[serde(flatten)]
    pub answers: OperationsNetwork,
    #[serde(default)]
    pub ops_score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationStrategySection {
    #[serde(flatten)]
    pub answers: LocationStrategy,
    #[serde(default)]
    pub loc_score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacilitySpecsSection {
    #[serde(flatten)]
    pub answers: FacilitySpecs,
    #[serde(default)]
    pub facility_score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayloadTotals {
    #[serde(default)]
    pub total_score: Option<f64>,
}

/// Score fields as they were written alongside the answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StoredScores {
    pub need_score: Option<f64>,
    pub ops_score: Option<f64>,
    pub loc_score: Option<f64>,
    pub facility_score: Option<f64>,
    pub total_score: Option<f64>,
}

impl SubmissionPayload {
    pub fn new(answers: &AnswerSet, scores: &ScoreResult) -> Self {
        Self {
            submitter: answers.submitter.clone(),
            need_identification: NeedIdentificationSection {
                answers: answers.need_identification.clone(),
                need_score: Some(scores.need_identification),
            },
            operations_network: OperationsNetworkSection {
                answers: answers.operations_network.clone(),
                ops_score: Some(scores.operations_network),
            },
            location_strategy: LocationStrategySection {
                answers: answers.location_strategy.clone(),
                loc_score: Some(scores.location_strategy),
            },
            facility_specs: FacilitySpecsSection {
                answers: answers.facility_specs.clone(),
                facility_score: Some(scores.facility_specs),
            },
            totals: PayloadTotals {
                total_score: Some(scores.total),
            },
        }
    }

    /// Rebuild the answer set the payload was written from.
    pub fn answers(&self) -> AnswerSet {
        AnswerSet {
            submitter: self.submitter.clone(),
            need_identification: self.need_identification.answers.clone(),
            operations_network: self.operations_network.answers.clone(),
            location_strategy: self.location_strategy.answers.clone(),
            facility_specs: self.facility_specs.answers.clone(),
        }
    }

    pub fn stored_scores(&self) -> StoredScores {
        StoredScores {
            need_score: self.need_identification.need_score,
            ops_score: self.operations_network.ops_score,
            loc_score: self.location_strategy.loc_score,
            facility_score: self.facility_specs.facility_score,
            total_score: self.totals.total_score,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
