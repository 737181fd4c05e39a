use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Deduplication key for submissions. Always trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacilityCode(String);

impl FacilityCode {
    /// Normalize raw input; blank text means "no facility code".
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn from_optional(raw: Option<&str>) -> Option<Self> {
        raw.and_then(Self::parse)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FacilityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trigger for the facility proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Overutilization,
    ExternalFactor,
    Restructuring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeNature {
    Planned,
    Sudden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestructuringReason {
    NetworkOptimization,
    LongHaulPlanningChange,
    AddFacility,
    RemoveFacility,
}

/// Operation types the proposed facility has to support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    AirOperation,
    SurfaceExpress,
    SurfaceLtl,
    UnifiedOperations,
    Branch,
    DarkStore,
    OriginProcessingUnit,
}

impl Operation {
    pub const fn label(self) -> &'static str {
        match self {
            Operation::AirOperation => "Air Operation",
            Operation::SurfaceExpress => "Surface Express",
            Operation::SurfaceLtl => "Surface LTL",
            Operation::UnifiedOperations => "Unified Operations",
            Operation::Branch => "Branch",
            Operation::DarkStore => "Dark Store",
            Operation::OriginProcessingUnit => "Origin Processing Unit (RTO/DP)",
        }
    }

    /// Surface-bound operations depend on highway access.
    pub const fn is_surface(self) -> bool {
        matches!(
            self,
            Operation::SurfaceExpress | Operation::SurfaceLtl | Operation::UnifiedOperations
        )
    }
}

/// Category 1 answers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeedIdentification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<Scenario>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utilization_percent: Option<f64>,
    pub process_improvement_possible: bool,
    pub bypass_plan_possible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_nature: Option<ChangeNature>,
    pub restructuring_reasons: BTreeSet<RestructuringReason>,
}

/// Category 2 answers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationsNetwork {
    pub operations: BTreeSet<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hubs_within_radius: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub airport_distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highway_distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_cost_per_area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposed_cost_per_area: Option<f64>,
}

impl OperationsNetwork {
    pub fn requires_air(&self) -> bool {
        self.operations.contains(&Operation::AirOperation)
    }

    pub fn requires_surface(&self) -> bool {
        self.operations.iter().any(|operation| operation.is_surface())
    }
}

/// Category 3 answers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationStrategy {
    pub in_logistics_cluster: bool,
    pub future_infrastructure_nearby: bool,
    pub highway_connected: bool,
    pub hazard_free: bool,
    pub zoning_permits_logistics: bool,
    pub utilities_available: bool,
    pub support_services_nearby: bool,
    pub labor_available: bool,
}

impl LocationStrategy {
    pub fn checks(&self) -> [(&'static str, bool); 8] {
        [
            ("logistics cluster", self.in_logistics_cluster),
            ("future infrastructure", self.future_infrastructure_nearby),
            ("highway connectivity", self.highway_connected),
            ("hazard free", self.hazard_free),
            ("zoning", self.zoning_permits_logistics),
            ("utilities", self.utilities_available),
            ("support services", self.support_services_nearby),
            ("labor availability", self.labor_available),
        ]
    }
}

/// Category 4 answers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacilitySpecs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operational_life_years: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_area_sqft: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clear_height_ft: Option<f64>,
    pub skylights_present: bool,
    pub ridge_ventilators_present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_spacing_width_ft: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_spacing_length_ft: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor_load_tons_per_sqm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dock_doors: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enclosed_dock_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dock_height_ft: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leveller_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canopy_length_ft: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apron_clearance_height_ft: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side_clearance_ft: Option<f64>,
    pub tail_mating_possible: bool,
    pub dual_sided_docks: bool,
    /// Recorded for reference only; not part of the score.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hcv_apron_clearance_ft: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hcv_parking_slots: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcv_parking_slots: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car_parking_slots: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub two_wheeler_parking_slots: Option<u32>,
    pub fire_compliant: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub office_space_percent: Option<f64>,
    pub fiber_ready: bool,
    pub driver_rest_area: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest_room_beds: Option<u32>,
}

/// Identity of whoever filed the proposal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitterIdentity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facility_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitter_id: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_coordinate"
    )]
    pub latitude: Option<f64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_coordinate"
    )]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_link: Option<String>,
}

impl SubmitterIdentity {
    pub fn facility_code(&self) -> Option<FacilityCode> {
        FacilityCode::from_optional(self.facility_code.as_deref())
    }
}

/// Full set of survey responses for one facility proposal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerSet {
    pub submitter: SubmitterIdentity,
    pub need_identification: NeedIdentification,
    pub operations_network: OperationsNetwork,
    pub location_strategy: LocationStrategy,
    pub facility_specs: FacilitySpecs,
}

/// Coordinates arrive from forms as text as often as numbers.
pub(crate) fn deserialize_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(value)) => Ok(Some(value)),
        Some(Raw::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .map(Some)
                .map_err(|err| serde::de::Error::custom(format!("'{text}' is not a number ({err})")))
        }
    }
}
