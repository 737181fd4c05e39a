use serde::{Deserialize, Serialize};

/// Maximum points each category contributes to the total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights {
    pub need_identification: f64,
    pub operations_network: f64,
    pub location_strategy: f64,
    pub facility_specs: f64,
}

impl CategoryWeights {
    pub fn total(&self) -> f64 {
        self.need_identification
            + self.operations_network
            + self.location_strategy
            + self.facility_specs
    }
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            need_identification: 10.0,
            operations_network: 20.0,
            location_strategy: 35.0,
            facility_specs: 35.0,
        }
    }
}

/// Policy constants for the scoring rubric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub weights: CategoryWeights,
    /// Applied when internal process or layout changes could absorb demand.
    pub process_improvement_multiplier: f64,
    /// Applied when a bypass or mesh plan could absorb demand.
    pub bypass_plan_multiplier: f64,
    pub planned_change_credit: f64,
    pub sudden_change_credit: f64,
    pub max_nearby_hubs: u32,
    pub max_airport_distance_km: f64,
    pub max_highway_distance_km: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: CategoryWeights::default(),
            process_improvement_multiplier: 0.6,
            bypass_plan_multiplier: 0.8,
            planned_change_credit: 0.5,
            sudden_change_credit: 1.0,
            max_nearby_hubs: 1,
            max_airport_distance_km: 15.0,
            max_highway_distance_km: 15.0,
        }
    }
}
