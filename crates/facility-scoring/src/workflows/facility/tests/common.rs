use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::workflows::facility::domain::{
    AnswerSet, ChangeNature, FacilitySpecs, LocationStrategy, NeedIdentification, Operation,
    OperationsNetwork, Scenario, SubmitterIdentity,
};
use crate::workflows::facility::repository::{
    FacilityFilter, NewSubmission, StoreError, SubmissionId, SubmissionRecord, SubmissionStore,
    UpsertOutcome,
};
use crate::workflows::facility::{
    facility_router, FacilityCode, FacilityScoringService, InMemorySubmissionStore, ScoringConfig,
};

pub(super) fn approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

pub(super) fn submitter(code: &str, submitter_id: &str) -> SubmitterIdentity {
    SubmitterIdentity {
        facility_code: Some(code.to_string()),
        submitter_id: Some(submitter_id.to_string()),
        latitude: Some(28.4595),
        longitude: Some(77.0266),
        reference_link: Some("https://maps.example.com/?q=28.4595,77.0266".to_string()),
    }
}

/// A strong proposal for an air and surface hub on the Gurgaon corridor.
pub(super) fn answers(code: &str) -> AnswerSet {
    AnswerSet {
        submitter: submitter(code, "E-1042"),
        need_identification: NeedIdentification {
            scenario: Some(Scenario::Overutilization),
            utilization_percent: Some(92.0),
            ..NeedIdentification::default()
        },
        operations_network: OperationsNetwork {
            operations: [Operation::AirOperation, Operation::SurfaceExpress]
                .into_iter()
                .collect(),
            hubs_within_radius: Some(1),
            airport_distance_km: Some(11.0),
            highway_distance_km: Some(3.5),
            budget_cost_per_area: Some(45.0),
            proposed_cost_per_area: Some(50.0),
        },
        location_strategy: LocationStrategy {
            in_logistics_cluster: true,
            future_infrastructure_nearby: true,
            highway_connected: true,
            hazard_free: true,
            zoning_permits_logistics: true,
            utilities_available: true,
            support_services_nearby: false,
            labor_available: true,
        },
        facility_specs: FacilitySpecs {
            operational_life_years: Some(9.0),
            required_area_sqft: Some(120_000.0),
            clear_height_ft: Some(32.0),
            skylights_present: true,
            ridge_ventilators_present: true,
            column_spacing_width_ft: Some(30.0),
            column_spacing_length_ft: Some(80.0),
            floor_load_tons_per_sqm: Some(5.0),
            dock_doors: Some(36),
            enclosed_dock_percent: Some(20.0),
            dock_height_ft: Some(12.0),
            leveller_percent: Some(60.0),
            canopy_length_ft: Some(16.0),
            apron_clearance_height_ft: Some(20.0),
            side_clearance_ft: Some(12.0),
            tail_mating_possible: true,
            dual_sided_docks: false,
            hcv_apron_clearance_ft: Some(75.0),
            hcv_parking_slots: Some(8),
            mcv_parking_slots: Some(12),
            car_parking_slots: Some(6),
            two_wheeler_parking_slots: Some(50),
            fire_compliant: true,
            office_space_percent: Some(4.0),
            fiber_ready: true,
            driver_rest_area: true,
            rest_room_beds: Some(6),
        },
    }
}

/// Same facility, re-filed after a sudden external change.
pub(super) fn revised_answers(code: &str) -> AnswerSet {
    let mut answers = answers(code);
    answers.submitter.submitter_id = Some("E-2210".to_string());
    answers.submitter.latitude = Some(28.5);
    answers.need_identification = NeedIdentification {
        scenario: Some(Scenario::ExternalFactor),
        change_nature: Some(ChangeNature::Sudden),
        ..NeedIdentification::default()
    };
    answers
}

pub(super) fn new_submission(code: Option<&str>, submitter_id: &str, total: f64) -> NewSubmission {
    NewSubmission {
        facility_code: FacilityCode::from_optional(code),
        submitter_id: submitter_id.to_string(),
        latitude: 19.076,
        longitude: 72.8777,
        reference_link: None,
        total_score: total,
        answer_payload: None,
    }
}

pub(super) fn build_service() -> (
    FacilityScoringService<InMemorySubmissionStore>,
    Arc<InMemorySubmissionStore>,
) {
    let store = Arc::new(InMemorySubmissionStore::default());
    let service = FacilityScoringService::new(store.clone(), ScoringConfig::default());
    (service, store)
}

pub(super) fn router_with_service(
    service: FacilityScoringService<InMemorySubmissionStore>,
) -> axum::Router {
    facility_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}

/// Store whose every call fails, for exercising error mapping.
#[derive(Debug, Default, Clone, Copy)]
pub(super) struct UnavailableStore;

impl SubmissionStore for UnavailableStore {
    fn upsert(&self, _submission: NewSubmission) -> Result<UpsertOutcome, StoreError> {
        Err(StoreError::Unavailable("database locked".to_string()))
    }

    fn list_latest_per_facility(
        &self,
        _filter: &FacilityFilter,
    ) -> Result<Vec<SubmissionRecord>, StoreError> {
        Err(StoreError::Unavailable("database locked".to_string()))
    }

    fn facility_codes(&self) -> Result<Vec<FacilityCode>, StoreError> {
        Err(StoreError::Unavailable("database locked".to_string()))
    }

    fn get(&self, _id: SubmissionId) -> Result<Option<SubmissionRecord>, StoreError> {
        Err(StoreError::Unavailable("database locked".to_string()))
    }
}
