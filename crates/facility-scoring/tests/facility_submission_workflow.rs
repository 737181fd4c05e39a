//! Integration scenarios for facility proposal scoring and submission storage.
//!
//! Proposals enter as the JSON a survey form would post, then flow through the public
//! service facade and HTTP router against a real SQLite file.

mod common {
    use std::sync::Arc;

    use serde_json::{json, Value};
    use tempfile::TempDir;

    use facility_scoring::workflows::facility::{
        AnswerSet, FacilityScoringService, ScoringConfig, SqliteSubmissionStore,
    };

    pub(super) fn proposal(code: &str, submitter_id: &str, utilization: f64) -> Value {
        json!({
            "submitter": {
                "facility_code": code,
                "submitter_id": submitter_id,
                "latitude": "17.3850",
                "longitude": 78.4867,
                "reference_link": "https://maps.example.com/?q=17.3850,78.4867"
            },
            "need_identification": {
                "scenario": "overutilization",
                "utilization_percent": utilization,
                "process_improvement_possible": true
            },
            "operations_network": {
                "operations": ["surface_ltl", "branch"],
                "hubs_within_radius": 0,
                "highway_distance_km": 4.0,
                "budget_cost_per_area": 38.0,
                "proposed_cost_per_area": 40.0
            },
            "location_strategy": {
                "in_logistics_cluster": true,
                "highway_connected": true,
                "zoning_permits_logistics": true,
                "labor_available": true
            },
            "facility_specs": {
                "operational_life_years": 3,
                "required_area_sqft": 60000,
                "clear_height_ft": 28,
                "dock_doors": 12,
                "dock_height_ft": 11,
                "fire_compliant": true,
                "car_parking_slots": 4,
                "two_wheeler_parking_slots": 40
            }
        })
    }

    pub(super) fn answer_set(value: Value) -> AnswerSet {
        serde_json::from_value(value).expect("valid answer set")
    }

    pub(super) fn sqlite_service() -> (TempDir, Arc<FacilityScoringService<SqliteSubmissionStore>>)
    {
        let dir = tempfile::tempdir().expect("temp dir");
        let store =
            SqliteSubmissionStore::open(dir.path().join("facility.db")).expect("open store");
        let service = FacilityScoringService::new(Arc::new(store), ScoringConfig::default());
        (dir, Arc::new(service))
    }

    pub(super) fn approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }
}

use std::collections::BTreeSet;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use common::*;
use facility_scoring::workflows::facility::{facility_router, AuditStatus, FacilityFilter};

#[test]
fn form_submission_is_scored_with_conditional_operations_checks() {
    let (_dir, service) = sqlite_service();

    let receipt = service
        .submit(answer_set(proposal("HYD-05", "E-311", 85.0)))
        .expect("submission stored");

    approx(receipt.scores.need_identification, 0.85 * 0.6 * 10.0);
    approx(receipt.scores.operations_network, 2.95 / 3.0 * 20.0);
    approx(receipt.scores.location_strategy, 4.0 / 8.0 * 35.0);
    // life 0.6, docks 12/24, dock height, fire, parking.
    approx(receipt.scores.facility_specs, 4.1 / 25.0 * 35.0);
    approx(
        receipt.scores.total,
        receipt.scores.need_identification
            + receipt.scores.operations_network
            + receipt.scores.location_strategy
            + receipt.scores.facility_specs,
    );
}

#[test]
fn latest_submission_per_facility_survives_reopen() {
    let (dir, service) = sqlite_service();

    service
        .submit(answer_set(proposal("HYD-05", "E-311", 85.0)))
        .expect("first");
    service
        .submit(answer_set(proposal("", "E-400", 70.0)))
        .expect("uncoded");
    let latest = service
        .submit(answer_set(proposal("HYD-05", "E-312", 95.0)))
        .expect("second");
    assert!(latest.was_update);

    let reopened = facility_scoring::workflows::facility::SqliteSubmissionStore::open(
        dir.path().join("facility.db"),
    )
    .expect("reopen");
    let listing = facility_scoring::workflows::facility::SubmissionStore::list_latest_per_facility(
        &reopened,
        &FacilityFilter::all(),
    )
    .expect("listing");

    assert_eq!(listing.len(), 2);
    assert_eq!(listing[0].id, latest.id);
    assert_eq!(listing[0].submitter_id, "E-312");
    assert!(listing[1].facility_code.is_none());
}

#[test]
fn stored_payloads_rescore_to_their_stored_totals() {
    let (_dir, service) = sqlite_service();
    service
        .submit(answer_set(proposal("HYD-05", "E-311", 85.0)))
        .expect("submit");
    service
        .submit(answer_set(proposal("VTZ-01", "E-77", 101.5)))
        .expect("submit");

    let audits = service.audit(&FacilityFilter::all()).expect("audit");
    assert_eq!(audits.len(), 2);
    assert!(audits
        .iter()
        .all(|audit| audit.status == AuditStatus::Consistent));
}

#[test]
fn export_of_selected_submission_flattens_answers() {
    let (_dir, service) = sqlite_service();
    let first = service
        .submit(answer_set(proposal("HYD-05", "E-311", 85.0)))
        .expect("submit");
    service
        .submit(answer_set(proposal("VTZ-01", "E-77", 60.0)))
        .expect("submit");

    let selected: BTreeSet<_> = [first.id].into_iter().collect();
    let csv = service
        .export_csv(&FacilityFilter::all(), &selected)
        .expect("export");

    let mut lines = csv.lines();
    let header = lines.next().expect("header row");
    assert!(header.starts_with("submitter.facility_code,submitter.submitter_id"));
    assert!(header.contains("operations_network.operations"));
    let row = lines.next().expect("data row");
    assert!(row.starts_with("HYD-05,E-311"));
    assert!(row.contains("surface_ltl; branch"));
    assert!(lines.next().is_none());
}

#[tokio::test]
async fn router_rejects_incomplete_proposals_and_accepts_revisions() {
    let (_dir, service) = sqlite_service();
    let router = facility_router(service);

    let mut incomplete = proposal("HYD-05", "E-311", 85.0);
    incomplete["need_identification"] = serde_json::json!({});
    let response = router
        .clone()
        .oneshot(
            Request::post("/api/v1/facility/submissions")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(incomplete.to_string()))
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    for (submitter, expected) in [("E-311", StatusCode::CREATED), ("E-312", StatusCode::OK)] {
        let response = router
            .clone()
            .oneshot(
                Request::post("/api/v1/facility/submissions")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(proposal("HYD-05", submitter, 85.0).to_string()))
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(response.status(), expected);
    }

    let response = router
        .oneshot(
            Request::get("/api/v1/facility/submissions?facility_codes=HYD-05")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    let rows: Value = serde_json::from_slice(&body).expect("json payload");
    let rows = rows.as_array().expect("listing array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["submitter_id"], "E-312");
}
