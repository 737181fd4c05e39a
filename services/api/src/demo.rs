use crate::infra::{print_scores, print_summaries};
use clap::Args;
use facility_scoring::error::AppError;
use facility_scoring::workflows::facility::{
    AnswerSet, AuditStatus, ChangeNature, FacilityFilter, FacilityScoringService, FacilitySpecs,
    InMemorySubmissionStore, LocationStrategy, NeedIdentification, Operation, OperationsNetwork,
    Scenario, ScoringConfig, SubmitterIdentity,
};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Facility code used for both sample submissions.
    #[arg(long, default_value = "BLR-HUB-02")]
    pub(crate) facility_code: String,
    /// Print the CSV export of the final listing.
    #[arg(long)]
    pub(crate) export: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        facility_code,
        export,
    } = args;

    println!("Facility scoring demo");
    let store = Arc::new(InMemorySubmissionStore::default());
    let service = FacilityScoringService::new(store.clone(), ScoringConfig::default());

    let draft = demo_answers(&facility_code);
    let mut unscoped = draft.clone();
    unscoped.need_identification = NeedIdentification::default();
    println!("\nDraft without a need scenario:");
    print_scores(&service.score(&unscoped));
    if let Err(err) = service.submit(unscoped) {
        println!("  Submission rejected: {err}");
    }

    println!("\nFirst submission for {facility_code}:");
    let first = service.submit(draft.clone())?;
    print_scores(&first.scores);

    let mut revised = draft;
    revised.submitter.submitter_id = Some("E-5120".to_string());
    revised.need_identification = NeedIdentification {
        scenario: Some(Scenario::ExternalFactor),
        change_nature: Some(ChangeNature::Sudden),
        ..NeedIdentification::default()
    };
    revised.facility_specs.dual_sided_docks = true;

    println!("\nRevised submission for {facility_code}:");
    let second = service.submit(revised)?;
    print_scores(&second.scores);
    println!(
        "  Replaced submission #{} in place: {}",
        first.id.0, second.was_update
    );

    println!("\nLatest submission per facility ({} stored)", store.len());
    let summaries = service.summaries(&FacilityFilter::all())?;
    print_summaries(&summaries);

    for audit in service.audit(&FacilityFilter::all())? {
        let status = match audit.status {
            AuditStatus::Consistent => "consistent".to_string(),
            AuditStatus::Drifted { delta } => format!("drifted by {delta:+.2}"),
            AuditStatus::MissingPayload => "no stored answers".to_string(),
        };
        println!("  Audit #{}: {status}", audit.id.0);
    }

    if export {
        println!("\nCSV export:");
        print!(
            "{}",
            service.export_csv(&FacilityFilter::all(), &BTreeSet::new())?
        );
    }

    Ok(())
}

pub(crate) fn demo_answers(facility_code: &str) -> AnswerSet {
    AnswerSet {
        submitter: SubmitterIdentity {
            facility_code: Some(facility_code.to_string()),
            submitter_id: Some("E-4471".to_string()),
            latitude: Some(13.1986),
            longitude: Some(77.7066),
            reference_link: Some("https://maps.example.com/?q=13.1986,77.7066".to_string()),
        },
        need_identification: NeedIdentification {
            scenario: Some(Scenario::Overutilization),
            utilization_percent: Some(88.0),
            bypass_plan_possible: true,
            ..NeedIdentification::default()
        },
        operations_network: OperationsNetwork {
            operations: [Operation::AirOperation, Operation::SurfaceExpress]
                .into_iter()
                .collect(),
            hubs_within_radius: Some(1),
            airport_distance_km: Some(8.5),
            highway_distance_km: Some(2.0),
            budget_cost_per_area: Some(42.0),
            proposed_cost_per_area: Some(46.0),
        },
        location_strategy: LocationStrategy {
            in_logistics_cluster: true,
            future_infrastructure_nearby: true,
            highway_connected: true,
            hazard_free: true,
            zoning_permits_logistics: true,
            utilities_available: true,
            support_services_nearby: true,
            labor_available: false,
        },
        facility_specs: FacilitySpecs {
            operational_life_years: Some(7.0),
            required_area_sqft: Some(150_000.0),
            clear_height_ft: Some(34.0),
            skylights_present: true,
            ridge_ventilators_present: true,
            column_spacing_width_ft: Some(30.0),
            column_spacing_length_ft: Some(75.0),
            floor_load_tons_per_sqm: Some(6.0),
            dock_doors: Some(48),
            enclosed_dock_percent: Some(15.0),
            dock_height_ft: Some(13.0),
            leveller_percent: Some(55.0),
            canopy_length_ft: Some(18.0),
            apron_clearance_height_ft: Some(20.0),
            side_clearance_ft: Some(12.0),
            tail_mating_possible: true,
            dual_sided_docks: false,
            hcv_apron_clearance_ft: Some(80.0),
            hcv_parking_slots: Some(10),
            mcv_parking_slots: Some(14),
            car_parking_slots: Some(8),
            two_wheeler_parking_slots: Some(60),
            fire_compliant: true,
            office_space_percent: Some(4.5),
            fiber_ready: true,
            driver_rest_area: true,
            rest_room_beds: Some(8),
        },
    }
}
