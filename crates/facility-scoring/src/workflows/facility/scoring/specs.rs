use super::super::domain::FacilitySpecs;
use super::{finite, CategoryOutcome, CheckOutcome, ScoreCategory};

const MAX_OPERATIONAL_LIFE_YEARS: f64 = 5.0;
const MIN_AREA_SQFT: f64 = 100_000.0;
const MIN_CLEAR_HEIGHT_FT: f64 = 30.0;
const MIN_COLUMN_WIDTH_FT: f64 = 25.0;
const MIN_COLUMN_LENGTH_FT: f64 = 75.0;
const MIN_FLOOR_LOAD_TONS: f64 = 5.0;
const AREA_PER_DOCK_SQFT: f64 = 2_500.0;
const MIN_ENCLOSED_DOCK_PERCENT: f64 = 10.0;
const DOCK_HEIGHT_FT: (f64, f64) = (10.0, 15.0);
const MIN_LEVELLER_PERCENT: f64 = 50.0;
const MIN_CANOPY_FT: f64 = 15.0;
const MIN_APRON_CLEARANCE_FT: f64 = 18.0;
const MIN_SIDE_CLEARANCE_FT: f64 = 10.0;
const MIN_HCV_SLOTS: u32 = 6;
const MIN_MCV_SLOTS: u32 = 10;
const MIN_CAR_SLOTS: u32 = 4;
const MIN_TWO_WHEELER_SLOTS: u32 = 40;
const OFFICE_SPACE_PERCENT: (f64, f64) = (3.0, 5.0);
const MIN_REST_ROOM_BEDS: u32 = 5;

/// Number of sub-scores averaged into the facility category.
pub const SCORED_SPEC_CHECKS: usize = 25;

/// Dock doors suggested for the forecast area; zero without a positive area.
pub fn recommended_docks(area_sqft: Option<f64>) -> f64 {
    match finite(area_sqft) {
        Some(area) if area > 0.0 => area / AREA_PER_DOCK_SQFT,
        _ => 0.0,
    }
}

pub(crate) fn facility_specs(specs: &FacilitySpecs, weight: f64) -> CategoryOutcome {
    let scored = spec_checks(specs);
    let earned: f64 = scored.iter().map(|(_, credit)| credit).sum();

    let checks = scored
        .iter()
        .map(|(label, credit)| CheckOutcome::new(ScoreCategory::FacilitySpecs, label, *credit, true))
        .collect();

    CategoryOutcome {
        score: earned / scored.len() as f64 * weight,
        complete: true,
        checks,
    }
}

fn spec_checks(specs: &FacilitySpecs) -> [(&'static str, f64); SCORED_SPEC_CHECKS] {
    [
        ("operational life", operational_life(specs.operational_life_years)),
        ("facility area", at_least(specs.required_area_sqft, MIN_AREA_SQFT)),
        ("clear height", at_least(specs.clear_height_ft, MIN_CLEAR_HEIGHT_FT)),
        ("skylights", flag(specs.skylights_present)),
        ("ridge ventilators", flag(specs.ridge_ventilators_present)),
        (
            "column spacing width",
            at_least(specs.column_spacing_width_ft, MIN_COLUMN_WIDTH_FT),
        ),
        (
            "column spacing length",
            at_least(specs.column_spacing_length_ft, MIN_COLUMN_LENGTH_FT),
        ),
        (
            "floor load",
            at_least(specs.floor_load_tons_per_sqm, MIN_FLOOR_LOAD_TONS),
        ),
        (
            "dock sufficiency",
            dock_sufficiency(specs.dock_doors, specs.required_area_sqft),
        ),
        (
            "enclosed docks",
            at_least(specs.enclosed_dock_percent, MIN_ENCLOSED_DOCK_PERCENT),
        ),
        ("dock height", between(specs.dock_height_ft, DOCK_HEIGHT_FT)),
        (
            "dock levellers",
            at_least(specs.leveller_percent, MIN_LEVELLER_PERCENT),
        ),
        ("canopy length", at_least(specs.canopy_length_ft, MIN_CANOPY_FT)),
        (
            "apron clearance",
            at_least(specs.apron_clearance_height_ft, MIN_APRON_CLEARANCE_FT),
        ),
        (
            "side clearance",
            at_least(specs.side_clearance_ft, MIN_SIDE_CLEARANCE_FT),
        ),
        ("tail mating", flag(specs.tail_mating_possible)),
        ("dual sided docks", flag(specs.dual_sided_docks)),
        ("hcv parking", at_least_count(specs.hcv_parking_slots, MIN_HCV_SLOTS)),
        ("mcv parking", at_least_count(specs.mcv_parking_slots, MIN_MCV_SLOTS)),
        ("employee parking", employee_parking(specs)),
        ("fire compliance", flag(specs.fire_compliant)),
        (
            "office space",
            between(specs.office_space_percent, OFFICE_SPACE_PERCENT),
        ),
        ("fiber connectivity", flag(specs.fiber_ready)),
        ("driver rest area", flag(specs.driver_rest_area)),
        (
            "rest room beds",
            at_least_count(specs.rest_room_beds, MIN_REST_ROOM_BEDS),
        ),
    ]
}

fn operational_life(years: Option<f64>) -> f64 {
    finite(years)
        .map(|years| years.clamp(0.0, MAX_OPERATIONAL_LIFE_YEARS) / MAX_OPERATIONAL_LIFE_YEARS)
        .unwrap_or(0.0)
}

fn dock_sufficiency(docks: Option<u32>, area_sqft: Option<f64>) -> f64 {
    let recommended = recommended_docks(area_sqft);
    match docks {
        Some(docks) if recommended > 0.0 => (f64::from(docks) / recommended).min(1.0),
        _ => 0.0,
    }
}

fn employee_parking(specs: &FacilitySpecs) -> f64 {
    let cars = specs.car_parking_slots.is_some_and(|slots| slots >= MIN_CAR_SLOTS);
    let two_wheelers = specs
        .two_wheeler_parking_slots
        .is_some_and(|slots| slots >= MIN_TWO_WHEELER_SLOTS);
    flag(cars && two_wheelers)
}

fn at_least(value: Option<f64>, min: f64) -> f64 {
    flag(finite(value).is_some_and(|value| value >= min))
}

fn at_least_count(value: Option<u32>, min: u32) -> f64 {
    flag(value.is_some_and(|value| value >= min))
}

fn between(value: Option<f64>, (low, high): (f64, f64)) -> f64 {
    flag(finite(value).is_some_and(|value| (low..=high).contains(&value)))
}

fn flag(met: bool) -> f64 {
    if met {
        1.0
    } else {
        0.0
    }
}
