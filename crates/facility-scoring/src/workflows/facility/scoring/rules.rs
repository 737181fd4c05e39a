use super::super::domain::{
    ChangeNature, LocationStrategy, NeedIdentification, OperationsNetwork, Scenario,
};
use super::config::ScoringConfig;
use super::{finite, CategoryOutcome, CheckOutcome, ScoreCategory};

pub(crate) fn need_identification(
    answers: &NeedIdentification,
    config: &ScoringConfig,
) -> CategoryOutcome {
    let weight = config.weights.need_identification;

    let Some(scenario) = answers.scenario else {
        return CategoryOutcome {
            score: 0.0,
            complete: false,
            checks: vec![CheckOutcome::new(
                ScoreCategory::NeedIdentification,
                "scenario selected",
                0.0,
                true,
            )],
        };
    };

    let (check, credit) = match scenario {
        Scenario::Overutilization => {
            let mut fraction = finite(answers.utilization_percent)
                .map(|percent| (percent / 100.0).clamp(0.0, 1.0))
                .unwrap_or(0.0);
            if answers.process_improvement_possible {
                fraction *= config.process_improvement_multiplier;
            }
            if answers.bypass_plan_possible {
                fraction *= config.bypass_plan_multiplier;
            }
            ("space utilization", fraction)
        }
        Scenario::ExternalFactor => {
            let credit = match answers.change_nature {
                Some(ChangeNature::Planned) => config.planned_change_credit,
                Some(ChangeNature::Sudden) => config.sudden_change_credit,
                None => 0.0,
            };
            ("external change", credit)
        }
        Scenario::Restructuring => {
            let credit = if answers.restructuring_reasons.is_empty() {
                0.0
            } else {
                1.0
            };
            ("restructuring reasons", credit)
        }
    };

    let credit = credit.clamp(0.0, 1.0);
    CategoryOutcome {
        score: credit * weight,
        complete: true,
        checks: vec![CheckOutcome::new(
            ScoreCategory::NeedIdentification,
            check,
            credit,
            true,
        )],
    }
}

/// A category 2 check that only counts toward the ratio when it applies.
struct OperationsCheck {
    label: &'static str,
    applies: fn(&OperationsNetwork) -> bool,
    credit: fn(&OperationsNetwork, &ScoringConfig) -> f64,
}

const OPERATIONS_CHECKS: [OperationsCheck; 4] = [
    OperationsCheck {
        label: "hub density",
        applies: always,
        credit: hub_density,
    },
    OperationsCheck {
        label: "airport proximity",
        applies: OperationsNetwork::requires_air,
        credit: airport_proximity,
    },
    OperationsCheck {
        label: "highway proximity",
        applies: OperationsNetwork::requires_surface,
        credit: highway_proximity,
    },
    OperationsCheck {
        label: "cost efficiency",
        applies: always,
        credit: cost_efficiency,
    },
];

fn always(_: &OperationsNetwork) -> bool {
    true
}

fn hub_density(answers: &OperationsNetwork, config: &ScoringConfig) -> f64 {
    match answers.hubs_within_radius {
        Some(hubs) if hubs <= config.max_nearby_hubs => 1.0,
        _ => 0.0,
    }
}

fn airport_proximity(answers: &OperationsNetwork, config: &ScoringConfig) -> f64 {
    within(answers.airport_distance_km, config.max_airport_distance_km)
}

fn highway_proximity(answers: &OperationsNetwork, config: &ScoringConfig) -> f64 {
    within(answers.highway_distance_km, config.max_highway_distance_km)
}

fn within(distance: Option<f64>, max: f64) -> f64 {
    match finite(distance) {
        Some(distance) if distance <= max => 1.0,
        _ => 0.0,
    }
}

/// Budgeted over proposed cost per unit area; partial credit when over budget.
fn cost_efficiency(answers: &OperationsNetwork, _config: &ScoringConfig) -> f64 {
    match (
        finite(answers.budget_cost_per_area),
        finite(answers.proposed_cost_per_area),
    ) {
        (Some(budget), Some(proposed)) if budget > 0.0 && proposed > 0.0 => {
            (budget / proposed).clamp(0.0, 1.0)
        }
        _ => 0.0,
    }
}

pub(crate) fn operations_network(
    answers: &OperationsNetwork,
    config: &ScoringConfig,
) -> CategoryOutcome {
    let mut earned = 0.0;
    let mut counted = 0.0;
    let mut checks = Vec::with_capacity(OPERATIONS_CHECKS.len());

    for check in &OPERATIONS_CHECKS {
        let applies = (check.applies)(answers);
        let credit = if applies {
            (check.credit)(answers, config)
        } else {
            0.0
        };
        if applies {
            earned += credit;
            counted += 1.0;
        }
        checks.push(CheckOutcome::new(
            ScoreCategory::OperationsNetwork,
            check.label,
            credit,
            applies,
        ));
    }

    let score = if counted > 0.0 {
        earned / counted * config.weights.operations_network
    } else {
        0.0
    };

    CategoryOutcome {
        score,
        complete: true,
        checks,
    }
}

pub(crate) fn location_strategy(answers: &LocationStrategy, weight: f64) -> CategoryOutcome {
    let flags = answers.checks();
    let met = flags.iter().filter(|(_, met)| *met).count();

    let checks = flags
        .iter()
        .map(|(label, met)| {
            CheckOutcome::new(
                ScoreCategory::LocationStrategy,
                label,
                if *met { 1.0 } else { 0.0 },
                true,
            )
        })
        .collect();

    CategoryOutcome {
        score: met as f64 / flags.len() as f64 * weight,
        complete: true,
        checks,
    }
}
