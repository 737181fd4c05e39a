use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::AnswerSet;
use super::repository::{FacilityFilter, SubmissionId, SubmissionStore};
use super::service::{FacilityScoringService, SubmissionError};

/// Router builder exposing scoring, submission, listing, and export endpoints.
pub fn facility_router<S>(service: Arc<FacilityScoringService<S>>) -> Router
where
    S: SubmissionStore + 'static,
{
    Router::new()
        .route("/api/v1/facility/score", post(score_handler::<S>))
        .route(
            "/api/v1/facility/submissions",
            post(submit_handler::<S>).get(list_handler::<S>),
        )
        .route(
            "/api/v1/facility/submissions/export",
            get(export_handler::<S>),
        )
        .route("/api/v1/facility/codes", get(codes_handler::<S>))
        .route("/api/v1/facility/audit", get(audit_handler::<S>))
        .with_state(service)
}

/// Comma separated query parameters shared by the listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    #[serde(default)]
    pub facility_codes: Option<String>,
    #[serde(default)]
    pub ids: Option<String>,
}

impl ListingQuery {
    pub fn filter(&self) -> FacilityFilter {
        self.facility_codes
            .as_deref()
            .map(FacilityFilter::parse_list)
            .unwrap_or_default()
    }

    pub fn selected_ids(&self) -> Result<BTreeSet<SubmissionId>, String> {
        let Some(raw) = self.ids.as_deref() else {
            return Ok(BTreeSet::new());
        };
        raw.split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| {
                id.parse::<i64>()
                    .map(SubmissionId)
                    .map_err(|_| format!("'{id}' is not a submission id"))
            })
            .collect()
    }
}

pub(crate) async fn score_handler<S>(
    State(service): State<Arc<FacilityScoringService<S>>>,
    axum::Json(answers): axum::Json<AnswerSet>,
) -> Response
where
    S: SubmissionStore + 'static,
{
    let scores = service.score(&answers);
    (StatusCode::OK, axum::Json(scores)).into_response()
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<FacilityScoringService<S>>>,
    axum::Json(answers): axum::Json<AnswerSet>,
) -> Response
where
    S: SubmissionStore + 'static,
{
    match run_blocking(service, move |service| service.submit(answers)).await {
        Ok(receipt) => {
            let status = if receipt.was_update {
                StatusCode::OK
            } else {
                StatusCode::CREATED
            };
            (status, axum::Json(receipt)).into_response()
        }
        Err(response) => response,
    }
}

pub(crate) async fn list_handler<S>(
    State(service): State<Arc<FacilityScoringService<S>>>,
    Query(query): Query<ListingQuery>,
) -> Response
where
    S: SubmissionStore + 'static,
{
    let filter = query.filter();
    match run_blocking(service, move |service| service.summaries(&filter)).await {
        Ok(summaries) => (StatusCode::OK, axum::Json(summaries)).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn export_handler<S>(
    State(service): State<Arc<FacilityScoringService<S>>>,
    Query(query): Query<ListingQuery>,
) -> Response
where
    S: SubmissionStore + 'static,
{
    let selected = match query.selected_ids() {
        Ok(selected) => selected,
        Err(message) => {
            let payload = json!({ "error": message });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    let filter = query.filter();
    match run_blocking(service, move |service| service.export_csv(&filter, &selected)).await {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"facility_submissions_inputs.csv\"",
                ),
            ],
            csv,
        )
            .into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn codes_handler<S>(
    State(service): State<Arc<FacilityScoringService<S>>>,
) -> Response
where
    S: SubmissionStore + 'static,
{
    match run_blocking(service, |service| service.facility_codes()).await {
        Ok(codes) => (StatusCode::OK, axum::Json(json!({ "facility_codes": codes }))).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn audit_handler<S>(
    State(service): State<Arc<FacilityScoringService<S>>>,
    Query(query): Query<ListingQuery>,
) -> Response
where
    S: SubmissionStore + 'static,
{
    let filter = query.filter();
    match run_blocking(service, move |service| service.audit(&filter)).await {
        Ok(audits) => (StatusCode::OK, axum::Json(audits)).into_response(),
        Err(response) => response,
    }
}

/// Store calls block (SQLite waits up to its busy timeout), so they run on the
/// blocking pool instead of an executor thread.
async fn run_blocking<S, F, T>(
    service: Arc<FacilityScoringService<S>>,
    operation: F,
) -> Result<T, Response>
where
    S: SubmissionStore + 'static,
    F: FnOnce(&FacilityScoringService<S>) -> Result<T, SubmissionError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(move || operation(&service)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(error_response(error)),
        Err(join_error) => {
            error!(error = %join_error, "store task did not complete");
            let payload = json!({ "error": "store task did not complete" });
            Err((StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response())
        }
    }
}

fn error_response(error: SubmissionError) -> Response {
    let status = if error.is_validation() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
