use facility_scoring::config::AppConfig;
use facility_scoring::error::AppError;
use facility_scoring::workflows::facility::{
    AnswerSet, ScoreResult, SqliteSubmissionStore, SubmissionSummary,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn read_answers(path: &Path) -> Result<AnswerSet, AppError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Explicit path wins; otherwise fall back to the configured database.
pub(crate) fn resolve_database(path: Option<PathBuf>) -> Result<PathBuf, AppError> {
    match path {
        Some(path) => Ok(path),
        None => Ok(AppConfig::load()?.storage.database_path),
    }
}

pub(crate) fn open_store(path: &Path) -> Result<SqliteSubmissionStore, AppError> {
    Ok(SqliteSubmissionStore::open(path)?)
}

pub(crate) fn print_scores(result: &ScoreResult) {
    for (category, score) in result.category_scores() {
        println!("  {:<20} {:>6.2}", category.label(), score);
    }
    println!("  {:<20} {:>6.2}", "Total", result.total);
    if !result.is_complete() {
        println!("  (need identification scenario not selected; submission would be rejected)");
    }
}

pub(crate) fn print_summaries(summaries: &[SubmissionSummary]) {
    if summaries.is_empty() {
        println!("No submissions stored");
        return;
    }

    for summary in summaries {
        println!(
            "- #{} {} by {} at {} -> total {:.2}",
            summary.id.0,
            summary
                .facility_code
                .as_ref()
                .map(|code| code.as_str())
                .unwrap_or("(no code)"),
            summary.submitter_id,
            summary.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            summary.total_score
        );
    }
}
