use crate::config::TelemetryConfig;
use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Crates whose events a bare level such as `debug` applies to.
const SERVICE_TARGETS: [&str; 2] = ["facility_scoring", "facility_scoring_api"];

/// Level for every other target when the configured filter is a bare level.
const DEPENDENCY_LEVEL: &str = "warn";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter '{directives}' (from '{configured}')")]
    EnvFilter {
        configured: String,
        directives: String,
        #[source]
        source: ParseError,
    },
    #[error("tracing subscriber already installed: {0}")]
    Subscriber(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Expand `APP_LOG_LEVEL` into filter directives. A bare level scopes to the
/// service crates and keeps dependencies at `warn`; anything else is used as
/// written.
pub fn directives(log_level: &str) -> String {
    let level = log_level.trim();
    let is_bare_level = !level.is_empty() && !level.contains(['=', ',', '[']);
    if !is_bare_level {
        return level.to_string();
    }

    let mut directives = vec![DEPENDENCY_LEVEL.to_string()];
    directives.extend(
        SERVICE_TARGETS
            .iter()
            .map(|target| format!("{target}={level}")),
    );
    directives.join(",")
}

/// `RUST_LOG` wins when set and valid; otherwise the configured level.
pub fn env_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directives = directives(&config.log_level);
    EnvFilter::try_new(&directives).map_err(|source| TelemetryError::EnvFilter {
        configured: config.log_level.clone(),
        directives,
        source,
    })
}

/// Install the global subscriber for the scoring service.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(config)?)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}
