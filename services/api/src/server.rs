use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_facility_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use facility_scoring::config::{AppConfig, StoreBackend};
use facility_scoring::error::AppError;
use facility_scoring::telemetry;
use facility_scoring::workflows::facility::{
    FacilityScoringService, InMemorySubmissionStore, ScoringConfig, SqliteSubmissionStore,
    SubmissionStore,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(database) = args.database.take() {
        config.storage.database_path = database;
    }
    if args.in_memory {
        config.storage.backend = StoreBackend::Memory;
    }

    telemetry::init(&config.telemetry)?;

    match config.storage.backend {
        StoreBackend::Sqlite => {
            let store = SqliteSubmissionStore::open(&config.storage.database_path)?;
            info!(path = %config.storage.database_path.display(), "using sqlite submission store");
            serve(config, Arc::new(store)).await
        }
        StoreBackend::Memory => {
            info!("using in-memory submission store");
            serve(config, Arc::new(InMemorySubmissionStore::default())).await
        }
    }
}

async fn serve<S>(config: AppConfig, store: Arc<S>) -> Result<(), AppError>
where
    S: SubmissionStore + 'static,
{
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let service = Arc::new(FacilityScoringService::new(store, ScoringConfig::default()));

    let app = with_facility_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "facility scoring service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
