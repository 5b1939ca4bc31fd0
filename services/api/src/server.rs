use crate::cli::ServeArgs;
use crate::infra::{load_catalog, spawn_session_reaper, AppState};
use crate::routes::with_intake_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use case_intake::config::AppConfig;
use case_intake::error::AppError;
use case_intake::intake::{InMemorySessionStore, IntakeService};
use case_intake::telemetry;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let catalog = load_catalog(config.intake.catalog_path.as_deref())?;
    let store = InMemorySessionStore::default();
    let intake_service = Arc::new(IntakeService::new(Arc::new(store.clone()), catalog));
    let _reaper = spawn_session_reaper(store, config.intake.session_ttl());

    let app = with_intake_routes(intake_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "case intake service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
