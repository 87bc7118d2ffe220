use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use tracing::info;

use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryEvaluationRepository, InMemoryTenderRepository};
use crate::routes::with_evaluation_routes;
use tender_eval::config::AppConfig;
use tender_eval::error::AppError;
use tender_eval::telemetry;
use tender_eval::workflows::tender::evaluation::TenderEvaluationService;

const RESYNC_INTERVAL: Duration = Duration::from_secs(300);

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

    let tenders = Arc::new(InMemoryTenderRepository::default());
    let evaluations = Arc::new(InMemoryEvaluationRepository::default());
    let service = Arc::new(TenderEvaluationService::new(
        tenders,
        evaluations,
        config.evaluation,
    ));

    // Poll-and-reconcile sweep: re-derives every tender status from source
    // records, so repeated or overlapping runs converge to the same result.
    let resync_service = service.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(RESYNC_INTERVAL);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            resync_service.resync(Utc::now());
        }
    });

    let app = with_evaluation_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "tender evaluation service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
