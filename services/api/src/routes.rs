use std::io::Cursor;
use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;

use crate::infra::AppState;
use tender_eval::error::AppError;
use tender_eval::workflows::tender::evaluation::{
    evaluation_router, EvaluationRepository, TenderEvaluationService, TenderRepository,
};
use tender_eval::workflows::tender::template::{EvaluationTemplate, ScoreTargets};
use tender_eval::workflows::tender::TemplateImporter;

pub(crate) fn with_evaluation_routes<T, E>(
    service: Arc<TenderEvaluationService<T, E>>,
) -> axum::Router
where
    T: TenderRepository + 'static,
    E: EvaluationRepository + 'static,
{
    let targets = service.settings().score_targets();
    evaluation_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/templates/import",
            axum::routing::post(move |payload: Json<TemplateImportRequest>| {
                template_import_endpoint(payload, targets)
            }),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct TemplateImportRequest {
    pub(crate) name: String,
    pub(crate) csv: String,
}

pub(crate) async fn template_import_endpoint(
    Json(payload): Json<TemplateImportRequest>,
    targets: ScoreTargets,
) -> Result<Json<EvaluationTemplate>, AppError> {
    let reader = Cursor::new(payload.csv.into_bytes());
    let template = TemplateImporter::from_reader(reader, &payload.name, &targets)?;
    Ok(Json(template))
}
