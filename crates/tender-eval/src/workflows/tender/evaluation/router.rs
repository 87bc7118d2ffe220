use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::conflict::{DeclarationId, ReviewDecision};
use super::domain::{EvaluatorId, ScoreSubmission};
use super::repository::{EvaluationRepository, RepositoryError, TenderRepository};
use super::service::{
    NewAssignment, NewDeclaration, OverrideRequest, ServiceError, TenderEvaluationService,
};
use super::session::ScorecardError;
use crate::workflows::tender::domain::TenderId;

/// Router builder exposing the evaluation workflow over HTTP.
pub fn evaluation_router<T, E>(service: Arc<TenderEvaluationService<T, E>>) -> Router
where
    T: TenderRepository + 'static,
    E: EvaluationRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/tenders/:tender_id/assignment",
            post(create_assignment_handler::<T, E>),
        )
        .route(
            "/api/v1/tenders/:tender_id/scores",
            post(submit_scores_handler::<T, E>),
        )
        .route(
            "/api/v1/tenders/:tender_id/scores/draft",
            post(save_draft_handler::<T, E>),
        )
        .route(
            "/api/v1/tenders/:tender_id/conflicts",
            post(declare_conflict_handler::<T, E>),
        )
        .route(
            "/api/v1/conflicts/:declaration_id/review",
            post(review_conflict_handler::<T, E>),
        )
        .route(
            "/api/v1/tenders/:tender_id/overrides",
            post(chairman_override_handler::<T, E>),
        )
        .route(
            "/api/v1/tenders/:tender_id/approve",
            post(approve_all_handler::<T, E>),
        )
        .route(
            "/api/v1/tenders/:tender_id/ranking",
            get(ranking_handler::<T, E>),
        )
        .route(
            "/api/v1/tenders/:tender_id/status",
            get(status_handler::<T, E>),
        )
        .with_state(service)
}

fn error_response(error: ServiceError) -> Response {
    let status = match &error {
        ServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        ServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        ServiceError::Scorecard(ScorecardError::Locked { .. }) => StatusCode::CONFLICT,
        ServiceError::Scorecard(ScorecardError::UnknownCriterion(_)) => StatusCode::NOT_FOUND,
        ServiceError::ChairmanOnly => StatusCode::FORBIDDEN,
        ServiceError::OverrideUnavailable { .. } => StatusCode::CONFLICT,
        ServiceError::Conflict(_) => StatusCode::CONFLICT,
        ServiceError::Assignment(_)
        | ServiceError::Template(_)
        | ServiceError::Scorecard(_)
        | ServiceError::UnknownEvaluator(_)
        | ServiceError::NonScoringEvaluator(_)
        | ServiceError::UnknownBidder(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };

    let body = axum::Json(json!({ "error": error.to_string() }));
    (status, body).into_response()
}

pub(crate) async fn create_assignment_handler<T, E>(
    State(service): State<Arc<TenderEvaluationService<T, E>>>,
    Path(tender_id): Path<String>,
    axum::Json(mut request): axum::Json<NewAssignment>,
) -> Response
where
    T: TenderRepository + 'static,
    E: EvaluationRepository + 'static,
{
    request.tender_id = TenderId(tender_id);
    match service.create_assignment(request) {
        Ok(assignment) => (StatusCode::CREATED, axum::Json(assignment)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_scores_handler<T, E>(
    State(service): State<Arc<TenderEvaluationService<T, E>>>,
    Path(tender_id): Path<String>,
    axum::Json(mut submission): axum::Json<ScoreSubmission>,
) -> Response
where
    T: TenderRepository + 'static,
    E: EvaluationRepository + 'static,
{
    submission.tender_id = TenderId(tender_id);
    match service.submit_scores(submission, Utc::now()) {
        Ok(view) => (StatusCode::ACCEPTED, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn save_draft_handler<T, E>(
    State(service): State<Arc<TenderEvaluationService<T, E>>>,
    Path(tender_id): Path<String>,
    axum::Json(mut submission): axum::Json<ScoreSubmission>,
) -> Response
where
    T: TenderRepository + 'static,
    E: EvaluationRepository + 'static,
{
    submission.tender_id = TenderId(tender_id);
    match service.save_draft(submission) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn declare_conflict_handler<T, E>(
    State(service): State<Arc<TenderEvaluationService<T, E>>>,
    Path(tender_id): Path<String>,
    axum::Json(mut declaration): axum::Json<NewDeclaration>,
) -> Response
where
    T: TenderRepository + 'static,
    E: EvaluationRepository + 'static,
{
    declaration.tender_id = TenderId(tender_id);
    match service.declare_conflict(declaration, Utc::now()) {
        Ok(stored) => (StatusCode::CREATED, axum::Json(stored)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewRequest {
    #[serde(flatten)]
    pub(crate) decision: ReviewDecision,
    pub(crate) reviewer: String,
    #[serde(default)]
    pub(crate) comment: Option<String>,
}

pub(crate) async fn review_conflict_handler<T, E>(
    State(service): State<Arc<TenderEvaluationService<T, E>>>,
    Path(declaration_id): Path<String>,
    axum::Json(request): axum::Json<ReviewRequest>,
) -> Response
where
    T: TenderRepository + 'static,
    E: EvaluationRepository + 'static,
{
    let id = DeclarationId(declaration_id);
    match service.review_conflict(
        &id,
        request.decision,
        request.reviewer,
        request.comment,
        Utc::now(),
    ) {
        Ok(declaration) => (StatusCode::OK, axum::Json(declaration)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn chairman_override_handler<T, E>(
    State(service): State<Arc<TenderEvaluationService<T, E>>>,
    Path(tender_id): Path<String>,
    axum::Json(mut request): axum::Json<OverrideRequest>,
) -> Response
where
    T: TenderRepository + 'static,
    E: EvaluationRepository + 'static,
{
    request.tender_id = TenderId(tender_id);
    match service.chairman_override(request, Utc::now()) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApproveRequest {
    pub(crate) actor: EvaluatorId,
}

pub(crate) async fn approve_all_handler<T, E>(
    State(service): State<Arc<TenderEvaluationService<T, E>>>,
    Path(tender_id): Path<String>,
    axum::Json(request): axum::Json<ApproveRequest>,
) -> Response
where
    T: TenderRepository + 'static,
    E: EvaluationRepository + 'static,
{
    let tender_id = TenderId(tender_id);
    match service.approve_all(&tender_id, &request.actor) {
        Ok(approved) => (
            StatusCode::OK,
            axum::Json(json!({ "approved": approved })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn ranking_handler<T, E>(
    State(service): State<Arc<TenderEvaluationService<T, E>>>,
    Path(tender_id): Path<String>,
) -> Response
where
    T: TenderRepository + 'static,
    E: EvaluationRepository + 'static,
{
    let tender_id = TenderId(tender_id);
    match service.consensus(&tender_id) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<T, E>(
    State(service): State<Arc<TenderEvaluationService<T, E>>>,
    Path(tender_id): Path<String>,
) -> Response
where
    T: TenderRepository + 'static,
    E: EvaluationRepository + 'static,
{
    let tender_id = TenderId(tender_id);
    match service.resolve_status(&tender_id, Utc::now()) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}
