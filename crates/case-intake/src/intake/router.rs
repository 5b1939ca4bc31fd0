use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::SessionId;
use super::repository::SessionStore;
use super::service::{IntakeService, IntakeServiceError};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    pub session_id: SessionId,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PracticeAreaToggle {
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MultiplierUpdate {
    pub phrase: String,
    pub factor: f64,
}

/// Router builder exposing the intake evaluation and catalog administration endpoints.
pub fn intake_router<S>(service: Arc<IntakeService<S>>) -> Router
where
    S: SessionStore + 'static,
{
    Router::new()
        .route("/api/v1/intake/evaluate", post(evaluate_handler::<S>))
        .route(
            "/api/v1/intake/sessions/:session_id",
            get(session_handler::<S>),
        )
        .route(
            "/api/v1/intake/practice-areas/:area_id",
            put(practice_area_handler::<S>),
        )
        .route(
            "/api/v1/intake/patterns/:pattern_id/multipliers",
            put(multiplier_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn evaluate_handler<S>(
    State(service): State<Arc<IntakeService<S>>>,
    axum::Json(request): axum::Json<EvaluateRequest>,
) -> Response
where
    S: SessionStore + 'static,
{
    // Session and catalog locks are blocking; keep them off the async workers.
    let outcome = tokio::task::spawn_blocking(move || {
        service.evaluate_case(&request.session_id, &request.text)
    })
    .await;

    match outcome {
        Ok(Ok(assessment)) => (StatusCode::OK, axum::Json(assessment)).into_response(),
        Ok(Err(error)) => error_response(error),
        Err(join_error) => {
            error!(error = %join_error, "case evaluation task failed");
            let payload = json!({
                "error": "case evaluation failed",
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn session_handler<S>(
    State(service): State<Arc<IntakeService<S>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
{
    let id = SessionId(session_id);
    match service.session(&id) {
        Ok(Some(state)) => (StatusCode::OK, axum::Json(state)).into_response(),
        Ok(None) => {
            let payload = json!({
                "error": "session not found",
                "sessionId": id.0,
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn practice_area_handler<S>(
    State(service): State<Arc<IntakeService<S>>>,
    Path(area_id): Path<String>,
    axum::Json(toggle): axum::Json<PracticeAreaToggle>,
) -> Response
where
    S: SessionStore + 'static,
{
    match service.set_practice_area_enabled(&area_id, toggle.enabled) {
        Ok(()) => {
            let payload = json!({
                "id": area_id,
                "enabled": toggle.enabled,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn multiplier_handler<S>(
    State(service): State<Arc<IntakeService<S>>>,
    Path(pattern_id): Path<String>,
    axum::Json(update): axum::Json<MultiplierUpdate>,
) -> Response
where
    S: SessionStore + 'static,
{
    match service.set_multiplier(&pattern_id, &update.phrase, update.factor) {
        Ok(()) => {
            let catalog = service.catalog();
            let multipliers = catalog
                .pattern(&pattern_id)
                .map(|pattern| json!(pattern.multipliers))
                .unwrap_or(serde_json::Value::Null);
            let payload = json!({
                "patternId": pattern_id,
                "multipliers": multipliers,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn error_response(error: IntakeServiceError) -> Response {
    let status = match &error {
        IntakeServiceError::Catalog(_) => StatusCode::UNPROCESSABLE_ENTITY,
        IntakeServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
