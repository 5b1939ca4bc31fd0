use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::intake::domain::{CaseState, SessionId};
use crate::intake::repository::{InMemorySessionStore, SessionStore, StoreError};
use crate::intake::{intake_router, IntakeService, PatternCatalog};

pub(super) fn catalog() -> PatternCatalog {
    PatternCatalog::standard().expect("standard catalog loads")
}

pub(super) fn session(id: &str) -> SessionId {
    SessionId::new(id)
}

pub(super) fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn build_service() -> (IntakeService<InMemorySessionStore>, InMemorySessionStore) {
    let store = InMemorySessionStore::default();
    let service = IntakeService::new(Arc::new(store.clone()), catalog());
    (service, store)
}

/// Stored state as if an earlier turn had settled on `score`.
pub(super) fn seeded_state(id: &str, score: f64, pattern_id: &str) -> CaseState {
    let mut state = CaseState::new(session(id), at(8));
    state.current_score = Some(score);
    state.matched_pattern_id = Some(pattern_id.to_string());
    state
}

pub(super) struct UnavailableStore;

impl SessionStore for UnavailableStore {
    fn get(&self, _session_id: &SessionId) -> Result<Option<CaseState>, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    fn put(&self, _state: CaseState) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }
}

pub(super) fn router_with_service<S>(service: IntakeService<S>) -> axum::Router
where
    S: SessionStore + 'static,
{
    intake_router(Arc::new(service))
}

pub(super) fn json_request(
    method: &str,
    uri: &str,
    body: Value,
) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(
            serde_json::to_vec(&body).expect("serialize body"),
        ))
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
