#![allow(dead_code)]
use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use marquee_notify::Notifier;
use marquee_presence::PresenceTracker;
use marquee_server::app::{AppState, build_router};
use marquee_store::{ContentStore, MemoryStore};
use std::sync::Arc;
use tower::ServiceExt;

pub fn test_state() -> AppState {
    let store: Arc<dyn ContentStore> = Arc::new(MemoryStore::new());
    let notifier = Arc::new(Notifier::new());
    let presence = Arc::new(PresenceTracker::new());
    AppState::new(store, notifier, presence)
}

pub fn test_router() -> (Router, AppState) {
    let state = test_state();
    (build_router(state.clone()), state)
}

pub async fn send(router: &Router, method: &str, uri: &str) -> Response {
    router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response")
}

pub async fn send_json(
    router: &Router,
    method: &str,
    uri: &str,
    body: serde_json::Value,
) -> Response {
    router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
        .expect("response")
}

pub async fn read_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}
