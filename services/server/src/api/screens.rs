//! Screen endpoints: admin CRUD, the display payload lookup, and the
//! heartbeat receiver.
//!
//! Screen status is derived from the heartbeat tracker at read time and is
//! never written to storage. The display lookup is a pure read; only the
//! heartbeat endpoint feeds the tracker.
use crate::api::error::{ApiError, api_validation_error};
use crate::api::types::{ScreenListEntry, ScreenListResponse};
use crate::app::AppState;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use marquee_common::ScreenToken;
use marquee_common::ids::ScreenId;
use marquee_store::{NewScreen, Screen, ScreenPatch};
use marquee_sync::DisplayPayload;

fn screen_entry(state: &AppState, screen: Screen) -> ScreenListEntry {
    let status = state.presence.status(&screen.token);
    let last_seen_secs = state
        .presence
        .last_seen_age(&screen.token)
        .map(|age| age.as_secs());
    ScreenListEntry {
        screen,
        status: status.as_str().to_string(),
        last_seen_secs,
    }
}

#[utoipa::path(
    get,
    path = "/api/screens",
    responses((status = 200, description = "All screens with derived status", body = ScreenListResponse))
)]
pub async fn list_screens(
    State(state): State<AppState>,
) -> Result<Json<ScreenListResponse>, ApiError> {
    let screens = state.store.list_screens().await?;
    Ok(Json(ScreenListResponse {
        screens: screens
            .into_iter()
            .map(|screen| screen_entry(&state, screen))
            .collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/screens",
    request_body = NewScreen,
    responses(
        (status = 201, description = "Screen created with a fresh token", body = Screen),
        (status = 400, description = "Invalid input", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Assigned menu does not exist", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn create_screen(
    State(state): State<AppState>,
    Json(new): Json<NewScreen>,
) -> Result<(StatusCode, Json<Screen>), ApiError> {
    if new.name.trim().is_empty() {
        return Err(api_validation_error("name must not be empty"));
    }
    let screen = state.store.create_screen(new).await?;
    Ok((StatusCode::CREATED, Json(screen)))
}

#[utoipa::path(
    put,
    path = "/api/screens/{id}",
    params(("id" = i64, Path, description = "Screen id")),
    request_body = ScreenPatch,
    responses(
        (status = 200, description = "Updated screen", body = Screen),
        (status = 404, description = "Unknown screen or menu", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn update_screen(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<ScreenPatch>,
) -> Result<Json<Screen>, ApiError> {
    let screen = state.store.update_screen(ScreenId::new(id), patch).await?;
    // One notice per write; the display refetches everything it renders, so
    // a menu reassignment needs no separate menu notice.
    state.publisher.screen_updated(&screen.token).await;
    Ok(Json(screen))
}

#[utoipa::path(
    delete,
    path = "/api/screens/{id}",
    params(("id" = i64, Path, description = "Screen id")),
    responses(
        (status = 204, description = "Screen removed"),
        (status = 404, description = "Unknown screen", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn delete_screen(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let removed = state.store.delete_screen(ScreenId::new(id)).await?;
    state.presence.forget(&removed.token);
    state.publisher.screen_updated(&removed.token).await;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/screens/display/{token}",
    params(("token" = String, Path, description = "Screen token")),
    responses(
        (status = 200, description = "Everything the display renders", body = DisplayPayload),
        (status = 404, description = "Unknown token", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn display(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<DisplayPayload>, ApiError> {
    let token = ScreenToken::new(token);
    let payload = state.resolver.resolve(&token).await?;
    Ok(Json(payload))
}

#[utoipa::path(
    post,
    path = "/api/screens/heartbeat/{token}",
    params(("token" = String, Path, description = "Screen token")),
    responses((status = 204, description = "Heartbeat accepted"))
)]
pub async fn heartbeat(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<StatusCode, ApiError> {
    let token = ScreenToken::new(token);
    // Unknown tokens get the same 204 so probes cannot enumerate tokens,
    // but they never enter the tracker.
    if state.store.screen_exists_by_token(&token).await? {
        state.presence.record_heartbeat(&token);
    }
    Ok(StatusCode::NO_CONTENT)
}
