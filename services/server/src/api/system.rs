//! Health endpoint.
use crate::api::error::ApiError;
use crate::api::types::HealthStatus;
use crate::app::AppState;
use axum::Json;
use axum::extract::State;

#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service and storage are reachable", body = HealthStatus),
        (status = 500, description = "Storage check failed", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthStatus>, ApiError> {
    state.store.health_check().await?;
    Ok(Json(HealthStatus {
        status: "ok".to_string(),
        backend: state.store.backend_name().to_string(),
    }))
}
