//! Menu item endpoints, including the batch reorder operation.
use crate::api::error::{ApiError, api_validation_error};
use crate::api::types::ReorderRequest;
use crate::app::AppState;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use marquee_common::ids::ItemId;
use marquee_store::{ItemPatch, MenuItem, NewItem};

#[utoipa::path(
    post,
    path = "/api/items",
    request_body = NewItem,
    responses(
        (status = 201, description = "Item created", body = MenuItem),
        (status = 400, description = "Invalid input", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Unknown menu", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn create_item(
    State(state): State<AppState>,
    Json(new): Json<NewItem>,
) -> Result<(StatusCode, Json<MenuItem>), ApiError> {
    if new.name.trim().is_empty() {
        return Err(api_validation_error("name must not be empty"));
    }
    let item = state.store.create_item(new).await?;
    state.publisher.menu_updated(item.menu_id).await;
    Ok((StatusCode::CREATED, Json(item)))
}

#[utoipa::path(
    put,
    path = "/api/items/{id}",
    params(("id" = i64, Path, description = "Item id")),
    request_body = ItemPatch,
    responses(
        (status = 200, description = "Updated item", body = MenuItem),
        (status = 404, description = "Unknown item", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<ItemPatch>,
) -> Result<Json<MenuItem>, ApiError> {
    let item = state.store.update_item(ItemId::new(id), patch).await?;
    state.publisher.menu_updated(item.menu_id).await;
    Ok(Json(item))
}

#[utoipa::path(
    delete,
    path = "/api/items/{id}",
    params(("id" = i64, Path, description = "Item id")),
    responses(
        (status = 204, description = "Item removed"),
        (status = 404, description = "Unknown item", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let removed = state.store.delete_item(ItemId::new(id)).await?;
    state.publisher.menu_updated(removed.menu_id).await;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/items/reorder",
    request_body = ReorderRequest,
    responses(
        (status = 204, description = "Batch applied; one menu_updated notice raised"),
        (status = 404, description = "Unknown menu", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Batch rejected, nothing applied", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn reorder_items(
    State(state): State<AppState>,
    Json(request): Json<ReorderRequest>,
) -> Result<StatusCode, ApiError> {
    let batch: Vec<_> = request
        .items
        .iter()
        .map(|entry| (entry.id, entry.order_index))
        .collect();
    state.ordering.reorder(request.menu_id, &batch).await?;
    Ok(StatusCode::NO_CONTENT)
}
