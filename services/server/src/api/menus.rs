//! Menu CRUD endpoints.
//!
//! Every successful mutation raises one `menu_updated` notice so subscribed
//! displays refetch; deleting a menu additionally nudges each screen that
//! was pointed at it.
use crate::api::error::{ApiError, api_validation_error};
use crate::api::types::{MenuDetailResponse, MenuListEntry, MenuListResponse};
use crate::app::AppState;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use marquee_common::ids::MenuId;
use marquee_store::{Menu, MenuPatch, NewMenu};

#[utoipa::path(
    get,
    path = "/api/menus",
    responses((status = 200, description = "All menus with item counts", body = MenuListResponse))
)]
pub async fn list_menus(State(state): State<AppState>) -> Result<Json<MenuListResponse>, ApiError> {
    let menus = state.store.list_menus().await?;
    Ok(Json(MenuListResponse {
        menus: menus
            .into_iter()
            .map(|entry| MenuListEntry {
                menu: entry.menu,
                item_count: entry.item_count,
            })
            .collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/menus",
    request_body = NewMenu,
    responses(
        (status = 201, description = "Menu created", body = Menu),
        (status = 400, description = "Invalid input", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Key name already in use", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn create_menu(
    State(state): State<AppState>,
    Json(new): Json<NewMenu>,
) -> Result<(StatusCode, Json<Menu>), ApiError> {
    if new.key_name.trim().is_empty() {
        return Err(api_validation_error("key_name must not be empty"));
    }
    if new.title.trim().is_empty() {
        return Err(api_validation_error("title must not be empty"));
    }
    let menu = state.store.create_menu(new).await?;
    Ok((StatusCode::CREATED, Json(menu)))
}

#[utoipa::path(
    get,
    path = "/api/menus/{id}",
    params(("id" = i64, Path, description = "Menu id")),
    responses(
        (status = 200, description = "Menu with all of its items", body = MenuDetailResponse),
        (status = 404, description = "Unknown menu", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn get_menu(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MenuDetailResponse>, ApiError> {
    let id = MenuId::new(id);
    let menu = state.store.get_menu(id).await?;
    // Admin view: hidden items included.
    let items = state.store.list_items(id, false).await?;
    Ok(Json(MenuDetailResponse { menu, items }))
}

#[utoipa::path(
    get,
    path = "/api/menus/key/{key_name}",
    params(("key_name" = String, Path, description = "Menu key name")),
    responses(
        (status = 200, description = "Menu with its visible items", body = MenuDetailResponse),
        (status = 404, description = "Unknown key", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn get_menu_by_key(
    State(state): State<AppState>,
    Path(key_name): Path<String>,
) -> Result<Json<MenuDetailResponse>, ApiError> {
    let menu = state.store.get_menu_by_key(&key_name).await?;
    let items = state.store.list_items(menu.id, true).await?;
    Ok(Json(MenuDetailResponse { menu, items }))
}

#[utoipa::path(
    put,
    path = "/api/menus/{id}",
    params(("id" = i64, Path, description = "Menu id")),
    request_body = MenuPatch,
    responses(
        (status = 200, description = "Updated menu", body = Menu),
        (status = 404, description = "Unknown menu", body = crate::api::types::ErrorResponse),
        (status = 409, description = "Key name already in use", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn update_menu(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<MenuPatch>,
) -> Result<Json<Menu>, ApiError> {
    let id = MenuId::new(id);
    let menu = state.store.update_menu(id, patch).await?;
    state.publisher.menu_updated(id).await;
    Ok(Json(menu))
}

#[utoipa::path(
    delete,
    path = "/api/menus/{id}",
    params(("id" = i64, Path, description = "Menu id")),
    responses(
        (status = 204, description = "Menu, its items, and screen assignments removed"),
        (status = 404, description = "Unknown menu", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn delete_menu(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let id = MenuId::new(id);
    let deletion = state.store.delete_menu(id).await?;
    state.publisher.menu_updated(id).await;
    // Detached screens refetch and land on the unconfigured payload.
    for token in &deletion.detached_screens {
        state.publisher.screen_updated(token).await;
    }
    tracing::info!(
        menu_id = %id,
        removed_items = deletion.removed_items,
        detached_screens = deletion.detached_screens.len(),
        "menu deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}
