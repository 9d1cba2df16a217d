//! Response shapes shared across API handlers.
use marquee_store::{Menu, MenuItem, Screen};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Uniform error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub backend: String,
}

/// A menu plus how many items it carries, for admin list views.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MenuListEntry {
    pub menu: Menu,
    pub item_count: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MenuListResponse {
    pub menus: Vec<MenuListEntry>,
}

/// A menu with its items. Admin detail views get every item; display-facing
/// lookups get visible items only.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MenuDetailResponse {
    pub menu: Menu,
    pub items: Vec<MenuItem>,
}

/// One repositioned item inside a reorder batch.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReorderEntry {
    #[schema(value_type = i64)]
    pub id: marquee_common::ids::ItemId,
    pub order_index: i32,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReorderRequest {
    #[schema(value_type = i64)]
    pub menu_id: marquee_common::ids::MenuId,
    pub items: Vec<ReorderEntry>,
}

/// A screen with its presence-derived status. `status` is computed from the
/// heartbeat tracker on every read and never persisted.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScreenListEntry {
    pub screen: Screen,
    pub status: String,
    pub last_seen_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScreenListResponse {
    pub screens: Vec<ScreenListEntry>,
}
