//! Content model: menus, their items, and the screens that display them.
//!
//! Menus own their items (deleting a menu cascades). Screens reference a
//! menu without owning it; deleting the menu detaches the screen instead of
//! breaking it. Online/offline status is intentionally absent here: it is
//! derived from heartbeat receipts at read time, never stored.
use chrono::{DateTime, Utc};
use marquee_common::ScreenToken;
use marquee_common::ids::{ItemId, MenuId, ScreenId};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_THEME_COLOR: &str = "#FF6B35";
pub const DEFAULT_BG_COLOR: &str = "#FFFFFF";
pub const DEFAULT_TEXT_COLOR: &str = "#2C3E50";
pub const DEFAULT_FONT_FAMILY: &str = "Rubik";
pub const DEFAULT_FONT_SIZE_TITLE: i32 = 52;
pub const DEFAULT_FONT_SIZE_ITEM: i32 = 24;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Menu {
    #[schema(value_type = i64)]
    pub id: MenuId,
    /// Unique human-readable key, e.g. `lunch-specials`.
    pub key_name: String,
    pub title: String,
    pub theme_color: String,
    pub bg_color: String,
    pub text_color: String,
    pub font_family: String,
    pub font_size_title: i32,
    pub font_size_item: i32,
    /// Optional background video played behind the menu.
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MenuItem {
    #[schema(value_type = i64)]
    pub id: ItemId,
    #[schema(value_type = i64)]
    pub menu_id: MenuId,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub is_visible: bool,
    /// Display position. Values need not be contiguous or unique at rest;
    /// readers always sort by `(order_index, id)`.
    pub order_index: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Screen {
    #[schema(value_type = i64)]
    pub id: ScreenId,
    pub name: String,
    /// Opaque display address; not derivable from the numeric id.
    #[schema(value_type = String)]
    pub token: ScreenToken,
    /// Non-owning menu assignment; `None` means unconfigured.
    #[schema(value_type = Option<i64>)]
    pub menu_id: Option<MenuId>,
    pub kiosk_mode: bool,
    pub created_at: DateTime<Utc>,
}

/// Menu plus its visible-item count, for admin list views.
#[derive(Debug, Clone)]
pub struct MenuWithCount {
    pub menu: Menu,
    pub item_count: usize,
}

/// Outcome of a menu deletion: the cascade removed `removed_items` items
/// and detached the listed screens, whose displays must be told to refetch.
#[derive(Debug, Clone)]
pub struct MenuDeletion {
    pub menu_id: MenuId,
    pub removed_items: usize,
    pub detached_screens: Vec<ScreenToken>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewMenu {
    pub key_name: String,
    pub title: String,
    pub theme_color: Option<String>,
    pub bg_color: Option<String>,
    pub text_color: Option<String>,
    pub font_family: Option<String>,
    pub font_size_title: Option<i32>,
    pub font_size_item: Option<i32>,
    pub video_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct MenuPatch {
    pub key_name: Option<String>,
    pub title: Option<String>,
    pub theme_color: Option<String>,
    pub bg_color: Option<String>,
    pub text_color: Option<String>,
    pub font_family: Option<String>,
    pub font_size_title: Option<i32>,
    pub font_size_item: Option<i32>,
    /// Present-and-null clears the video; absent leaves it untouched.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub video_url: Option<Option<String>>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewItem {
    #[schema(value_type = i64)]
    pub menu_id: MenuId,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    /// Defaults to visible.
    pub is_visible: Option<bool>,
    /// Defaults to one past the menu's current maximum.
    pub order_index: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ItemPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>, nullable)]
    pub price: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub image_url: Option<Option<String>>,
    pub is_visible: Option<bool>,
    pub order_index: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewScreen {
    pub name: String,
    #[schema(value_type = Option<i64>)]
    pub menu_id: Option<MenuId>,
    /// Defaults to kiosk mode on, matching how screens are usually deployed.
    pub kiosk_mode: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ScreenPatch {
    pub name: Option<String>,
    /// Present-and-null unassigns the menu; absent leaves it untouched.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>, nullable)]
    pub menu_id: Option<Option<MenuId>>,
    pub kiosk_mode: Option<bool>,
}

// Distinguishes a field that is absent from one that is explicitly null.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
