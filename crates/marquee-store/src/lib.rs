//! Storage interface for menus, items, and screens.
//!
//! There is exactly one storage contract, [`ContentStore`], and callers hold
//! it as `Arc<dyn ContentStore>`. Mutations return enough context for the
//! caller to raise change notices (owning menu id on item writes, detached
//! screen tokens on menu deletion); the store itself never talks to the
//! notification layer.
use async_trait::async_trait;
use marquee_common::ScreenToken;
use marquee_common::ids::{ItemId, MenuId, ScreenId};
use thiserror::Error;

pub mod memory;
pub mod model;

pub use memory::MemoryStore;
pub use model::{
    ItemPatch, Menu, MenuDeletion, MenuItem, MenuPatch, MenuWithCount, NewItem, NewMenu, NewScreen,
    Screen, ScreenPatch,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    /// A reorder batch referenced items outside the target menu. The whole
    /// batch is rejected; no row was touched.
    #[error("batch conflict: {0}")]
    BatchConflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn list_menus(&self) -> StoreResult<Vec<MenuWithCount>>;
    async fn get_menu(&self, id: MenuId) -> StoreResult<Menu>;
    async fn get_menu_by_key(&self, key_name: &str) -> StoreResult<Menu>;
    async fn create_menu(&self, new: NewMenu) -> StoreResult<Menu>;
    async fn update_menu(&self, id: MenuId, patch: MenuPatch) -> StoreResult<Menu>;
    async fn delete_menu(&self, id: MenuId) -> StoreResult<MenuDeletion>;

    /// Items of a menu, sorted by `(order_index, id)`.
    async fn list_items(&self, menu_id: MenuId, visible_only: bool) -> StoreResult<Vec<MenuItem>>;
    async fn create_item(&self, new: NewItem) -> StoreResult<MenuItem>;
    async fn update_item(&self, id: ItemId, patch: ItemPatch) -> StoreResult<MenuItem>;
    /// Returns the removed item so the caller knows the owning menu.
    async fn delete_item(&self, id: ItemId) -> StoreResult<MenuItem>;
    /// Apply every `(item, order_index)` pair or none of them. Every item
    /// must belong to `menu_id`; a foreign item rejects the whole batch.
    async fn reorder_items(&self, menu_id: MenuId, batch: &[(ItemId, i32)]) -> StoreResult<()>;

    async fn list_screens(&self) -> StoreResult<Vec<Screen>>;
    async fn get_screen(&self, id: ScreenId) -> StoreResult<Screen>;
    /// Constant-time token lookup; never a scan.
    async fn get_screen_by_token(&self, token: &ScreenToken) -> StoreResult<Screen>;
    async fn screen_exists_by_token(&self, token: &ScreenToken) -> StoreResult<bool>;
    async fn create_screen(&self, new: NewScreen) -> StoreResult<Screen>;
    async fn update_screen(&self, id: ScreenId, patch: ScreenPatch) -> StoreResult<Screen>;
    /// Returns the removed record so presence/notify state can be cleaned up.
    async fn delete_screen(&self, id: ScreenId) -> StoreResult<Screen>;

    async fn health_check(&self) -> StoreResult<()>;
    fn backend_name(&self) -> &'static str;
}
