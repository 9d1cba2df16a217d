//! In-memory implementation of the content store.
//!
//! # Purpose
//! Implements `ContentStore` with plain `HashMap`s behind one
//! `tokio::sync::RwLock`. It exists for local development, tests, and
//! deployments where durability is not required.
//!
//! # Consistency
//! All maps live under a single lock, so cross-entity operations (menu
//! cascade deletes, reorder batches, token-index maintenance) are atomic
//! within one process. Reorders validate the full batch before the first
//! write; concurrent reorders of the same store serialize on the write lock.
//!
//! # Durability
//! Not durable: all state is lost on process restart.
use crate::model::{
    DEFAULT_BG_COLOR, DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE_ITEM, DEFAULT_FONT_SIZE_TITLE,
    DEFAULT_TEXT_COLOR, DEFAULT_THEME_COLOR, ItemPatch, Menu, MenuDeletion, MenuItem, MenuPatch,
    MenuWithCount, NewItem, NewMenu, NewScreen, Screen, ScreenPatch,
};
use crate::{ContentStore, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::Utc;
use marquee_common::ScreenToken;
use marquee_common::ids::{ItemId, MenuId, ScreenId};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Inner {
    menus: HashMap<MenuId, Menu>,
    items: HashMap<ItemId, MenuItem>,
    screens: HashMap<ScreenId, Screen>,
    // Token -> screen id index so display resolution never scans.
    token_index: HashMap<ScreenToken, ScreenId>,
    next_menu_id: i64,
    next_item_id: i64,
    next_screen_id: i64,
}

impl Inner {
    fn sorted_items(&self, menu_id: MenuId, visible_only: bool) -> Vec<MenuItem> {
        let mut items: Vec<MenuItem> = self
            .items
            .values()
            .filter(|item| item.menu_id == menu_id && (!visible_only || item.is_visible))
            .cloned()
            .collect();
        items.sort_by_key(|item| (item.order_index, item.id));
        items
    }
}

pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn list_menus(&self) -> StoreResult<Vec<MenuWithCount>> {
        let inner = self.inner.read().await;
        let mut menus: Vec<MenuWithCount> = inner
            .menus
            .values()
            .map(|menu| MenuWithCount {
                menu: menu.clone(),
                item_count: inner
                    .items
                    .values()
                    .filter(|item| item.menu_id == menu.id && item.is_visible)
                    .count(),
            })
            .collect();
        menus.sort_by_key(|entry| entry.menu.id);
        Ok(menus)
    }

    async fn get_menu(&self, id: MenuId) -> StoreResult<Menu> {
        self.inner
            .read()
            .await
            .menus
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("menu".into()))
    }

    async fn get_menu_by_key(&self, key_name: &str) -> StoreResult<Menu> {
        self.inner
            .read()
            .await
            .menus
            .values()
            .find(|menu| menu.key_name == key_name)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("menu".into()))
    }

    async fn create_menu(&self, new: NewMenu) -> StoreResult<Menu> {
        let mut inner = self.inner.write().await;
        if inner.menus.values().any(|menu| menu.key_name == new.key_name) {
            return Err(StoreError::Conflict("menu key_name exists".into()));
        }
        inner.next_menu_id += 1;
        let now = Utc::now();
        let menu = Menu {
            id: MenuId::new(inner.next_menu_id),
            key_name: new.key_name,
            title: new.title,
            theme_color: new.theme_color.unwrap_or_else(|| DEFAULT_THEME_COLOR.into()),
            bg_color: new.bg_color.unwrap_or_else(|| DEFAULT_BG_COLOR.into()),
            text_color: new.text_color.unwrap_or_else(|| DEFAULT_TEXT_COLOR.into()),
            font_family: new.font_family.unwrap_or_else(|| DEFAULT_FONT_FAMILY.into()),
            font_size_title: new.font_size_title.unwrap_or(DEFAULT_FONT_SIZE_TITLE),
            font_size_item: new.font_size_item.unwrap_or(DEFAULT_FONT_SIZE_ITEM),
            video_url: new.video_url,
            created_at: now,
            updated_at: now,
        };
        inner.menus.insert(menu.id, menu.clone());
        metrics::counter!("marquee_store_changes_total", "entity" => "menu", "op" => "created")
            .increment(1);
        metrics::gauge!("marquee_menus_total").set(inner.menus.len() as f64);
        Ok(menu)
    }

    async fn update_menu(&self, id: MenuId, patch: MenuPatch) -> StoreResult<Menu> {
        let mut inner = self.inner.write().await;
        if let Some(key_name) = &patch.key_name {
            let taken = inner
                .menus
                .values()
                .any(|menu| menu.id != id && &menu.key_name == key_name);
            if taken {
                return Err(StoreError::Conflict("menu key_name exists".into()));
            }
        }
        let menu = inner
            .menus
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("menu".into()))?;
        if let Some(key_name) = patch.key_name {
            menu.key_name = key_name;
        }
        if let Some(title) = patch.title {
            menu.title = title;
        }
        if let Some(theme_color) = patch.theme_color {
            menu.theme_color = theme_color;
        }
        if let Some(bg_color) = patch.bg_color {
            menu.bg_color = bg_color;
        }
        if let Some(text_color) = patch.text_color {
            menu.text_color = text_color;
        }
        if let Some(font_family) = patch.font_family {
            menu.font_family = font_family;
        }
        if let Some(size) = patch.font_size_title {
            menu.font_size_title = size;
        }
        if let Some(size) = patch.font_size_item {
            menu.font_size_item = size;
        }
        if let Some(video_url) = patch.video_url {
            menu.video_url = video_url;
        }
        menu.updated_at = Utc::now();
        let updated = menu.clone();
        metrics::counter!("marquee_store_changes_total", "entity" => "menu", "op" => "updated")
            .increment(1);
        Ok(updated)
    }

    async fn delete_menu(&self, id: MenuId) -> StoreResult<MenuDeletion> {
        let mut inner = self.inner.write().await;
        if inner.menus.remove(&id).is_none() {
            return Err(StoreError::NotFound("menu".into()));
        }
        // Cascade: the menu owns its items.
        let before = inner.items.len();
        inner.items.retain(|_, item| item.menu_id != id);
        let removed_items = before - inner.items.len();
        // Detach, never delete, referencing screens; their displays fall back
        // to the unconfigured state and must be told to refetch.
        let mut detached_screens = Vec::new();
        for screen in inner.screens.values_mut() {
            if screen.menu_id == Some(id) {
                screen.menu_id = None;
                detached_screens.push(screen.token.clone());
            }
        }
        metrics::counter!("marquee_store_changes_total", "entity" => "menu", "op" => "deleted")
            .increment(1);
        metrics::gauge!("marquee_menus_total").set(inner.menus.len() as f64);
        metrics::gauge!("marquee_menu_items_total").set(inner.items.len() as f64);
        Ok(MenuDeletion {
            menu_id: id,
            removed_items,
            detached_screens,
        })
    }

    async fn list_items(&self, menu_id: MenuId, visible_only: bool) -> StoreResult<Vec<MenuItem>> {
        let inner = self.inner.read().await;
        if !inner.menus.contains_key(&menu_id) {
            return Err(StoreError::NotFound("menu".into()));
        }
        Ok(inner.sorted_items(menu_id, visible_only))
    }

    async fn create_item(&self, new: NewItem) -> StoreResult<MenuItem> {
        let mut inner = self.inner.write().await;
        if !inner.menus.contains_key(&new.menu_id) {
            return Err(StoreError::NotFound("menu".into()));
        }
        let order_index = new.order_index.unwrap_or_else(|| {
            inner
                .items
                .values()
                .filter(|item| item.menu_id == new.menu_id)
                .map(|item| item.order_index)
                .max()
                .map_or(0, |max| max + 1)
        });
        inner.next_item_id += 1;
        let item = MenuItem {
            id: ItemId::new(inner.next_item_id),
            menu_id: new.menu_id,
            name: new.name,
            description: new.description,
            price: new.price,
            image_url: new.image_url,
            is_visible: new.is_visible.unwrap_or(true),
            order_index,
        };
        inner.items.insert(item.id, item.clone());
        metrics::counter!("marquee_store_changes_total", "entity" => "item", "op" => "created")
            .increment(1);
        metrics::gauge!("marquee_menu_items_total").set(inner.items.len() as f64);
        Ok(item)
    }

    async fn update_item(&self, id: ItemId, patch: ItemPatch) -> StoreResult<MenuItem> {
        let mut inner = self.inner.write().await;
        let item = inner
            .items
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("item".into()))?;
        if let Some(name) = patch.name {
            item.name = name;
        }
        if let Some(description) = patch.description {
            item.description = description;
        }
        if let Some(price) = patch.price {
            item.price = price;
        }
        if let Some(image_url) = patch.image_url {
            item.image_url = image_url;
        }
        if let Some(is_visible) = patch.is_visible {
            item.is_visible = is_visible;
        }
        if let Some(order_index) = patch.order_index {
            item.order_index = order_index;
        }
        let updated = item.clone();
        metrics::counter!("marquee_store_changes_total", "entity" => "item", "op" => "updated")
            .increment(1);
        Ok(updated)
    }

    async fn delete_item(&self, id: ItemId) -> StoreResult<MenuItem> {
        let mut inner = self.inner.write().await;
        let removed = inner
            .items
            .remove(&id)
            .ok_or_else(|| StoreError::NotFound("item".into()))?;
        metrics::counter!("marquee_store_changes_total", "entity" => "item", "op" => "deleted")
            .increment(1);
        metrics::gauge!("marquee_menu_items_total").set(inner.items.len() as f64);
        Ok(removed)
    }

    async fn reorder_items(&self, menu_id: MenuId, batch: &[(ItemId, i32)]) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.menus.contains_key(&menu_id) {
            return Err(StoreError::NotFound("menu".into()));
        }
        // Validate the entire batch before the first write so a bad entry
        // leaves every order_index untouched.
        for (item_id, _) in batch {
            match inner.items.get(item_id) {
                Some(item) if item.menu_id == menu_id => {}
                _ => {
                    return Err(StoreError::BatchConflict(format!(
                        "item {item_id} does not belong to menu {menu_id}"
                    )));
                }
            }
        }
        for (item_id, order_index) in batch {
            if let Some(item) = inner.items.get_mut(item_id) {
                item.order_index = *order_index;
            }
        }
        if let Some(menu) = inner.menus.get_mut(&menu_id) {
            menu.updated_at = Utc::now();
        }
        metrics::counter!("marquee_store_changes_total", "entity" => "item", "op" => "reordered")
            .increment(1);
        Ok(())
    }

    async fn list_screens(&self) -> StoreResult<Vec<Screen>> {
        let mut screens: Vec<Screen> = self.inner.read().await.screens.values().cloned().collect();
        screens.sort_by_key(|screen| screen.id);
        Ok(screens)
    }

    async fn get_screen(&self, id: ScreenId) -> StoreResult<Screen> {
        self.inner
            .read()
            .await
            .screens
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("screen".into()))
    }

    async fn get_screen_by_token(&self, token: &ScreenToken) -> StoreResult<Screen> {
        let inner = self.inner.read().await;
        inner
            .token_index
            .get(token)
            .and_then(|id| inner.screens.get(id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound("screen".into()))
    }

    async fn screen_exists_by_token(&self, token: &ScreenToken) -> StoreResult<bool> {
        Ok(self.inner.read().await.token_index.contains_key(token))
    }

    async fn create_screen(&self, new: NewScreen) -> StoreResult<Screen> {
        let mut inner = self.inner.write().await;
        if let Some(menu_id) = new.menu_id {
            if !inner.menus.contains_key(&menu_id) {
                return Err(StoreError::NotFound("menu".into()));
            }
        }
        inner.next_screen_id += 1;
        let screen = Screen {
            id: ScreenId::new(inner.next_screen_id),
            name: new.name,
            token: ScreenToken::generate(),
            menu_id: new.menu_id,
            kiosk_mode: new.kiosk_mode.unwrap_or(true),
            created_at: Utc::now(),
        };
        inner.screens.insert(screen.id, screen.clone());
        inner.token_index.insert(screen.token.clone(), screen.id);
        metrics::counter!("marquee_store_changes_total", "entity" => "screen", "op" => "created")
            .increment(1);
        metrics::gauge!("marquee_screens_total").set(inner.screens.len() as f64);
        Ok(screen)
    }

    async fn update_screen(&self, id: ScreenId, patch: ScreenPatch) -> StoreResult<Screen> {
        let mut inner = self.inner.write().await;
        if let Some(Some(menu_id)) = patch.menu_id {
            if !inner.menus.contains_key(&menu_id) {
                return Err(StoreError::NotFound("menu".into()));
            }
        }
        let screen = inner
            .screens
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("screen".into()))?;
        if let Some(name) = patch.name {
            screen.name = name;
        }
        if let Some(menu_id) = patch.menu_id {
            screen.menu_id = menu_id;
        }
        if let Some(kiosk_mode) = patch.kiosk_mode {
            screen.kiosk_mode = kiosk_mode;
        }
        let updated = screen.clone();
        metrics::counter!("marquee_store_changes_total", "entity" => "screen", "op" => "updated")
            .increment(1);
        Ok(updated)
    }

    async fn delete_screen(&self, id: ScreenId) -> StoreResult<Screen> {
        let mut inner = self.inner.write().await;
        let removed = inner
            .screens
            .remove(&id)
            .ok_or_else(|| StoreError::NotFound("screen".into()))?;
        inner.token_index.remove(&removed.token);
        metrics::counter!("marquee_store_changes_total", "entity" => "screen", "op" => "deleted")
            .increment(1);
        metrics::gauge!("marquee_screens_total").set(inner.screens.len() as f64);
        Ok(removed)
    }

    async fn health_check(&self) -> StoreResult<()> {
        // In-memory backend is healthy whenever the process is running.
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
