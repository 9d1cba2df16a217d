//! Write-path glue between storage and the change notifier, plus the
//! read-only display resolver.
//!
//! Notification is strictly best-effort: a storage write that succeeded is
//! reported as succeeded no matter what happens on the fan-out path. The
//! publisher logs delivery counts and keeps counters, nothing more.
use marquee_common::{EventKind, ScreenToken, Subject};
use marquee_common::ids::{ItemId, MenuId, ScreenId};
use marquee_notify::Notifier;
use marquee_store::{ContentStore, Menu, MenuItem, StoreError};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    #[error("not found: {0}")]
    NotFound(String),
    /// The reorder batch named items outside the target menu; nothing was
    /// applied.
    #[error("batch conflict: {0}")]
    BatchConflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => SyncError::NotFound(what),
            StoreError::BatchConflict(what) | StoreError::Conflict(what) => {
                SyncError::BatchConflict(what)
            }
            StoreError::Unexpected(err) => SyncError::Unexpected(err),
        }
    }
}

/// Raises invalidation notices after successful writes.
///
/// Infallible by construction: fan-out troubles (no subscribers, full
/// queues, closed consumers) are absorbed by the notifier and surface only
/// as logs and counters, never to the write caller.
#[derive(Clone)]
pub struct ChangePublisher {
    notifier: Arc<Notifier>,
}

impl ChangePublisher {
    pub fn new(notifier: Arc<Notifier>) -> Self {
        Self { notifier }
    }

    pub async fn menu_updated(&self, id: MenuId) {
        let subject = Subject::menu(id);
        let delivered = self.notifier.publish(&subject, EventKind::MenuUpdated).await;
        tracing::debug!(%subject, delivered, "menu change notice");
        metrics::counter!("marquee_sync_notices_total", "kind" => "menu_updated").increment(1);
    }

    pub async fn screen_updated(&self, token: &ScreenToken) {
        let subject = Subject::screen(token.clone());
        let delivered = self
            .notifier
            .publish(&subject, EventKind::ScreenUpdated)
            .await;
        tracing::debug!(%subject, delivered, "screen change notice");
        metrics::counter!("marquee_sync_notices_total", "kind" => "screen_updated").increment(1);
    }
}

/// All-or-nothing batch repositioning of a menu's items.
#[derive(Clone)]
pub struct OrderingEngine {
    store: Arc<dyn ContentStore>,
    publisher: ChangePublisher,
}

impl OrderingEngine {
    pub fn new(store: Arc<dyn ContentStore>, publisher: ChangePublisher) -> Self {
        Self { store, publisher }
    }

    /// Apply every `(item, order_index)` pair in one transaction and raise
    /// exactly one `menu_updated` notice, or apply nothing at all.
    pub async fn reorder(&self, menu_id: MenuId, batch: &[(ItemId, i32)]) -> Result<()> {
        self.store.reorder_items(menu_id, batch).await?;
        // One notice per batch, never one per item.
        self.publisher.menu_updated(menu_id).await;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DisplayScreen {
    #[schema(value_type = i64)]
    pub id: ScreenId,
    pub name: String,
    pub kiosk_mode: bool,
}

/// Everything a display needs to render one refresh.
///
/// `menu: null` with an empty item list is the valid shape for a screen
/// that exists but has no menu assigned.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DisplayPayload {
    pub screen: DisplayScreen,
    pub menu: Option<Menu>,
    pub items: Vec<MenuItem>,
}

/// Read-only token-to-content resolution for display clients.
#[derive(Clone)]
pub struct TokenResolver {
    store: Arc<dyn ContentStore>,
}

impl TokenResolver {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Resolve a screen token to its render payload.
    ///
    /// Items are filtered to visible ones and sorted by `(order_index, id)`.
    /// Resolution is a pure read: it records no heartbeat and mutates
    /// nothing, so cache refreshes never masquerade as liveness.
    pub async fn resolve(&self, token: &ScreenToken) -> Result<DisplayPayload> {
        let screen = self.store.get_screen_by_token(token).await?;
        let menu = match screen.menu_id {
            Some(menu_id) => match self.store.get_menu(menu_id).await {
                Ok(menu) => Some(menu),
                // A dangling assignment renders as unconfigured rather than
                // failing the display.
                Err(StoreError::NotFound(_)) => None,
                Err(err) => return Err(err.into()),
            },
            None => None,
        };
        let items = match &menu {
            Some(menu) => self.store.list_items(menu.id, true).await?,
            None => Vec::new(),
        };
        Ok(DisplayPayload {
            screen: DisplayScreen {
                id: screen.id,
                name: screen.name,
                kiosk_mode: screen.kiosk_mode,
            },
            menu,
            items,
        })
    }
}
