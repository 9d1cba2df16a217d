//! HTTP application wiring.
//!
//! Builds the Axum router, configures middleware, and defines the shared
//! application state injected into handlers. Route composition lives here
//! to keep `main` small and testable.
use crate::api;
use crate::api::openapi::ApiDoc;
use marquee_notify::Notifier;
use marquee_presence::PresenceTracker;
use marquee_store::ContentStore;
use marquee_sync::{ChangePublisher, OrderingEngine, TokenResolver};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub notifier: Arc<Notifier>,
    pub presence: Arc<PresenceTracker>,
    pub publisher: ChangePublisher,
    pub ordering: OrderingEngine,
    pub resolver: TokenResolver,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ContentStore>,
        notifier: Arc<Notifier>,
        presence: Arc<PresenceTracker>,
    ) -> Self {
        let publisher = ChangePublisher::new(Arc::clone(&notifier));
        let ordering = OrderingEngine::new(Arc::clone(&store), publisher.clone());
        let resolver = TokenResolver::new(Arc::clone(&store));
        Self {
            store,
            notifier,
            presence,
            publisher,
            ordering,
            resolver,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            )
        });

    Router::new()
        .route("/api/health", axum::routing::get(api::system::health))
        .route(
            "/api/menus",
            axum::routing::get(api::menus::list_menus).post(api::menus::create_menu),
        )
        .route(
            "/api/menus/key/:key_name",
            axum::routing::get(api::menus::get_menu_by_key),
        )
        .route(
            "/api/menus/:id",
            axum::routing::get(api::menus::get_menu)
                .put(api::menus::update_menu)
                .delete(api::menus::delete_menu),
        )
        .route("/api/items", axum::routing::post(api::items::create_item))
        .route(
            "/api/items/reorder",
            axum::routing::post(api::items::reorder_items),
        )
        .route(
            "/api/items/:id",
            axum::routing::put(api::items::update_item).delete(api::items::delete_item),
        )
        .route(
            "/api/screens",
            axum::routing::get(api::screens::list_screens).post(api::screens::create_screen),
        )
        .route(
            "/api/screens/display/:token",
            axum::routing::get(api::screens::display),
        )
        .route(
            "/api/screens/heartbeat/:token",
            axum::routing::post(api::screens::heartbeat),
        )
        .route(
            "/api/screens/:id",
            axum::routing::put(api::screens::update_screen).delete(api::screens::delete_screen),
        )
        .route(
            "/api/events/:token",
            axum::routing::get(api::events::subscribe_events),
        )
        .merge(
            utoipa_swagger_ui::SwaggerUi::new("/docs").url("/api/openapi.json", ApiDoc::openapi()),
        )
        .layer(trace_layer)
        .with_state(state)
}
