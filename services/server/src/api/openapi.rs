//! OpenAPI document assembly served under `/docs`.
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::system::health,
        crate::api::menus::list_menus,
        crate::api::menus::create_menu,
        crate::api::menus::get_menu,
        crate::api::menus::get_menu_by_key,
        crate::api::menus::update_menu,
        crate::api::menus::delete_menu,
        crate::api::items::create_item,
        crate::api::items::update_item,
        crate::api::items::delete_item,
        crate::api::items::reorder_items,
        crate::api::screens::list_screens,
        crate::api::screens::create_screen,
        crate::api::screens::update_screen,
        crate::api::screens::delete_screen,
        crate::api::screens::display,
        crate::api::screens::heartbeat,
    ),
    components(schemas(
        crate::api::types::ErrorResponse,
        crate::api::types::HealthStatus,
        crate::api::types::MenuListEntry,
        crate::api::types::MenuListResponse,
        crate::api::types::MenuDetailResponse,
        crate::api::types::ReorderEntry,
        crate::api::types::ReorderRequest,
        crate::api::types::ScreenListEntry,
        crate::api::types::ScreenListResponse,
        marquee_store::Menu,
        marquee_store::MenuItem,
        marquee_store::Screen,
        marquee_store::NewMenu,
        marquee_store::MenuPatch,
        marquee_store::NewItem,
        marquee_store::ItemPatch,
        marquee_store::NewScreen,
        marquee_store::ScreenPatch,
        marquee_sync::DisplayPayload,
        marquee_sync::DisplayScreen,
    )),
    info(
        title = "Marquee API",
        description = "Digital signage content management and live display sync."
    )
)]
pub struct ApiDoc;
