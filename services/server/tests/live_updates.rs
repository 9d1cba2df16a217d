mod common;

use axum::Router;
use axum::http::StatusCode;
use common::{read_json, send_json, test_state};
use futures_util::{SinkExt, StreamExt};
use marquee_server::app::build_router;
use serde_json::json;
use std::net::SocketAddr;
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite;

async fn spawn_server() -> (SocketAddr, Router) {
    let state = test_state();
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = router.clone();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app.into_make_service()).await;
    });
    (addr, router)
}

async fn create_screen(router: &Router, name: &str) -> (i64, String) {
    let screen = read_json(
        send_json(router, "POST", "/api/screens", json!({"name": name})).await,
    )
    .await;
    (
        screen["id"].as_i64().expect("screen id"),
        screen["token"].as_str().expect("token").to_string(),
    )
}

async fn next_notice(
    socket: &mut (impl futures_util::Stream<Item = Result<tungstenite::Message, tungstenite::Error>>
              + Unpin),
) -> serde_json::Value {
    let frame = tokio::time::timeout(Duration::from_secs(2), socket.next())
        .await
        .expect("notice before timeout")
        .expect("socket open")
        .expect("frame");
    match frame {
        tungstenite::Message::Text(text) => serde_json::from_str(&text).expect("notice json"),
        other => panic!("unexpected frame: {other:?}"),
    }
}

#[tokio::test]
async fn joined_menu_updates_reach_the_display() {
    let (addr, router) = spawn_server().await;
    let menu = read_json(
        send_json(
            &router,
            "POST",
            "/api/menus",
            json!({"key_name": "lunch", "title": "Lunch"}),
        )
        .await,
    )
    .await;
    let menu_id = menu["id"].as_i64().expect("menu id");
    let (_screen_id, token) = create_screen(&router, "Lobby").await;

    let (mut socket, _response) = connect_async(format!("ws://{addr}/api/events/{token}"))
        .await
        .expect("ws connect");
    socket
        .send(tungstenite::Message::Text(
            json!({"join_menu": menu_id}).to_string(),
        ))
        .await
        .expect("join frame");
    // Let the server register the menu subscription.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let response = send_json(
        &router,
        "PUT",
        &format!("/api/menus/{menu_id}"),
        json!({"title": "Lunch v2"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let notice = next_notice(&mut socket).await;
    assert_eq!(notice["event_kind"], "menu_updated");
    assert_eq!(notice["subject"], format!("menu:{menu_id}"));
}

#[tokio::test]
async fn repeated_join_frames_do_not_duplicate_notices() {
    let (addr, router) = spawn_server().await;
    let menu = read_json(
        send_json(
            &router,
            "POST",
            "/api/menus",
            json!({"key_name": "lunch", "title": "Lunch"}),
        )
        .await,
    )
    .await;
    let menu_id = menu["id"].as_i64().expect("menu id");
    let (_screen_id, token) = create_screen(&router, "Lobby").await;

    let (mut socket, _response) = connect_async(format!("ws://{addr}/api/events/{token}"))
        .await
        .expect("ws connect");
    for _ in 0..3 {
        socket
            .send(tungstenite::Message::Text(
                json!({"join_menu": menu_id}).to_string(),
            ))
            .await
            .expect("join frame");
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    let response = send_json(
        &router,
        "PUT",
        &format!("/api/menus/{menu_id}"),
        json!({"title": "Lunch v2"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let notice = next_notice(&mut socket).await;
    assert_eq!(notice["event_kind"], "menu_updated");
    // One notice per edit no matter how many join frames were sent.
    let extra = tokio::time::timeout(Duration::from_millis(300), socket.next()).await;
    assert!(extra.is_err(), "duplicate join produced a second notice");
}

#[tokio::test]
async fn screen_reassignment_notifies_its_own_subject() {
    let (addr, router) = spawn_server().await;
    let menu = read_json(
        send_json(
            &router,
            "POST",
            "/api/menus",
            json!({"key_name": "dinner", "title": "Dinner"}),
        )
        .await,
    )
    .await;
    let menu_id = menu["id"].as_i64().expect("menu id");
    let (screen_id, token) = create_screen(&router, "Bar").await;

    let (mut socket, _response) = connect_async(format!("ws://{addr}/api/events/{token}"))
        .await
        .expect("ws connect");
    // The screen subject is subscribed at accept; give it a beat.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let response = send_json(
        &router,
        "PUT",
        &format!("/api/screens/{screen_id}"),
        json!({"menu_id": menu_id}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let notice = next_notice(&mut socket).await;
    assert_eq!(notice["event_kind"], "screen_updated");
    assert_eq!(notice["subject"], format!("screen:{token}"));
}

#[tokio::test]
async fn deleting_a_joined_menu_raises_both_notices() {
    let (addr, router) = spawn_server().await;
    let menu = read_json(
        send_json(
            &router,
            "POST",
            "/api/menus",
            json!({"key_name": "brunch", "title": "Brunch"}),
        )
        .await,
    )
    .await;
    let menu_id = menu["id"].as_i64().expect("menu id");
    let screen = read_json(
        send_json(
            &router,
            "POST",
            "/api/screens",
            json!({"name": "Patio", "menu_id": menu_id}),
        )
        .await,
    )
    .await;
    let token = screen["token"].as_str().expect("token").to_string();

    let (mut socket, _response) = connect_async(format!("ws://{addr}/api/events/{token}"))
        .await
        .expect("ws connect");
    socket
        .send(tungstenite::Message::Text(
            json!({"join_menu": menu_id}).to_string(),
        ))
        .await
        .expect("join frame");
    tokio::time::sleep(Duration::from_millis(100)).await;

    let response = common::send(&router, "DELETE", &format!("/api/menus/{menu_id}")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Publish order is menu first, then detached screens.
    let first = next_notice(&mut socket).await;
    assert_eq!(first["event_kind"], "menu_updated");
    let second = next_notice(&mut socket).await;
    assert_eq!(second["event_kind"], "screen_updated");
    assert_eq!(second["subject"], format!("screen:{token}"));
}

#[tokio::test]
async fn unknown_token_is_rejected_before_upgrade() {
    let (addr, _router) = spawn_server().await;
    let err = connect_async(format!("ws://{addr}/api/events/no-such-token"))
        .await
        .err()
        .expect("connect should fail");
    match err {
        tungstenite::Error::Http(response) => {
            assert_eq!(response.status(), 404);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn closing_the_socket_releases_the_subscription() {
    let (addr, router) = spawn_server().await;
    let (_screen_id, token) = create_screen(&router, "Hall").await;

    let (mut socket, _response) = connect_async(format!("ws://{addr}/api/events/{token}"))
        .await
        .expect("ws connect");
    tokio::time::sleep(Duration::from_millis(100)).await;
    socket
        .close(None)
        .await
        .expect("close");
    tokio::time::sleep(Duration::from_millis(100)).await;

    // A fresh connection still works against the same token.
    let (mut socket, _response) = connect_async(format!("ws://{addr}/api/events/{token}"))
        .await
        .expect("reconnect");
    tokio::time::sleep(Duration::from_millis(100)).await;
    let screen = read_json(
        common::send(&router, "GET", "/api/screens").await,
    )
    .await;
    let screen_id = screen["screens"][0]["screen"]["id"].as_i64().expect("id");
    let response = send_json(
        &router,
        "PUT",
        &format!("/api/screens/{screen_id}"),
        json!({"name": "Hall 2"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let notice = next_notice(&mut socket).await;
    assert_eq!(notice["event_kind"], "screen_updated");
}
