//! Live invalidation feed over WebSocket.
//!
//! A display connects with its screen token and is immediately subscribed
//! to its own screen subject. Sending `{"join_menu": <id>}` adds a menu
//! subject to the same connection; all subjects multiplex onto the one
//! socket. Frames carry no content, only `{event_kind, subject}` — clients
//! refetch over HTTP when nudged.
use crate::api::error::{ApiError, api_not_found};
use crate::app::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use marquee_common::{ScreenToken, Subject};
use marquee_common::ids::MenuId;
use marquee_notify::Connection;
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Deserialize)]
struct JoinMenuFrame {
    join_menu: i64,
}

pub async fn subscribe_events(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response, ApiError> {
    let token = ScreenToken::new(token);
    // Reject unknown tokens before the upgrade completes.
    if !state.store.screen_exists_by_token(&token).await? {
        return Err(api_not_found("unknown screen token"));
    }
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, token)))
}

async fn handle_socket(mut socket: WebSocket, state: AppState, token: ScreenToken) {
    let mut conn = state.notifier.connection();
    if state
        .notifier
        .subscribe(&mut conn, Subject::screen(token.clone()))
        .await
        .is_err()
    {
        return;
    }
    metrics::gauge!("marquee_ws_connections").increment(1.0);
    tracing::debug!(%token, "display connected");
    let mut joined_menus: HashSet<i64> = HashSet::new();

    loop {
        tokio::select! {
            maybe_notice = conn.recv() => {
                let Some(notice) = maybe_notice else { break };
                let text = match serde_json::to_string(&notice) {
                    Ok(text) => text,
                    Err(err) => {
                        tracing::warn!(error = %err, "encode notice");
                        continue;
                    }
                };
                if socket.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        handle_client_frame(&state, &mut conn, &mut joined_menus, &token, &text)
                            .await;
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Pings are answered by the ws layer; ignore the rest.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    conn.close();
    metrics::gauge!("marquee_ws_connections").decrement(1.0);
    tracing::debug!(%token, "display disconnected");
}

async fn handle_client_frame(
    state: &AppState,
    conn: &mut Connection,
    joined_menus: &mut HashSet<i64>,
    token: &ScreenToken,
    text: &str,
) {
    let frame: JoinMenuFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(err) => {
            // Malformed frames are dropped, never fatal.
            tracing::debug!(%token, error = %err, "unrecognized client frame");
            return;
        }
    };
    // Rejoining an already-joined menu is a no-op, not a second queue entry.
    if !joined_menus.insert(frame.join_menu) {
        return;
    }
    let subject = Subject::menu(MenuId::new(frame.join_menu));
    if let Err(err) = state.notifier.subscribe(conn, subject.clone()).await {
        joined_menus.remove(&frame.join_menu);
        tracing::debug!(%token, %subject, error = %err, "menu subscribe failed");
    }
}
