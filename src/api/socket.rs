// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! WebSocket event endpoint.
//!
//! Each text frame carries one event envelope and gets exactly one reply
//! frame. Failures are replied as a text frame holding the error message;
//! they never close the connection.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::ConnectionToken;
use crate::dispatch::{Dispatcher, ReplyFrame};
use crate::error::ServiceError;
use crate::state::AppState;

/// Open an event connection.
///
/// The optional `token` query parameter binds a session to the connection.
/// Without it only `login` succeeds.
#[utoipa::path(
    get,
    path = "/ws",
    tag = "Events",
    params(
        ("token" = Option<String>, Query, description = "Session token returned by login")
    ),
    responses(
        (status = 101, description = "Switched to the WebSocket protocol"),
        (status = 400, description = "Malformed query or authorization header")
    )
)]
pub async fn connect(
    State(state): State<AppState>,
    ConnectionToken(token): ConnectionToken,
    ws: WebSocketUpgrade,
) -> Response {
    let connection_id = Uuid::new_v4();
    info!(%connection_id, authenticated = token.is_some(), "Client connected");
    ws.on_upgrade(move |socket| serve_connection(socket, state, token, connection_id))
}

async fn serve_connection(
    mut socket: WebSocket,
    state: AppState,
    token: Option<String>,
    connection_id: Uuid,
) {
    while let Some(frame) = socket.recv().await {
        let reply = match frame {
            Ok(Message::Text(text)) => {
                respond(&state.dispatcher, token.as_deref(), text.as_str(), connection_id)
            }
            Ok(Message::Binary(_)) => error_frame(
                &ServiceError::input("event frames must be text"),
                connection_id,
            ),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!(%connection_id, error = %e, "WebSocket receive failed");
                break;
            }
        };

        if socket.send(reply).await.is_err() {
            break;
        }
    }

    info!(%connection_id, "Client disconnected");
}

/// Handle one text frame and build the reply frame.
pub fn respond(
    dispatcher: &Dispatcher,
    token: Option<&str>,
    frame: &str,
    connection_id: Uuid,
) -> Message {
    match dispatcher.handle_frame(token, frame) {
        Ok(reply) => match reply.into_frame() {
            ReplyFrame::Text(text) => Message::Text(text.into()),
            ReplyFrame::Binary(bytes) => Message::Binary(bytes.into()),
        },
        Err(e) => error_frame(&e, connection_id),
    }
}

fn error_frame(error: &ServiceError, connection_id: Uuid) -> Message {
    let error_code = error.error_code();
    match error {
        ServiceError::Storage(source) => {
            warn!(%connection_id, error_code, error = %source, "Request failed")
        }
        _ => debug!(%connection_id, error_code, error = %error, "Request rejected"),
    }
    Message::Text(error.to_string().into())
}
