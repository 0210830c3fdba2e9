//! WebSocket transport for `ChatSession`.
//!
//! The credential is checked before the upgrade, so a bad token gets a plain
//! 401 response instead of a socket. After the upgrade one task drains the
//! session's outbound queue into the socket while the connection task feeds
//! decoded frames to the session. Whichever side ends first closes the
//! connection; cleanup runs unconditionally afterwards.

use super::session::{ChatContext, ChatSession};
use super::types::{ClientEvent, ServerEvent};
use crate::auth::bearer_token;
use crate::error::AppError;

use axum::Extension;
use axum::extract::Query;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::response::Response;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Deserialize)]
pub struct ChatConnectQuery {
    pub token: Option<String>,
}

/// Header credential wins over the query parameter.
fn handshake_credential(headers: &HeaderMap, query: ChatConnectQuery) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_string)
        .or(query.token)
}

pub async fn handle_chat_socket(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    Query(query): Query<ChatConnectQuery>,
    Extension(context): Extension<Arc<ChatContext>>,
) -> Result<Response, AppError> {
    let credential = handshake_credential(&headers, query);

    let (outbound, outbound_rx) = mpsc::channel(context.config.outbound_capacity);
    let mut session = ChatSession::new(context, outbound);
    let identity = session.authenticate(credential.as_deref())?;

    tracing::info!("User connected: {} ({})", identity.name, session.id());
    Ok(ws.on_upgrade(move |socket| run_connection(socket, session, outbound_rx)))
}

async fn run_connection(
    socket: WebSocket,
    mut session: ChatSession,
    outbound: mpsc::Receiver<ServerEvent>,
) {
    let connection = session.id();
    let (sender, receiver) = StreamExt::split(socket);
    let mut send_task = tokio::spawn(write_outbound(sender, outbound));

    tokio::select! {
        _ = read_inbound(receiver, &mut session) => {
            tracing::debug!("Connection {} closed by client", connection);
        }
        result = &mut send_task => {
            if let Err(e) = result {
                tracing::error!("Outbound task for {} failed: {:?}", connection, e);
            }
        }
    }

    session.disconnect().await;
    send_task.abort();
}

async fn read_inbound(mut receiver: SplitStream<WebSocket>, session: &mut ChatSession) {
    if let Err(e) = session.enter_default_room().await {
        session.report(e).await;
    }

    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => session.handle(event).await,
                Err(e) => {
                    session
                        .report(AppError::validation(format!("Malformed event: {}", e)))
                        .await
                }
            },
            Ok(Message::Close(_)) => break,
            Err(e) => {
                tracing::warn!("WebSocket error on {}: {:?}", session.id(), e);
                break;
            }
            _ => {}
        }
    }
}

async fn write_outbound(
    mut sender: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<ServerEvent>,
) {
    while let Some(event) = outbound.recv().await {
        let text = match serde_json::to_string(&event) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Failed to encode chat event: {}", e);
                continue;
            }
        };
        if sender.send(Message::Text(text)).await.is_err() {
            break;
        }
    }
}
