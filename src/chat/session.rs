//! Per-connection chat state machine.
//!
//! `ChatSession` is transport-agnostic: it consumes typed `ClientEvent`s and
//! writes `ServerEvent`s to an outbound channel. The WebSocket layer only
//! decodes frames and drains that channel.
//!
//! ```text
//! Connecting --authenticate--> Authenticated --enter--> InRoom(room)
//!      |                                                    |
//!      +-- auth failure --> Disconnected <-- disconnect ----+
//! ```

use super::hub::RoomHub;
use super::presence::PresenceTracker;
use super::types::{
    ClientEvent, ConnectionId, DEFAULT_ROOM, Message, MessageSender, ParticipantsUpdate,
    RoomBroadcast, SendMessagePayload, ServerEvent, TypingPayload, UserTyping,
};
use crate::accounts::types::Identity;
use crate::auth::Authenticator;
use crate::config::ChatConfig;
use crate::error::{AppError, Result};

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// Longest message preview written to the log.
const LOG_PREVIEW_CHARS: usize = 50;

/// Shared services every session needs.
pub struct ChatContext {
    pub authenticator: Arc<Authenticator>,
    pub hub: Arc<RoomHub>,
    pub presence: Arc<dyn PresenceTracker>,
    pub config: ChatConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Authenticated,
    InRoom(String),
    Disconnected,
}

pub struct ChatSession {
    id: ConnectionId,
    state: SessionState,
    identity: Option<Identity>,
    context: Arc<ChatContext>,
    outbound: mpsc::Sender<ServerEvent>,
    /// Room name -> task forwarding that room's broadcasts to `outbound`.
    forwarders: HashMap<String, JoinHandle<()>>,
}

impl ChatSession {
    pub fn new(context: Arc<ChatContext>, outbound: mpsc::Sender<ServerEvent>) -> Self {
        Self {
            id: ConnectionId::new(),
            state: SessionState::Connecting,
            identity: None,
            context,
            outbound,
            forwarders: HashMap::new(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Verifies the handshake credential. Failure is fatal for the session.
    pub fn authenticate(&mut self, credential: Option<&str>) -> Result<Identity> {
        if self.state != SessionState::Connecting {
            return Err(AppError::validation("Session already authenticated"));
        }

        match self.context.authenticator.authenticate(credential) {
            Ok(identity) => {
                tracing::info!(
                    "Connection {} authenticated as {} ({})",
                    self.id,
                    identity.name,
                    identity.user_id
                );
                self.identity = Some(identity.clone());
                self.state = SessionState::Authenticated;
                Ok(identity)
            }
            Err(e) => {
                tracing::warn!("Connection {} failed authentication: {}", self.id, e);
                self.state = SessionState::Disconnected;
                Err(e)
            }
        }
    }

    /// Runs the post-authentication auto-join of the default room.
    pub async fn enter_default_room(&mut self) -> Result<()> {
        if self.state != SessionState::Authenticated {
            return Err(AppError::validation("Session is not ready to join a room"));
        }
        self.enter_room(DEFAULT_ROOM).await
    }

    /// Dispatches one client event. Failures go to this connection only and
    /// never change the session state.
    pub async fn handle(&mut self, event: ClientEvent) {
        let result = match event {
            ClientEvent::SendMessage(payload) => self.send_message(payload).await,
            ClientEvent::Typing(payload) => self.typing(payload),
            ClientEvent::JoinRoom(room) => self.join_room(&room).await,
        };
        if let Err(e) = result {
            self.report(e).await;
        }
    }

    /// Sends an `error` event to this connection.
    pub async fn report(&self, error: AppError) {
        tracing::debug!("Reporting to connection {}: {}", self.id, error);
        let message = match error {
            AppError::Validation(m) | AppError::Auth(m) | AppError::Persistence(m) => m,
            other => other.to_string(),
        };
        self.deliver(ServerEvent::error(message)).await;
    }

    async fn deliver(&self, event: ServerEvent) {
        if self.outbound.send(event).await.is_err() {
            tracing::debug!("Connection {} outbound closed", self.id);
        }
    }

    fn current_room(&self) -> Option<&str> {
        match &self.state {
            SessionState::InRoom(room) => Some(room),
            _ => None,
        }
    }

    fn require_identity(&self) -> Result<Identity> {
        match (&self.state, &self.identity) {
            (SessionState::Authenticated | SessionState::InRoom(_), Some(identity)) => {
                Ok(identity.clone())
            }
            _ => Err(AppError::validation("Not connected to chat")),
        }
    }

    async fn send_message(&mut self, payload: SendMessagePayload) -> Result<()> {
        let identity = self.require_identity()?;
        if self.current_room().is_none() {
            return Err(AppError::validation("Join a room before sending messages"));
        }

        let body = payload.message.trim();
        if body.is_empty() {
            return Err(AppError::validation("Message cannot be empty"));
        }

        // Unspecified rooms mean the default room, not the current one.
        let room = payload
            .room
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_ROOM.to_string());

        let message = Message {
            sender: MessageSender::from(&identity),
            message: body.to_string(),
            created_at: Utc::now(),
        };

        self.context
            .hub
            .post(&room, message)
            .await
            .map_err(|e| {
                tracing::error!("Failed to store message from {} in {}: {}", identity.user_id, room, e);
                AppError::persistence("Failed to send message")
            })?;

        let preview: String = body.chars().take(LOG_PREVIEW_CHARS).collect();
        tracing::info!("Message from {} in {}: {}", identity.name, room, preview);
        Ok(())
    }

    fn typing(&self, payload: TypingPayload) -> Result<()> {
        let identity = self.require_identity()?;
        let room = payload
            .room
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ROOM.to_string());

        let event = ServerEvent::UserTyping(UserTyping {
            user_id: identity.user_id,
            user_name: identity.name,
            is_typing: payload.is_typing,
        });
        self.context
            .hub
            .publish(&room, RoomBroadcast::to_others(event, self.id));
        Ok(())
    }

    async fn join_room(&mut self, room: &str) -> Result<()> {
        self.require_identity()?;
        let room = room.trim();
        if room.is_empty() {
            return Err(AppError::validation("Room name is required"));
        }
        self.enter_room(room).await
    }

    /// Entry side effects for `room`, leaving the previous room's presence
    /// first when it is neither the default room nor `room` itself.
    ///
    /// The roster write happens first so a store failure leaves the session
    /// exactly where it was.
    async fn enter_room(&mut self, room: &str) -> Result<()> {
        let identity = self.require_identity()?;

        let joined = self
            .context
            .hub
            .join(room, identity.clone())
            .await
            .map_err(|e| {
                tracing::error!("Failed to join {} to {}: {}", identity.user_id, room, e);
                AppError::persistence("Failed to join room")
            })?;

        if let Some(previous) = self.current_room().map(str::to_string)
            && previous != DEFAULT_ROOM
            && previous != room
        {
            self.leave_room(&previous, &identity).await;
        }

        let snapshot = self.context.presence.join(room, &identity.user_id).await;
        self.state = SessionState::InRoom(room.to_string());

        self.deliver(ServerEvent::MessageHistory(
            joined.room.recent(self.context.config.history_window),
        ))
        .await;

        // The join's subscription picks up exactly where the history ends and
        // buffers until the forwarder starts. A room that already has a
        // forwarder keeps it.
        if !self.forwarders.contains_key(room) {
            let handle = spawn_forwarder(self.id, joined.events, self.outbound.clone());
            self.forwarders.insert(room.to_string(), handle);
        }

        self.context.hub.publish(
            room,
            RoomBroadcast::to_all(ServerEvent::ParticipantsUpdate(ParticipantsUpdate {
                count: snapshot.count,
                participants: Some(snapshot.members),
            })),
        );

        tracing::info!("{} joined room {} ({} online)", identity.name, room, snapshot.count);
        Ok(())
    }

    async fn leave_room(&mut self, room: &str, identity: &Identity) {
        if let Some(handle) = self.forwarders.remove(room) {
            handle.abort();
        }
        let snapshot = self.context.presence.leave(room, &identity.user_id).await;
        self.context.hub.publish(
            room,
            RoomBroadcast::to_all(ServerEvent::ParticipantsUpdate(ParticipantsUpdate {
                count: snapshot.count,
                participants: None,
            })),
        );
        tracing::info!("{} left room {} ({} online)", identity.name, room, snapshot.count);
    }

    /// Tears the session down. Safe to call more than once.
    pub async fn disconnect(&mut self) {
        for (_, handle) in self.forwarders.drain() {
            handle.abort();
        }

        if self.state == SessionState::Disconnected {
            return;
        }
        self.state = SessionState::Disconnected;

        let Some(identity) = self.identity.as_ref() else {
            return;
        };

        let affected = self
            .context
            .presence
            .remove_everywhere(&identity.user_id)
            .await;
        for (room, count) in &affected {
            self.context.hub.publish(
                room,
                RoomBroadcast::to_all(ServerEvent::ParticipantsUpdate(ParticipantsUpdate {
                    count: *count,
                    participants: None,
                })),
            );
        }

        tracing::info!(
            "User disconnected: {} (connection {}, {} rooms updated)",
            identity.name,
            self.id,
            affected.len()
        );
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        for (_, handle) in self.forwarders.drain() {
            handle.abort();
        }
    }
}

/// Copies one room's broadcasts into a connection's outbound queue.
fn spawn_forwarder(
    connection: ConnectionId,
    mut events: broadcast::Receiver<RoomBroadcast>,
    outbound: mpsc::Sender<ServerEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(broadcast) => {
                    if broadcast.exclude == Some(connection) {
                        continue;
                    }
                    if outbound.send(broadcast.event).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        "Connection {} fell behind, {} room events dropped",
                        connection,
                        skipped
                    );
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
