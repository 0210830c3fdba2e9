use crate::accounts::types::{AccountKind, Identity};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Room every connection joins after authenticating.
pub const DEFAULT_ROOM: &str = "general";

/// Oldest messages beyond this count are evicted on append.
pub const MAX_ROOM_MESSAGES: usize = 1000;

/// Messages replayed to a connection when it enters a room.
pub const HISTORY_WINDOW: usize = 50;

/// Author of a message as stored in the room log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageSender {
    pub user: String,
    pub user_type: AccountKind,
    pub name: String,
}

impl From<&Identity> for MessageSender {
    fn from(identity: &Identity) -> Self {
        Self {
            user: identity.user_id.clone(),
            user_type: identity.kind,
            name: identity.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub sender: MessageSender,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Persisted roster entry. Never removed by presence changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub user: String,
    pub user_type: AccountKind,
    pub name: String,
    pub joined_at: DateTime<Utc>,
}

/// Persisted state of one chat room.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoom {
    pub room: String,
    /// Creation order, oldest first.
    pub messages: VecDeque<Message>,
    pub participants: Vec<Participant>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatRoom {
    pub fn new(room: &str) -> Self {
        let now = Utc::now();
        Self {
            room: room.to_string(),
            messages: VecDeque::new(),
            participants: Vec::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends `message` and evicts from the front until at most `cap` remain.
    ///
    /// The stored timestamp is clamped so it never precedes the previous
    /// entry; log order and timestamp order always agree.
    pub fn append(&mut self, mut message: Message, cap: usize) -> Message {
        if let Some(last) = self.messages.back()
            && message.created_at < last.created_at
        {
            message.created_at = last.created_at;
        }
        self.messages.push_back(message.clone());
        while self.messages.len() > cap {
            self.messages.pop_front();
        }
        self.updated_at = Utc::now();
        message
    }

    /// Adds `identity` to the roster unless that user id is already present.
    ///
    /// Returns true when a new entry was created.
    pub fn add_participant(&mut self, identity: &Identity) -> bool {
        if self.has_participant(&identity.user_id) {
            return false;
        }
        self.participants.push(Participant {
            user: identity.user_id.clone(),
            user_type: identity.kind,
            name: identity.name.clone(),
            joined_at: Utc::now(),
        });
        self.updated_at = Utc::now();
        true
    }

    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p.user == user_id)
    }

    /// Newest-first window `[skip, skip + limit)`, returned oldest-first.
    ///
    /// Built by sorting on creation time descending (log position breaks
    /// ties), then reversing the slice.
    pub fn window(&self, skip: usize, limit: usize) -> Vec<Message> {
        let mut newest_first: Vec<(usize, &Message)> = self.messages.iter().enumerate().collect();
        newest_first.sort_by(|(ia, a), (ib, b)| {
            b.created_at.cmp(&a.created_at).then_with(|| ib.cmp(ia))
        });

        let mut page: Vec<Message> = newest_first
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|(_, m)| m.clone())
            .collect();
        page.reverse();
        page
    }

    pub fn recent(&self, limit: usize) -> Vec<Message> {
        self.window(0, limit)
    }
}

/// Frames a client may send over the real-time channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    SendMessage(SendMessagePayload),
    Typing(TypingPayload),
    JoinRoom(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SendMessagePayload {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub room: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub is_typing: bool,
}

/// Frames the server pushes to a connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    MessageHistory(Vec<Message>),
    NewMessage(Message),
    ParticipantsUpdate(ParticipantsUpdate),
    UserTyping(UserTyping),
    Error(ErrorPayload),
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error(ErrorPayload {
            message: message.into(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParticipantsUpdate {
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserTyping {
    pub user_id: String,
    pub user_name: String,
    pub is_typing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorPayload {
    pub message: String,
}

/// Identifier of one live connection. A user may hold several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub uuid::Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A server event fanned out to a room, optionally skipping one connection.
#[derive(Debug, Clone)]
pub struct RoomBroadcast {
    pub event: ServerEvent,
    pub exclude: Option<ConnectionId>,
}

impl RoomBroadcast {
    pub fn to_all(event: ServerEvent) -> Self {
        Self {
            event,
            exclude: None,
        }
    }

    pub fn to_others(event: ServerEvent, origin: ConnectionId) -> Self {
        Self {
            event,
            exclude: Some(origin),
        }
    }
}
