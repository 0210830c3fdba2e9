use super::session::ChatContext;
use super::types::{DEFAULT_ROOM, MAX_ROOM_MESSAGES, Message, Participant};
use crate::error::AppError;

use axum::extract::{Path, Query};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMessagesResponse {
    pub room: String,
    pub messages: Vec<Message>,
    pub participant_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub messages: Vec<Message>,
    pub has_more: bool,
    pub page: usize,
    pub total_messages: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantsResponse {
    pub participants: Vec<Participant>,
    pub count: usize,
    /// Users with a live connection in the room right now.
    pub online: usize,
}

fn room_or_default(room: Option<Path<String>>) -> String {
    room.map(|Path(room)| room.trim().to_string())
        .filter(|room| !room.is_empty())
        .unwrap_or_else(|| DEFAULT_ROOM.to_string())
}

/// Recent messages for a room, creating the room on first access.
pub async fn handle_room_messages(
    room: Option<Path<String>>,
    Extension(chat): Extension<Arc<ChatContext>>,
) -> Result<Json<RoomMessagesResponse>, AppError> {
    let room = room_or_default(room);
    let record = chat.hub.open(&room).await?;

    Ok(Json(RoomMessagesResponse {
        messages: record.recent(chat.config.history_window),
        participant_count: record.participants.len(),
        room,
    }))
}

/// Paginated history. Page 1 holds the newest `limit` messages.
pub async fn handle_room_history(
    room: Option<Path<String>>,
    Query(params): Query<HistoryParams>,
    Extension(chat): Extension<Arc<ChatContext>>,
) -> Result<Json<HistoryResponse>, AppError> {
    let room = room_or_default(room);
    let page = params.page.unwrap_or(1).max(1);
    let limit = params
        .limit
        .unwrap_or(chat.config.history_window)
        .clamp(1, MAX_ROOM_MESSAGES);

    let Some(record) = chat.hub.store().find_active(&room).await? else {
        return Ok(Json(HistoryResponse {
            messages: Vec::new(),
            has_more: false,
            page,
            total_messages: 0,
        }));
    };

    let skip = (page - 1).saturating_mul(limit);
    let total = record.messages.len();

    Ok(Json(HistoryResponse {
        messages: record.window(skip, limit),
        has_more: total > skip.saturating_add(limit),
        page,
        total_messages: total,
    }))
}

pub async fn handle_room_participants(
    room: Option<Path<String>>,
    Extension(chat): Extension<Arc<ChatContext>>,
) -> Result<Json<ParticipantsResponse>, AppError> {
    let room = room_or_default(room);
    let online = chat.presence.snapshot(&room).await.count;

    let participants = chat
        .hub
        .store()
        .find_active(&room)
        .await?
        .map(|record| record.participants)
        .unwrap_or_default();

    Ok(Json(ParticipantsResponse {
        count: participants.len(),
        participants,
        online,
    }))
}
