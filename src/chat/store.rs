//! Chat room persistence.
//!
//! `ChatRepository` is the seam to the document store; `ChatRoomStore` layers
//! the room lifecycle rules (lazy creation, soft delete, roster idempotence,
//! log trimming) and a timeout on every repository call on top of it.
//!
//! Writes are read-modify-write sequences and are NOT safe to run
//! concurrently for the same room; `RoomHub` funnels them through one writer
//! per room.

use super::types::{ChatRoom, Message};
use crate::accounts::types::Identity;
use crate::error::{AppError, Result};
use crate::storage::memory::DocumentStore;

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Room record by name, active or not.
    async fn find(&self, room: &str) -> Result<Option<ChatRoom>>;

    /// Inserts or replaces the record for `room.room`.
    async fn save(&self, room: ChatRoom) -> Result<()>;
}

/// Process-local repository backed by a `DocumentStore`.
pub struct MemoryChatRepository {
    rooms: DocumentStore<String, ChatRoom>,
}

impl MemoryChatRepository {
    pub fn new() -> Self {
        Self {
            rooms: DocumentStore::new(),
        }
    }
}

impl Default for MemoryChatRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatRepository for MemoryChatRepository {
    async fn find(&self, room: &str) -> Result<Option<ChatRoom>> {
        Ok(self.rooms.get(&room.to_string()))
    }

    async fn save(&self, room: ChatRoom) -> Result<()> {
        self.rooms.put(room.room.clone(), room);
        Ok(())
    }
}

pub struct ChatRoomStore {
    repository: Arc<dyn ChatRepository>,
    op_timeout: Duration,
    max_messages: usize,
}

impl ChatRoomStore {
    pub fn new(repository: Arc<dyn ChatRepository>, op_timeout: Duration, max_messages: usize) -> Self {
        Self {
            repository,
            op_timeout,
            max_messages,
        }
    }

    async fn bounded<T, F>(&self, operation: &str, room: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result.inspect_err(|e| {
                tracing::error!("Chat store {} failed for room {}: {}", operation, room, e);
            }),
            Err(_) => {
                tracing::error!(
                    "Chat store {} timed out for room {} after {:?}",
                    operation,
                    room,
                    self.op_timeout
                );
                Err(AppError::persistence(format!(
                    "{} for room {} timed out",
                    operation, room
                )))
            }
        }
    }

    /// Active record for `room`; inactive rooms read as absent.
    pub async fn find_active(&self, room: &str) -> Result<Option<ChatRoom>> {
        let found = self.bounded("read", room, self.repository.find(room)).await?;
        Ok(found.filter(|record| record.is_active))
    }

    async fn save(&self, record: ChatRoom) -> Result<()> {
        let name = record.room.clone();
        self.bounded("write", &name, self.repository.save(record)).await
    }

    /// Loads the room, creating it (or reactivating a soft-deleted record)
    /// when needed.
    pub async fn fetch_or_create(&self, room: &str) -> Result<ChatRoom> {
        match self.bounded("read", room, self.repository.find(room)).await? {
            Some(record) if record.is_active => Ok(record),
            Some(mut record) => {
                tracing::info!("Reactivating chat room {}", room);
                record.is_active = true;
                record.updated_at = chrono::Utc::now();
                self.save(record.clone()).await?;
                Ok(record)
            }
            None => {
                tracing::info!("Creating chat room {}", room);
                let record = ChatRoom::new(room);
                self.save(record.clone()).await?;
                Ok(record)
            }
        }
    }

    /// Ensures the room exists and `identity` is on its roster.
    pub async fn join(&self, room: &str, identity: &Identity) -> Result<ChatRoom> {
        let mut record = self.fetch_or_create(room).await?;
        if record.add_participant(identity) {
            self.save(record.clone()).await?;
            tracing::debug!("Added {} to roster of {}", identity.user_id, room);
        }
        Ok(record)
    }

    /// Appends to the room log, trims it, and persists. Returns the message
    /// as stored.
    pub async fn append(&self, room: &str, message: Message) -> Result<Message> {
        let mut record = self.fetch_or_create(room).await?;
        let stored = record.append(message, self.max_messages);
        self.save(record).await?;
        Ok(stored)
    }

    /// Soft-deletes the room. Returns false when there was no active record.
    pub async fn deactivate(&self, room: &str) -> Result<bool> {
        let Some(mut record) = self.find_active(room).await? else {
            return Ok(false);
        };
        record.is_active = false;
        record.updated_at = chrono::Utc::now();
        self.save(record).await?;
        tracing::info!("Deactivated chat room {}", room);
        Ok(true)
    }
}
