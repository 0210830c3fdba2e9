//! Per-room writer and fan-out.
//!
//! Each room gets a bounded command queue drained by one worker task, so all
//! writes to a room record happen one at a time and in queue order. The same
//! worker publishes `new-message` right after a successful append, which
//! makes broadcast order equal to append order.
//!
//! Joins are answered with a subscription the worker opens between commands:
//! every message appended before the join is in the returned record, every
//! message appended after it arrives on the subscription.
//!
//! Fan-out uses a `broadcast` channel per room. Presence and typing events
//! never touch the store and are published directly.
//!
//! An idle writer removes its room entry and exits once nobody holds or
//! watches its channel. The next request for that room starts a fresh writer.

use super::store::ChatRoomStore;
use super::types::{ChatRoom, Message, RoomBroadcast, ServerEvent};
use crate::accounts::types::Identity;
use crate::config::ChatConfig;
use crate::error::{AppError, Result};

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::sync::{broadcast, mpsc, oneshot};

/// A write request for one room's worker.
enum RoomCommand {
    Open {
        reply: oneshot::Sender<Result<ChatRoom>>,
    },
    Join {
        identity: Identity,
        reply: oneshot::Sender<Result<JoinedRoom>>,
    },
    Append {
        message: Message,
        reply: oneshot::Sender<Result<Message>>,
    },
    Deactivate {
        reply: oneshot::Sender<Result<bool>>,
    },
}

/// Room record at the moment of joining, plus every event published after it.
pub struct JoinedRoom {
    pub room: ChatRoom,
    pub events: broadcast::Receiver<RoomBroadcast>,
}

struct RoomChannel {
    commands: mpsc::Sender<RoomCommand>,
    events: broadcast::Sender<RoomBroadcast>,
}

type RoomMap = DashMap<String, Arc<RoomChannel>>;

pub struct RoomHub {
    /// Room name -> writer queue and fan-out channel. Created on first use,
    /// removed by the writer once it retires.
    rooms: Arc<RoomMap>,
    store: Arc<ChatRoomStore>,
    config: ChatConfig,
}

impl RoomHub {
    pub fn new(store: Arc<ChatRoomStore>, config: ChatConfig) -> Arc<Self> {
        Arc::new(Self {
            rooms: Arc::new(DashMap::new()),
            store,
            config,
        })
    }

    pub fn store(&self) -> &Arc<ChatRoomStore> {
        &self.store
    }

    /// Rooms that currently have a running writer.
    pub fn active_rooms(&self) -> usize {
        self.rooms.len()
    }

    /// Returns the room's channel, spawning its worker on first use. The
    /// worker cannot retire while the returned handle is alive.
    ///
    /// Must be called from within a Tokio runtime.
    fn channel(&self, room: &str) -> Arc<RoomChannel> {
        let entry = self.rooms.entry(room.to_string()).or_insert_with(|| {
            let (commands, receiver) = mpsc::channel(self.config.queue_capacity);
            let (events, _) = broadcast::channel(self.config.broadcast_capacity);

            tokio::spawn(room_worker(
                room.to_string(),
                self.store.clone(),
                receiver,
                events.clone(),
                self.rooms.clone(),
                self.config.idle_room_timeout,
            ));
            tracing::debug!("Started writer for room {}", room);

            Arc::new(RoomChannel { commands, events })
        });
        entry.value().clone()
    }

    /// Subscribes to every event published to `room` from now on.
    pub fn subscribe(&self, room: &str) -> broadcast::Receiver<RoomBroadcast> {
        self.channel(room).events.subscribe()
    }

    /// Publishes an ephemeral event. Returns how many subscribers saw it;
    /// rooms without a running writer have no subscribers and are skipped.
    pub fn publish(&self, room: &str, event: RoomBroadcast) -> usize {
        match self.rooms.get(room) {
            // An error only means there are no receivers right now.
            Some(channel) => channel.events.send(event).unwrap_or(0),
            None => 0,
        }
    }

    /// Queues `build(reply)` on the room's writer and waits for the answer.
    async fn request<T>(
        &self,
        room: &str,
        build: impl FnOnce(oneshot::Sender<Result<T>>) -> RoomCommand,
    ) -> Result<T> {
        let (reply, answer) = oneshot::channel();
        // Held until the answer arrives so the writer stays up meanwhile.
        let channel = self.channel(room);

        channel
            .commands
            .send_timeout(build(reply), self.config.store_timeout)
            .await
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => {
                    tracing::warn!("Write queue for room {} is full", room);
                    AppError::persistence(format!("room {} is busy, try again", room))
                }
                SendTimeoutError::Closed(_) => {
                    AppError::persistence(format!("writer for room {} has stopped", room))
                }
            })?;

        let outcome = match tokio::time::timeout(self.config.reply_timeout(), answer).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(AppError::persistence(format!(
                "writer for room {} dropped the request",
                room
            ))),
            Err(_) => {
                tracing::error!("Timed out waiting for writer of room {}", room);
                Err(AppError::persistence(format!(
                    "timed out waiting for room {}",
                    room
                )))
            }
        };
        drop(channel);
        outcome
    }

    /// Fetch-or-create through the room's writer.
    pub async fn open(&self, room: &str) -> Result<ChatRoom> {
        self.request(room, |reply| RoomCommand::Open { reply }).await
    }

    /// Ensures `identity` is on the room's roster and subscribes at that
    /// point of the room's log.
    pub async fn join(&self, room: &str, identity: Identity) -> Result<JoinedRoom> {
        self.request(room, |reply| RoomCommand::Join { identity, reply })
            .await
    }

    /// Appends `message` and broadcasts it to the room once persisted.
    pub async fn post(&self, room: &str, message: Message) -> Result<Message> {
        self.request(room, |reply| RoomCommand::Append { message, reply })
            .await
    }

    pub async fn deactivate(&self, room: &str) -> Result<bool> {
        self.request(room, |reply| RoomCommand::Deactivate { reply })
            .await
    }
}

/// Drains one room's queue until it retires or every sender is gone.
async fn room_worker(
    room: String,
    store: Arc<ChatRoomStore>,
    mut commands: mpsc::Receiver<RoomCommand>,
    events: broadcast::Sender<RoomBroadcast>,
    rooms: Arc<RoomMap>,
    idle_timeout: Duration,
) {
    loop {
        let next = tokio::time::timeout(idle_timeout, commands.recv()).await;
        let command = match next {
            Ok(Some(command)) => command,
            Ok(None) => break,
            Err(_) => {
                // Runs under the shard lock, so no caller can pick the channel
                // up mid-check. A strong count of one means only the map has it.
                let retired = rooms
                    .remove_if(&room, |_, channel| {
                        Arc::strong_count(channel) == 1
                            && channel.events.receiver_count() == 0
                            && commands.is_empty()
                    })
                    .is_some();
                if retired {
                    tracing::debug!("Retiring idle writer for room {}", room);
                    break;
                }
                continue;
            }
        };

        match command {
            RoomCommand::Open { reply } => {
                let _ = reply.send(store.fetch_or_create(&room).await);
            }
            RoomCommand::Join { identity, reply } => {
                let joined = store.join(&room, &identity).await.map(|record| JoinedRoom {
                    room: record,
                    events: events.subscribe(),
                });
                let _ = reply.send(joined);
            }
            RoomCommand::Append { message, reply } => {
                let result = store.append(&room, message).await;
                if let Ok(stored) = &result {
                    let delivered = events
                        .send(RoomBroadcast::to_all(ServerEvent::NewMessage(stored.clone())))
                        .unwrap_or(0);
                    tracing::trace!("Message in {} delivered to {} subscribers", room, delivered);
                }
                // The caller may have given up; the append stands either way.
                let _ = reply.send(result);
            }
            RoomCommand::Deactivate { reply } => {
                let _ = reply.send(store.deactivate(&room).await);
            }
        }
    }
    tracing::debug!("Writer for room {} stopped", room);
}
