//! Live presence: which users currently hold a connection in which room.
//!
//! Presence is keyed by user id, not by connection. It is independent of the
//! persisted roster and is never written to the chat store.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PresenceSnapshot {
    pub count: usize,
    /// Online user ids, sorted.
    pub members: Vec<String>,
}

impl PresenceSnapshot {
    fn of(members: &HashSet<String>) -> Self {
        let mut sorted: Vec<String> = members.iter().cloned().collect();
        sorted.sort();
        Self {
            count: sorted.len(),
            members: sorted,
        }
    }
}

#[async_trait]
pub trait PresenceTracker: Send + Sync {
    /// Marks `user_id` online in `room`.
    async fn join(&self, room: &str, user_id: &str) -> PresenceSnapshot;

    /// Marks `user_id` offline in `room`.
    async fn leave(&self, room: &str, user_id: &str) -> PresenceSnapshot;

    /// Removes `user_id` from every room. Returns the affected rooms with
    /// their new online counts, sorted by room name.
    async fn remove_everywhere(&self, user_id: &str) -> Vec<(String, usize)>;

    async fn snapshot(&self, room: &str) -> PresenceSnapshot;
}

pub struct InMemoryPresence {
    rooms: DashMap<String, HashSet<String>>,
}

impl InMemoryPresence {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }
}

impl Default for InMemoryPresence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PresenceTracker for InMemoryPresence {
    async fn join(&self, room: &str, user_id: &str) -> PresenceSnapshot {
        let mut members = self.rooms.entry(room.to_string()).or_default();
        members.insert(user_id.to_string());
        PresenceSnapshot::of(&members)
    }

    async fn leave(&self, room: &str, user_id: &str) -> PresenceSnapshot {
        match self.rooms.get_mut(room) {
            Some(mut members) => {
                members.remove(user_id);
                PresenceSnapshot::of(&members)
            }
            None => PresenceSnapshot::default(),
        }
    }

    async fn remove_everywhere(&self, user_id: &str) -> Vec<(String, usize)> {
        let mut affected: Vec<(String, usize)> = self
            .rooms
            .iter_mut()
            .filter_map(|mut entry| {
                if entry.value_mut().remove(user_id) {
                    Some((entry.key().clone(), entry.value().len()))
                } else {
                    None
                }
            })
            .collect();
        affected.sort();
        affected
    }

    async fn snapshot(&self, room: &str) -> PresenceSnapshot {
        self.rooms
            .get(room)
            .map(|members| PresenceSnapshot::of(&members))
            .unwrap_or_default()
    }
}
