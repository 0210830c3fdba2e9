use super::types::{CreateEventRequest, Event, MANUAL_SOURCE};
use crate::error::{AppError, Result};
use crate::storage::memory::DocumentStore;

use chrono::{DateTime, Utc};

pub struct EventStore {
    events: DocumentStore<String, Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: DocumentStore::new(),
        }
    }

    pub fn insert(&self, event: Event) {
        self.events.put(event.id.clone(), event);
    }

    /// Validates a manual-entry request and stores the resulting event.
    pub fn create(&self, req: CreateEventRequest) -> Result<Event> {
        let (Some(name), Some(date), Some(location), Some(description)) =
            (req.name, req.date, req.location, req.description)
        else {
            return Err(AppError::validation(
                "name, date, location and description are required",
            ));
        };
        if name.trim().is_empty() || location.trim().is_empty() || description.trim().is_empty() {
            return Err(AppError::validation(
                "name, location and description must not be blank",
            ));
        }

        let event = Event {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            date,
            location,
            description,
            skills: req.skills,
            source: req.source.unwrap_or_else(|| MANUAL_SOURCE.to_string()),
            external_id: req.external_id,
            volunteers: Vec::new(),
        };
        self.insert(event.clone());
        tracing::info!("Created event {} ({})", event.id, event.name);
        Ok(event)
    }

    pub fn get(&self, event_id: &str) -> Option<Event> {
        self.events.get(&event_id.to_string())
    }

    /// All events ordered by date, then id.
    pub fn list(&self) -> Vec<Event> {
        let mut events = self.events.values();
        sort_by_schedule(&mut events);
        events
    }

    /// Events dated at or after `now`, ordered by date, then id.
    pub fn upcoming(&self, now: DateTime<Utc>) -> Vec<Event> {
        let mut events: Vec<Event> = self
            .events
            .values()
            .into_iter()
            .filter(|event| event.date >= now)
            .collect();
        sort_by_schedule(&mut events);
        events
    }

    /// Adds `user_id` to the event's volunteer list.
    pub fn register_volunteer(&self, event_id: &str, user_id: &str) -> Result<Event> {
        let outcome = self.events.update(&event_id.to_string(), |event| {
            if event.volunteers.iter().any(|id| id == user_id) {
                return Err(AppError::validation("Already registered for this event"));
            }
            event.volunteers.push(user_id.to_string());
            Ok(event.clone())
        });

        match outcome {
            Some(result) => result,
            None => Err(AppError::not_found("event", event_id)),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}

fn sort_by_schedule(events: &mut [Event]) {
    events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
}
