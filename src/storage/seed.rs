//! Startup seed loading.
//!
//! The seed file is a single JSON object:
//!
//! ```json
//! { "volunteers": [...], "ngos": [...], "events": [...] }
//! ```
//!
//! Every list is optional. Records are inserted as-is, replacing any
//! existing record with the same id.

use crate::accounts::directory::AccountDirectory;
use crate::accounts::types::{Ngo, Volunteer};
use crate::error::{AppError, Result};
use crate::events::store::EventStore;
use crate::events::types::Event;

use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub volunteers: Vec<Volunteer>,
    #[serde(default)]
    pub ngos: Vec<Ngo>,
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub volunteers: usize,
    pub ngos: usize,
    pub events: usize,
}

pub fn load_seed(path: &Path) -> Result<SeedData> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        AppError::persistence(format!("could not read seed file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        AppError::persistence(format!("invalid seed file {}: {}", path.display(), e))
    })
}

pub fn apply_seed(seed: SeedData, accounts: &AccountDirectory, events: &EventStore) -> SeedSummary {
    let summary = SeedSummary {
        volunteers: seed.volunteers.len(),
        ngos: seed.ngos.len(),
        events: seed.events.len(),
    };

    for volunteer in seed.volunteers {
        accounts.add_volunteer(volunteer);
    }
    for ngo in seed.ngos {
        accounts.add_ngo(ngo);
    }
    for event in seed.events {
        events.insert(event);
    }
    summary
}
