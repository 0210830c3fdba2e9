use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MANUAL_SOURCE: &str = "Manual";

fn default_source() -> String {
    MANUAL_SOURCE.to_string()
}

/// A volunteering opportunity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub name: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub description: String,
    #[serde(default)]
    pub skills: Vec<String>,
    /// Provenance tag: `"Manual"` or the name of the ingesting feed.
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub external_id: Option<String>,
    /// Ids of users registered for this event.
    #[serde(default)]
    pub volunteers: Vec<String>,
}

impl Event {
    /// Text the lexical filter matches against.
    pub fn searchable_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.name,
            self.description,
            self.location,
            self.skills.join(" ")
        )
    }

    /// Text the relevance model encodes on the document side.
    pub fn model_text(&self) -> String {
        format!("{} {}", self.description, self.skills.join(" "))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub name: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub source: Option<String>,
    pub external_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventMessageResponse {
    pub message: String,
}
