use crate::events::types::Event;
use serde::{Deserialize, Serialize};

/// Relevance assigned to every result when the model is not used.
pub const FALLBACK_RELEVANCE: f32 = 0.8;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SearchMethod {
    #[serde(rename = "filter+ml")]
    FilterMl,
    #[serde(rename = "filter")]
    Filter,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredEvent {
    #[serde(flatten)]
    pub event: Event,
    pub relevance: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<ScoredEvent>,
    pub method: SearchMethod,
}
