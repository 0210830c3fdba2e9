use super::filter::filter_candidates;
use super::model::{RelevanceModel, RelevanceNetwork};
use super::types::{FALLBACK_RELEVANCE, ScoredEvent, SearchMethod, SearchResponse};
use crate::error::{AppError, Result};
use crate::events::types::Event;

use chrono::{DateTime, Utc};

/// Two-stage event search.
///
/// 1. Drop events dated before `now`.
/// 2. Lexical filter, widening to every future event when nothing matches.
/// 3. Model re-ranking when the model is loaded and scores cleanly; otherwise
///    date order with a fixed relevance.
///
/// Both sorts are stable, so ties keep the order of the previous stage.
pub fn search(
    query: &str,
    candidates: Vec<Event>,
    now: DateTime<Utc>,
    model: &RelevanceModel,
) -> Result<SearchResponse> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::validation("Search query is required"));
    }

    let future: Vec<Event> = candidates
        .into_iter()
        .filter(|event| event.date >= now)
        .collect();
    let pool_size = future.len();

    let filtered = filter_candidates(query, future);
    if filtered.widened {
        tracing::info!("No lexical matches for {:?}; ranking all {} future events", query, pool_size);
    }
    let survivors = filtered.events;

    if let RelevanceModel::Loaded(network) = model {
        match rank_with_model(network, query, &survivors) {
            Ok(results) => {
                tracing::debug!(
                    "Search {:?}: {} of {} candidates ranked by model",
                    query,
                    results.len(),
                    pool_size
                );
                return Ok(SearchResponse {
                    results,
                    method: SearchMethod::FilterMl,
                });
            }
            Err(e) => {
                tracing::warn!("Relevance scoring failed, falling back to filter order: {}", e);
            }
        }
    }

    Ok(SearchResponse {
        results: rank_by_date(survivors),
        method: SearchMethod::Filter,
    })
}

fn rank_with_model(
    network: &RelevanceNetwork,
    query: &str,
    events: &[Event],
) -> Result<Vec<ScoredEvent>> {
    let documents: Vec<String> = events.iter().map(Event::model_text).collect();
    let scores = network.score_batch(query, &documents)?;

    let mut results: Vec<ScoredEvent> = events
        .iter()
        .cloned()
        .zip(scores)
        .map(|(event, relevance)| ScoredEvent { event, relevance })
        .collect();

    results.sort_by(|a, b| {
        b.relevance
            .partial_cmp(&a.relevance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(results)
}

fn rank_by_date(mut events: Vec<Event>) -> Vec<ScoredEvent> {
    events.sort_by(|a, b| a.date.cmp(&b.date));
    events
        .into_iter()
        .map(|event| ScoredEvent {
            event,
            relevance: FALLBACK_RELEVANCE,
        })
        .collect()
}
