use super::engine::search;
use super::model::RelevanceModel;
use super::types::SearchResponse;
use crate::error::AppError;
use crate::events::store::EventStore;

use axum::extract::Query;
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

pub async fn handle_search(
    Query(params): Query<SearchParams>,
    Extension(events): Extension<Arc<EventStore>>,
    Extension(model): Extension<Arc<RelevanceModel>>,
) -> Result<Json<SearchResponse>, AppError> {
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(AppError::validation("Search query is required"));
    }

    let now = Utc::now();
    let candidates = events.upcoming(now);

    // Batch inference is CPU-bound; keep it off the async workers.
    let response = tokio::task::spawn_blocking(move || search(&query, candidates, now, &model))
        .await
        .map_err(search_task_failed)??;

    tracing::info!(
        "Search returned {} results (method: {:?})",
        response.results.len(),
        response.method
    );
    Ok(Json(response))
}

/// A panicked or cancelled ranking task is a server fault, not a storage one.
pub(crate) fn search_task_failed(err: tokio::task::JoinError) -> AppError {
    AppError::Internal(format!("search task failed: {}", err))
}
