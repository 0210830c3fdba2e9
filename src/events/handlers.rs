use super::store::EventStore;
use super::types::{CreateEventRequest, Event, EventMessageResponse};
use crate::auth::extractor::AuthenticatedUser;
use crate::error::AppError;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::{Extension, Json};
use std::sync::Arc;

pub async fn handle_list_events(Extension(events): Extension<Arc<EventStore>>) -> Json<Vec<Event>> {
    Json(events.list())
}

pub async fn handle_create_event(
    Extension(events): Extension<Arc<EventStore>>,
    Json(req): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let event = events.create(req)?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn handle_register_volunteer(
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(event_id): Path<String>,
    Extension(events): Extension<Arc<EventStore>>,
) -> Result<Json<EventMessageResponse>, AppError> {
    events.register_volunteer(&event_id, &identity.user_id)?;
    tracing::info!("User {} registered for event {}", identity.user_id, event_id);

    Ok(Json(EventMessageResponse {
        message: "Successfully registered as volunteer".to_string(),
    }))
}
