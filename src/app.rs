//! Application assembly: shared services and the HTTP router.

use crate::accounts::directory::AccountDirectory;
use crate::auth::Authenticator;
use crate::auth::token::TokenService;
use crate::chat::handlers::{handle_room_history, handle_room_messages, handle_room_participants};
use crate::chat::hub::RoomHub;
use crate::chat::presence::{InMemoryPresence, PresenceTracker};
use crate::chat::session::ChatContext;
use crate::chat::socket::handle_chat_socket;
use crate::chat::store::{ChatRepository, ChatRoomStore};
use crate::config::ChatConfig;
use crate::events::handlers::{handle_create_event, handle_list_events, handle_register_volunteer};
use crate::events::store::EventStore;
use crate::search::handlers::handle_search;
use crate::search::model::RelevanceModel;

use axum::routing::{get, post};
use axum::{Extension, Router};
use std::sync::Arc;

/// Every long-lived service, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub events: Arc<EventStore>,
    pub model: Arc<RelevanceModel>,
    pub authenticator: Arc<Authenticator>,
    pub chat: Arc<ChatContext>,
}

impl AppState {
    pub fn new(
        accounts: Arc<AccountDirectory>,
        events: Arc<EventStore>,
        model: RelevanceModel,
        tokens: TokenService,
        repository: Arc<dyn ChatRepository>,
        config: ChatConfig,
    ) -> Self {
        Self::with_presence(
            accounts,
            events,
            model,
            tokens,
            repository,
            Arc::new(InMemoryPresence::new()),
            config,
        )
    }

    pub fn with_presence(
        accounts: Arc<AccountDirectory>,
        events: Arc<EventStore>,
        model: RelevanceModel,
        tokens: TokenService,
        repository: Arc<dyn ChatRepository>,
        presence: Arc<dyn PresenceTracker>,
        config: ChatConfig,
    ) -> Self {
        let authenticator = Arc::new(Authenticator::new(tokens, accounts));
        let store = Arc::new(ChatRoomStore::new(
            repository,
            config.store_timeout,
            config.max_messages,
        ));

        let chat = Arc::new(ChatContext {
            authenticator: authenticator.clone(),
            hub: RoomHub::new(store, config.clone()),
            presence,
            config,
        });

        Self {
            events,
            model: Arc::new(model),
            authenticator,
            chat,
        }
    }
}

pub fn router(state: &AppState) -> Router {
    Router::new()
        .route("/", get(handle_root))
        .route("/api/events", get(handle_list_events).post(handle_create_event))
        .route("/api/events/search", get(handle_search))
        .route("/api/events/:id/volunteer", post(handle_register_volunteer))
        .route("/api/chat/messages", get(handle_room_messages))
        .route("/api/chat/messages/:room", get(handle_room_messages))
        .route("/api/chat/history", get(handle_room_history))
        .route("/api/chat/history/:room", get(handle_room_history))
        .route("/api/chat/participants", get(handle_room_participants))
        .route("/api/chat/participants/:room", get(handle_room_participants))
        .route("/ws/chat", get(handle_chat_socket))
        .layer(Extension(state.events.clone()))
        .layer(Extension(state.model.clone()))
        .layer(Extension(state.authenticator.clone()))
        .layer(Extension(state.chat.clone()))
}

async fn handle_root() -> &'static str {
    "Volunteer hub API is running"
}
