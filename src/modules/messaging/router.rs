use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    broadcast, create_conversation, get_conversation, get_conversations, get_messages,
    mark_read, send_message,
};

pub fn init_messaging_router() -> Router<AppState> {
    Router::new()
        .route(
            "/conversations",
            get(get_conversations).post(create_conversation),
        )
        .route("/conversations/{id}", get(get_conversation))
        .route(
            "/conversations/{id}/messages",
            get(get_messages).post(send_message),
        )
        .route("/conversations/{id}/read", post(mark_read))
        .route("/broadcast", post(broadcast))
}
