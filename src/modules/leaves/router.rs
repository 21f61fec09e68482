use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_leave, get_gate_pass, get_leave, get_leaves, parent_decision, school_decision,
    verify_gate_pass,
};

pub fn init_leaves_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_leaves).post(create_leave))
        .route("/{id}", get(get_leave))
        .route("/{id}/parent-decision", post(parent_decision))
        .route("/{id}/school-decision", post(school_decision))
        .route("/{id}/gate-pass", get(get_gate_pass))
}

pub fn init_gate_passes_router() -> Router<AppState> {
    Router::new().route("/verify", post(verify_gate_pass))
}
