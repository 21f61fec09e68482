use axum::{
    Router,
    routing::{get, put},
};

use crate::state::AppState;

use super::controller::{create_program, delete_program, get_live, get_programs, update_program};

pub fn init_radio_router() -> Router<AppState> {
    Router::new()
        .route("/programs", get(get_programs).post(create_program))
        .route("/programs/{id}", put(update_program).delete(delete_program))
        .route("/live", get(get_live))
}
