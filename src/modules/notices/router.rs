use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{
    create_newsletter, create_notice, delete_newsletter, delete_notice, get_newsletter,
    get_newsletters, get_notice, get_notices, update_newsletter, update_notice,
};

pub fn init_notices_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_notices).post(create_notice))
        .route(
            "/{id}",
            get(get_notice).put(update_notice).delete(delete_notice),
        )
}

pub fn init_newsletters_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_newsletters).post(create_newsletter))
        .route(
            "/{id}",
            get(get_newsletter)
                .put(update_newsletter)
                .delete(delete_newsletter),
        )
}
