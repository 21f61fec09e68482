use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{
    create_certificate, delete_certificate, get_certificate, get_certificates, update_certificate,
};

pub fn init_certificates_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_certificates).post(create_certificate))
        .route(
            "/{id}",
            get(get_certificate)
                .put(update_certificate)
                .delete(delete_certificate),
        )
}
