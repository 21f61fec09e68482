use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{
    create_item, create_transaction, delete_item, get_item, get_items, get_transactions,
    update_item,
};

pub fn init_inventory_router() -> Router<AppState> {
    Router::new()
        .route("/items", get(get_items).post(create_item))
        .route(
            "/items/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route(
            "/items/{id}/transactions",
            get(get_transactions).post(create_transaction),
        )
}
