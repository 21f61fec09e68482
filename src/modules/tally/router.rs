use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{auto_ledger, companies, health, ledgers, sales};

pub fn init_tally_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/companies", get(companies))
        .route("/ledgers", get(ledgers))
        .route("/sales", get(sales))
        .route("/auto-ledger", post(auto_ledger))
}
