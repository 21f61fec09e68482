use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_book, delete_book, get_book, get_books, get_issues, issue_book, return_book,
    update_book,
};

pub fn init_library_router() -> Router<AppState> {
    Router::new()
        .route("/books", get(get_books).post(create_book))
        .route(
            "/books/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/issues", get(get_issues).post(issue_book))
        .route("/issues/{id}/return", post(return_book))
}
