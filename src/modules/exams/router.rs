use axum::{
    Router,
    routing::{delete, get},
};

use crate::state::AppState;

use super::controller::{
    add_paper, create_exam, delete_exam, delete_paper, get_exam, get_exams, get_papers,
    get_report_card, get_results, record_results, update_exam,
};

pub fn init_exams_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_exams).post(create_exam))
        .route("/{id}", get(get_exam).put(update_exam).delete(delete_exam))
        .route("/{id}/papers", get(get_papers).post(add_paper))
        .route("/{id}/students/{student_id}/report", get(get_report_card))
        .route("/papers/{paper_id}", delete(delete_paper))
        .route(
            "/papers/{paper_id}/results",
            get(get_results).post(record_results),
        )
}
