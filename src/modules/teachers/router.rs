use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{
    assign_subjects, create_teacher, delete_teacher, get_teacher, get_teacher_subjects,
    get_teachers, update_teacher,
};

pub fn init_teachers_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_teachers).post(create_teacher))
        .route(
            "/{id}",
            get(get_teacher).put(update_teacher).delete(delete_teacher),
        )
        .route(
            "/{id}/subjects",
            get(get_teacher_subjects).post(assign_subjects),
        )
}
