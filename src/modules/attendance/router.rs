use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    check_in, get_attendance, get_check_ins, get_geofence_status, get_student_summary,
    mark_attendance,
};

pub fn init_attendance_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_attendance))
        .route("/mark", post(mark_attendance))
        .route("/students/{id}/summary", get(get_student_summary))
        .route("/check-in", post(check_in))
        .route("/check-ins", get(get_check_ins))
        .route("/geofence", get(get_geofence_status))
}
