use axum::{Router, routing::{delete, get}};

use crate::state::AppState;

use super::controller::{
    assign_student, create_bus, delete_bus, get_bus, get_bus_students, get_buses,
    unassign_student, update_bus,
};

pub fn init_transport_router() -> Router<AppState> {
    Router::new()
        .route("/buses", get(get_buses).post(create_bus))
        .route("/buses/{id}", get(get_bus).put(update_bus).delete(delete_bus))
        .route(
            "/buses/{id}/students",
            get(get_bus_students).post(assign_student),
        )
        .route("/buses/{id}/students/{student_id}", delete(unassign_student))
}
