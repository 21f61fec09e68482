use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

use super::controller::{
    add_room, allocate, create_hostel, delete_hostel, delete_room, get_allocations, get_hostel,
    get_hostels, get_rooms, release_allocation, update_hostel, update_room,
};

pub fn init_hostel_router() -> Router<AppState> {
    Router::new()
        .route("/hostels", get(get_hostels).post(create_hostel))
        .route(
            "/hostels/{id}",
            get(get_hostel).put(update_hostel).delete(delete_hostel),
        )
        .route("/hostels/{id}/rooms", get(get_rooms).post(add_room))
        .route("/rooms/{id}", put(update_room).delete(delete_room))
        .route("/allocations", get(get_allocations).post(allocate))
        .route("/allocations/{id}/release", post(release_allocation))
}
