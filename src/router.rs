use std::sync::Arc;

use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::middleware::role::require_system_admin;
use crate::modules::attendance::init_attendance_router;
use crate::modules::auth::{init_auth_router, init_public_auth_router};
use crate::modules::certificates::init_certificates_router;
use crate::modules::classes::{init_classes_router, init_sections_router, init_subjects_router};
use crate::modules::contents::init_contents_router;
use crate::modules::exams::init_exams_router;
use crate::modules::health::init_health_router;
use crate::modules::hostel::init_hostel_router;
use crate::modules::inventory::init_inventory_router;
use crate::modules::leaves::{init_gate_passes_router, init_leaves_router};
use crate::modules::library::init_library_router;
use crate::modules::messaging::init_messaging_router;
use crate::modules::notices::{init_newsletters_router, init_notices_router};
use crate::modules::radio::init_radio_router;
use crate::modules::schools::init_schools_router;
use crate::modules::students::init_students_router;
use crate::modules::tally::init_tally_router;
use crate::modules::teachers::init_teachers_router;
use crate::modules::transport::init_transport_router;
use crate::modules::uploads::init_uploads_router;
use crate::modules::users::init_users_router;
use crate::state::AppState;
use axum::http::{HeaderValue, Method};
use axum::{Router, middleware};
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

/// Builds the full application.
///
/// Rate limiting keys on the peer IP, so the server must be started with
/// `into_make_service_with_connect_info::<SocketAddr>()` when it is enabled.
pub fn init_router(state: AppState) -> Router {
    let rate_limit = &state.rate_limit_config;

    let mut public_auth = init_public_auth_router();
    if rate_limit.enabled
        && let Some(config) = rate_limit.auth_governor_config()
    {
        public_auth = public_auth.layer(GovernorLayer::new(Arc::new(config)));
    }

    let mut api = Router::new()
        .nest("/auth", public_auth.merge(init_auth_router()))
        .nest(
            "/schools",
            init_schools_router().route_layer(middleware::from_fn_with_state(
                state.clone(),
                require_system_admin,
            )),
        )
        .nest("/users", init_users_router())
        .nest("/students", init_students_router())
        .nest("/teachers", init_teachers_router())
        .nest("/classes", init_classes_router())
        .nest("/sections", init_sections_router())
        .nest("/subjects", init_subjects_router())
        .nest("/attendance", init_attendance_router())
        .nest("/exams", init_exams_router())
        .nest("/contents", init_contents_router())
        .nest("/certificates", init_certificates_router())
        .nest("/library", init_library_router())
        .nest("/hostel", init_hostel_router())
        .nest("/inventory", init_inventory_router())
        .nest("/transport", init_transport_router())
        .nest("/messages", init_messaging_router())
        .nest("/notices", init_notices_router())
        .nest("/newsletters", init_newsletters_router())
        .nest("/leaves", init_leaves_router())
        .nest("/gate-passes", init_gate_passes_router())
        .nest("/radio", init_radio_router())
        .nest("/tally", init_tally_router())
        .nest("/health", init_health_router())
        .merge(init_uploads_router(&state.storage_config));

    if rate_limit.enabled
        && let Some(config) = rate_limit.general_governor_config()
    {
        api = api.layer(GovernorLayer::new(Arc::new(config)));
    }

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(&state.storage_config.upload_dir))
        .with_state(state.clone())
        .layer({
            let allowed_origins: Vec<HeaderValue> = state
                .cors_config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                ])
                .allow_credentials(true)
        })
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
