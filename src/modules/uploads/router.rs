use axum::{Router, extract::DefaultBodyLimit, routing::post};
use scholaris_config::StorageConfig;

use crate::state::AppState;

use super::controller::{upload_multiple, upload_single};

/// Multipart overhead allowed on top of the file bytes themselves.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn init_uploads_router(config: &StorageConfig) -> Router<AppState> {
    let single_limit = config.max_file_bytes + FORM_OVERHEAD_BYTES;
    let multiple_limit = config.max_file_bytes * config.max_files.max(1) + FORM_OVERHEAD_BYTES;

    Router::new()
        .route(
            "/upload",
            post(upload_single).layer(DefaultBodyLimit::max(single_limit)),
        )
        .route(
            "/upload-multiple",
            post(upload_multiple).layer(DefaultBodyLimit::max(multiple_limit)),
        )
}
