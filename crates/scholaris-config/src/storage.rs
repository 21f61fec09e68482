use std::path::PathBuf;

use crate::{env_or, env_string_or};

/// Upload storage settings.
///
/// - `UPLOAD_DIR`: directory files are written to (default `uploads`)
/// - `UPLOAD_BASE_URL`: public prefix the directory is served under (default `/uploads`)
/// - `UPLOAD_MAX_BYTES`: per-file limit (default 10 MiB)
/// - `UPLOAD_MAX_FILES`: files accepted by `/upload-multiple` (default 10)
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub base_url: String,
    pub max_file_bytes: usize,
    pub max_files: usize,
}

impl StorageConfig {
    pub fn from_env() -> Self {
        Self {
            upload_dir: PathBuf::from(env_string_or("UPLOAD_DIR", "uploads")),
            base_url: env_string_or("UPLOAD_BASE_URL", "/uploads"),
            max_file_bytes: env_or("UPLOAD_MAX_BYTES", 10 * 1024 * 1024),
            max_files: env_or("UPLOAD_MAX_FILES", 10),
        }
    }
}
