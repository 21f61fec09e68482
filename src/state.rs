#[cfg(any(test, feature = "test-utils"))]
use std::path::Path;
use std::sync::Arc;

use scholaris_config::{
    CorsConfig, JwtConfig, LibraryConfig, RadioConfig, RateLimitConfig, StorageConfig, TallyConfig,
};
use scholaris_core::file_storage::LocalFileStorage;
use sqlx::PgPool;

use crate::modules::radio::store::{FileRadioStore, RadioProgramStore};
use crate::modules::tally::client::{TallyClient, TallyError};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
    pub storage: Arc<LocalFileStorage>,
    pub storage_config: StorageConfig,
    pub radio_store: Arc<dyn RadioProgramStore>,
    pub radio_config: RadioConfig,
    pub tally: TallyClient,
    pub library_config: LibraryConfig,
}

impl AppState {
    pub fn new(
        db: PgPool,
        storage_config: StorageConfig,
        radio_config: RadioConfig,
        tally_config: TallyConfig,
    ) -> Result<Self, TallyError> {
        let storage = LocalFileStorage::new(
            storage_config.upload_dir.clone(),
            storage_config.base_url.clone(),
            storage_config.max_file_bytes,
        );

        Ok(Self {
            db,
            jwt_config: JwtConfig::from_env(),
            cors_config: CorsConfig::from_env(),
            rate_limit_config: RateLimitConfig::from_env(),
            storage: Arc::new(storage),
            storage_config,
            radio_store: Arc::new(FileRadioStore::new(radio_config.store_path.clone())),
            radio_config,
            tally: TallyClient::new(&tally_config)?,
            library_config: LibraryConfig::from_env(),
        })
    }

    /// State for integration tests: rate limiting off, uploads and the radio
    /// file under `workdir`, Tally pointed at `tally_url`.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn for_tests(db: PgPool, workdir: &Path, tally_url: &str) -> Self {
        let storage_config = StorageConfig {
            upload_dir: workdir.join("uploads"),
            base_url: "/uploads".to_string(),
            max_file_bytes: 1024 * 1024,
            max_files: 3,
        };
        let radio_config = RadioConfig {
            store_path: workdir.join("radio-programs.json"),
            ..RadioConfig::default()
        };
        let tally_config = TallyConfig {
            base_url: tally_url.to_string(),
            timeout: std::time::Duration::from_secs(2),
        };

        let mut state = Self::new(db, storage_config, radio_config, tally_config)
            .expect("failed to build test state");
        state.jwt_config = JwtConfig {
            secret: "test-secret".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 7200,
        };
        state.rate_limit_config = RateLimitConfig::disabled();
        state.library_config = LibraryConfig::default();
        state
    }
}

pub async fn init_app_state(db: PgPool) -> anyhow::Result<AppState> {
    let state = AppState::new(
        db,
        StorageConfig::from_env(),
        RadioConfig::from_env(),
        TallyConfig::from_env(),
    )?;

    if let Some(parent) = state.radio_config.store_path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::create_dir_all(&state.storage_config.upload_dir).await?;

    Ok(state)
}

