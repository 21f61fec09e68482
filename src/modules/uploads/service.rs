use axum::http::StatusCode;
use scholaris_core::AppError;
use scholaris_core::file_storage::{FileStorage, LocalFileStorage, StorageError};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::metrics;

use super::model::{PendingFile, UploadedFile};

pub fn storage_error(err: StorageError) -> AppError {
    let status = match &err {
        StorageError::InvalidFileSize { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        StorageError::InvalidMimeType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        StorageError::InvalidKey(_) => StatusCode::BAD_REQUEST,
        StorageError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    AppError::new(status, err)
}

pub struct UploadService;

impl UploadService {
    /// Validates every file before writing any, so a bad file in a batch
    /// leaves nothing behind.
    #[instrument(skip(storage, files), fields(files = files.len()))]
    pub async fn store(
        storage: &LocalFileStorage,
        school_id: Uuid,
        files: Vec<PendingFile>,
    ) -> Result<Vec<UploadedFile>, AppError> {
        for file in &files {
            storage
                .validate(&file.mime_type, file.bytes.len())
                .map_err(storage_error)?;
        }

        let mut uploaded = Vec::with_capacity(files.len());
        for file in files {
            let key = storage.key_for(school_id, &file.file_name, &file.bytes);
            storage.save(&key, &file.bytes).await.map_err(storage_error)?;
            let url = storage.get_url(&key).map_err(storage_error)?;
            uploaded.push(UploadedFile {
                url,
                key,
                size: file.bytes.len(),
                file_name: file.file_name,
                mime_type: file.mime_type,
            });
        }

        let total_bytes = uploaded.iter().map(|f| f.size).sum();
        metrics::track_upload(uploaded.len(), total_bytes);
        info!(school.id = %school_id, files = uploaded.len(), bytes = total_bytes, "Files uploaded");
        Ok(uploaded)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn pending(name: &str, mime: &str, bytes: &[u8]) -> PendingFile {
        PendingFile {
            file_name: name.to_string(),
            mime_type: mime.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_storage_error_statuses() {
        assert_eq!(
            storage_error(StorageError::InvalidFileSize { max_bytes: 1 }).status,
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            storage_error(StorageError::InvalidMimeType {
                received: "x".into(),
                allowed: vec![]
            })
            .status,
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }

    #[tokio::test]
    async fn test_store_writes_under_school_directory() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path().to_path_buf(), "/uploads".into(), 1024);
        let school = Uuid::new_v4();

        let stored = UploadService::store(&storage, school, vec![pending("notes.txt", "text/plain", b"hi")])
            .await
            .unwrap();

        assert_eq!(stored.len(), 1);
        assert!(stored[0].url.starts_with(&format!("/uploads/{school}/")));
        assert!(dir.path().join(&stored[0].key).exists());
    }

    #[tokio::test]
    async fn test_bad_file_in_batch_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(PathBuf::from(dir.path()), "/uploads".into(), 1024);
        let school = Uuid::new_v4();

        let err = UploadService::store(
            &storage,
            school,
            vec![
                pending("a.txt", "text/plain", b"ok"),
                pending("b.exe", "application/x-msdownload", b"MZ"),
            ],
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(!dir.path().join(school.to_string()).exists());
    }
}
