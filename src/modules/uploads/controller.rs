use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
};
use scholaris_core::AppError;
use tracing::instrument;

use crate::docs::ErrorResponse;
use crate::middleware::auth::RequireUploadsWrite;
use crate::state::AppState;
use crate::utils::auth_helpers::school_for_scoped_operation;
use crate::validator::ValidatedQuery;

use super::model::{
    MULTIPLE_FIELD, PendingFile, SINGLE_FIELD, UploadForm, UploadManyForm, UploadManyResponse,
    UploadQuery, UploadedFile,
};
use super::service::UploadService;

fn multipart_error(err: MultipartError) -> AppError {
    AppError::new(err.status(), anyhow::anyhow!(err.body_text()))
}

/// Reads the parts named `field`, ignoring any other form fields.
async fn read_files(
    multipart: &mut Multipart,
    field: &str,
    max_files: usize,
) -> Result<Vec<PendingFile>, AppError> {
    let mut files = Vec::new();

    while let Some(part) = multipart.next_field().await.map_err(multipart_error)? {
        if part.name() != Some(field) {
            continue;
        }
        if files.len() == max_files {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "At most {max_files} files can be uploaded at once"
            )));
        }

        let file_name = part.file_name().unwrap_or("upload").to_string();
        let mime_type = part
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = part.bytes().await.map_err(multipart_error)?;

        if bytes.is_empty() {
            return Err(AppError::bad_request(anyhow::anyhow!("{file_name} is empty")));
        }

        files.push(PendingFile {
            file_name,
            mime_type,
            bytes: bytes.to_vec(),
        });
    }

    if files.is_empty() {
        return Err(AppError::bad_request(anyhow::anyhow!(
            "No file uploaded in field '{field}'"
        )));
    }
    Ok(files)
}

#[utoipa::path(
    post,
    path = "/api/upload",
    params(UploadQuery),
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File stored", body = UploadedFile),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 415, description = "File type not allowed", body = ErrorResponse)
    ),
    tag = "Uploads",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn upload_single(
    State(state): State<AppState>,
    RequireUploadsWrite(auth_user): RequireUploadsWrite,
    ValidatedQuery(query): ValidatedQuery<UploadQuery>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadedFile>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, query.school_id)?;
    let files = read_files(&mut multipart, SINGLE_FIELD, 1).await?;

    let mut stored = UploadService::store(&state.storage, school_id, files).await?;
    let file = stored
        .pop()
        .ok_or_else(|| AppError::internal(anyhow::anyhow!("Upload produced no file")))?;
    Ok((StatusCode::CREATED, Json(file)))
}

#[utoipa::path(
    post,
    path = "/api/upload-multiple",
    params(UploadQuery),
    request_body(content = UploadManyForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Files stored", body = UploadManyResponse),
        (status = 400, description = "No files or too many files", body = ErrorResponse),
        (status = 415, description = "File type not allowed", body = ErrorResponse)
    ),
    tag = "Uploads",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn upload_multiple(
    State(state): State<AppState>,
    RequireUploadsWrite(auth_user): RequireUploadsWrite,
    ValidatedQuery(query): ValidatedQuery<UploadQuery>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadManyResponse>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, query.school_id)?;
    let files = read_files(&mut multipart, MULTIPLE_FIELD, state.storage_config.max_files).await?;

    let files = UploadService::store(&state.storage, school_id, files).await?;
    Ok((StatusCode::CREATED, Json(UploadManyResponse { files })))
}
