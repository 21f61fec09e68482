use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use scholaris_core::AppError;
use tracing::instrument;
use uuid::Uuid;

use crate::docs::ErrorResponse;
use crate::middleware::auth::{RequireContentsRead, RequireContentsWrite};
use crate::state::AppState;
use crate::utils::auth_helpers::{resource_scope, school_for_scoped_operation};
use crate::validator::{ValidatedJson, ValidatedQuery};

use super::model::{
    AcademicContent, ContentFilterParams, CreateContentDto, PaginatedContentsResponse,
    UpdateContentDto,
};
use super::service::ContentService;

#[utoipa::path(
    post,
    path = "/api/contents",
    request_body = CreateContentDto,
    responses(
        (status = 201, description = "Content created", body = AcademicContent),
        (status = 400, description = "Class or subject not in this school", body = ErrorResponse)
    ),
    tag = "Contents",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn create_content(
    State(state): State<AppState>,
    RequireContentsWrite(auth_user): RequireContentsWrite,
    ValidatedJson(dto): ValidatedJson<CreateContentDto>,
) -> Result<(StatusCode, Json<AcademicContent>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, dto.school_id)?;
    let content =
        ContentService::create_content(&state.db, school_id, auth_user.user_id()?, dto).await?;
    Ok((StatusCode::CREATED, Json(content)))
}

#[utoipa::path(
    get,
    path = "/api/contents",
    params(ContentFilterParams),
    responses((status = 200, description = "Paginated contents", body = PaginatedContentsResponse)),
    tag = "Contents",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn get_contents(
    State(state): State<AppState>,
    RequireContentsRead(auth_user): RequireContentsRead,
    ValidatedQuery(filters): ValidatedQuery<ContentFilterParams>,
) -> Result<Json<PaginatedContentsResponse>, AppError> {
    let school_id = school_for_scoped_operation(&auth_user, filters.school_id)?;
    Ok(Json(ContentService::list_contents(&state.db, school_id, &filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/contents/{id}",
    params(("id" = Uuid, Path, description = "Content ID")),
    responses(
        (status = 200, description = "Content details", body = AcademicContent),
        (status = 404, description = "Content not found", body = ErrorResponse)
    ),
    tag = "Contents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_content(
    State(state): State<AppState>,
    RequireContentsRead(auth_user): RequireContentsRead,
    Path(id): Path<Uuid>,
) -> Result<Json<AcademicContent>, AppError> {
    Ok(Json(ContentService::get_content(&state.db, id, resource_scope(&auth_user)?).await?))
}

#[utoipa::path(
    put,
    path = "/api/contents/{id}",
    params(("id" = Uuid, Path, description = "Content ID")),
    request_body = UpdateContentDto,
    responses(
        (status = 200, description = "Content updated", body = AcademicContent),
        (status = 404, description = "Content not found", body = ErrorResponse)
    ),
    tag = "Contents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_content(
    State(state): State<AppState>,
    RequireContentsWrite(auth_user): RequireContentsWrite,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateContentDto>,
) -> Result<Json<AcademicContent>, AppError> {
    Ok(Json(
        ContentService::update_content(&state.db, id, resource_scope(&auth_user)?, dto).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/contents/{id}",
    params(("id" = Uuid, Path, description = "Content ID")),
    responses(
        (status = 204, description = "Content deleted"),
        (status = 404, description = "Content not found", body = ErrorResponse)
    ),
    tag = "Contents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_content(
    State(state): State<AppState>,
    RequireContentsWrite(auth_user): RequireContentsWrite,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ContentService::delete_content(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
