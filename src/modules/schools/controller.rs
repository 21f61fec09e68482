use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use scholaris_core::AppError;
use tracing::instrument;
use uuid::Uuid;

use crate::docs::ErrorResponse;
use crate::middleware::auth::RequireSchoolsManage;
use crate::state::AppState;
use crate::validator::{ValidatedJson, ValidatedQuery};

use super::model::{
    CreateSchoolDto, PaginatedSchoolsResponse, School, SchoolFilterParams, UpdateSchoolDto,
};
use super::service::SchoolService;

#[utoipa::path(
    post,
    path = "/api/schools",
    request_body = CreateSchoolDto,
    responses(
        (status = 201, description = "School created", body = School),
        (status = 403, description = "System admin only", body = ErrorResponse),
        (status = 409, description = "School name already exists", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn create_school(
    State(state): State<AppState>,
    _auth: RequireSchoolsManage,
    ValidatedJson(dto): ValidatedJson<CreateSchoolDto>,
) -> Result<(StatusCode, Json<School>), AppError> {
    let school = SchoolService::create_school(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(school)))
}

#[utoipa::path(
    get,
    path = "/api/schools",
    params(SchoolFilterParams),
    responses(
        (status = 200, description = "Paginated schools", body = PaginatedSchoolsResponse),
        (status = 403, description = "System admin only", body = ErrorResponse)
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn get_all_schools(
    State(state): State<AppState>,
    _auth: RequireSchoolsManage,
    ValidatedQuery(filters): ValidatedQuery<SchoolFilterParams>,
) -> Result<Json<PaginatedSchoolsResponse>, AppError> {
    Ok(Json(SchoolService::get_all_schools(&state.db, filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/schools/{id}",
    params(("id" = Uuid, Path, description = "School ID")),
    responses(
        (status = 200, description = "School details", body = School),
        (status = 404, description = "School not found", body = ErrorResponse)
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn get_school(
    State(state): State<AppState>,
    _auth: RequireSchoolsManage,
    Path(id): Path<Uuid>,
) -> Result<Json<School>, AppError> {
    Ok(Json(SchoolService::get_school_by_id(&state.db, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/schools/{id}",
    params(("id" = Uuid, Path, description = "School ID")),
    request_body = UpdateSchoolDto,
    responses(
        (status = 200, description = "School updated", body = School),
        (status = 404, description = "School not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth, dto))]
pub async fn update_school(
    State(state): State<AppState>,
    _auth: RequireSchoolsManage,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateSchoolDto>,
) -> Result<Json<School>, AppError> {
    Ok(Json(SchoolService::update_school(&state.db, id, dto).await?))
}

#[utoipa::path(
    delete,
    path = "/api/schools/{id}",
    params(("id" = Uuid, Path, description = "School ID")),
    responses(
        (status = 204, description = "School deleted"),
        (status = 404, description = "School not found", body = ErrorResponse)
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth))]
pub async fn delete_school(
    State(state): State<AppState>,
    _auth: RequireSchoolsManage,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    SchoolService::delete_school(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
