use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use scholaris_core::{AppError, permissions};
use tracing::instrument;
use uuid::Uuid;

use crate::docs::ErrorResponse;
use crate::middleware::auth::{AuthUser, RequireNoticesRead, RequireNoticesWrite};
use crate::state::AppState;
use crate::utils::auth_helpers::{resource_scope, school_for_scoped_operation};
use crate::validator::{ValidatedJson, ValidatedQuery};

use super::model::{
    CreateNewsletterDto, CreateNoticeDto, Newsletter, NewsletterFilterParams, Notice,
    NoticeFilterParams, PaginatedNewslettersResponse, PaginatedNoticesResponse,
    UpdateNewsletterDto, UpdateNoticeDto,
};
use super::service::{NewsletterService, NoticeService, NoticeViewer};

fn viewer_of(auth_user: &AuthUser) -> Result<NoticeViewer, AppError> {
    Ok(NoticeViewer {
        user_id: auth_user.user_id()?,
        role: auth_user.role()?,
        sees_all: auth_user.has_permission(permissions::NOTICES_WRITE),
    })
}

#[utoipa::path(
    post,
    path = "/api/notices",
    request_body = CreateNoticeDto,
    responses(
        (status = 201, description = "Notice published", body = Notice),
        (status = 400, description = "Audience class not in this school", body = ErrorResponse)
    ),
    tag = "Notices",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn create_notice(
    State(state): State<AppState>,
    RequireNoticesWrite(auth_user): RequireNoticesWrite,
    ValidatedJson(dto): ValidatedJson<CreateNoticeDto>,
) -> Result<(StatusCode, Json<Notice>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, dto.school_id)?;
    let notice =
        NoticeService::create_notice(&state.db, school_id, auth_user.user_id()?, dto).await?;
    Ok((StatusCode::CREATED, Json(notice)))
}

#[utoipa::path(
    get,
    path = "/api/notices",
    params(NoticeFilterParams),
    responses((status = 200, description = "Notices addressed to the caller", body = PaginatedNoticesResponse)),
    tag = "Notices",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn get_notices(
    State(state): State<AppState>,
    RequireNoticesRead(auth_user): RequireNoticesRead,
    ValidatedQuery(filters): ValidatedQuery<NoticeFilterParams>,
) -> Result<Json<PaginatedNoticesResponse>, AppError> {
    let school_id = school_for_scoped_operation(&auth_user, filters.school_id)?;
    Ok(Json(
        NoticeService::list_notices(&state.db, school_id, viewer_of(&auth_user)?, &filters)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/notices/{id}",
    params(("id" = Uuid, Path, description = "Notice ID")),
    responses(
        (status = 200, description = "Notice", body = Notice),
        (status = 404, description = "Notice not found", body = ErrorResponse)
    ),
    tag = "Notices",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_notice(
    State(state): State<AppState>,
    RequireNoticesRead(auth_user): RequireNoticesRead,
    Path(id): Path<Uuid>,
) -> Result<Json<Notice>, AppError> {
    let scope = resource_scope(&auth_user)?;
    Ok(Json(
        NoticeService::get_notice(&state.db, id, scope, viewer_of(&auth_user)?).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/notices/{id}",
    params(("id" = Uuid, Path, description = "Notice ID")),
    request_body = UpdateNoticeDto,
    responses(
        (status = 200, description = "Notice updated", body = Notice),
        (status = 404, description = "Notice not found", body = ErrorResponse)
    ),
    tag = "Notices",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_notice(
    State(state): State<AppState>,
    RequireNoticesWrite(auth_user): RequireNoticesWrite,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateNoticeDto>,
) -> Result<Json<Notice>, AppError> {
    Ok(Json(
        NoticeService::update_notice(&state.db, id, resource_scope(&auth_user)?, dto).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/notices/{id}",
    params(("id" = Uuid, Path, description = "Notice ID")),
    responses(
        (status = 204, description = "Notice deleted"),
        (status = 404, description = "Notice not found", body = ErrorResponse)
    ),
    tag = "Notices",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_notice(
    State(state): State<AppState>,
    RequireNoticesWrite(auth_user): RequireNoticesWrite,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    NoticeService::delete_notice(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/newsletters",
    request_body = CreateNewsletterDto,
    responses((status = 201, description = "Newsletter published", body = Newsletter)),
    tag = "Notices",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn create_newsletter(
    State(state): State<AppState>,
    RequireNoticesWrite(auth_user): RequireNoticesWrite,
    ValidatedJson(dto): ValidatedJson<CreateNewsletterDto>,
) -> Result<(StatusCode, Json<Newsletter>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, dto.school_id)?;
    let newsletter =
        NewsletterService::create_newsletter(&state.db, school_id, auth_user.user_id()?, dto)
            .await?;
    Ok((StatusCode::CREATED, Json(newsletter)))
}

#[utoipa::path(
    get,
    path = "/api/newsletters",
    params(NewsletterFilterParams),
    responses((status = 200, description = "Newsletters, newest first", body = PaginatedNewslettersResponse)),
    tag = "Notices",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn get_newsletters(
    State(state): State<AppState>,
    RequireNoticesRead(auth_user): RequireNoticesRead,
    ValidatedQuery(filters): ValidatedQuery<NewsletterFilterParams>,
) -> Result<Json<PaginatedNewslettersResponse>, AppError> {
    let school_id = school_for_scoped_operation(&auth_user, filters.school_id)?;
    Ok(Json(
        NewsletterService::list_newsletters(&state.db, school_id, &filters).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/newsletters/{id}",
    params(("id" = Uuid, Path, description = "Newsletter ID")),
    responses(
        (status = 200, description = "Newsletter", body = Newsletter),
        (status = 404, description = "Newsletter not found", body = ErrorResponse)
    ),
    tag = "Notices",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_newsletter(
    State(state): State<AppState>,
    RequireNoticesRead(auth_user): RequireNoticesRead,
    Path(id): Path<Uuid>,
) -> Result<Json<Newsletter>, AppError> {
    Ok(Json(
        NewsletterService::get_newsletter(&state.db, id, resource_scope(&auth_user)?).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/newsletters/{id}",
    params(("id" = Uuid, Path, description = "Newsletter ID")),
    request_body = UpdateNewsletterDto,
    responses(
        (status = 200, description = "Newsletter updated", body = Newsletter),
        (status = 404, description = "Newsletter not found", body = ErrorResponse)
    ),
    tag = "Notices",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_newsletter(
    State(state): State<AppState>,
    RequireNoticesWrite(auth_user): RequireNoticesWrite,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateNewsletterDto>,
) -> Result<Json<Newsletter>, AppError> {
    Ok(Json(
        NewsletterService::update_newsletter(&state.db, id, resource_scope(&auth_user)?, dto)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/newsletters/{id}",
    params(("id" = Uuid, Path, description = "Newsletter ID")),
    responses(
        (status = 204, description = "Newsletter deleted"),
        (status = 404, description = "Newsletter not found", body = ErrorResponse)
    ),
    tag = "Notices",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_newsletter(
    State(state): State<AppState>,
    RequireNoticesWrite(auth_user): RequireNoticesWrite,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    NewsletterService::delete_newsletter(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
