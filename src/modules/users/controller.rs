use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use scholaris_core::AppError;
use tracing::instrument;
use uuid::Uuid;

use crate::docs::ErrorResponse;
use crate::middleware::auth::{RequireUsersRead, RequireUsersWrite};
use crate::middleware::role::check_can_manage;
use crate::modules::users::model::{
    CreateUserDto, PaginatedUsersResponse, UpdateUserDto, User, UserFilterParams,
};
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::utils::auth_helpers::{resource_scope, school_for_scoped_operation};
use crate::validator::{ValidatedJson, ValidatedQuery};

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserDto,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Role cannot create this kind of account", body = ErrorResponse),
        (status = 409, description = "Email already exists", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_user(
    State(state): State<AppState>,
    RequireUsersWrite(auth_user): RequireUsersWrite,
    ValidatedJson(dto): ValidatedJson<CreateUserDto>,
) -> Result<(StatusCode, Json<User>), AppError> {
    check_can_manage(auth_user.role()?, dto.role)?;
    let school_id = school_for_scoped_operation(&auth_user, dto.school_id)?;

    let user = UserService::create_user(&state.db, school_id, dto).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(UserFilterParams),
    responses(
        (status = 200, description = "Paginated users", body = PaginatedUsersResponse),
        (status = 400, description = "System admin did not pass school_id", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, filters))]
pub async fn get_users(
    State(state): State<AppState>,
    RequireUsersRead(auth_user): RequireUsersRead,
    ValidatedQuery(filters): ValidatedQuery<UserFilterParams>,
) -> Result<Json<PaginatedUsersResponse>, AppError> {
    let school_id = school_for_scoped_operation(&auth_user, filters.school_id)?;
    let users = UserService::list_users(&state.db, Some(school_id), None, &filters).await?;
    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_user(
    State(state): State<AppState>,
    RequireUsersRead(auth_user): RequireUsersRead,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let user = UserService::get_user(&state.db, id, resource_scope(&auth_user)?, None).await?;
    Ok(Json(user))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 403, description = "Role cannot manage this account", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_user(
    State(state): State<AppState>,
    RequireUsersWrite(auth_user): RequireUsersWrite,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateUserDto>,
) -> Result<Json<User>, AppError> {
    let scope = resource_scope(&auth_user)?;
    let target = UserService::get_user(&state.db, id, scope, None).await?;
    check_can_manage(auth_user.role()?, target.role)?;

    let user = UserService::update_user(&state.db, id, scope, None, dto).await?;
    Ok(Json(user))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Role cannot manage this account", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_user(
    State(state): State<AppState>,
    RequireUsersWrite(auth_user): RequireUsersWrite,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let scope = resource_scope(&auth_user)?;
    let target = UserService::get_user(&state.db, id, scope, None).await?;
    check_can_manage(auth_user.role()?, target.role)?;
    if target.id == auth_user.user_id()? {
        return Err(AppError::bad_request(anyhow::anyhow!("You cannot delete your own account")));
    }

    UserService::delete_user(&state.db, id, scope, None).await?;
    Ok(StatusCode::NO_CONTENT)
}
