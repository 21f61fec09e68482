use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use scholaris_core::AppError;
use tracing::instrument;
use uuid::Uuid;

use crate::docs::ErrorResponse;
use crate::middleware::auth::{AuthUser, RequireStudentsRead, RequireStudentsWrite};
use crate::middleware::role::check_any_role;
use crate::modules::users::model::{PaginatedUsersResponse, UpdateUserDto, User, UserRole};
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::utils::auth_helpers::{resource_scope, school_for_scoped_operation};
use crate::validator::{ValidatedJson, ValidatedQuery};

use super::model::{CreateStudentDto, StudentFilterParams};
use super::service::StudentService;

const STUDENT: Option<UserRole> = Some(UserRole::Student);

#[utoipa::path(
    post,
    path = "/api/students",
    request_body = CreateStudentDto,
    responses(
        (status = 201, description = "Student created", body = User),
        (status = 400, description = "Class, section or parent not in this school", body = ErrorResponse),
        (status = 409, description = "Email already exists", body = ErrorResponse)
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn create_student(
    State(state): State<AppState>,
    RequireStudentsWrite(auth_user): RequireStudentsWrite,
    ValidatedJson(dto): ValidatedJson<CreateStudentDto>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, dto.school_id)?;
    let student = UserService::create_user(&state.db, school_id, dto.into()).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

#[utoipa::path(
    get,
    path = "/api/students",
    params(StudentFilterParams),
    responses((status = 200, description = "Paginated students", body = PaginatedUsersResponse)),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn get_students(
    State(state): State<AppState>,
    RequireStudentsRead(auth_user): RequireStudentsRead,
    ValidatedQuery(filters): ValidatedQuery<StudentFilterParams>,
) -> Result<Json<PaginatedUsersResponse>, AppError> {
    let school_id = school_for_scoped_operation(&auth_user, filters.school_id)?;
    let students =
        UserService::list_users(&state.db, Some(school_id), STUDENT, &filters.into()).await?;
    Ok(Json(students))
}

#[utoipa::path(
    get,
    path = "/api/students/children",
    responses(
        (status = 200, description = "Students linked to the calling parent", body = Vec<User>),
        (status = 403, description = "Parents only", body = ErrorResponse)
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn get_my_children(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<User>>, AppError> {
    check_any_role(&auth_user, &[UserRole::Parent])?;
    Ok(Json(StudentService::children_of(&state.db, auth_user.user_id()?).await?))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student details", body = User),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_student(
    State(state): State<AppState>,
    RequireStudentsRead(auth_user): RequireStudentsRead,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    Ok(Json(
        UserService::get_user(&state.db, id, resource_scope(&auth_user)?, STUDENT).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/students/{id}",
    params(("id" = Uuid, Path, description = "Student ID")),
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "Student updated", body = User),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_student(
    State(state): State<AppState>,
    RequireStudentsWrite(auth_user): RequireStudentsWrite,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateUserDto>,
) -> Result<Json<User>, AppError> {
    let student =
        UserService::update_user(&state.db, id, resource_scope(&auth_user)?, STUDENT, dto).await?;
    Ok(Json(student))
}

#[utoipa::path(
    delete,
    path = "/api/students/{id}",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 204, description = "Student deleted"),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_student(
    State(state): State<AppState>,
    RequireStudentsWrite(auth_user): RequireStudentsWrite,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    UserService::delete_user(&state.db, id, resource_scope(&auth_user)?, STUDENT).await?;
    Ok(StatusCode::NO_CONTENT)
}
