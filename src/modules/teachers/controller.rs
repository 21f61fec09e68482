use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use scholaris_core::AppError;
use tracing::instrument;
use uuid::Uuid;

use crate::docs::ErrorResponse;
use crate::middleware::auth::{
    RequireClassesWrite, RequireTeachersRead, RequireTeachersWrite,
};
use crate::modules::classes::model::{Subject, SubjectFilterParams};
use crate::modules::classes::service::SubjectService;
use crate::modules::users::model::{PaginatedUsersResponse, UpdateUserDto, User, UserRole};
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::utils::auth_helpers::{resource_scope, school_for_scoped_operation};
use crate::validator::{ValidatedJson, ValidatedQuery};

use super::model::{AssignSubjectsDto, CreateTeacherDto, TeacherFilterParams};

const TEACHER: Option<UserRole> = Some(UserRole::Teacher);

#[utoipa::path(
    post,
    path = "/api/teachers",
    request_body = CreateTeacherDto,
    responses(
        (status = 201, description = "Teacher created", body = User),
        (status = 409, description = "Email already exists", body = ErrorResponse)
    ),
    tag = "Teachers",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn create_teacher(
    State(state): State<AppState>,
    RequireTeachersWrite(auth_user): RequireTeachersWrite,
    ValidatedJson(dto): ValidatedJson<CreateTeacherDto>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, dto.school_id)?;
    let teacher = UserService::create_user(&state.db, school_id, dto.into()).await?;
    Ok((StatusCode::CREATED, Json(teacher)))
}

#[utoipa::path(
    get,
    path = "/api/teachers",
    params(TeacherFilterParams),
    responses((status = 200, description = "Paginated teachers", body = PaginatedUsersResponse)),
    tag = "Teachers",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn get_teachers(
    State(state): State<AppState>,
    RequireTeachersRead(auth_user): RequireTeachersRead,
    ValidatedQuery(filters): ValidatedQuery<TeacherFilterParams>,
) -> Result<Json<PaginatedUsersResponse>, AppError> {
    let school_id = school_for_scoped_operation(&auth_user, filters.school_id)?;
    let teachers =
        UserService::list_users(&state.db, Some(school_id), TEACHER, &filters.into()).await?;
    Ok(Json(teachers))
}

#[utoipa::path(
    get,
    path = "/api/teachers/{id}",
    params(("id" = Uuid, Path, description = "Teacher ID")),
    responses(
        (status = 200, description = "Teacher details", body = User),
        (status = 404, description = "Teacher not found", body = ErrorResponse)
    ),
    tag = "Teachers",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_teacher(
    State(state): State<AppState>,
    RequireTeachersRead(auth_user): RequireTeachersRead,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    Ok(Json(
        UserService::get_user(&state.db, id, resource_scope(&auth_user)?, TEACHER).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/teachers/{id}",
    params(("id" = Uuid, Path, description = "Teacher ID")),
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "Teacher updated", body = User),
        (status = 404, description = "Teacher not found", body = ErrorResponse)
    ),
    tag = "Teachers",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_teacher(
    State(state): State<AppState>,
    RequireTeachersWrite(auth_user): RequireTeachersWrite,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateUserDto>,
) -> Result<Json<User>, AppError> {
    let teacher =
        UserService::update_user(&state.db, id, resource_scope(&auth_user)?, TEACHER, dto).await?;
    Ok(Json(teacher))
}

#[utoipa::path(
    delete,
    path = "/api/teachers/{id}",
    params(("id" = Uuid, Path, description = "Teacher ID")),
    responses(
        (status = 204, description = "Teacher deleted"),
        (status = 404, description = "Teacher not found", body = ErrorResponse)
    ),
    tag = "Teachers",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_teacher(
    State(state): State<AppState>,
    RequireTeachersWrite(auth_user): RequireTeachersWrite,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    UserService::delete_user(&state.db, id, resource_scope(&auth_user)?, TEACHER).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/teachers/{id}/subjects",
    params(("id" = Uuid, Path, description = "Teacher ID")),
    responses(
        (status = 200, description = "Subjects taught by the teacher", body = Vec<Subject>),
        (status = 404, description = "Teacher not found", body = ErrorResponse)
    ),
    tag = "Teachers",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_teacher_subjects(
    State(state): State<AppState>,
    RequireTeachersRead(auth_user): RequireTeachersRead,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Subject>>, AppError> {
    let teacher = UserService::get_user(&state.db, id, resource_scope(&auth_user)?, TEACHER).await?;
    let school_id = teacher
        .school_id
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Teacher not found")))?;

    let filters = SubjectFilterParams {
        teacher_id: Some(teacher.id),
        ..Default::default()
    };
    Ok(Json(SubjectService::list_subjects(&state.db, school_id, &filters).await?))
}

#[utoipa::path(
    post,
    path = "/api/teachers/{id}/subjects",
    params(("id" = Uuid, Path, description = "Teacher ID")),
    request_body = AssignSubjectsDto,
    responses(
        (status = 200, description = "Subjects now assigned to the teacher", body = Vec<Subject>),
        (status = 400, description = "Teacher not found in this school", body = ErrorResponse)
    ),
    tag = "Teachers",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn assign_subjects(
    State(state): State<AppState>,
    RequireClassesWrite(auth_user): RequireClassesWrite,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<AssignSubjectsDto>,
) -> Result<Json<Vec<Subject>>, AppError> {
    let teacher = UserService::get_user(&state.db, id, resource_scope(&auth_user)?, TEACHER).await?;
    let school_id = teacher
        .school_id
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Teacher not found")))?;

    let subjects =
        SubjectService::assign_teacher(&state.db, teacher.id, school_id, &dto.subject_ids).await?;
    Ok(Json(subjects))
}
