use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use scholaris_core::AppError;
use tracing::instrument;
use uuid::Uuid;

use crate::docs::ErrorResponse;
use crate::middleware::auth::{RequireClassesRead, RequireClassesWrite};
use crate::state::AppState;
use crate::utils::auth_helpers::{resource_scope, school_for_scoped_operation};
use crate::validator::{ValidatedJson, ValidatedQuery};

use super::model::{
    Class, ClassFilterParams, CreateClassDto, CreateSubjectDto, PaginatedClassesResponse, Section,
    SectionDto, Subject, SubjectFilterParams, UpdateClassDto, UpdateSubjectDto,
};
use super::service::{ClassService, SubjectService};

#[utoipa::path(
    post,
    path = "/api/classes",
    request_body = CreateClassDto,
    responses(
        (status = 201, description = "Class created", body = Class),
        (status = 409, description = "Class name already used in this school", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn create_class(
    State(state): State<AppState>,
    RequireClassesWrite(auth_user): RequireClassesWrite,
    ValidatedJson(dto): ValidatedJson<CreateClassDto>,
) -> Result<(StatusCode, Json<Class>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, dto.school_id)?;
    let class = ClassService::create_class(&state.db, school_id, dto).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

#[utoipa::path(
    get,
    path = "/api/classes",
    params(ClassFilterParams),
    responses((status = 200, description = "Classes with section and student counts", body = PaginatedClassesResponse)),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn get_classes(
    State(state): State<AppState>,
    RequireClassesRead(auth_user): RequireClassesRead,
    ValidatedQuery(filters): ValidatedQuery<ClassFilterParams>,
) -> Result<Json<PaginatedClassesResponse>, AppError> {
    let school_id = school_for_scoped_operation(&auth_user, filters.school_id)?;
    Ok(Json(ClassService::list_classes(&state.db, school_id, &filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/classes/{id}",
    params(("id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Class details", body = Class),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_class(
    State(state): State<AppState>,
    RequireClassesRead(auth_user): RequireClassesRead,
    Path(id): Path<Uuid>,
) -> Result<Json<Class>, AppError> {
    Ok(Json(ClassService::get_class(&state.db, id, resource_scope(&auth_user)?).await?))
}

#[utoipa::path(
    put,
    path = "/api/classes/{id}",
    params(("id" = Uuid, Path, description = "Class ID")),
    request_body = UpdateClassDto,
    responses(
        (status = 200, description = "Class updated", body = Class),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_class(
    State(state): State<AppState>,
    RequireClassesWrite(auth_user): RequireClassesWrite,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateClassDto>,
) -> Result<Json<Class>, AppError> {
    let class = ClassService::update_class(&state.db, id, resource_scope(&auth_user)?, dto).await?;
    Ok(Json(class))
}

#[utoipa::path(
    delete,
    path = "/api/classes/{id}",
    params(("id" = Uuid, Path, description = "Class ID")),
    responses(
        (status = 204, description = "Class deleted"),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_class(
    State(state): State<AppState>,
    RequireClassesWrite(auth_user): RequireClassesWrite,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ClassService::delete_class(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/classes/{id}/sections",
    params(("id" = Uuid, Path, description = "Class ID")),
    request_body = SectionDto,
    responses(
        (status = 201, description = "Section created", body = Section),
        (status = 409, description = "Section name already used in this class", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_section(
    State(state): State<AppState>,
    RequireClassesWrite(auth_user): RequireClassesWrite,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<SectionDto>,
) -> Result<(StatusCode, Json<Section>), AppError> {
    let section = ClassService::create_section(&state.db, id, resource_scope(&auth_user)?, dto).await?;
    Ok((StatusCode::CREATED, Json(section)))
}

#[utoipa::path(
    get,
    path = "/api/classes/{id}/sections",
    params(("id" = Uuid, Path, description = "Class ID")),
    responses((status = 200, description = "Sections of the class", body = Vec<Section>)),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_sections(
    State(state): State<AppState>,
    RequireClassesRead(auth_user): RequireClassesRead,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Section>>, AppError> {
    Ok(Json(ClassService::list_sections(&state.db, id, resource_scope(&auth_user)?).await?))
}

#[utoipa::path(
    put,
    path = "/api/sections/{id}",
    params(("id" = Uuid, Path, description = "Section ID")),
    request_body = SectionDto,
    responses(
        (status = 200, description = "Section renamed", body = Section),
        (status = 404, description = "Section not found", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_section(
    State(state): State<AppState>,
    RequireClassesWrite(auth_user): RequireClassesWrite,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<SectionDto>,
) -> Result<Json<Section>, AppError> {
    Ok(Json(ClassService::update_section(&state.db, id, resource_scope(&auth_user)?, dto).await?))
}

#[utoipa::path(
    delete,
    path = "/api/sections/{id}",
    params(("id" = Uuid, Path, description = "Section ID")),
    responses(
        (status = 204, description = "Section deleted"),
        (status = 404, description = "Section not found", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_section(
    State(state): State<AppState>,
    RequireClassesWrite(auth_user): RequireClassesWrite,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ClassService::delete_section(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/subjects",
    request_body = CreateSubjectDto,
    responses(
        (status = 201, description = "Subject created", body = Subject),
        (status = 400, description = "Class or teacher not in this school", body = ErrorResponse)
    ),
    tag = "Subjects",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn create_subject(
    State(state): State<AppState>,
    RequireClassesWrite(auth_user): RequireClassesWrite,
    ValidatedJson(dto): ValidatedJson<CreateSubjectDto>,
) -> Result<(StatusCode, Json<Subject>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, dto.school_id)?;
    let subject = SubjectService::create_subject(&state.db, school_id, dto).await?;
    Ok((StatusCode::CREATED, Json(subject)))
}

#[utoipa::path(
    get,
    path = "/api/subjects",
    params(SubjectFilterParams),
    responses((status = 200, description = "Subjects", body = Vec<Subject>)),
    tag = "Subjects",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn get_subjects(
    State(state): State<AppState>,
    RequireClassesRead(auth_user): RequireClassesRead,
    ValidatedQuery(filters): ValidatedQuery<SubjectFilterParams>,
) -> Result<Json<Vec<Subject>>, AppError> {
    let school_id = school_for_scoped_operation(&auth_user, filters.school_id)?;
    Ok(Json(SubjectService::list_subjects(&state.db, school_id, &filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/subjects/{id}",
    params(("id" = Uuid, Path, description = "Subject ID")),
    responses(
        (status = 200, description = "Subject details", body = Subject),
        (status = 404, description = "Subject not found", body = ErrorResponse)
    ),
    tag = "Subjects",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_subject(
    State(state): State<AppState>,
    RequireClassesRead(auth_user): RequireClassesRead,
    Path(id): Path<Uuid>,
) -> Result<Json<Subject>, AppError> {
    Ok(Json(SubjectService::get_subject(&state.db, id, resource_scope(&auth_user)?).await?))
}

#[utoipa::path(
    put,
    path = "/api/subjects/{id}",
    params(("id" = Uuid, Path, description = "Subject ID")),
    request_body = UpdateSubjectDto,
    responses(
        (status = 200, description = "Subject updated", body = Subject),
        (status = 404, description = "Subject not found", body = ErrorResponse)
    ),
    tag = "Subjects",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_subject(
    State(state): State<AppState>,
    RequireClassesWrite(auth_user): RequireClassesWrite,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateSubjectDto>,
) -> Result<Json<Subject>, AppError> {
    Ok(Json(SubjectService::update_subject(&state.db, id, resource_scope(&auth_user)?, dto).await?))
}

#[utoipa::path(
    delete,
    path = "/api/subjects/{id}",
    params(("id" = Uuid, Path, description = "Subject ID")),
    responses(
        (status = 204, description = "Subject deleted"),
        (status = 404, description = "Subject not found", body = ErrorResponse)
    ),
    tag = "Subjects",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_subject(
    State(state): State<AppState>,
    RequireClassesWrite(auth_user): RequireClassesWrite,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    SubjectService::delete_subject(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
