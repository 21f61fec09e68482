use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use scholaris_core::AppError;
use tracing::instrument;
use uuid::Uuid;

use crate::docs::ErrorResponse;
use crate::middleware::auth::{RequireExamsRead, RequireExamsWrite, RequireResultsWrite};
use crate::modules::students::service::StudentService;
use crate::state::AppState;
use crate::utils::auth_helpers::{resource_scope, school_for_scoped_operation};
use crate::validator::{ValidatedJson, ValidatedQuery};

use super::model::{
    CreateExamDto, CreatePaperDto, Exam, ExamFilterParams, ExamPaper, ExamResult,
    RecordResultsDto, ReportCard, UpdateExamDto,
};
use super::service::ExamService;

#[utoipa::path(
    post,
    path = "/api/exams",
    request_body = CreateExamDto,
    responses(
        (status = 201, description = "Exam created", body = Exam),
        (status = 400, description = "Class not found in this school", body = ErrorResponse)
    ),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn create_exam(
    State(state): State<AppState>,
    RequireExamsWrite(auth_user): RequireExamsWrite,
    ValidatedJson(dto): ValidatedJson<CreateExamDto>,
) -> Result<(StatusCode, Json<Exam>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, dto.school_id)?;
    let exam = ExamService::create_exam(&state.db, school_id, dto).await?;
    Ok((StatusCode::CREATED, Json(exam)))
}

#[utoipa::path(
    get,
    path = "/api/exams",
    params(ExamFilterParams),
    responses((status = 200, description = "Exams", body = Vec<Exam>)),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn get_exams(
    State(state): State<AppState>,
    RequireExamsRead(auth_user): RequireExamsRead,
    ValidatedQuery(filters): ValidatedQuery<ExamFilterParams>,
) -> Result<Json<Vec<Exam>>, AppError> {
    let school_id = school_for_scoped_operation(&auth_user, filters.school_id)?;
    Ok(Json(ExamService::list_exams(&state.db, school_id, filters.class_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/exams/{id}",
    params(("id" = Uuid, Path, description = "Exam ID")),
    responses(
        (status = 200, description = "Exam details", body = Exam),
        (status = 404, description = "Exam not found", body = ErrorResponse)
    ),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_exam(
    State(state): State<AppState>,
    RequireExamsRead(auth_user): RequireExamsRead,
    Path(id): Path<Uuid>,
) -> Result<Json<Exam>, AppError> {
    Ok(Json(ExamService::get_exam(&state.db, id, resource_scope(&auth_user)?).await?))
}

#[utoipa::path(
    put,
    path = "/api/exams/{id}",
    params(("id" = Uuid, Path, description = "Exam ID")),
    request_body = UpdateExamDto,
    responses(
        (status = 200, description = "Exam updated", body = Exam),
        (status = 404, description = "Exam not found", body = ErrorResponse)
    ),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_exam(
    State(state): State<AppState>,
    RequireExamsWrite(auth_user): RequireExamsWrite,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateExamDto>,
) -> Result<Json<Exam>, AppError> {
    Ok(Json(
        ExamService::update_exam(&state.db, id, resource_scope(&auth_user)?, dto).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/exams/{id}",
    params(("id" = Uuid, Path, description = "Exam ID")),
    responses(
        (status = 204, description = "Exam deleted"),
        (status = 404, description = "Exam not found", body = ErrorResponse)
    ),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_exam(
    State(state): State<AppState>,
    RequireExamsWrite(auth_user): RequireExamsWrite,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ExamService::delete_exam(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/exams/{id}/papers",
    params(("id" = Uuid, Path, description = "Exam ID")),
    request_body = CreatePaperDto,
    responses(
        (status = 201, description = "Paper added", body = ExamPaper),
        (status = 409, description = "Subject already has a paper in this exam", body = ErrorResponse)
    ),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn add_paper(
    State(state): State<AppState>,
    RequireExamsWrite(auth_user): RequireExamsWrite,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<CreatePaperDto>,
) -> Result<(StatusCode, Json<ExamPaper>), AppError> {
    let paper = ExamService::add_paper(&state.db, id, resource_scope(&auth_user)?, dto).await?;
    Ok((StatusCode::CREATED, Json(paper)))
}

#[utoipa::path(
    get,
    path = "/api/exams/{id}/papers",
    params(("id" = Uuid, Path, description = "Exam ID")),
    responses((status = 200, description = "Papers of the exam", body = Vec<ExamPaper>)),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_papers(
    State(state): State<AppState>,
    RequireExamsRead(auth_user): RequireExamsRead,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ExamPaper>>, AppError> {
    Ok(Json(ExamService::list_papers(&state.db, id, resource_scope(&auth_user)?).await?))
}

#[utoipa::path(
    delete,
    path = "/api/exams/papers/{paper_id}",
    params(("paper_id" = Uuid, Path, description = "Paper ID")),
    responses(
        (status = 204, description = "Paper deleted"),
        (status = 404, description = "Paper not found", body = ErrorResponse)
    ),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_paper(
    State(state): State<AppState>,
    RequireExamsWrite(auth_user): RequireExamsWrite,
    Path(paper_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    ExamService::delete_paper(&state.db, paper_id, resource_scope(&auth_user)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/exams/papers/{paper_id}/results",
    params(("paper_id" = Uuid, Path, description = "Paper ID")),
    request_body = RecordResultsDto,
    responses(
        (status = 200, description = "Results stored", body = Vec<ExamResult>),
        (status = 400, description = "Marks above maximum or student not in class", body = ErrorResponse),
        (status = 422, description = "Negative marks", body = ErrorResponse)
    ),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn record_results(
    State(state): State<AppState>,
    RequireResultsWrite(auth_user): RequireResultsWrite,
    Path(paper_id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<RecordResultsDto>,
) -> Result<Json<Vec<ExamResult>>, AppError> {
    let results =
        ExamService::record_results(&state.db, paper_id, resource_scope(&auth_user)?, dto).await?;
    Ok(Json(results))
}

#[utoipa::path(
    get,
    path = "/api/exams/papers/{paper_id}/results",
    params(("paper_id" = Uuid, Path, description = "Paper ID")),
    responses((status = 200, description = "Results for the paper", body = Vec<ExamResult>)),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_results(
    State(state): State<AppState>,
    RequireResultsWrite(auth_user): RequireResultsWrite,
    Path(paper_id): Path<Uuid>,
) -> Result<Json<Vec<ExamResult>>, AppError> {
    Ok(Json(
        ExamService::list_results(&state.db, paper_id, resource_scope(&auth_user)?).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/exams/{id}/students/{student_id}/report",
    params(
        ("id" = Uuid, Path, description = "Exam ID"),
        ("student_id" = Uuid, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Report card with per-subject grades", body = ReportCard),
        (status = 403, description = "Not your child or yourself", body = ErrorResponse),
        (status = 404, description = "Exam or student not found", body = ErrorResponse)
    ),
    tag = "Exams",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_report_card(
    State(state): State<AppState>,
    RequireExamsRead(auth_user): RequireExamsRead,
    Path((id, student_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ReportCard>, AppError> {
    let scope = resource_scope(&auth_user)?;
    StudentService::can_view(
        &state.db,
        auth_user.user_id()?,
        auth_user.role()?,
        scope,
        student_id,
    )
    .await?;
    Ok(Json(ExamService::report_card(&state.db, id, student_id, scope).await?))
}
