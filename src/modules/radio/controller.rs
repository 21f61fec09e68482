use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use scholaris_core::AppError;
use tracing::instrument;

use crate::docs::ErrorResponse;
use crate::middleware::auth::{RequireRadioRead, RequireRadioWrite};
use crate::state::AppState;
use crate::utils::auth_helpers::school_for_scoped_operation;
use crate::validator::{ValidatedJson, ValidatedQuery};

use super::model::{
    CreateProgramDto, LiveProgram, LiveQuery, ProgramQuery, RadioProgram, UpdateProgramDto,
};
use super::schedule::Pacing;
use super::service::RadioService;

fn pacing(state: &AppState) -> Pacing {
    Pacing {
        words_per_chunk: state.radio_config.words_per_chunk,
        words_per_second: state.radio_config.words_per_second,
    }
}

#[utoipa::path(
    get,
    path = "/api/radio/programs",
    params(ProgramQuery),
    responses((status = 200, description = "School schedule ordered by start time", body = Vec<RadioProgram>)),
    tag = "Radio",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn get_programs(
    State(state): State<AppState>,
    RequireRadioRead(auth_user): RequireRadioRead,
    ValidatedQuery(query): ValidatedQuery<ProgramQuery>,
) -> Result<Json<Vec<RadioProgram>>, AppError> {
    let school_id = school_for_scoped_operation(&auth_user, query.school_id)?;
    Ok(Json(
        RadioService::list_programs(state.radio_store.as_ref(), school_id).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/radio/programs",
    request_body = CreateProgramDto,
    responses(
        (status = 201, description = "Program scheduled", body = RadioProgram),
        (status = 422, description = "No text or audio given", body = ErrorResponse)
    ),
    tag = "Radio",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn create_program(
    State(state): State<AppState>,
    RequireRadioWrite(auth_user): RequireRadioWrite,
    ValidatedJson(dto): ValidatedJson<CreateProgramDto>,
) -> Result<(StatusCode, Json<RadioProgram>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, dto.school_id)?;
    let program = RadioService::create_program(state.radio_store.as_ref(), school_id, dto).await?;
    Ok((StatusCode::CREATED, Json(program)))
}

#[utoipa::path(
    put,
    path = "/api/radio/programs/{id}",
    params(("id" = String, Path, description = "Program ID"), ProgramQuery),
    request_body = UpdateProgramDto,
    responses(
        (status = 200, description = "Program updated", body = RadioProgram),
        (status = 404, description = "Program not found", body = ErrorResponse)
    ),
    tag = "Radio",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, query, dto))]
pub async fn update_program(
    State(state): State<AppState>,
    RequireRadioWrite(auth_user): RequireRadioWrite,
    Path(id): Path<String>,
    ValidatedQuery(query): ValidatedQuery<ProgramQuery>,
    ValidatedJson(dto): ValidatedJson<UpdateProgramDto>,
) -> Result<Json<RadioProgram>, AppError> {
    let school_id = school_for_scoped_operation(&auth_user, query.school_id)?;
    Ok(Json(
        RadioService::update_program(state.radio_store.as_ref(), school_id, &id, dto).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/radio/programs/{id}",
    params(("id" = String, Path, description = "Program ID"), ProgramQuery),
    responses(
        (status = 204, description = "Program removed"),
        (status = 404, description = "Program not found", body = ErrorResponse)
    ),
    tag = "Radio",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, query))]
pub async fn delete_program(
    State(state): State<AppState>,
    RequireRadioWrite(auth_user): RequireRadioWrite,
    Path(id): Path<String>,
    ValidatedQuery(query): ValidatedQuery<ProgramQuery>,
) -> Result<StatusCode, AppError> {
    let school_id = school_for_scoped_operation(&auth_user, query.school_id)?;
    RadioService::delete_program(state.radio_store.as_ref(), school_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/radio/live",
    params(LiveQuery),
    responses((status = 200, description = "Programs on air with offsets and playback plans", body = Vec<LiveProgram>)),
    tag = "Radio",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn get_live(
    State(state): State<AppState>,
    RequireRadioRead(auth_user): RequireRadioRead,
    ValidatedQuery(query): ValidatedQuery<LiveQuery>,
) -> Result<Json<Vec<LiveProgram>>, AppError> {
    let school_id = school_for_scoped_operation(&auth_user, query.school_id)?;
    let now = query.at.unwrap_or_else(Utc::now);
    Ok(Json(
        RadioService::live(state.radio_store.as_ref(), school_id, now, pacing(&state)).await?,
    ))
}
