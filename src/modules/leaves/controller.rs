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
    AuthUser, RequireGatePassesVerify, RequireLeavesParentDecide, RequireLeavesRead,
    RequireLeavesRequest, RequireLeavesSchoolDecide,
};
use crate::state::AppState;
use crate::utils::auth_helpers::{resource_scope, school_for_scoped_operation};
use crate::validator::{ValidatedJson, ValidatedQuery};

use super::model::{
    CreateLeaveDto, GatePass, GatePassVerification, LeaveDecisionDto, LeaveDecisionResponse,
    LeaveFilterParams, LeaveRequest, PaginatedLeavesResponse, VerifyGatePassDto,
};
use super::service::{LeaveActor, LeaveService};
use super::workflow::Stage;

fn actor(auth_user: &AuthUser) -> Result<LeaveActor, AppError> {
    Ok(LeaveActor {
        user_id: auth_user.user_id()?,
        role: auth_user.role()?,
        scope: resource_scope(auth_user)?,
    })
}

#[utoipa::path(
    post,
    path = "/api/leaves",
    request_body = CreateLeaveDto,
    responses(
        (status = 201, description = "Leave requested, awaiting parent", body = LeaveRequest),
        (status = 403, description = "Not the student or their parent", body = ErrorResponse)
    ),
    tag = "Leaves",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn create_leave(
    State(state): State<AppState>,
    RequireLeavesRequest(auth_user): RequireLeavesRequest,
    ValidatedJson(dto): ValidatedJson<CreateLeaveDto>,
) -> Result<(StatusCode, Json<LeaveRequest>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, None)?;
    let leave = LeaveService::create_leave(&state.db, school_id, actor(&auth_user)?, dto).await?;
    Ok((StatusCode::CREATED, Json(leave)))
}

#[utoipa::path(
    get,
    path = "/api/leaves",
    params(LeaveFilterParams),
    responses((status = 200, description = "Leave requests visible to the caller", body = PaginatedLeavesResponse)),
    tag = "Leaves",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn get_leaves(
    State(state): State<AppState>,
    RequireLeavesRead(auth_user): RequireLeavesRead,
    ValidatedQuery(filters): ValidatedQuery<LeaveFilterParams>,
) -> Result<Json<PaginatedLeavesResponse>, AppError> {
    let school_id = school_for_scoped_operation(&auth_user, filters.school_id)?;
    Ok(Json(
        LeaveService::list_leaves(&state.db, school_id, actor(&auth_user)?, &filters).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/leaves/{id}",
    params(("id" = Uuid, Path, description = "Leave request ID")),
    responses(
        (status = 200, description = "Leave request", body = LeaveRequest),
        (status = 404, description = "Leave request not found", body = ErrorResponse)
    ),
    tag = "Leaves",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_leave(
    State(state): State<AppState>,
    RequireLeavesRead(auth_user): RequireLeavesRead,
    Path(id): Path<Uuid>,
) -> Result<Json<LeaveRequest>, AppError> {
    Ok(Json(LeaveService::get_leave(&state.db, id, actor(&auth_user)?).await?))
}

#[utoipa::path(
    post,
    path = "/api/leaves/{id}/parent-decision",
    params(("id" = Uuid, Path, description = "Leave request ID")),
    request_body = LeaveDecisionDto,
    responses(
        (status = 200, description = "Decision recorded", body = LeaveDecisionResponse),
        (status = 403, description = "Caller is not the student's parent", body = ErrorResponse),
        (status = 409, description = "Request is not awaiting the parent", body = ErrorResponse)
    ),
    tag = "Leaves",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn parent_decision(
    State(state): State<AppState>,
    RequireLeavesParentDecide(auth_user): RequireLeavesParentDecide,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<LeaveDecisionDto>,
) -> Result<Json<LeaveDecisionResponse>, AppError> {
    Ok(Json(
        LeaveService::decide(&state.db, id, actor(&auth_user)?, Stage::Parent, dto).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/leaves/{id}/school-decision",
    params(("id" = Uuid, Path, description = "Leave request ID")),
    request_body = LeaveDecisionDto,
    responses(
        (status = 200, description = "Decision recorded; approval includes the gate pass", body = LeaveDecisionResponse),
        (status = 409, description = "Request is not awaiting the school", body = ErrorResponse)
    ),
    tag = "Leaves",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn school_decision(
    State(state): State<AppState>,
    RequireLeavesSchoolDecide(auth_user): RequireLeavesSchoolDecide,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<LeaveDecisionDto>,
) -> Result<Json<LeaveDecisionResponse>, AppError> {
    Ok(Json(
        LeaveService::decide(&state.db, id, actor(&auth_user)?, Stage::School, dto).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/leaves/{id}/gate-pass",
    params(("id" = Uuid, Path, description = "Leave request ID")),
    responses(
        (status = 200, description = "Gate pass for an approved leave", body = GatePass),
        (status = 404, description = "No gate pass issued", body = ErrorResponse)
    ),
    tag = "Leaves",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_gate_pass(
    State(state): State<AppState>,
    RequireLeavesRead(auth_user): RequireLeavesRead,
    Path(id): Path<Uuid>,
) -> Result<Json<GatePass>, AppError> {
    Ok(Json(
        LeaveService::get_gate_pass(&state.db, id, actor(&auth_user)?).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/gate-passes/verify",
    request_body = VerifyGatePassDto,
    responses(
        (status = 200, description = "Pass accepted and marked used", body = GatePassVerification),
        (status = 404, description = "Unknown code", body = ErrorResponse),
        (status = 409, description = "Pass already used", body = ErrorResponse)
    ),
    tag = "Leaves",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn verify_gate_pass(
    State(state): State<AppState>,
    RequireGatePassesVerify(auth_user): RequireGatePassesVerify,
    ValidatedJson(dto): ValidatedJson<VerifyGatePassDto>,
) -> Result<Json<GatePassVerification>, AppError> {
    let school_id = school_for_scoped_operation(&auth_user, dto.school_id)?;
    Ok(Json(
        LeaveService::verify_gate_pass(&state.db, school_id, &dto.code).await?,
    ))
}
