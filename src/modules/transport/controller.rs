use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use scholaris_core::AppError;
use tracing::instrument;
use uuid::Uuid;

use crate::docs::ErrorResponse;
use crate::middleware::auth::{RequireTransportRead, RequireTransportWrite};
use crate::state::AppState;
use crate::utils::auth_helpers::{resource_scope, school_for_scoped_operation};
use crate::validator::{ValidatedJson, ValidatedQuery};

use super::model::{
    AssignStudentDto, Bus, BusAssignment, BusFilterParams, CreateBusDto, UpdateBusDto,
};
use super::service::TransportService;

#[utoipa::path(
    post,
    path = "/api/transport/buses",
    request_body = CreateBusDto,
    responses(
        (status = 201, description = "Bus registered", body = Bus),
        (status = 409, description = "Registration number already used", body = ErrorResponse)
    ),
    tag = "Transport",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn create_bus(
    State(state): State<AppState>,
    RequireTransportWrite(auth_user): RequireTransportWrite,
    ValidatedJson(dto): ValidatedJson<CreateBusDto>,
) -> Result<(StatusCode, Json<Bus>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, dto.school_id)?;
    let bus = TransportService::create_bus(&state.db, school_id, dto).await?;
    Ok((StatusCode::CREATED, Json(bus)))
}

#[utoipa::path(
    get,
    path = "/api/transport/buses",
    params(BusFilterParams),
    responses((status = 200, description = "Buses with seat usage", body = Vec<Bus>)),
    tag = "Transport",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn get_buses(
    State(state): State<AppState>,
    RequireTransportRead(auth_user): RequireTransportRead,
    ValidatedQuery(filters): ValidatedQuery<BusFilterParams>,
) -> Result<Json<Vec<Bus>>, AppError> {
    let school_id = school_for_scoped_operation(&auth_user, filters.school_id)?;
    Ok(Json(TransportService::list_buses(&state.db, school_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/transport/buses/{id}",
    params(("id" = Uuid, Path, description = "Bus ID")),
    responses(
        (status = 200, description = "Bus", body = Bus),
        (status = 404, description = "Bus not found", body = ErrorResponse)
    ),
    tag = "Transport",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_bus(
    State(state): State<AppState>,
    RequireTransportRead(auth_user): RequireTransportRead,
    Path(id): Path<Uuid>,
) -> Result<Json<Bus>, AppError> {
    Ok(Json(TransportService::get_bus(&state.db, id, resource_scope(&auth_user)?).await?))
}

#[utoipa::path(
    put,
    path = "/api/transport/buses/{id}",
    params(("id" = Uuid, Path, description = "Bus ID")),
    request_body = UpdateBusDto,
    responses(
        (status = 200, description = "Bus updated", body = Bus),
        (status = 409, description = "Capacity below assigned students", body = ErrorResponse)
    ),
    tag = "Transport",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_bus(
    State(state): State<AppState>,
    RequireTransportWrite(auth_user): RequireTransportWrite,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateBusDto>,
) -> Result<Json<Bus>, AppError> {
    Ok(Json(
        TransportService::update_bus(&state.db, id, resource_scope(&auth_user)?, dto).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/transport/buses/{id}",
    params(("id" = Uuid, Path, description = "Bus ID")),
    responses(
        (status = 204, description = "Bus deleted"),
        (status = 404, description = "Bus not found", body = ErrorResponse)
    ),
    tag = "Transport",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_bus(
    State(state): State<AppState>,
    RequireTransportWrite(auth_user): RequireTransportWrite,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    TransportService::delete_bus(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/transport/buses/{id}/students",
    params(("id" = Uuid, Path, description = "Bus ID")),
    responses((status = 200, description = "Students assigned to the bus", body = Vec<BusAssignment>)),
    tag = "Transport",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_bus_students(
    State(state): State<AppState>,
    RequireTransportRead(auth_user): RequireTransportRead,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<BusAssignment>>, AppError> {
    Ok(Json(
        TransportService::list_assignments(&state.db, id, resource_scope(&auth_user)?).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/transport/buses/{id}/students",
    params(("id" = Uuid, Path, description = "Bus ID")),
    request_body = AssignStudentDto,
    responses(
        (status = 201, description = "Student assigned", body = BusAssignment),
        (status = 409, description = "Bus full or student already assigned", body = ErrorResponse)
    ),
    tag = "Transport",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn assign_student(
    State(state): State<AppState>,
    RequireTransportWrite(auth_user): RequireTransportWrite,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<AssignStudentDto>,
) -> Result<(StatusCode, Json<BusAssignment>), AppError> {
    let assignment =
        TransportService::assign_student(&state.db, id, resource_scope(&auth_user)?, dto).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

#[utoipa::path(
    delete,
    path = "/api/transport/buses/{id}/students/{student_id}",
    params(
        ("id" = Uuid, Path, description = "Bus ID"),
        ("student_id" = Uuid, Path, description = "Student ID")
    ),
    responses(
        (status = 204, description = "Student removed from the bus"),
        (status = 404, description = "Assignment not found", body = ErrorResponse)
    ),
    tag = "Transport",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn unassign_student(
    State(state): State<AppState>,
    RequireTransportWrite(auth_user): RequireTransportWrite,
    Path((id, student_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    TransportService::unassign_student(&state.db, id, student_id, resource_scope(&auth_user)?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
