use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use scholaris_core::AppError;
use tracing::instrument;
use uuid::Uuid;

use crate::docs::ErrorResponse;
use crate::middleware::auth::{RequireHostelRead, RequireHostelWrite};
use crate::state::AppState;
use crate::utils::auth_helpers::{resource_scope, school_for_scoped_operation};
use crate::validator::{ValidatedJson, ValidatedQuery};

use super::model::{
    AllocateDto, AllocationFilterParams, CreateHostelDto, CreateRoomDto, Hostel,
    HostelAllocation, HostelFilterParams, HostelRoom, UpdateHostelDto, UpdateRoomDto,
};
use super::service::HostelService;

#[utoipa::path(
    post,
    path = "/api/hostel/hostels",
    request_body = CreateHostelDto,
    responses(
        (status = 201, description = "Hostel created", body = Hostel),
        (status = 409, description = "Name already used", body = ErrorResponse)
    ),
    tag = "Hostel",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn create_hostel(
    State(state): State<AppState>,
    RequireHostelWrite(auth_user): RequireHostelWrite,
    ValidatedJson(dto): ValidatedJson<CreateHostelDto>,
) -> Result<(StatusCode, Json<Hostel>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, dto.school_id)?;
    let hostel = HostelService::create_hostel(&state.db, school_id, dto).await?;
    Ok((StatusCode::CREATED, Json(hostel)))
}

#[utoipa::path(
    get,
    path = "/api/hostel/hostels",
    params(HostelFilterParams),
    responses((status = 200, description = "Hostels", body = Vec<Hostel>)),
    tag = "Hostel",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn get_hostels(
    State(state): State<AppState>,
    RequireHostelRead(auth_user): RequireHostelRead,
    ValidatedQuery(filters): ValidatedQuery<HostelFilterParams>,
) -> Result<Json<Vec<Hostel>>, AppError> {
    let school_id = school_for_scoped_operation(&auth_user, filters.school_id)?;
    Ok(Json(HostelService::list_hostels(&state.db, school_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/hostel/hostels/{id}",
    params(("id" = Uuid, Path, description = "Hostel ID")),
    responses(
        (status = 200, description = "Hostel", body = Hostel),
        (status = 404, description = "Hostel not found", body = ErrorResponse)
    ),
    tag = "Hostel",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_hostel(
    State(state): State<AppState>,
    RequireHostelRead(auth_user): RequireHostelRead,
    Path(id): Path<Uuid>,
) -> Result<Json<Hostel>, AppError> {
    Ok(Json(HostelService::get_hostel(&state.db, id, resource_scope(&auth_user)?).await?))
}

#[utoipa::path(
    put,
    path = "/api/hostel/hostels/{id}",
    params(("id" = Uuid, Path, description = "Hostel ID")),
    request_body = UpdateHostelDto,
    responses(
        (status = 200, description = "Hostel updated", body = Hostel),
        (status = 404, description = "Hostel not found", body = ErrorResponse)
    ),
    tag = "Hostel",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_hostel(
    State(state): State<AppState>,
    RequireHostelWrite(auth_user): RequireHostelWrite,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateHostelDto>,
) -> Result<Json<Hostel>, AppError> {
    Ok(Json(
        HostelService::update_hostel(&state.db, id, resource_scope(&auth_user)?, dto).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/hostel/hostels/{id}",
    params(("id" = Uuid, Path, description = "Hostel ID")),
    responses(
        (status = 204, description = "Hostel deleted"),
        (status = 409, description = "Hostel has residents", body = ErrorResponse)
    ),
    tag = "Hostel",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_hostel(
    State(state): State<AppState>,
    RequireHostelWrite(auth_user): RequireHostelWrite,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    HostelService::delete_hostel(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/hostel/hostels/{id}/rooms",
    params(("id" = Uuid, Path, description = "Hostel ID")),
    request_body = CreateRoomDto,
    responses(
        (status = 201, description = "Room added", body = HostelRoom),
        (status = 409, description = "Room number already exists", body = ErrorResponse)
    ),
    tag = "Hostel",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn add_room(
    State(state): State<AppState>,
    RequireHostelWrite(auth_user): RequireHostelWrite,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<CreateRoomDto>,
) -> Result<(StatusCode, Json<HostelRoom>), AppError> {
    let room = HostelService::add_room(&state.db, id, resource_scope(&auth_user)?, dto).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

#[utoipa::path(
    get,
    path = "/api/hostel/hostels/{id}/rooms",
    params(("id" = Uuid, Path, description = "Hostel ID")),
    responses((status = 200, description = "Rooms with occupancy", body = Vec<HostelRoom>)),
    tag = "Hostel",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_rooms(
    State(state): State<AppState>,
    RequireHostelRead(auth_user): RequireHostelRead,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<HostelRoom>>, AppError> {
    Ok(Json(HostelService::list_rooms(&state.db, id, resource_scope(&auth_user)?).await?))
}

#[utoipa::path(
    put,
    path = "/api/hostel/rooms/{id}",
    params(("id" = Uuid, Path, description = "Room ID")),
    request_body = UpdateRoomDto,
    responses(
        (status = 200, description = "Room updated", body = HostelRoom),
        (status = 409, description = "Capacity below current occupancy", body = ErrorResponse)
    ),
    tag = "Hostel",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_room(
    State(state): State<AppState>,
    RequireHostelWrite(auth_user): RequireHostelWrite,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateRoomDto>,
) -> Result<Json<HostelRoom>, AppError> {
    Ok(Json(
        HostelService::update_room(&state.db, id, resource_scope(&auth_user)?, dto).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/hostel/rooms/{id}",
    params(("id" = Uuid, Path, description = "Room ID")),
    responses(
        (status = 204, description = "Room deleted"),
        (status = 409, description = "Room is occupied", body = ErrorResponse)
    ),
    tag = "Hostel",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_room(
    State(state): State<AppState>,
    RequireHostelWrite(auth_user): RequireHostelWrite,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    HostelService::delete_room(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/hostel/allocations",
    request_body = AllocateDto,
    responses(
        (status = 201, description = "Bed allocated", body = HostelAllocation),
        (status = 404, description = "Room not found", body = ErrorResponse),
        (status = 409, description = "Room full or student already allocated", body = ErrorResponse)
    ),
    tag = "Hostel",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn allocate(
    State(state): State<AppState>,
    RequireHostelWrite(auth_user): RequireHostelWrite,
    ValidatedJson(dto): ValidatedJson<AllocateDto>,
) -> Result<(StatusCode, Json<HostelAllocation>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, None)?;
    let allocation = HostelService::allocate(&state.db, school_id, &dto).await?;
    Ok((StatusCode::CREATED, Json(allocation)))
}

#[utoipa::path(
    get,
    path = "/api/hostel/allocations",
    params(AllocationFilterParams),
    responses((status = 200, description = "Allocations", body = Vec<HostelAllocation>)),
    tag = "Hostel",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn get_allocations(
    State(state): State<AppState>,
    RequireHostelRead(auth_user): RequireHostelRead,
    ValidatedQuery(filters): ValidatedQuery<AllocationFilterParams>,
) -> Result<Json<Vec<HostelAllocation>>, AppError> {
    let school_id = school_for_scoped_operation(&auth_user, filters.school_id)?;
    Ok(Json(HostelService::list_allocations(&state.db, school_id, &filters).await?))
}

#[utoipa::path(
    post,
    path = "/api/hostel/allocations/{id}/release",
    params(("id" = Uuid, Path, description = "Allocation ID")),
    responses(
        (status = 200, description = "Bed released", body = HostelAllocation),
        (status = 409, description = "Already released", body = ErrorResponse)
    ),
    tag = "Hostel",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn release_allocation(
    State(state): State<AppState>,
    RequireHostelWrite(auth_user): RequireHostelWrite,
    Path(id): Path<Uuid>,
) -> Result<Json<HostelAllocation>, AppError> {
    Ok(Json(HostelService::release(&state.db, id, resource_scope(&auth_user)?).await?))
}
