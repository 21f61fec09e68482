use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use scholaris_core::AppError;
use tracing::instrument;
use uuid::Uuid;

use crate::docs::ErrorResponse;
use crate::middleware::auth::{RequireInventoryRead, RequireInventoryWrite};
use crate::state::AppState;
use crate::utils::auth_helpers::{resource_scope, school_for_scoped_operation};
use crate::validator::{ValidatedJson, ValidatedQuery};

use super::model::{
    CreateItemDto, CreateTransactionDto, InventoryItem, InventoryTransaction, ItemFilterParams,
    PaginatedItemsResponse, StockMovement, UpdateItemDto,
};
use super::service::InventoryService;

#[utoipa::path(
    post,
    path = "/api/inventory/items",
    request_body = CreateItemDto,
    responses(
        (status = 201, description = "Item created", body = InventoryItem),
        (status = 409, description = "Name already used", body = ErrorResponse)
    ),
    tag = "Inventory",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn create_item(
    State(state): State<AppState>,
    RequireInventoryWrite(auth_user): RequireInventoryWrite,
    ValidatedJson(dto): ValidatedJson<CreateItemDto>,
) -> Result<(StatusCode, Json<InventoryItem>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, dto.school_id)?;
    let item =
        InventoryService::create_item(&state.db, school_id, auth_user.user_id()?, dto).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[utoipa::path(
    get,
    path = "/api/inventory/items",
    params(ItemFilterParams),
    responses((status = 200, description = "Paginated items", body = PaginatedItemsResponse)),
    tag = "Inventory",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn get_items(
    State(state): State<AppState>,
    RequireInventoryRead(auth_user): RequireInventoryRead,
    ValidatedQuery(filters): ValidatedQuery<ItemFilterParams>,
) -> Result<Json<PaginatedItemsResponse>, AppError> {
    let school_id = school_for_scoped_operation(&auth_user, filters.school_id)?;
    Ok(Json(InventoryService::list_items(&state.db, school_id, &filters).await?))
}

#[utoipa::path(
    get,
    path = "/api/inventory/items/{id}",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item", body = InventoryItem),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    tag = "Inventory",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_item(
    State(state): State<AppState>,
    RequireInventoryRead(auth_user): RequireInventoryRead,
    Path(id): Path<Uuid>,
) -> Result<Json<InventoryItem>, AppError> {
    Ok(Json(InventoryService::get_item(&state.db, id, resource_scope(&auth_user)?).await?))
}

#[utoipa::path(
    put,
    path = "/api/inventory/items/{id}",
    params(("id" = Uuid, Path, description = "Item ID")),
    request_body = UpdateItemDto,
    responses(
        (status = 200, description = "Item updated", body = InventoryItem),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    tag = "Inventory",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_item(
    State(state): State<AppState>,
    RequireInventoryWrite(auth_user): RequireInventoryWrite,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateItemDto>,
) -> Result<Json<InventoryItem>, AppError> {
    Ok(Json(
        InventoryService::update_item(&state.db, id, resource_scope(&auth_user)?, dto).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/inventory/items/{id}",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 204, description = "Item deleted with its history"),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    tag = "Inventory",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_item(
    State(state): State<AppState>,
    RequireInventoryWrite(auth_user): RequireInventoryWrite,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    InventoryService::delete_item(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/inventory/items/{id}/transactions",
    params(("id" = Uuid, Path, description = "Item ID")),
    request_body = CreateTransactionDto,
    responses(
        (status = 201, description = "Stock moved", body = StockMovement),
        (status = 404, description = "Item not found", body = ErrorResponse),
        (status = 409, description = "Outgoing quantity exceeds stock", body = ErrorResponse)
    ),
    tag = "Inventory",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_transaction(
    State(state): State<AppState>,
    RequireInventoryWrite(auth_user): RequireInventoryWrite,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<CreateTransactionDto>,
) -> Result<(StatusCode, Json<StockMovement>), AppError> {
    let movement = InventoryService::move_stock(
        &state.db,
        id,
        resource_scope(&auth_user)?,
        auth_user.user_id()?,
        dto,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

#[utoipa::path(
    get,
    path = "/api/inventory/items/{id}/transactions",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses((status = 200, description = "Movement history, newest first", body = Vec<InventoryTransaction>)),
    tag = "Inventory",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_transactions(
    State(state): State<AppState>,
    RequireInventoryRead(auth_user): RequireInventoryRead,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<InventoryTransaction>>, AppError> {
    Ok(Json(
        InventoryService::list_transactions(&state.db, id, resource_scope(&auth_user)?).await?,
    ))
}
