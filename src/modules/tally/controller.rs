use axum::{Json, extract::State};
use scholaris_core::AppError;
use serde_json::Value;
use tracing::instrument;

use crate::docs::ErrorResponse;
use crate::middleware::auth::RequireTallyAccess;
use crate::state::AppState;
use crate::validator::{ValidatedJson, ValidatedQuery};

use super::model::{AutoLedgerDto, TallyHealth, TallyQuery, TallyRecords};
use super::normalize::Collection;
use super::service::TallyService;

#[utoipa::path(
    get,
    path = "/api/tally/health",
    responses((status = 200, description = "Gateway reachability", body = TallyHealth)),
    tag = "Tally",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn health(
    State(state): State<AppState>,
    RequireTallyAccess(_auth_user): RequireTallyAccess,
) -> Json<TallyHealth> {
    Json(TallyService::health(&state.tally).await)
}

#[utoipa::path(
    get,
    path = "/api/tally/companies",
    params(TallyQuery),
    responses(
        (status = 200, description = "Companies", body = TallyRecords),
        (status = 502, description = "Gateway failure", body = ErrorResponse)
    ),
    tag = "Tally",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn companies(
    State(state): State<AppState>,
    RequireTallyAccess(_auth_user): RequireTallyAccess,
    ValidatedQuery(query): ValidatedQuery<TallyQuery>,
) -> Result<Json<TallyRecords>, AppError> {
    Ok(Json(
        TallyService::fetch(&state.tally, Collection::Companies, &query).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/tally/ledgers",
    params(TallyQuery),
    responses(
        (status = 200, description = "Ledgers", body = TallyRecords),
        (status = 502, description = "Gateway failure", body = ErrorResponse)
    ),
    tag = "Tally",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn ledgers(
    State(state): State<AppState>,
    RequireTallyAccess(_auth_user): RequireTallyAccess,
    ValidatedQuery(query): ValidatedQuery<TallyQuery>,
) -> Result<Json<TallyRecords>, AppError> {
    Ok(Json(
        TallyService::fetch(&state.tally, Collection::Ledgers, &query).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/tally/sales",
    params(TallyQuery),
    responses(
        (status = 200, description = "Sales vouchers", body = TallyRecords),
        (status = 502, description = "Gateway failure", body = ErrorResponse)
    ),
    tag = "Tally",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn sales(
    State(state): State<AppState>,
    RequireTallyAccess(_auth_user): RequireTallyAccess,
    ValidatedQuery(query): ValidatedQuery<TallyQuery>,
) -> Result<Json<TallyRecords>, AppError> {
    Ok(Json(
        TallyService::fetch(&state.tally, Collection::Sales, &query).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/tally/auto-ledger",
    request_body = AutoLedgerDto,
    responses(
        (status = 200, description = "Gateway response", body = Object),
        (status = 502, description = "Gateway failure", body = ErrorResponse)
    ),
    tag = "Tally",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn auto_ledger(
    State(state): State<AppState>,
    RequireTallyAccess(_auth_user): RequireTallyAccess,
    ValidatedJson(dto): ValidatedJson<AutoLedgerDto>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(TallyService::auto_ledger(&state.tally, &dto).await?))
}
