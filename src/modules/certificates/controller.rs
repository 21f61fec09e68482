use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use scholaris_core::AppError;
use tracing::instrument;
use uuid::Uuid;

use crate::docs::ErrorResponse;
use crate::middleware::auth::{AuthUser, RequireCertificatesRead, RequireCertificatesWrite};
use crate::modules::students::service::StudentService;
use crate::modules::users::model::UserRole;
use crate::state::AppState;
use crate::utils::auth_helpers::{resource_scope, school_for_scoped_operation};
use crate::validator::{ValidatedJson, ValidatedQuery};

use super::model::{
    Certificate, CertificateFilterParams, CreateCertificateDto, UpdateCertificateDto,
};
use super::service::CertificateService;

/// Students only ever see their own certificates and parents those of
/// their children.
async fn visible_student(
    state: &AppState,
    auth_user: &AuthUser,
    requested: Option<Uuid>,
) -> Result<Option<Uuid>, AppError> {
    let role = auth_user.role()?;
    let student_id = match (role, requested) {
        (UserRole::Student, None) => Some(auth_user.user_id()?),
        (UserRole::Parent, None) => {
            return Err(AppError::bad_request(anyhow::anyhow!("student_id is required")));
        }
        (_, requested) => requested,
    };

    if let Some(student_id) = student_id
        && matches!(role, UserRole::Student | UserRole::Parent)
    {
        StudentService::can_view(
            &state.db,
            auth_user.user_id()?,
            role,
            resource_scope(auth_user)?,
            student_id,
        )
        .await?;
    }
    Ok(student_id)
}

#[utoipa::path(
    post,
    path = "/api/certificates",
    request_body = CreateCertificateDto,
    responses(
        (status = 201, description = "Certificate issued with a new serial number", body = Certificate),
        (status = 400, description = "Student not found in this school", body = ErrorResponse)
    ),
    tag = "Certificates",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn create_certificate(
    State(state): State<AppState>,
    RequireCertificatesWrite(auth_user): RequireCertificatesWrite,
    ValidatedJson(dto): ValidatedJson<CreateCertificateDto>,
) -> Result<(StatusCode, Json<Certificate>), AppError> {
    let school_id = school_for_scoped_operation(&auth_user, dto.school_id)?;
    let certificate = CertificateService::issue(&state.db, school_id, dto).await?;
    Ok((StatusCode::CREATED, Json(certificate)))
}

#[utoipa::path(
    get,
    path = "/api/certificates",
    params(CertificateFilterParams),
    responses((status = 200, description = "Certificates", body = Vec<Certificate>)),
    tag = "Certificates",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn get_certificates(
    State(state): State<AppState>,
    RequireCertificatesRead(auth_user): RequireCertificatesRead,
    ValidatedQuery(filters): ValidatedQuery<CertificateFilterParams>,
) -> Result<Json<Vec<Certificate>>, AppError> {
    let school_id = school_for_scoped_operation(&auth_user, filters.school_id)?;
    let student_id = visible_student(&state, &auth_user, filters.student_id).await?;
    Ok(Json(CertificateService::list(&state.db, school_id, student_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/certificates/{id}",
    params(("id" = Uuid, Path, description = "Certificate ID")),
    responses(
        (status = 200, description = "Certificate", body = Certificate),
        (status = 404, description = "Certificate not found", body = ErrorResponse)
    ),
    tag = "Certificates",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_certificate(
    State(state): State<AppState>,
    RequireCertificatesRead(auth_user): RequireCertificatesRead,
    Path(id): Path<Uuid>,
) -> Result<Json<Certificate>, AppError> {
    let certificate = CertificateService::get(&state.db, id, resource_scope(&auth_user)?).await?;
    visible_student(&state, &auth_user, Some(certificate.student_id)).await?;
    Ok(Json(certificate))
}

#[utoipa::path(
    put,
    path = "/api/certificates/{id}",
    params(("id" = Uuid, Path, description = "Certificate ID")),
    request_body = UpdateCertificateDto,
    responses(
        (status = 200, description = "Certificate updated", body = Certificate),
        (status = 404, description = "Certificate not found", body = ErrorResponse)
    ),
    tag = "Certificates",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_certificate(
    State(state): State<AppState>,
    RequireCertificatesWrite(auth_user): RequireCertificatesWrite,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateCertificateDto>,
) -> Result<Json<Certificate>, AppError> {
    Ok(Json(
        CertificateService::update(&state.db, id, resource_scope(&auth_user)?, dto).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/certificates/{id}",
    params(("id" = Uuid, Path, description = "Certificate ID")),
    responses(
        (status = 204, description = "Certificate deleted"),
        (status = 404, description = "Certificate not found", body = ErrorResponse)
    ),
    tag = "Certificates",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_certificate(
    State(state): State<AppState>,
    RequireCertificatesWrite(auth_user): RequireCertificatesWrite,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    CertificateService::delete(&state.db, id, resource_scope(&auth_user)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
