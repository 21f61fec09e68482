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
    RequireAttendanceCheckIn, RequireAttendanceMark, RequireAttendanceRead,
};
use crate::modules::students::service::StudentService;
use crate::state::AppState;
use crate::utils::auth_helpers::{own_school, resource_scope, school_for_scoped_operation};
use crate::validator::{ValidatedJson, ValidatedQuery};

use super::model::{
    AttendanceFilterParams, AttendanceRecord, AttendanceSummary, CheckInDto, GeofenceQuery,
    GeofenceStatus, MarkAttendanceDto, StaffCheckIn, SummaryParams,
};
use super::service::AttendanceService;

#[utoipa::path(
    post,
    path = "/api/attendance/mark",
    request_body = MarkAttendanceDto,
    responses(
        (status = 200, description = "Attendance stored for every entry", body = Vec<AttendanceRecord>),
        (status = 400, description = "Student not in class or listed twice", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn mark_attendance(
    State(state): State<AppState>,
    RequireAttendanceMark(auth_user): RequireAttendanceMark,
    ValidatedJson(dto): ValidatedJson<MarkAttendanceDto>,
) -> Result<Json<Vec<AttendanceRecord>>, AppError> {
    let school_id = own_school(&auth_user)?;
    let records = AttendanceService::mark(&state.db, school_id, auth_user.user_id()?, dto).await?;
    Ok(Json(records))
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceFilterParams),
    responses((status = 200, description = "Attendance records", body = Vec<AttendanceRecord>)),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn get_attendance(
    State(state): State<AppState>,
    RequireAttendanceRead(auth_user): RequireAttendanceRead,
    ValidatedQuery(filters): ValidatedQuery<AttendanceFilterParams>,
) -> Result<Json<Vec<AttendanceRecord>>, AppError> {
    let school_id = school_for_scoped_operation(&auth_user, filters.school_id)?;
    let records =
        AttendanceService::list(&state.db, school_id, filters.class_id, filters.date).await?;
    Ok(Json(records))
}

#[utoipa::path(
    get,
    path = "/api/attendance/students/{id}/summary",
    params(("id" = Uuid, Path, description = "Student ID"), SummaryParams),
    responses(
        (status = 200, description = "Attendance totals for the student", body = AttendanceSummary),
        (status = 403, description = "Not your child or yourself", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, params))]
pub async fn get_student_summary(
    State(state): State<AppState>,
    RequireAttendanceRead(auth_user): RequireAttendanceRead,
    Path(id): Path<Uuid>,
    ValidatedQuery(params): ValidatedQuery<SummaryParams>,
) -> Result<Json<AttendanceSummary>, AppError> {
    StudentService::can_view(
        &state.db,
        auth_user.user_id()?,
        auth_user.role()?,
        resource_scope(&auth_user)?,
        id,
    )
    .await?;
    Ok(Json(AttendanceService::summary(&state.db, id, &params).await?))
}

#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body = CheckInDto,
    responses(
        (status = 201, description = "Checked in", body = StaffCheckIn),
        (status = 403, description = "Outside the school geofence", body = ErrorResponse),
        (status = 409, description = "Already checked in today", body = ErrorResponse)
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn check_in(
    State(state): State<AppState>,
    RequireAttendanceCheckIn(auth_user): RequireAttendanceCheckIn,
    ValidatedJson(dto): ValidatedJson<CheckInDto>,
) -> Result<(StatusCode, Json<StaffCheckIn>), AppError> {
    let school_id = own_school(&auth_user)?;
    let check_in = AttendanceService::check_in(
        &state.db,
        school_id,
        auth_user.user_id()?,
        dto.latitude,
        dto.longitude,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(check_in)))
}

#[utoipa::path(
    get,
    path = "/api/attendance/check-ins",
    params(AttendanceFilterParams),
    responses((status = 200, description = "Staff check-ins", body = Vec<StaffCheckIn>)),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn get_check_ins(
    State(state): State<AppState>,
    RequireAttendanceMark(auth_user): RequireAttendanceMark,
    ValidatedQuery(filters): ValidatedQuery<AttendanceFilterParams>,
) -> Result<Json<Vec<StaffCheckIn>>, AppError> {
    let school_id = school_for_scoped_operation(&auth_user, filters.school_id)?;
    Ok(Json(AttendanceService::list_check_ins(&state.db, school_id, filters.date).await?))
}

#[utoipa::path(
    get,
    path = "/api/attendance/geofence",
    params(GeofenceQuery),
    responses(
        (status = 200, description = "Distance to school and whether check-in is allowed", body = GeofenceStatus),
        (status = 400, description = "Latitude and longitude are required", body = ErrorResponse)
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn get_geofence_status(
    State(state): State<AppState>,
    RequireAttendanceCheckIn(auth_user): RequireAttendanceCheckIn,
    ValidatedQuery(query): ValidatedQuery<GeofenceQuery>,
) -> Result<Json<GeofenceStatus>, AppError> {
    let (Some(latitude), Some(longitude)) = (query.latitude, query.longitude) else {
        return Err(AppError::bad_request(anyhow::anyhow!(
            "latitude and longitude are required"
        )));
    };

    let school_id = own_school(&auth_user)?;
    let fence =
        AttendanceService::geofence_status(&state.db, school_id, latitude, longitude).await?;

    Ok(Json(GeofenceStatus {
        school_has_location: fence.school_has_location(),
        distance_m: fence.distance_m,
        radius_m: fence.radius_m,
        allowed: fence.allowed,
    }))
}
