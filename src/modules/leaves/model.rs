use chrono::{DateTime, NaiveDate, Utc};
use scholaris_core::serde::deserialize_optional_uuid;
use scholaris_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const LEAVE_COLUMNS: &str = "id, school_id, student_id, requested_by, reason, from_date, \
     to_date, status, parent_decided_by, parent_decided_at, school_decided_by, \
     school_decided_at, decision_note, created_at, updated_at";

pub const GATE_PASS_COLUMNS: &str =
    "id, school_id, leave_request_id, code, valid_from, valid_until, used_at, created_at";

pub const GATE_PASS_CODE_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "leave_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    PendingParent,
    PendingSchool,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LeaveRequest {
    pub id: Uuid,
    pub school_id: Uuid,
    pub student_id: Uuid,
    pub requested_by: Option<Uuid>,
    pub reason: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub status: LeaveStatus,
    pub parent_decided_by: Option<Uuid>,
    pub parent_decided_at: Option<DateTime<Utc>>,
    pub school_decided_by: Option<Uuid>,
    pub school_decided_at: Option<DateTime<Utc>>,
    pub decision_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn validate_leave_dates(dto: &CreateLeaveDto) -> Result<(), ValidationError> {
    if dto.to_date < dto.from_date {
        let mut err = ValidationError::new("date_range");
        err.message = Some("to_date must not be before from_date".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_leave_dates"))]
pub struct CreateLeaveDto {
    /// Required when a parent files on behalf of a child; students always file for themselves
    pub student_id: Option<Uuid>,
    #[validate(length(min = 1, max = 2000, message = "Reason is required"))]
    pub reason: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LeaveDecisionDto {
    pub approve: bool,
    #[validate(length(max = 1000, message = "Note is at most 1000 characters"))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaveFilterParams {
    pub status: Option<LeaveStatus>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub student_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedLeavesResponse {
    pub data: Vec<LeaveRequest>,
    pub meta: PaginationMeta,
}

/// Exit authorisation issued when the school approves a leave.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct GatePass {
    pub id: Uuid,
    pub school_id: Uuid,
    pub leave_request_id: Uuid,
    pub code: String,
    pub valid_from: NaiveDate,
    pub valid_until: NaiveDate,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl GatePass {
    pub fn is_valid_on(&self, day: NaiveDate) -> bool {
        self.valid_from <= day && day <= self.valid_until
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaveDecisionResponse {
    pub leave: LeaveRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gate_pass: Option<GatePass>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct VerifyGatePassDto {
    #[validate(length(min = 4, max = 16, message = "Code must be 4 to 16 characters"))]
    pub code: String,
    pub school_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GatePassVerification {
    pub gate_pass: GatePass,
    pub student_id: Uuid,
    pub student_name: String,
}
