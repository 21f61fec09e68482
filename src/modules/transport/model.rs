use chrono::{DateTime, Utc};
use scholaris_core::serde::deserialize_optional_uuid;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

pub const ASSIGNMENT_COLUMNS: &str = "id, bus_id, student_id, stop_name, created_at";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Bus {
    pub id: Uuid,
    pub school_id: Uuid,
    pub registration_number: String,
    pub driver_name: Option<String>,
    pub driver_phone: Option<String>,
    pub route_name: Option<String>,
    pub capacity: i32,
    /// Students currently assigned
    pub assigned: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBusDto {
    #[validate(length(min = 1, max = 50, message = "Registration number is required"))]
    pub registration_number: String,
    pub driver_name: Option<String>,
    pub driver_phone: Option<String>,
    pub route_name: Option<String>,
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: i32,
    pub school_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateBusDto {
    #[validate(length(min = 1, max = 50, message = "Registration number cannot be empty"))]
    pub registration_number: Option<String>,
    pub driver_name: Option<String>,
    pub driver_phone: Option<String>,
    pub route_name: Option<String>,
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BusFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BusAssignment {
    pub id: Uuid,
    pub bus_id: Uuid,
    pub student_id: Uuid,
    pub stop_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AssignStudentDto {
    pub student_id: Uuid,
    #[validate(length(max = 255, message = "Stop name is at most 255 characters"))]
    pub stop_name: Option<String>,
}
