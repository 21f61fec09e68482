use chrono::{DateTime, Utc};
use scholaris_core::serde::deserialize_optional_uuid;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

pub const HOSTEL_COLUMNS: &str = "id, school_id, name, warden_name, created_at, updated_at";
pub const ALLOCATION_COLUMNS: &str =
    "id, school_id, room_id, student_id, allocated_at, released_at";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Hostel {
    pub id: Uuid,
    pub school_id: Uuid,
    pub name: String,
    pub warden_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateHostelDto {
    #[validate(length(min = 1, max = 255, message = "Hostel name is required"))]
    pub name: String,
    pub warden_name: Option<String>,
    pub school_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateHostelDto {
    #[validate(length(min = 1, max = 255, message = "Hostel name cannot be empty"))]
    pub name: Option<String>,
    pub warden_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HostelFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
}

/// A room with its live occupancy.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct HostelRoom {
    pub id: Uuid,
    pub hostel_id: Uuid,
    pub room_number: String,
    pub capacity: i32,
    pub occupied: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateRoomDto {
    #[validate(length(min = 1, max = 50, message = "Room number is required"))]
    pub room_number: String,
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateRoomDto {
    #[validate(length(min = 1, max = 50, message = "Room number cannot be empty"))]
    pub room_number: Option<String>,
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct HostelAllocation {
    pub id: Uuid,
    pub school_id: Uuid,
    pub room_id: Uuid,
    pub student_id: Uuid,
    pub allocated_at: DateTime<Utc>,
    pub released_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AllocateDto {
    pub room_id: Uuid,
    pub student_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AllocationFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub room_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub student_id: Option<Uuid>,
    /// Include released allocations
    pub include_released: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
}
