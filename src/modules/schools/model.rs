use chrono::{DateTime, Utc};
use scholaris_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const SCHOOL_COLUMNS: &str = "id, name, address, phone, email, latitude, longitude, \
     geofence_radius_m, created_at, updated_at";

pub const DEFAULT_GEOFENCE_RADIUS_M: f64 = 200.0;

/// A tenant. `latitude`/`longitude` are either both set or both absent;
/// without them attendance check-in accepts any location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct School {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub geofence_radius_m: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn validate_coordinates(lat: Option<f64>, lon: Option<f64>) -> Result<(), ValidationError> {
    match (lat, lon) {
        (None, None) => Ok(()),
        (Some(lat), Some(lon)) if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) => {
            Ok(())
        }
        (Some(_), Some(_)) => Err(ValidationError::new("coordinates")
            .with_message("Latitude must be within ±90 and longitude within ±180".into())),
        _ => Err(ValidationError::new("coordinates")
            .with_message("Latitude and longitude must be provided together".into())),
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_create_coordinates"))]
pub struct CreateSchoolDto {
    #[validate(length(min = 1, max = 255, message = "School name is required"))]
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "Email must be valid"))]
    pub email: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[validate(range(exclusive_min = 0.0, message = "Geofence radius must be positive"))]
    pub geofence_radius_m: Option<f64>,
}

fn validate_create_coordinates(dto: &CreateSchoolDto) -> Result<(), ValidationError> {
    validate_coordinates(dto.latitude, dto.longitude)
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_update_coordinates"))]
pub struct UpdateSchoolDto {
    #[validate(length(min = 1, max = 255, message = "School name cannot be empty"))]
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "Email must be valid"))]
    pub email: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[validate(range(exclusive_min = 0.0, message = "Geofence radius must be positive"))]
    pub geofence_radius_m: Option<f64>,
}

fn validate_update_coordinates(dto: &UpdateSchoolDto) -> Result<(), ValidationError> {
    validate_coordinates(dto.latitude, dto.longitude)
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SchoolFilterParams {
    /// Partial match on name
    pub name: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedSchoolsResponse {
    pub data: Vec<School>,
    pub meta: PaginationMeta,
}
