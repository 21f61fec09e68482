use chrono::{DateTime, NaiveDate, Utc};
use scholaris_core::serde::deserialize_optional_uuid;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

pub const CERTIFICATE_COLUMNS: &str =
    "id, school_id, student_id, title, description, serial_number, issued_on, created_at";

/// Length of the random part of a serial number, e.g. `2024-7KQ2M9XA`.
pub const SERIAL_RANDOM_LEN: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Certificate {
    pub id: Uuid,
    pub school_id: Uuid,
    pub student_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub serial_number: String,
    pub issued_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCertificateDto {
    pub student_id: Uuid,
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    pub description: Option<String>,
    /// Defaults to today.
    pub issued_on: Option<NaiveDate>,
    pub school_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateCertificateDto {
    #[validate(length(min = 1, max = 255, message = "Title cannot be empty"))]
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CertificateFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub student_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
}
