use chrono::{DateTime, NaiveDate, Utc};
use scholaris_core::serde::deserialize_optional_uuid;
use scholaris_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::modules::users::model::UserRole;

pub const NOTICE_COLUMNS: &str = "id, school_id, title, body, audience_role, audience_class_id, \
     created_by, created_at, updated_at";

pub const NEWSLETTER_COLUMNS: &str =
    "id, school_id, title, summary, file_url, published_on, created_by, created_at, updated_at";

/// A school announcement. An empty audience means everyone in the school.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notice {
    pub id: Uuid,
    pub school_id: Uuid,
    pub title: String,
    pub body: String,
    pub audience_role: Option<UserRole>,
    pub audience_class_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateNoticeDto {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Body is required"))]
    pub body: String,
    pub audience_role: Option<UserRole>,
    pub audience_class_id: Option<Uuid>,
    pub school_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateNoticeDto {
    #[validate(length(min = 1, max = 255, message = "Title cannot be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Body cannot be empty"))]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NoticeFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedNoticesResponse {
    pub data: Vec<Notice>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Newsletter {
    pub id: Uuid,
    pub school_id: Uuid,
    pub title: String,
    pub summary: Option<String>,
    /// Usually an `/uploads/...` URL returned by the upload endpoint
    pub file_url: Option<String>,
    pub published_on: NaiveDate,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateNewsletterDto {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    pub summary: Option<String>,
    #[validate(length(max = 2048, message = "File URL is too long"))]
    pub file_url: Option<String>,
    /// Defaults to today
    pub published_on: Option<NaiveDate>,
    pub school_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateNewsletterDto {
    #[validate(length(min = 1, max = 255, message = "Title cannot be empty"))]
    pub title: Option<String>,
    pub summary: Option<String>,
    #[validate(length(max = 2048, message = "File URL is too long"))]
    pub file_url: Option<String>,
    pub published_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NewsletterFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedNewslettersResponse {
    pub data: Vec<Newsletter>,
    pub meta: PaginationMeta,
}
