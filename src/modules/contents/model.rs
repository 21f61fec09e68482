use chrono::{DateTime, NaiveDate, Utc};
use scholaris_core::serde::deserialize_optional_uuid;
use scholaris_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

pub const CONTENT_COLUMNS: &str = "id, school_id, kind, title, body, class_id, subject_id, \
     attachment_url, due_date, created_by, created_at, updated_at";

/// Assignments, homework, classwork, notes and syllabus items share one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "content_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Assignment,
    Homework,
    Classwork,
    Note,
    Syllabus,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AcademicContent {
    pub id: Uuid,
    pub school_id: Uuid,
    pub kind: ContentKind,
    pub title: String,
    pub body: Option<String>,
    pub class_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub attachment_url: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateContentDto {
    pub kind: ContentKind,
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    pub body: Option<String>,
    pub class_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    #[validate(length(max = 2048, message = "Attachment URL is too long"))]
    pub attachment_url: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub school_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateContentDto {
    #[validate(length(min = 1, max = 255, message = "Title cannot be empty"))]
    pub title: Option<String>,
    pub body: Option<String>,
    #[validate(length(max = 2048, message = "Attachment URL is too long"))]
    pub attachment_url: Option<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ContentFilterParams {
    pub kind: Option<ContentKind>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub subject_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedContentsResponse {
    pub data: Vec<AcademicContent>,
    pub meta: PaginationMeta,
}
