use chrono::{DateTime, NaiveDate, Utc};
use scholaris_core::serde::deserialize_optional_uuid;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const EXAM_COLUMNS: &str =
    "id, school_id, name, class_id, start_date, end_date, created_at, updated_at";
pub const PAPER_COLUMNS: &str = "id, exam_id, subject_id, max_marks, paper_date, created_at";
pub const RESULT_COLUMNS: &str =
    "id, paper_id, student_id, marks, remarks, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Exam {
    pub id: Uuid,
    pub school_id: Uuid,
    pub name: String,
    pub class_id: Uuid,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn validate_date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<(), ValidationError> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(ValidationError::new("date_range")
            .with_message("End date cannot be before start date".into())),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_create_dates"))]
pub struct CreateExamDto {
    #[validate(length(min = 1, max = 255, message = "Exam name is required"))]
    pub name: String,
    pub class_id: Uuid,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub school_id: Option<Uuid>,
}

fn validate_create_dates(dto: &CreateExamDto) -> Result<(), ValidationError> {
    validate_date_range(dto.start_date, dto.end_date)
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_update_dates"))]
pub struct UpdateExamDto {
    #[validate(length(min = 1, max = 255, message = "Exam name cannot be empty"))]
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

fn validate_update_dates(dto: &UpdateExamDto) -> Result<(), ValidationError> {
    validate_date_range(dto.start_date, dto.end_date)
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExamFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ExamPaper {
    pub id: Uuid,
    pub exam_id: Uuid,
    pub subject_id: Uuid,
    pub max_marks: f64,
    pub paper_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePaperDto {
    pub subject_id: Uuid,
    #[validate(range(exclusive_min = 0.0, message = "Maximum marks must be positive"))]
    pub max_marks: f64,
    pub paper_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ExamResult {
    pub id: Uuid,
    pub paper_id: Uuid,
    pub student_id: Uuid,
    pub marks: f64,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ResultEntry {
    pub student_id: Uuid,
    #[validate(range(min = 0.0, message = "Marks cannot be negative"))]
    pub marks: f64,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RecordResultsDto {
    #[validate(length(min = 1, message = "At least one result is required"), nested)]
    pub results: Vec<ResultEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubjectReport {
    pub paper_id: Uuid,
    pub subject_id: Uuid,
    pub subject_name: String,
    pub max_marks: f64,
    /// `None` when no result was recorded for this paper.
    pub marks: Option<f64>,
    pub percentage: Option<f64>,
    pub grade: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportCard {
    pub exam_id: Uuid,
    pub exam_name: String,
    pub student_id: Uuid,
    pub student_name: String,
    pub subjects: Vec<SubjectReport>,
    pub total_marks: f64,
    pub total_max_marks: f64,
    pub percentage: f64,
    pub grade: String,
}

#[derive(Debug, FromRow)]
pub(crate) struct PaperWithResult {
    pub paper_id: Uuid,
    pub subject_id: Uuid,
    pub subject_name: String,
    pub max_marks: f64,
    pub marks: Option<f64>,
}
