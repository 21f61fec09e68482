use chrono::{DateTime, NaiveDate, Utc};
use scholaris_core::serde::deserialize_optional_uuid;
use scholaris_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub const BOOK_COLUMNS: &str =
    "id, school_id, title, author, isbn, total_copies, available_copies, created_at, updated_at";
pub const ISSUE_COLUMNS: &str =
    "id, school_id, book_id, user_id, issued_on, due_on, returned_on, fine, created_at";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub school_id: Uuid,
    pub title: String,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBookDto {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,
    pub author: Option<String>,
    #[validate(length(max = 32, message = "ISBN is at most 32 characters"))]
    pub isbn: Option<String>,
    #[validate(range(min = 1, message = "A book needs at least one copy"))]
    pub total_copies: i32,
    pub school_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateBookDto {
    #[validate(length(min = 1, max = 255, message = "Title cannot be empty"))]
    pub title: Option<String>,
    pub author: Option<String>,
    #[validate(length(max = 32, message = "ISBN is at most 32 characters"))]
    pub isbn: Option<String>,
    /// Changing the total shifts available copies by the same amount.
    #[validate(range(min = 0, message = "Copies cannot be negative"))]
    pub total_copies: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookFilterParams {
    /// Matches title, author or ISBN
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedBooksResponse {
    pub data: Vec<Book>,
    pub meta: PaginationMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookIssue {
    pub id: Uuid,
    pub school_id: Uuid,
    pub book_id: Uuid,
    pub user_id: Uuid,
    pub issued_on: NaiveDate,
    pub due_on: NaiveDate,
    pub returned_on: Option<NaiveDate>,
    pub fine: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_issue_dates"))]
pub struct IssueBookDto {
    pub book_id: Uuid,
    /// Borrower; any member of the school
    pub user_id: Uuid,
    /// Defaults to today
    pub issued_on: Option<NaiveDate>,
    /// Defaults to the issue date plus the configured loan period
    pub due_on: Option<NaiveDate>,
}

fn validate_issue_dates(dto: &IssueBookDto) -> Result<(), ValidationError> {
    match (dto.issued_on, dto.due_on) {
        (Some(issued), Some(due)) if due < issued => Err(ValidationError::new("due_on")
            .with_message("Due date cannot be before the issue date".into())),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ReturnBookDto {
    /// Defaults to today
    pub returned_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IssueFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub book_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub user_id: Option<Uuid>,
    /// Only issues not yet returned
    pub open: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due_before_issue_is_rejected() {
        let dto = IssueBookDto {
            book_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            issued_on: NaiveDate::from_ymd_opt(2024, 5, 10),
            due_on: NaiveDate::from_ymd_opt(2024, 5, 1),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_book_needs_a_copy() {
        let dto = CreateBookDto {
            title: "Things Fall Apart".into(),
            author: None,
            isbn: None,
            total_copies: 0,
            school_id: None,
        };
        assert!(dto.validate().is_err());
    }
}
