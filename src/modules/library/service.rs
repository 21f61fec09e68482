use chrono::{Duration, Utc};
use scholaris_config::LibraryConfig;
use scholaris_core::{AppError, PaginationMeta};
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::modules::users::service::UserService;

use super::fines::fine_for;
use super::model::{
    BOOK_COLUMNS, Book, BookFilterParams, BookIssue, CreateBookDto, ISSUE_COLUMNS,
    IssueBookDto, IssueFilterParams, PaginatedBooksResponse, ReturnBookDto, UpdateBookDto,
};

pub struct LibraryService;

impl LibraryService {
    #[instrument(skip(db, dto), fields(book.title = %dto.title, db.table = "books"))]
    pub async fn create_book(
        db: &PgPool,
        school_id: Uuid,
        dto: CreateBookDto,
    ) -> Result<Book, AppError> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "INSERT INTO books (school_id, title, author, isbn, total_copies, available_copies)
             VALUES ($1, $2, $3, $4, $5, $5)
             RETURNING {BOOK_COLUMNS}"
        ))
        .bind(school_id)
        .bind(dto.title.trim())
        .bind(&dto.author)
        .bind(&dto.isbn)
        .bind(dto.total_copies)
        .fetch_one(db)
        .await?;

        info!(book.id = %book.id, "Book added");
        Ok(book)
    }

    pub async fn list_books(
        db: &PgPool,
        school_id: Uuid,
        filters: &BookFilterParams,
    ) -> Result<PaginatedBooksResponse, AppError> {
        let search = filters.search.as_deref().map(|s| format!("%{}%", s.trim()));
        let where_clause = "WHERE school_id = $1
               AND ($2::text IS NULL OR title ILIKE $2 OR author ILIKE $2 OR isbn ILIKE $2)";

        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM books {where_clause}"))
            .bind(school_id)
            .bind(&search)
            .fetch_one(db)
            .await?;

        let data = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books {where_clause}
             ORDER BY title
             LIMIT $3 OFFSET $4"
        ))
        .bind(school_id)
        .bind(&search)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(PaginatedBooksResponse {
            data,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    pub async fn get_book(db: &PgPool, id: Uuid, scope: Option<Uuid>) -> Result<Book, AppError> {
        sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)"
        ))
        .bind(id)
        .bind(scope)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Book not found")))
    }

    /// Copies on loan stay on loan: the total can shrink only down to the
    /// number currently issued.
    #[instrument(skip(db, dto))]
    pub async fn update_book(
        db: &PgPool,
        id: Uuid,
        scope: Option<Uuid>,
        dto: UpdateBookDto,
    ) -> Result<Book, AppError> {
        let mut tx = db.begin().await?;

        let current = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books
             WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)
             FOR UPDATE"
        ))
        .bind(id)
        .bind(scope)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Book not found")))?;

        let on_loan = current.total_copies - current.available_copies;
        let total = dto.total_copies.unwrap_or(current.total_copies);
        if total < on_loan {
            return Err(AppError::conflict(anyhow::anyhow!(
                "{on_loan} copies are on loan; total cannot drop below that"
            )));
        }

        let book = sqlx::query_as::<_, Book>(&format!(
            "UPDATE books
             SET title = COALESCE($2, title),
                 author = COALESCE($3, author),
                 isbn = COALESCE($4, isbn),
                 total_copies = $5,
                 available_copies = $6,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {BOOK_COLUMNS}"
        ))
        .bind(id)
        .bind(dto.title.as_deref().map(str::trim))
        .bind(&dto.author)
        .bind(&dto.isbn)
        .bind(total)
        .bind(total - on_loan)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(book)
    }

    pub async fn delete_book(db: &PgPool, id: Uuid, scope: Option<Uuid>) -> Result<(), AppError> {
        let book = Self::get_book(db, id, scope).await?;
        if book.available_copies < book.total_copies {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Book has copies on loan and cannot be deleted"
            )));
        }
        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(book.id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Lends one copy. The book row is locked so two concurrent issues of
    /// the last copy cannot both succeed.
    #[instrument(skip(db, config, dto), fields(book.id = %dto.book_id, user.id = %dto.user_id))]
    pub async fn issue_book(
        db: &PgPool,
        school_id: Uuid,
        config: &LibraryConfig,
        dto: IssueBookDto,
    ) -> Result<BookIssue, AppError> {
        UserService::get_user(db, dto.user_id, Some(school_id), None)
            .await
            .map_err(|_| AppError::bad_request(anyhow::anyhow!("Borrower not found in this school")))?;

        let issued_on = dto.issued_on.unwrap_or_else(|| Utc::now().date_naive());
        let due_on = dto
            .due_on
            .unwrap_or_else(|| issued_on + Duration::days(config.loan_days));

        let mut tx = db.begin().await?;

        let available = sqlx::query_scalar::<_, i32>(
            "SELECT available_copies FROM books WHERE id = $1 AND school_id = $2 FOR UPDATE",
        )
        .bind(dto.book_id)
        .bind(school_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Book not found")))?;

        if available <= 0 {
            warn!("No copies available");
            return Err(AppError::conflict(anyhow::anyhow!("No copies of this book are available")));
        }

        sqlx::query(
            "UPDATE books SET available_copies = available_copies - 1, updated_at = NOW() WHERE id = $1",
        )
        .bind(dto.book_id)
        .execute(&mut *tx)
        .await?;

        let issue = sqlx::query_as::<_, BookIssue>(&format!(
            "INSERT INTO book_issues (school_id, book_id, user_id, issued_on, due_on)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {ISSUE_COLUMNS}"
        ))
        .bind(school_id)
        .bind(dto.book_id)
        .bind(dto.user_id)
        .bind(issued_on)
        .bind(due_on)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(issue.id = %issue.id, due_on = %issue.due_on, "Book issued");
        Ok(issue)
    }

    #[instrument(skip(db, config, dto))]
    pub async fn return_book(
        db: &PgPool,
        issue_id: Uuid,
        scope: Option<Uuid>,
        config: &LibraryConfig,
        dto: ReturnBookDto,
    ) -> Result<BookIssue, AppError> {
        let mut tx = db.begin().await?;

        let issue = sqlx::query_as::<_, BookIssue>(&format!(
            "SELECT {ISSUE_COLUMNS} FROM book_issues
             WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)
             FOR UPDATE"
        ))
        .bind(issue_id)
        .bind(scope)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Issue not found")))?;

        if issue.returned_on.is_some() {
            return Err(AppError::conflict(anyhow::anyhow!("Book has already been returned")));
        }

        let returned_on = dto.returned_on.unwrap_or_else(|| Utc::now().date_naive());
        if returned_on < issue.issued_on {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Return date cannot be before the issue date"
            )));
        }
        let fine = fine_for(issue.due_on, returned_on, config.fine_per_day);

        let returned = sqlx::query_as::<_, BookIssue>(&format!(
            "UPDATE book_issues SET returned_on = $2, fine = $3
             WHERE id = $1
             RETURNING {ISSUE_COLUMNS}"
        ))
        .bind(issue.id)
        .bind(returned_on)
        .bind(fine)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE books SET available_copies = available_copies + 1, updated_at = NOW() WHERE id = $1",
        )
        .bind(issue.book_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(issue.id = %returned.id, fine, "Book returned");
        Ok(returned)
    }

    pub async fn list_issues(
        db: &PgPool,
        school_id: Uuid,
        filters: &IssueFilterParams,
    ) -> Result<Vec<BookIssue>, AppError> {
        let issues = sqlx::query_as::<_, BookIssue>(&format!(
            "SELECT {ISSUE_COLUMNS} FROM book_issues
             WHERE school_id = $1
               AND ($2::uuid IS NULL OR book_id = $2)
               AND ($3::uuid IS NULL OR user_id = $3)
               AND (NOT COALESCE($4, false) OR returned_on IS NULL)
             ORDER BY issued_on DESC, created_at DESC"
        ))
        .bind(school_id)
        .bind(filters.book_id)
        .bind(filters.user_id)
        .bind(filters.open)
        .fetch_all(db)
        .await?;
        Ok(issues)
    }
}
