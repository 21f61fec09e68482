use scholaris_core::{AppError, PaginationMeta};
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::modules::classes::service::{ClassService, SubjectService};

use super::model::{
    AcademicContent, CONTENT_COLUMNS, ContentFilterParams, CreateContentDto,
    PaginatedContentsResponse, UpdateContentDto,
};

pub struct ContentService;

impl ContentService {
    #[instrument(skip(db, dto), fields(content.kind = ?dto.kind, db.table = "academic_contents"))]
    pub async fn create_content(
        db: &PgPool,
        school_id: Uuid,
        created_by: Uuid,
        dto: CreateContentDto,
    ) -> Result<AcademicContent, AppError> {
        if let Some(class_id) = dto.class_id {
            ClassService::get_class(db, class_id, Some(school_id))
                .await
                .map_err(|_| AppError::bad_request(anyhow::anyhow!("Class not found in this school")))?;
        }
        if let Some(subject_id) = dto.subject_id {
            SubjectService::get_subject(db, subject_id, Some(school_id))
                .await
                .map_err(|_| AppError::bad_request(anyhow::anyhow!("Subject not found in this school")))?;
        }

        let content = sqlx::query_as::<_, AcademicContent>(&format!(
            "INSERT INTO academic_contents
                (school_id, kind, title, body, class_id, subject_id, attachment_url, due_date, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {CONTENT_COLUMNS}"
        ))
        .bind(school_id)
        .bind(dto.kind)
        .bind(dto.title.trim())
        .bind(&dto.body)
        .bind(dto.class_id)
        .bind(dto.subject_id)
        .bind(&dto.attachment_url)
        .bind(dto.due_date)
        .bind(created_by)
        .fetch_one(db)
        .await?;

        info!(content.id = %content.id, "Academic content created");
        Ok(content)
    }

    pub async fn list_contents(
        db: &PgPool,
        school_id: Uuid,
        filters: &ContentFilterParams,
    ) -> Result<PaginatedContentsResponse, AppError> {
        let where_clause = "WHERE school_id = $1
               AND ($2::content_kind IS NULL OR kind = $2)
               AND ($3::uuid IS NULL OR class_id = $3)
               AND ($4::uuid IS NULL OR subject_id = $4)";

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM academic_contents {where_clause}"
        ))
        .bind(school_id)
        .bind(filters.kind)
        .bind(filters.class_id)
        .bind(filters.subject_id)
        .fetch_one(db)
        .await?;

        let data = sqlx::query_as::<_, AcademicContent>(&format!(
            "SELECT {CONTENT_COLUMNS} FROM academic_contents {where_clause}
             ORDER BY created_at DESC
             LIMIT $5 OFFSET $6"
        ))
        .bind(school_id)
        .bind(filters.kind)
        .bind(filters.class_id)
        .bind(filters.subject_id)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(PaginatedContentsResponse {
            data,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    pub async fn get_content(
        db: &PgPool,
        id: Uuid,
        scope: Option<Uuid>,
    ) -> Result<AcademicContent, AppError> {
        sqlx::query_as::<_, AcademicContent>(&format!(
            "SELECT {CONTENT_COLUMNS} FROM academic_contents
             WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)"
        ))
        .bind(id)
        .bind(scope)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Content not found")))
    }

    pub async fn update_content(
        db: &PgPool,
        id: Uuid,
        scope: Option<Uuid>,
        dto: UpdateContentDto,
    ) -> Result<AcademicContent, AppError> {
        sqlx::query_as::<_, AcademicContent>(&format!(
            "UPDATE academic_contents
             SET title = COALESCE($3, title),
                 body = COALESCE($4, body),
                 attachment_url = COALESCE($5, attachment_url),
                 due_date = COALESCE($6, due_date),
                 updated_at = NOW()
             WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)
             RETURNING {CONTENT_COLUMNS}"
        ))
        .bind(id)
        .bind(scope)
        .bind(dto.title.as_deref().map(str::trim))
        .bind(&dto.body)
        .bind(&dto.attachment_url)
        .bind(dto.due_date)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Content not found")))
    }

    pub async fn delete_content(db: &PgPool, id: Uuid, scope: Option<Uuid>) -> Result<(), AppError> {
        let result = sqlx::query(
            "DELETE FROM academic_contents WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)",
        )
        .bind(id)
        .bind(scope)
        .execute(db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Content not found")));
        }
        Ok(())
    }
}
