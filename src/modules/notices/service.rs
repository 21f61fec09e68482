use scholaris_core::{AppError, PaginationMeta};
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::modules::classes::service::ClassService;
use crate::modules::users::model::UserRole;

use super::model::{
    CreateNewsletterDto, CreateNoticeDto, NEWSLETTER_COLUMNS, NOTICE_COLUMNS, Newsletter,
    NewsletterFilterParams, Notice, NoticeFilterParams, PaginatedNewslettersResponse,
    PaginatedNoticesResponse, UpdateNewsletterDto, UpdateNoticeDto,
};

/// Who is reading a notice list. Managers see everything in the school; other
/// readers only see notices addressed to their role and to a class they are
/// tied to (their own, a child's, or one they teach).
#[derive(Debug, Clone, Copy)]
pub struct NoticeViewer {
    pub user_id: Uuid,
    pub role: UserRole,
    pub sees_all: bool,
}

/// Audience test for a viewer bound at `$first` (sees_all), `$first + 1`
/// (role) and `$first + 2` (user id).
fn audience_clause(first: usize) -> String {
    let (role, user) = (first + 1, first + 2);
    format!(
        "(${first}::boolean
          OR ((audience_role IS NULL OR audience_role = ${role})
              AND (audience_class_id IS NULL OR audience_class_id IN (
                      SELECT class_id FROM users
                      WHERE (id = ${user} OR parent_id = ${user}) AND class_id IS NOT NULL
                      UNION
                      SELECT class_id FROM subjects WHERE teacher_id = ${user}))))"
    )
}

pub struct NoticeService;

impl NoticeService {
    /// Inserts a notice on an existing connection so broadcasts can share
    /// their transaction.
    pub async fn insert_notice(
        conn: &mut PgConnection,
        school_id: Uuid,
        created_by: Uuid,
        dto: &CreateNoticeDto,
    ) -> Result<Notice, AppError> {
        let notice = sqlx::query_as::<_, Notice>(&format!(
            "INSERT INTO notices (school_id, title, body, audience_role, audience_class_id, created_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {NOTICE_COLUMNS}"
        ))
        .bind(school_id)
        .bind(dto.title.trim())
        .bind(&dto.body)
        .bind(dto.audience_role)
        .bind(dto.audience_class_id)
        .bind(created_by)
        .fetch_one(conn)
        .await?;
        Ok(notice)
    }

    #[instrument(skip(db, dto), fields(db.table = "notices"))]
    pub async fn create_notice(
        db: &PgPool,
        school_id: Uuid,
        created_by: Uuid,
        dto: CreateNoticeDto,
    ) -> Result<Notice, AppError> {
        if let Some(class_id) = dto.audience_class_id {
            ClassService::get_class(db, class_id, Some(school_id))
                .await
                .map_err(|_| AppError::bad_request(anyhow::anyhow!("Class not found in this school")))?;
        }

        let mut conn = db.acquire().await?;
        let notice = Self::insert_notice(&mut conn, school_id, created_by, &dto).await?;
        info!(notice.id = %notice.id, "Notice published");
        Ok(notice)
    }

    pub async fn list_notices(
        db: &PgPool,
        school_id: Uuid,
        viewer: NoticeViewer,
        filters: &NoticeFilterParams,
    ) -> Result<PaginatedNoticesResponse, AppError> {
        let filter = format!("WHERE school_id = $1 AND {}", audience_clause(2));
        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM notices {filter}"))
        .bind(school_id)
        .bind(viewer.sees_all)
        .bind(viewer.role)
        .bind(viewer.user_id)
        .fetch_one(db)
        .await?;

        let data = sqlx::query_as::<_, Notice>(&format!(
            "SELECT {NOTICE_COLUMNS} FROM notices {filter}
             ORDER BY created_at DESC
             LIMIT $5 OFFSET $6"
        ))
        .bind(school_id)
        .bind(viewer.sees_all)
        .bind(viewer.role)
        .bind(viewer.user_id)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(PaginatedNoticesResponse {
            data,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    /// A notice outside the viewer's audience reads as not found.
    pub async fn get_notice(
        db: &PgPool,
        id: Uuid,
        scope: Option<Uuid>,
        viewer: NoticeViewer,
    ) -> Result<Notice, AppError> {
        sqlx::query_as::<_, Notice>(&format!(
            "SELECT {NOTICE_COLUMNS} FROM notices
             WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2) AND {}",
            audience_clause(3)
        ))
        .bind(id)
        .bind(scope)
        .bind(viewer.sees_all)
        .bind(viewer.role)
        .bind(viewer.user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Notice not found")))
    }

    pub async fn update_notice(
        db: &PgPool,
        id: Uuid,
        scope: Option<Uuid>,
        dto: UpdateNoticeDto,
    ) -> Result<Notice, AppError> {
        sqlx::query_as::<_, Notice>(&format!(
            "UPDATE notices
             SET title = COALESCE($3, title),
                 body = COALESCE($4, body),
                 updated_at = NOW()
             WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)
             RETURNING {NOTICE_COLUMNS}"
        ))
        .bind(id)
        .bind(scope)
        .bind(dto.title.as_deref().map(str::trim))
        .bind(&dto.body)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Notice not found")))
    }

    pub async fn delete_notice(db: &PgPool, id: Uuid, scope: Option<Uuid>) -> Result<(), AppError> {
        let result =
            sqlx::query("DELETE FROM notices WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)")
                .bind(id)
                .bind(scope)
                .execute(db)
                .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Notice not found")));
        }
        Ok(())
    }
}

pub struct NewsletterService;

impl NewsletterService {
    #[instrument(skip(db, dto), fields(db.table = "newsletters"))]
    pub async fn create_newsletter(
        db: &PgPool,
        school_id: Uuid,
        created_by: Uuid,
        dto: CreateNewsletterDto,
    ) -> Result<Newsletter, AppError> {
        let newsletter = sqlx::query_as::<_, Newsletter>(&format!(
            "INSERT INTO newsletters (school_id, title, summary, file_url, published_on, created_by)
             VALUES ($1, $2, $3, $4, COALESCE($5, CURRENT_DATE), $6)
             RETURNING {NEWSLETTER_COLUMNS}"
        ))
        .bind(school_id)
        .bind(dto.title.trim())
        .bind(&dto.summary)
        .bind(&dto.file_url)
        .bind(dto.published_on)
        .bind(created_by)
        .fetch_one(db)
        .await?;

        info!(newsletter.id = %newsletter.id, "Newsletter published");
        Ok(newsletter)
    }

    pub async fn list_newsletters(
        db: &PgPool,
        school_id: Uuid,
        filters: &NewsletterFilterParams,
    ) -> Result<PaginatedNewslettersResponse, AppError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM newsletters WHERE school_id = $1")
            .bind(school_id)
            .fetch_one(db)
            .await?;

        let data = sqlx::query_as::<_, Newsletter>(&format!(
            "SELECT {NEWSLETTER_COLUMNS} FROM newsletters
             WHERE school_id = $1
             ORDER BY published_on DESC, created_at DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(school_id)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(PaginatedNewslettersResponse {
            data,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    pub async fn get_newsletter(
        db: &PgPool,
        id: Uuid,
        scope: Option<Uuid>,
    ) -> Result<Newsletter, AppError> {
        sqlx::query_as::<_, Newsletter>(&format!(
            "SELECT {NEWSLETTER_COLUMNS} FROM newsletters
             WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)"
        ))
        .bind(id)
        .bind(scope)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Newsletter not found")))
    }

    pub async fn update_newsletter(
        db: &PgPool,
        id: Uuid,
        scope: Option<Uuid>,
        dto: UpdateNewsletterDto,
    ) -> Result<Newsletter, AppError> {
        sqlx::query_as::<_, Newsletter>(&format!(
            "UPDATE newsletters
             SET title = COALESCE($3, title),
                 summary = COALESCE($4, summary),
                 file_url = COALESCE($5, file_url),
                 published_on = COALESCE($6, published_on),
                 updated_at = NOW()
             WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)
             RETURNING {NEWSLETTER_COLUMNS}"
        ))
        .bind(id)
        .bind(scope)
        .bind(dto.title.as_deref().map(str::trim))
        .bind(&dto.summary)
        .bind(&dto.file_url)
        .bind(dto.published_on)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Newsletter not found")))
    }

    pub async fn delete_newsletter(
        db: &PgPool,
        id: Uuid,
        scope: Option<Uuid>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "DELETE FROM newsletters WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)",
        )
        .bind(id)
        .bind(scope)
        .execute(db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Newsletter not found")));
        }
        Ok(())
    }
}
