use scholaris_core::{AppError, PaginationMeta};
use sqlx::PgPool;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::modules::users::model::UserRole;
use crate::modules::users::service::UserService;

use super::model::{
    Class, ClassFilterParams, ClassWithStats, CreateClassDto, CreateSubjectDto,
    PaginatedClassesResponse, Section, SectionDto, Subject, SubjectFilterParams, UpdateClassDto,
    UpdateSubjectDto,
};

const CLASS_COLUMNS: &str = "id, school_id, name, description, created_at, updated_at";
const SUBJECT_COLUMNS: &str =
    "id, school_id, name, code, class_id, teacher_id, created_at, updated_at";

fn map_duplicate(e: sqlx::Error, what: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        return AppError::conflict(anyhow::anyhow!("{} already exists", what));
    }
    error!(error = %e, "Database error writing {}", what.to_lowercase());
    AppError::database(e)
}

pub struct ClassService;

impl ClassService {
    #[instrument(skip(db, dto), fields(class.name = %dto.name, db.table = "classes"))]
    pub async fn create_class(
        db: &PgPool,
        school_id: Uuid,
        dto: CreateClassDto,
    ) -> Result<Class, AppError> {
        let class = sqlx::query_as::<_, Class>(&format!(
            "INSERT INTO classes (school_id, name, description) VALUES ($1, $2, $3)
             RETURNING {CLASS_COLUMNS}"
        ))
        .bind(school_id)
        .bind(dto.name.trim())
        .bind(&dto.description)
        .fetch_one(db)
        .await
        .map_err(|e| map_duplicate(e, "Class"))?;

        info!(class.id = %class.id, "Class created");
        Ok(class)
    }

    #[instrument(skip(db, filters), fields(db.table = "classes"))]
    pub async fn list_classes(
        db: &PgPool,
        school_id: Uuid,
        filters: &ClassFilterParams,
    ) -> Result<PaginatedClassesResponse, AppError> {
        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM classes WHERE school_id = $1")
                .bind(school_id)
                .fetch_one(db)
                .await?;

        let classes = sqlx::query_as::<_, ClassWithStats>(
            "SELECT c.id, c.school_id, c.name, c.description, c.created_at, c.updated_at,
                    (SELECT COUNT(*) FROM sections s WHERE s.class_id = c.id) AS section_count,
                    (SELECT COUNT(*) FROM users u WHERE u.class_id = c.id AND u.role = 'student') AS student_count
             FROM classes c
             WHERE c.school_id = $1
             ORDER BY c.name
             LIMIT $2 OFFSET $3",
        )
        .bind(school_id)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(PaginatedClassesResponse {
            data: classes,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db), fields(db.table = "classes"))]
    pub async fn get_class(db: &PgPool, id: Uuid, scope: Option<Uuid>) -> Result<Class, AppError> {
        sqlx::query_as::<_, Class>(&format!(
            "SELECT {CLASS_COLUMNS} FROM classes
             WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)"
        ))
        .bind(id)
        .bind(scope)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Class not found")))
    }

    #[instrument(skip(db, dto), fields(db.table = "classes"))]
    pub async fn update_class(
        db: &PgPool,
        id: Uuid,
        scope: Option<Uuid>,
        dto: UpdateClassDto,
    ) -> Result<Class, AppError> {
        sqlx::query_as::<_, Class>(&format!(
            "UPDATE classes SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                updated_at = NOW()
             WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)
             RETURNING {CLASS_COLUMNS}"
        ))
        .bind(id)
        .bind(scope)
        .bind(dto.name.as_deref().map(str::trim))
        .bind(&dto.description)
        .fetch_optional(db)
        .await
        .map_err(|e| map_duplicate(e, "Class"))?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Class not found")))
    }

    #[instrument(skip(db), fields(db.table = "classes"))]
    pub async fn delete_class(db: &PgPool, id: Uuid, scope: Option<Uuid>) -> Result<(), AppError> {
        let result =
            sqlx::query("DELETE FROM classes WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)")
                .bind(id)
                .bind(scope)
                .execute(db)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Class not found")));
        }
        info!(class.id = %id, "Class deleted");
        Ok(())
    }

    // Sections

    pub async fn create_section(
        db: &PgPool,
        class_id: Uuid,
        scope: Option<Uuid>,
        dto: SectionDto,
    ) -> Result<Section, AppError> {
        Self::get_class(db, class_id, scope).await?;

        sqlx::query_as::<_, Section>(
            "INSERT INTO sections (class_id, name) VALUES ($1, $2)
             RETURNING id, class_id, name, created_at",
        )
        .bind(class_id)
        .bind(dto.name.trim())
        .fetch_one(db)
        .await
        .map_err(|e| map_duplicate(e, "Section"))
    }

    pub async fn list_sections(
        db: &PgPool,
        class_id: Uuid,
        scope: Option<Uuid>,
    ) -> Result<Vec<Section>, AppError> {
        Self::get_class(db, class_id, scope).await?;

        let sections = sqlx::query_as::<_, Section>(
            "SELECT id, class_id, name, created_at FROM sections WHERE class_id = $1 ORDER BY name",
        )
        .bind(class_id)
        .fetch_all(db)
        .await?;
        Ok(sections)
    }

    pub async fn update_section(
        db: &PgPool,
        section_id: Uuid,
        scope: Option<Uuid>,
        dto: SectionDto,
    ) -> Result<Section, AppError> {
        sqlx::query_as::<_, Section>(
            "UPDATE sections s SET name = $3
             FROM classes c
             WHERE s.id = $1 AND c.id = s.class_id AND ($2::uuid IS NULL OR c.school_id = $2)
             RETURNING s.id, s.class_id, s.name, s.created_at",
        )
        .bind(section_id)
        .bind(scope)
        .bind(dto.name.trim())
        .fetch_optional(db)
        .await
        .map_err(|e| map_duplicate(e, "Section"))?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Section not found")))
    }

    pub async fn delete_section(
        db: &PgPool,
        section_id: Uuid,
        scope: Option<Uuid>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "DELETE FROM sections s USING classes c
             WHERE s.id = $1 AND c.id = s.class_id AND ($2::uuid IS NULL OR c.school_id = $2)",
        )
        .bind(section_id)
        .bind(scope)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Section not found")));
        }
        Ok(())
    }
}

pub struct SubjectService;

impl SubjectService {
    async fn verify_references(
        db: &PgPool,
        school_id: Uuid,
        class_id: Option<Uuid>,
        teacher_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        if let Some(class_id) = class_id {
            ClassService::get_class(db, class_id, Some(school_id))
                .await
                .map_err(|_| AppError::bad_request(anyhow::anyhow!("Class not found in this school")))?;
        }
        if let Some(teacher_id) = teacher_id {
            UserService::ensure_member(db, teacher_id, school_id, UserRole::Teacher).await?;
        }
        Ok(())
    }

    #[instrument(skip(db, dto), fields(subject.name = %dto.name, db.table = "subjects"))]
    pub async fn create_subject(
        db: &PgPool,
        school_id: Uuid,
        dto: CreateSubjectDto,
    ) -> Result<Subject, AppError> {
        Self::verify_references(db, school_id, dto.class_id, dto.teacher_id).await?;

        let subject = sqlx::query_as::<_, Subject>(&format!(
            "INSERT INTO subjects (school_id, name, code, class_id, teacher_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {SUBJECT_COLUMNS}"
        ))
        .bind(school_id)
        .bind(dto.name.trim())
        .bind(&dto.code)
        .bind(dto.class_id)
        .bind(dto.teacher_id)
        .fetch_one(db)
        .await?;

        info!(subject.id = %subject.id, "Subject created");
        Ok(subject)
    }

    pub async fn list_subjects(
        db: &PgPool,
        school_id: Uuid,
        filters: &SubjectFilterParams,
    ) -> Result<Vec<Subject>, AppError> {
        let subjects = sqlx::query_as::<_, Subject>(&format!(
            "SELECT {SUBJECT_COLUMNS} FROM subjects
             WHERE school_id = $1
               AND ($2::uuid IS NULL OR class_id = $2)
               AND ($3::uuid IS NULL OR teacher_id = $3)
             ORDER BY name"
        ))
        .bind(school_id)
        .bind(filters.class_id)
        .bind(filters.teacher_id)
        .fetch_all(db)
        .await?;
        Ok(subjects)
    }

    pub async fn get_subject(
        db: &PgPool,
        id: Uuid,
        scope: Option<Uuid>,
    ) -> Result<Subject, AppError> {
        sqlx::query_as::<_, Subject>(&format!(
            "SELECT {SUBJECT_COLUMNS} FROM subjects
             WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)"
        ))
        .bind(id)
        .bind(scope)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Subject not found")))
    }

    pub async fn update_subject(
        db: &PgPool,
        id: Uuid,
        scope: Option<Uuid>,
        dto: UpdateSubjectDto,
    ) -> Result<Subject, AppError> {
        let existing = Self::get_subject(db, id, scope).await?;
        Self::verify_references(db, existing.school_id, dto.class_id, dto.teacher_id).await?;

        let subject = sqlx::query_as::<_, Subject>(&format!(
            "UPDATE subjects SET
                name = COALESCE($2, name),
                code = COALESCE($3, code),
                class_id = COALESCE($4, class_id),
                teacher_id = COALESCE($5, teacher_id),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {SUBJECT_COLUMNS}"
        ))
        .bind(id)
        .bind(dto.name.as_deref().map(str::trim))
        .bind(&dto.code)
        .bind(dto.class_id)
        .bind(dto.teacher_id)
        .fetch_one(db)
        .await?;
        Ok(subject)
    }

    pub async fn delete_subject(db: &PgPool, id: Uuid, scope: Option<Uuid>) -> Result<(), AppError> {
        let result = sqlx::query(
            "DELETE FROM subjects WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)",
        )
        .bind(id)
        .bind(scope)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Subject not found")));
        }
        Ok(())
    }

    /// Points the given subjects at `teacher_id`. Subjects outside the
    /// teacher's school are ignored.
    pub async fn assign_teacher(
        db: &PgPool,
        teacher_id: Uuid,
        school_id: Uuid,
        subject_ids: &[Uuid],
    ) -> Result<Vec<Subject>, AppError> {
        UserService::ensure_member(db, teacher_id, school_id, UserRole::Teacher).await?;

        let subjects = sqlx::query_as::<_, Subject>(&format!(
            "UPDATE subjects SET teacher_id = $1, updated_at = NOW()
             WHERE school_id = $2 AND id = ANY($3)
             RETURNING {SUBJECT_COLUMNS}"
        ))
        .bind(teacher_id)
        .bind(school_id)
        .bind(subject_ids)
        .fetch_all(db)
        .await?;

        info!(teacher.id = %teacher_id, assigned = subjects.len(), "Subjects assigned");
        Ok(subjects)
    }
}
