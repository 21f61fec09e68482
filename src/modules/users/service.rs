use scholaris_core::{AppError, PaginationMeta, hash_password};
use sqlx::PgPool;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::metrics;
use crate::modules::users::model::{
    CreateUserDto, PaginatedUsersResponse, USER_COLUMNS, UpdateUserDto, User, UserFilterParams,
    UserRole,
};

pub struct UserService;

/// Row used by login and password change; the only place the hash is read.
#[derive(Debug, sqlx::FromRow)]
pub struct UserCredentials {
    pub id: Uuid,
    pub password: String,
}

fn map_unique_violation(e: sqlx::Error, email: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        warn!(user.email = %email, "Attempted to use an existing email");
        return AppError::conflict(anyhow::anyhow!("Email already exists"));
    }
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_foreign_key_violation()
    {
        return AppError::bad_request(anyhow::anyhow!("Referenced class, section or parent does not exist"));
    }
    error!(error = %e, "Database error writing user");
    AppError::database(e)
}

impl UserService {
    /// Checks that a parent link points at a parent account of the same school.
    async fn verify_parent(db: &PgPool, parent_id: Uuid, school_id: Uuid) -> Result<(), AppError> {
        let role = sqlx::query_scalar::<_, UserRole>(
            "SELECT role FROM users WHERE id = $1 AND school_id = $2",
        )
        .bind(parent_id)
        .bind(school_id)
        .fetch_optional(db)
        .await?;

        match role {
            Some(UserRole::Parent) => Ok(()),
            Some(_) => Err(AppError::bad_request(anyhow::anyhow!(
                "parent_id must reference a parent account"
            ))),
            None => Err(AppError::bad_request(anyhow::anyhow!("Parent not found in this school"))),
        }
    }

    /// Checks that class and section belong to the school and to each other.
    async fn verify_placement(
        db: &PgPool,
        school_id: Uuid,
        class_id: Option<Uuid>,
        section_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        if let Some(class_id) = class_id {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM classes WHERE id = $1 AND school_id = $2)",
            )
            .bind(class_id)
            .bind(school_id)
            .fetch_one(db)
            .await?;
            if !exists {
                return Err(AppError::bad_request(anyhow::anyhow!("Class not found in this school")));
            }
        }

        if let Some(section_id) = section_id {
            let section_class = sqlx::query_scalar::<_, Uuid>(
                "SELECT s.class_id FROM sections s JOIN classes c ON c.id = s.class_id
                 WHERE s.id = $1 AND c.school_id = $2",
            )
            .bind(section_id)
            .bind(school_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::bad_request(anyhow::anyhow!("Section not found in this school")))?;

            if class_id.is_some_and(|c| c != section_class) {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "Section does not belong to the given class"
                )));
            }
        }

        Ok(())
    }

    #[instrument(skip(db, dto), fields(user.email = %dto.email, user.role = %dto.role, db.table = "users"))]
    pub async fn create_user(
        db: &PgPool,
        school_id: Uuid,
        dto: CreateUserDto,
    ) -> Result<User, AppError> {
        if dto.role == UserRole::Admin {
            return Err(AppError::forbidden(
                "System admins can only be created from the CLI",
            ));
        }

        let is_student = dto.role == UserRole::Student;
        let (class_id, section_id, roll_number, parent_id) = if is_student {
            (dto.class_id, dto.section_id, dto.roll_number.clone(), dto.parent_id)
        } else {
            (None, None, None, None)
        };

        Self::verify_placement(db, school_id, class_id, section_id).await?;
        if let Some(parent_id) = parent_id {
            Self::verify_parent(db, parent_id, school_id).await?;
        }

        let hashed = hash_password(&dto.password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (first_name, last_name, email, password, role, school_id, phone,
                                class_id, section_id, roll_number, parent_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&dto.first_name)
        .bind(&dto.last_name)
        .bind(dto.email.to_lowercase())
        .bind(&hashed)
        .bind(dto.role)
        .bind(school_id)
        .bind(&dto.phone)
        .bind(class_id)
        .bind(section_id)
        .bind(&roll_number)
        .bind(parent_id)
        .fetch_one(db)
        .await
        .map_err(|e| map_unique_violation(e, &dto.email))?;

        metrics::track_user_created(user.role.as_str());
        info!(user.id = %user.id, school.id = %school_id, "User created");

        Ok(user)
    }

    #[instrument(skip(db, filters), fields(db.table = "users"))]
    pub async fn list_users(
        db: &PgPool,
        school_id: Option<Uuid>,
        role: Option<UserRole>,
        filters: &UserFilterParams,
    ) -> Result<PaginatedUsersResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();
        let role = role.or(filters.role);
        let search = filters
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        const WHERE: &str = "WHERE ($1::uuid IS NULL OR school_id = $1)
               AND ($2::user_role IS NULL OR role = $2)
               AND ($3::uuid IS NULL OR class_id = $3)
               AND ($4::uuid IS NULL OR section_id = $4)
               AND ($5::text IS NULL OR first_name || ' ' || last_name ILIKE $5 OR email ILIKE $5)";

        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM users {WHERE}"))
            .bind(school_id)
            .bind(role)
            .bind(filters.class_id)
            .bind(filters.section_id)
            .bind(&search)
            .fetch_one(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Database error counting users");
                AppError::database(e)
            })?;

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users {WHERE}
             ORDER BY last_name, first_name LIMIT $6 OFFSET $7"
        ))
        .bind(school_id)
        .bind(role)
        .bind(filters.class_id)
        .bind(filters.section_id)
        .bind(&search)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;

        debug!(total, returned = users.len(), "Users fetched");

        Ok(PaginatedUsersResponse {
            data: users,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    /// Loads a user inside `scope`, optionally requiring a role.
    #[instrument(skip(db), fields(db.table = "users"))]
    pub async fn get_user(
        db: &PgPool,
        id: Uuid,
        scope: Option<Uuid>,
        role: Option<UserRole>,
    ) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)
               AND ($3::user_role IS NULL OR role = $3)"
        ))
        .bind(id)
        .bind(scope)
        .bind(role)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| {
            let what = role.map(|r| r.as_str()).unwrap_or("user");
            AppError::not_found(anyhow::anyhow!("{} not found", capitalize(what)))
        })
    }

    #[instrument(skip(db, dto), fields(db.table = "users"))]
    pub async fn update_user(
        db: &PgPool,
        id: Uuid,
        scope: Option<Uuid>,
        role: Option<UserRole>,
        dto: UpdateUserDto,
    ) -> Result<User, AppError> {
        let existing = Self::get_user(db, id, scope, role).await?;

        if existing.role == UserRole::Student {
            if let Some(school_id) = existing.school_id {
                let class_id = dto.class_id.or(existing.class_id);
                let section_id = dto.section_id.or(existing.section_id);
                Self::verify_placement(db, school_id, class_id, section_id).await?;
                if let Some(parent_id) = dto.parent_id {
                    Self::verify_parent(db, parent_id, school_id).await?;
                }
            }
        } else if dto.class_id.is_some() || dto.section_id.is_some() || dto.parent_id.is_some() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Only students can be placed in a class or linked to a parent"
            )));
        }

        let email = dto.email.as_deref().map(str::to_lowercase);
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                class_id = COALESCE($6, class_id),
                section_id = COALESCE($7, section_id),
                roll_number = COALESCE($8, roll_number),
                parent_id = COALESCE($9, parent_id),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&dto.first_name)
        .bind(&dto.last_name)
        .bind(&email)
        .bind(&dto.phone)
        .bind(dto.class_id)
        .bind(dto.section_id)
        .bind(&dto.roll_number)
        .bind(dto.parent_id)
        .fetch_one(db)
        .await
        .map_err(|e| map_unique_violation(e, email.as_deref().unwrap_or(&existing.email)))?;

        info!(user.id = %id, "User updated");
        Ok(user)
    }

    #[instrument(skip(db), fields(db.table = "users"))]
    pub async fn delete_user(
        db: &PgPool,
        id: Uuid,
        scope: Option<Uuid>,
        role: Option<UserRole>,
    ) -> Result<User, AppError> {
        let existing = Self::get_user(db, id, scope, role).await?;

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        info!(user.id = %id, "User deleted");
        Ok(existing)
    }

    /// Loads a user that must hold `role` in `school_id`; used to validate
    /// references such as a subject's teacher or a hostel resident.
    pub async fn ensure_member(
        db: &PgPool,
        user_id: Uuid,
        school_id: Uuid,
        role: UserRole,
    ) -> Result<User, AppError> {
        Self::get_user(db, user_id, Some(school_id), Some(role))
            .await
            .map_err(|e| {
                if e.status == axum::http::StatusCode::NOT_FOUND {
                    AppError::bad_request(anyhow::anyhow!(
                        "{} not found in this school",
                        capitalize(role.as_str())
                    ))
                } else {
                    e
                }
            })
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.to_lowercase())
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn credentials(db: &PgPool, user_id: Uuid) -> Result<UserCredentials, AppError> {
        sqlx::query_as::<_, UserCredentials>("SELECT id, password FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>().replace('_', " "),
        None => String::new(),
    }
}
