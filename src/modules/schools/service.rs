use scholaris_core::{AppError, PaginationMeta};
use sqlx::PgPool;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::metrics;

use super::model::{
    CreateSchoolDto, DEFAULT_GEOFENCE_RADIUS_M, PaginatedSchoolsResponse, SCHOOL_COLUMNS, School,
    SchoolFilterParams, UpdateSchoolDto,
};

pub struct SchoolService;

fn map_write_error(e: sqlx::Error, name: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        warn!(school.name = %name, "Attempted to use an existing school name");
        return AppError::conflict(anyhow::anyhow!("School name already exists"));
    }
    error!(error = %e, school.name = %name, "Database error writing school");
    AppError::database(e)
}

impl SchoolService {
    #[instrument(skip(db, dto), fields(school.name = %dto.name, db.operation = "INSERT", db.table = "schools"))]
    pub async fn create_school(db: &PgPool, dto: CreateSchoolDto) -> Result<School, AppError> {
        let school = sqlx::query_as::<_, School>(&format!(
            "INSERT INTO schools (name, address, phone, email, latitude, longitude, geofence_radius_m)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {SCHOOL_COLUMNS}"
        ))
        .bind(&dto.name)
        .bind(&dto.address)
        .bind(&dto.phone)
        .bind(&dto.email)
        .bind(dto.latitude)
        .bind(dto.longitude)
        .bind(dto.geofence_radius_m.unwrap_or(DEFAULT_GEOFENCE_RADIUS_M))
        .fetch_one(db)
        .await
        .map_err(|e| map_write_error(e, &dto.name))?;

        metrics::track_school_created();
        info!(school.id = %school.id, "School created");

        Ok(school)
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "schools"))]
    pub async fn get_all_schools(
        db: &PgPool,
        filters: SchoolFilterParams,
    ) -> Result<PaginatedSchoolsResponse, AppError> {
        let name = filters.name.as_deref().map(|n| format!("%{}%", n.trim()));

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM schools WHERE ($1::text IS NULL OR name ILIKE $1)",
        )
        .bind(&name)
        .fetch_one(db)
        .await?;

        let schools = sqlx::query_as::<_, School>(&format!(
            "SELECT {SCHOOL_COLUMNS} FROM schools
             WHERE ($1::text IS NULL OR name ILIKE $1)
             ORDER BY name LIMIT $2 OFFSET $3"
        ))
        .bind(&name)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await?;

        debug!(total, returned = schools.len(), "Schools fetched");

        Ok(PaginatedSchoolsResponse {
            data: schools,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "schools"))]
    pub async fn get_school_by_id(db: &PgPool, school_id: Uuid) -> Result<School, AppError> {
        sqlx::query_as::<_, School>(&format!("SELECT {SCHOOL_COLUMNS} FROM schools WHERE id = $1"))
            .bind(school_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("School not found")))
    }

    #[instrument(skip(db, dto), fields(db.operation = "UPDATE", db.table = "schools"))]
    pub async fn update_school(
        db: &PgPool,
        school_id: Uuid,
        dto: UpdateSchoolDto,
    ) -> Result<School, AppError> {
        let existing = Self::get_school_by_id(db, school_id).await?;

        // Coordinates are replaced as a pair; omitting both keeps the old pair.
        let (latitude, longitude) = match (dto.latitude, dto.longitude) {
            (Some(lat), Some(lon)) => (Some(lat), Some(lon)),
            _ => (existing.latitude, existing.longitude),
        };

        let school = sqlx::query_as::<_, School>(&format!(
            "UPDATE schools SET
                name = COALESCE($2, name),
                address = COALESCE($3, address),
                phone = COALESCE($4, phone),
                email = COALESCE($5, email),
                latitude = $6,
                longitude = $7,
                geofence_radius_m = COALESCE($8, geofence_radius_m),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {SCHOOL_COLUMNS}"
        ))
        .bind(school_id)
        .bind(&dto.name)
        .bind(&dto.address)
        .bind(&dto.phone)
        .bind(&dto.email)
        .bind(latitude)
        .bind(longitude)
        .bind(dto.geofence_radius_m)
        .fetch_one(db)
        .await
        .map_err(|e| map_write_error(e, dto.name.as_deref().unwrap_or(&existing.name)))?;

        info!(school.id = %school_id, "School updated");
        Ok(school)
    }

    #[instrument(skip(db), fields(db.operation = "DELETE", db.table = "schools"))]
    pub async fn delete_school(db: &PgPool, school_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM schools WHERE id = $1")
            .bind(school_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("School not found")));
        }

        info!(school.id = %school_id, "School deleted");
        Ok(())
    }
}
