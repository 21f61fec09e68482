use chrono::{Datelike, NaiveDate, Utc};
use scholaris_core::AppError;
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::modules::users::model::UserRole;
use crate::modules::users::service::UserService;
use crate::utils::codes::random_code;

use super::model::{
    CERTIFICATE_COLUMNS, Certificate, CreateCertificateDto, SERIAL_RANDOM_LEN,
    UpdateCertificateDto,
};

const SERIAL_ATTEMPTS: usize = 3;

pub fn generate_serial(issued_on: NaiveDate) -> String {
    format!("{}-{}", issued_on.year(), random_code(SERIAL_RANDOM_LEN))
}

pub struct CertificateService;

impl CertificateService {
    /// Issues a certificate with a fresh serial, retrying on the rare
    /// collision with an existing serial of the same school.
    #[instrument(skip(db, dto), fields(student.id = %dto.student_id, db.table = "certificates"))]
    pub async fn issue(
        db: &PgPool,
        school_id: Uuid,
        dto: CreateCertificateDto,
    ) -> Result<Certificate, AppError> {
        UserService::ensure_member(db, dto.student_id, school_id, UserRole::Student).await?;
        let issued_on = dto.issued_on.unwrap_or_else(|| Utc::now().date_naive());

        for attempt in 1..=SERIAL_ATTEMPTS {
            let serial = generate_serial(issued_on);
            let inserted = sqlx::query_as::<_, Certificate>(&format!(
                "INSERT INTO certificates (school_id, student_id, title, description, serial_number, issued_on)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 RETURNING {CERTIFICATE_COLUMNS}"
            ))
            .bind(school_id)
            .bind(dto.student_id)
            .bind(dto.title.trim())
            .bind(&dto.description)
            .bind(&serial)
            .bind(issued_on)
            .fetch_one(db)
            .await;

            match inserted {
                Ok(certificate) => {
                    info!(certificate.id = %certificate.id, serial = %certificate.serial_number, "Certificate issued");
                    return Ok(certificate);
                }
                Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                    warn!(attempt, "Certificate serial collision");
                }
                Err(e) => return Err(AppError::database(e)),
            }
        }

        Err(AppError::internal(anyhow::anyhow!(
            "Could not allocate a unique certificate serial"
        )))
    }

    pub async fn list(
        db: &PgPool,
        school_id: Uuid,
        student_id: Option<Uuid>,
    ) -> Result<Vec<Certificate>, AppError> {
        let certificates = sqlx::query_as::<_, Certificate>(&format!(
            "SELECT {CERTIFICATE_COLUMNS} FROM certificates
             WHERE school_id = $1 AND ($2::uuid IS NULL OR student_id = $2)
             ORDER BY issued_on DESC, created_at DESC"
        ))
        .bind(school_id)
        .bind(student_id)
        .fetch_all(db)
        .await?;
        Ok(certificates)
    }

    pub async fn get(db: &PgPool, id: Uuid, scope: Option<Uuid>) -> Result<Certificate, AppError> {
        sqlx::query_as::<_, Certificate>(&format!(
            "SELECT {CERTIFICATE_COLUMNS} FROM certificates
             WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)"
        ))
        .bind(id)
        .bind(scope)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Certificate not found")))
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        scope: Option<Uuid>,
        dto: UpdateCertificateDto,
    ) -> Result<Certificate, AppError> {
        sqlx::query_as::<_, Certificate>(&format!(
            "UPDATE certificates
             SET title = COALESCE($3, title), description = COALESCE($4, description)
             WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)
             RETURNING {CERTIFICATE_COLUMNS}"
        ))
        .bind(id)
        .bind(scope)
        .bind(dto.title.as_deref().map(str::trim))
        .bind(&dto.description)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Certificate not found")))
    }

    pub async fn delete(db: &PgPool, id: Uuid, scope: Option<Uuid>) -> Result<(), AppError> {
        let result = sqlx::query(
            "DELETE FROM certificates WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)",
        )
        .bind(id)
        .bind(scope)
        .execute(db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Certificate not found")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_format() {
        let serial = generate_serial(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        let (year, code) = serial.split_once('-').unwrap();
        assert_eq!(year, "2024");
        assert_eq!(code.len(), SERIAL_RANDOM_LEN);
    }
}
