use std::collections::HashSet;

use scholaris_core::AppError;
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::metrics;
use crate::modules::classes::service::ClassService;
use crate::modules::schools::service::SchoolService;

use super::geofence::{self, GeofenceCheck};
use super::model::{
    ATTENDANCE_COLUMNS, AttendanceRecord, AttendanceSummary, MarkAttendanceDto, StaffCheckIn,
    SummaryCounts, SummaryParams,
};

pub struct AttendanceService;

impl AttendanceService {
    #[instrument(skip(db, dto), fields(class.id = %dto.class_id, date = %dto.date, entries = dto.entries.len()))]
    pub async fn mark(
        db: &PgPool,
        school_id: Uuid,
        marked_by: Uuid,
        dto: MarkAttendanceDto,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        ClassService::get_class(db, dto.class_id, Some(school_id)).await?;

        let student_ids: Vec<Uuid> = dto
            .entries
            .iter()
            .map(|e| e.student_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        if student_ids.len() != dto.entries.len() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Each student may appear only once per marking"
            )));
        }

        let enrolled = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users
             WHERE id = ANY($1) AND role = 'student' AND school_id = $2 AND class_id = $3",
        )
        .bind(&student_ids)
        .bind(school_id)
        .bind(dto.class_id)
        .fetch_one(db)
        .await?;

        if enrolled != student_ids.len() as i64 {
            warn!(enrolled, requested = student_ids.len(), "Attendance for students outside the class");
            return Err(AppError::bad_request(anyhow::anyhow!(
                "All students must belong to the class"
            )));
        }

        let mut tx = db.begin().await?;
        let mut records = Vec::with_capacity(dto.entries.len());
        for entry in &dto.entries {
            let record = sqlx::query_as::<_, AttendanceRecord>(&format!(
                "INSERT INTO attendance (school_id, student_id, class_id, date, status, remarks, marked_by)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 ON CONFLICT (student_id, date) DO UPDATE
                 SET status = EXCLUDED.status,
                     remarks = EXCLUDED.remarks,
                     class_id = EXCLUDED.class_id,
                     marked_by = EXCLUDED.marked_by,
                     updated_at = NOW()
                 RETURNING {ATTENDANCE_COLUMNS}"
            ))
            .bind(school_id)
            .bind(entry.student_id)
            .bind(dto.class_id)
            .bind(dto.date)
            .bind(entry.status)
            .bind(&entry.remarks)
            .bind(marked_by)
            .fetch_one(&mut *tx)
            .await?;
            records.push(record);
        }
        tx.commit().await?;

        info!(marked = records.len(), "Attendance marked");
        Ok(records)
    }

    pub async fn list(
        db: &PgPool,
        school_id: Uuid,
        class_id: Option<Uuid>,
        date: Option<chrono::NaiveDate>,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let records = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance
             WHERE school_id = $1
               AND ($2::uuid IS NULL OR class_id = $2)
               AND ($3::date IS NULL OR date = $3)
             ORDER BY date DESC, student_id"
        ))
        .bind(school_id)
        .bind(class_id)
        .bind(date)
        .fetch_all(db)
        .await?;
        Ok(records)
    }

    #[instrument(skip(db))]
    pub async fn summary(
        db: &PgPool,
        student_id: Uuid,
        params: &SummaryParams,
    ) -> Result<AttendanceSummary, AppError> {
        let counts = sqlx::query_as::<_, SummaryCounts>(
            "SELECT COUNT(*) AS total_days,
                    COUNT(*) FILTER (WHERE status = 'present') AS present,
                    COUNT(*) FILTER (WHERE status = 'absent') AS absent,
                    COUNT(*) FILTER (WHERE status = 'late') AS late,
                    COUNT(*) FILTER (WHERE status = 'excused') AS excused
             FROM attendance
             WHERE student_id = $1
               AND ($2::date IS NULL OR date >= $2)
               AND ($3::date IS NULL OR date <= $3)",
        )
        .bind(student_id)
        .bind(params.from)
        .bind(params.to)
        .fetch_one(db)
        .await?;

        Ok(AttendanceSummary::from_counts(student_id, counts))
    }

    pub async fn geofence_status(
        db: &PgPool,
        school_id: Uuid,
        latitude: f64,
        longitude: f64,
    ) -> Result<GeofenceCheck, AppError> {
        let school = SchoolService::get_school_by_id(db, school_id).await?;
        Ok(geofence::check(&school, latitude, longitude))
    }

    /// Records today's check-in for a staff member or teacher. Positions
    /// outside the fence are refused and nothing is stored.
    #[instrument(skip(db))]
    pub async fn check_in(
        db: &PgPool,
        school_id: Uuid,
        user_id: Uuid,
        latitude: f64,
        longitude: f64,
    ) -> Result<StaffCheckIn, AppError> {
        let fence = Self::geofence_status(db, school_id, latitude, longitude).await?;
        metrics::track_attendance_check_in(fence.allowed);

        if !fence.allowed {
            let distance = fence.distance_m.unwrap_or_default();
            warn!(distance_m = distance, radius_m = fence.radius_m, "Check-in outside geofence");
            return Err(AppError::forbidden(format!(
                "You are {:.0} m from school; check-in is allowed within {:.0} m",
                distance, fence.radius_m
            )));
        }

        let check_in = sqlx::query_as::<_, StaffCheckIn>(
            "INSERT INTO staff_attendance (school_id, user_id, date, latitude, longitude, distance_m)
             VALUES ($1, $2, CURRENT_DATE, $3, $4, $5)
             ON CONFLICT (user_id, date) DO NOTHING
             RETURNING id, school_id, user_id, date, checked_in_at, latitude, longitude, distance_m",
        )
        .bind(school_id)
        .bind(user_id)
        .bind(latitude)
        .bind(longitude)
        .bind(fence.distance_m)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::conflict(anyhow::anyhow!("Already checked in today")))?;

        info!(check_in.id = %check_in.id, "Staff checked in");
        Ok(check_in)
    }

    pub async fn list_check_ins(
        db: &PgPool,
        school_id: Uuid,
        date: Option<chrono::NaiveDate>,
    ) -> Result<Vec<StaffCheckIn>, AppError> {
        let rows = sqlx::query_as::<_, StaffCheckIn>(
            "SELECT id, school_id, user_id, date, checked_in_at, latitude, longitude, distance_m
             FROM staff_attendance
             WHERE school_id = $1 AND ($2::date IS NULL OR date = $2)
             ORDER BY checked_in_at DESC",
        )
        .bind(school_id)
        .bind(date)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}
