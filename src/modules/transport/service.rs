use scholaris_core::AppError;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::modules::hostel::capacity::Occupancy;
use crate::modules::users::model::UserRole;
use crate::modules::users::service::UserService;

use super::model::{
    ASSIGNMENT_COLUMNS, AssignStudentDto, Bus, BusAssignment, CreateBusDto, UpdateBusDto,
};

const BUS_COLUMNS: &str = "id, school_id, registration_number, driver_name, driver_phone, \
     route_name, capacity, \
     (SELECT COUNT(*) FROM bus_assignments ba WHERE ba.bus_id = buses.id) AS assigned, \
     created_at, updated_at";

fn map_duplicate(e: sqlx::Error, message: &'static str) -> AppError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::conflict(anyhow::anyhow!(message))
        }
        _ => AppError::database(e),
    }
}

pub struct TransportService;

impl TransportService {
    #[instrument(skip(db, dto), fields(bus.registration = %dto.registration_number, db.table = "buses"))]
    pub async fn create_bus(db: &PgPool, school_id: Uuid, dto: CreateBusDto) -> Result<Bus, AppError> {
        let bus = sqlx::query_as::<_, Bus>(&format!(
            "INSERT INTO buses (school_id, registration_number, driver_name, driver_phone, route_name, capacity)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {BUS_COLUMNS}"
        ))
        .bind(school_id)
        .bind(dto.registration_number.trim())
        .bind(&dto.driver_name)
        .bind(&dto.driver_phone)
        .bind(&dto.route_name)
        .bind(dto.capacity)
        .fetch_one(db)
        .await
        .map_err(|e| map_duplicate(e, "A bus with this registration number already exists"))?;

        info!(bus.id = %bus.id, "Bus registered");
        Ok(bus)
    }

    pub async fn list_buses(db: &PgPool, school_id: Uuid) -> Result<Vec<Bus>, AppError> {
        let buses = sqlx::query_as::<_, Bus>(&format!(
            "SELECT {BUS_COLUMNS} FROM buses WHERE school_id = $1 ORDER BY registration_number"
        ))
        .bind(school_id)
        .fetch_all(db)
        .await?;
        Ok(buses)
    }

    pub async fn get_bus(db: &PgPool, id: Uuid, scope: Option<Uuid>) -> Result<Bus, AppError> {
        sqlx::query_as::<_, Bus>(&format!(
            "SELECT {BUS_COLUMNS} FROM buses WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)"
        ))
        .bind(id)
        .bind(scope)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Bus not found")))
    }

    /// Locks the bus row and returns it with its seat occupancy.
    async fn lock_bus(
        conn: &mut PgConnection,
        id: Uuid,
        scope: Option<Uuid>,
    ) -> Result<(Bus, Occupancy), AppError> {
        let bus = sqlx::query_as::<_, Bus>(&format!(
            "SELECT {BUS_COLUMNS} FROM buses
             WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)
             FOR UPDATE"
        ))
        .bind(id)
        .bind(scope)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Bus not found")))?;

        let occupancy = Occupancy::new(bus.assigned, bus.capacity);
        Ok((bus, occupancy))
    }

    pub async fn update_bus(
        db: &PgPool,
        id: Uuid,
        scope: Option<Uuid>,
        dto: UpdateBusDto,
    ) -> Result<Bus, AppError> {
        let mut tx = db.begin().await?;
        let (bus, occupancy) = Self::lock_bus(&mut tx, id, scope).await?;

        if let Some(capacity) = dto.capacity
            && !occupancy.can_resize_to(capacity)
        {
            return Err(AppError::conflict(anyhow::anyhow!(
                "{} students are assigned; capacity cannot drop below that",
                occupancy.occupied
            )));
        }

        let bus = sqlx::query_as::<_, Bus>(&format!(
            "UPDATE buses
             SET registration_number = COALESCE($2, registration_number),
                 driver_name = COALESCE($3, driver_name),
                 driver_phone = COALESCE($4, driver_phone),
                 route_name = COALESCE($5, route_name),
                 capacity = COALESCE($6, capacity),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {BUS_COLUMNS}"
        ))
        .bind(bus.id)
        .bind(dto.registration_number.as_deref().map(str::trim))
        .bind(&dto.driver_name)
        .bind(&dto.driver_phone)
        .bind(&dto.route_name)
        .bind(dto.capacity)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_duplicate(e, "A bus with this registration number already exists"))?;

        tx.commit().await?;
        Ok(bus)
    }

    pub async fn delete_bus(db: &PgPool, id: Uuid, scope: Option<Uuid>) -> Result<(), AppError> {
        let result =
            sqlx::query("DELETE FROM buses WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)")
                .bind(id)
                .bind(scope)
                .execute(db)
                .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Bus not found")));
        }
        Ok(())
    }

    /// Seats a student on a bus, refusing when every seat is taken. A student
    /// rides at most one bus.
    #[instrument(skip(db, dto), fields(student.id = %dto.student_id))]
    pub async fn assign_student(
        db: &PgPool,
        bus_id: Uuid,
        scope: Option<Uuid>,
        dto: AssignStudentDto,
    ) -> Result<BusAssignment, AppError> {
        let mut tx = db.begin().await?;
        let (bus, occupancy) = Self::lock_bus(&mut tx, bus_id, scope).await?;
        UserService::ensure_member(db, dto.student_id, bus.school_id, UserRole::Student).await?;

        if !occupancy.has_space() {
            warn!(bus.id = %bus.id, capacity = occupancy.capacity, "Bus is full");
            return Err(AppError::conflict(anyhow::anyhow!(
                "Bus is full ({}/{} seats taken)",
                occupancy.occupied,
                occupancy.capacity
            )));
        }

        let assignment = sqlx::query_as::<_, BusAssignment>(&format!(
            "INSERT INTO bus_assignments (bus_id, student_id, stop_name)
             VALUES ($1, $2, $3)
             RETURNING {ASSIGNMENT_COLUMNS}"
        ))
        .bind(bus.id)
        .bind(dto.student_id)
        .bind(&dto.stop_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_duplicate(e, "Student is already assigned to a bus"))?;

        tx.commit().await?;
        info!(bus.id = %bus.id, "Student assigned to bus");
        Ok(assignment)
    }

    pub async fn list_assignments(
        db: &PgPool,
        bus_id: Uuid,
        scope: Option<Uuid>,
    ) -> Result<Vec<BusAssignment>, AppError> {
        let bus = Self::get_bus(db, bus_id, scope).await?;
        let assignments = sqlx::query_as::<_, BusAssignment>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM bus_assignments WHERE bus_id = $1 ORDER BY created_at"
        ))
        .bind(bus.id)
        .fetch_all(db)
        .await?;
        Ok(assignments)
    }

    pub async fn unassign_student(
        db: &PgPool,
        bus_id: Uuid,
        student_id: Uuid,
        scope: Option<Uuid>,
    ) -> Result<(), AppError> {
        let bus = Self::get_bus(db, bus_id, scope).await?;
        let result = sqlx::query("DELETE FROM bus_assignments WHERE bus_id = $1 AND student_id = $2")
            .bind(bus.id)
            .bind(student_id)
            .execute(db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!(
                "Student is not assigned to this bus"
            )));
        }
        Ok(())
    }
}
