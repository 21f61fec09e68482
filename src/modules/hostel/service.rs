use scholaris_core::AppError;
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::metrics;
use crate::modules::users::model::UserRole;
use crate::modules::users::service::UserService;

use super::capacity::Occupancy;
use super::model::{
    ALLOCATION_COLUMNS, AllocateDto, AllocationFilterParams, CreateHostelDto, CreateRoomDto,
    HOSTEL_COLUMNS, Hostel, HostelAllocation, HostelRoom, UpdateHostelDto, UpdateRoomDto,
};

const ACTIVE_OCCUPANCY: &str = "(SELECT COUNT(*) FROM hostel_allocations a
     WHERE a.room_id = hostel_rooms.id AND a.released_at IS NULL)";

fn room_columns() -> String {
    format!("id, hostel_id, room_number, capacity, {ACTIVE_OCCUPANCY} AS occupied, created_at")
}

fn map_duplicate(e: sqlx::Error, message: &'static str) -> AppError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::conflict(anyhow::anyhow!(message))
        }
        _ => AppError::database(e),
    }
}

pub struct HostelService;

impl HostelService {
    #[instrument(skip(db, dto), fields(hostel.name = %dto.name, db.table = "hostels"))]
    pub async fn create_hostel(
        db: &PgPool,
        school_id: Uuid,
        dto: CreateHostelDto,
    ) -> Result<Hostel, AppError> {
        let hostel = sqlx::query_as::<_, Hostel>(&format!(
            "INSERT INTO hostels (school_id, name, warden_name)
             VALUES ($1, $2, $3)
             RETURNING {HOSTEL_COLUMNS}"
        ))
        .bind(school_id)
        .bind(dto.name.trim())
        .bind(&dto.warden_name)
        .fetch_one(db)
        .await
        .map_err(|e| map_duplicate(e, "A hostel with this name already exists"))?;

        info!(hostel.id = %hostel.id, "Hostel created");
        Ok(hostel)
    }

    pub async fn list_hostels(db: &PgPool, school_id: Uuid) -> Result<Vec<Hostel>, AppError> {
        let hostels = sqlx::query_as::<_, Hostel>(&format!(
            "SELECT {HOSTEL_COLUMNS} FROM hostels WHERE school_id = $1 ORDER BY name"
        ))
        .bind(school_id)
        .fetch_all(db)
        .await?;
        Ok(hostels)
    }

    pub async fn get_hostel(db: &PgPool, id: Uuid, scope: Option<Uuid>) -> Result<Hostel, AppError> {
        sqlx::query_as::<_, Hostel>(&format!(
            "SELECT {HOSTEL_COLUMNS} FROM hostels WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)"
        ))
        .bind(id)
        .bind(scope)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Hostel not found")))
    }

    pub async fn update_hostel(
        db: &PgPool,
        id: Uuid,
        scope: Option<Uuid>,
        dto: UpdateHostelDto,
    ) -> Result<Hostel, AppError> {
        sqlx::query_as::<_, Hostel>(&format!(
            "UPDATE hostels
             SET name = COALESCE($3, name), warden_name = COALESCE($4, warden_name), updated_at = NOW()
             WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)
             RETURNING {HOSTEL_COLUMNS}"
        ))
        .bind(id)
        .bind(scope)
        .bind(dto.name.as_deref().map(str::trim))
        .bind(&dto.warden_name)
        .fetch_optional(db)
        .await
        .map_err(|e| map_duplicate(e, "A hostel with this name already exists"))?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Hostel not found")))
    }

    pub async fn delete_hostel(db: &PgPool, id: Uuid, scope: Option<Uuid>) -> Result<(), AppError> {
        let hostel = Self::get_hostel(db, id, scope).await?;
        let residents = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM hostel_allocations a
             JOIN hostel_rooms r ON r.id = a.room_id
             WHERE r.hostel_id = $1 AND a.released_at IS NULL",
        )
        .bind(hostel.id)
        .fetch_one(db)
        .await?;
        if residents > 0 {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Hostel still has {residents} resident(s)"
            )));
        }

        sqlx::query("DELETE FROM hostels WHERE id = $1")
            .bind(hostel.id)
            .execute(db)
            .await?;
        Ok(())
    }

    #[instrument(skip(db, dto), fields(room.number = %dto.room_number))]
    pub async fn add_room(
        db: &PgPool,
        hostel_id: Uuid,
        scope: Option<Uuid>,
        dto: CreateRoomDto,
    ) -> Result<HostelRoom, AppError> {
        let hostel = Self::get_hostel(db, hostel_id, scope).await?;
        sqlx::query_as::<_, HostelRoom>(
            "INSERT INTO hostel_rooms (hostel_id, room_number, capacity)
             VALUES ($1, $2, $3)
             RETURNING id, hostel_id, room_number, capacity, 0::bigint AS occupied, created_at",
        )
        .bind(hostel.id)
        .bind(dto.room_number.trim())
        .bind(dto.capacity)
        .fetch_one(db)
        .await
        .map_err(|e| map_duplicate(e, "Room number already exists in this hostel"))
    }

    pub async fn list_rooms(
        db: &PgPool,
        hostel_id: Uuid,
        scope: Option<Uuid>,
    ) -> Result<Vec<HostelRoom>, AppError> {
        let hostel = Self::get_hostel(db, hostel_id, scope).await?;
        let rooms = sqlx::query_as::<_, HostelRoom>(&format!(
            "SELECT {} FROM hostel_rooms WHERE hostel_id = $1 ORDER BY room_number",
            room_columns()
        ))
        .bind(hostel.id)
        .fetch_all(db)
        .await?;
        Ok(rooms)
    }

    /// Locks a room that belongs to `school_id` (any school when `None`) and
    /// returns its current occupancy.
    async fn lock_room(
        tx: &mut sqlx::PgConnection,
        room_id: Uuid,
        scope: Option<Uuid>,
    ) -> Result<Occupancy, AppError> {
        let capacity = sqlx::query_scalar::<_, i32>(
            "SELECT r.capacity FROM hostel_rooms r
             JOIN hostels h ON h.id = r.hostel_id
             WHERE r.id = $1 AND ($2::uuid IS NULL OR h.school_id = $2)
             FOR UPDATE OF r",
        )
        .bind(room_id)
        .bind(scope)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Room not found")))?;

        let occupied = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM hostel_allocations WHERE room_id = $1 AND released_at IS NULL",
        )
        .bind(room_id)
        .fetch_one(&mut *tx)
        .await?;

        Ok(Occupancy::new(occupied, capacity))
    }

    pub async fn update_room(
        db: &PgPool,
        room_id: Uuid,
        scope: Option<Uuid>,
        dto: UpdateRoomDto,
    ) -> Result<HostelRoom, AppError> {
        let mut tx = db.begin().await?;
        let occupancy = Self::lock_room(&mut tx, room_id, scope).await?;

        if let Some(capacity) = dto.capacity
            && !occupancy.can_resize_to(capacity)
        {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Room has {} occupants; capacity cannot drop below that",
                occupancy.occupied
            )));
        }

        let room = sqlx::query_as::<_, HostelRoom>(&format!(
            "UPDATE hostel_rooms
             SET room_number = COALESCE($2, room_number), capacity = COALESCE($3, capacity)
             WHERE id = $1
             RETURNING {}",
            room_columns()
        ))
        .bind(room_id)
        .bind(dto.room_number.as_deref().map(str::trim))
        .bind(dto.capacity)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_duplicate(e, "Room number already exists in this hostel"))?;

        tx.commit().await?;
        Ok(room)
    }

    pub async fn delete_room(db: &PgPool, room_id: Uuid, scope: Option<Uuid>) -> Result<(), AppError> {
        let mut tx = db.begin().await?;
        let occupancy = Self::lock_room(&mut tx, room_id, scope).await?;
        if occupancy.occupied > 0 {
            return Err(AppError::conflict(anyhow::anyhow!("Room is occupied")));
        }
        sqlx::query("DELETE FROM hostel_rooms WHERE id = $1")
            .bind(room_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Gives a student a bed. The room row is locked for the duration of the
    /// transaction so concurrent allocations see each other's inserts, and a
    /// room with `occupied >= capacity` is refused.
    #[instrument(skip(db), fields(room.id = %dto.room_id, student.id = %dto.student_id))]
    pub async fn allocate(
        db: &PgPool,
        school_id: Uuid,
        dto: &AllocateDto,
    ) -> Result<HostelAllocation, AppError> {
        UserService::ensure_member(db, dto.student_id, school_id, UserRole::Student).await?;

        let mut tx = db.begin().await?;
        let occupancy = Self::lock_room(&mut tx, dto.room_id, Some(school_id)).await?;

        if !occupancy.has_space() {
            warn!(occupied = occupancy.occupied, capacity = occupancy.capacity, "Room is full");
            metrics::track_hostel_allocation("room_full");
            return Err(AppError::conflict(anyhow::anyhow!(
                "Room is full ({}/{} beds taken)",
                occupancy.occupied,
                occupancy.capacity
            )));
        }

        let allocation = sqlx::query_as::<_, HostelAllocation>(&format!(
            "INSERT INTO hostel_allocations (school_id, room_id, student_id)
             VALUES ($1, $2, $3)
             RETURNING {ALLOCATION_COLUMNS}"
        ))
        .bind(school_id)
        .bind(dto.room_id)
        .bind(dto.student_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if matches!(&e, sqlx::Error::Database(d) if d.is_unique_violation()) {
                metrics::track_hostel_allocation("already_allocated");
            }
            map_duplicate(e, "Student already has an active hostel allocation")
        })?;

        tx.commit().await?;
        metrics::track_hostel_allocation("allocated");
        info!(allocation.id = %allocation.id, "Hostel bed allocated");
        Ok(allocation)
    }

    #[instrument(skip(db))]
    pub async fn release(
        db: &PgPool,
        allocation_id: Uuid,
        scope: Option<Uuid>,
    ) -> Result<HostelAllocation, AppError> {
        let released = sqlx::query_as::<_, HostelAllocation>(&format!(
            "UPDATE hostel_allocations SET released_at = NOW()
             WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2) AND released_at IS NULL
             RETURNING {ALLOCATION_COLUMNS}"
        ))
        .bind(allocation_id)
        .bind(scope)
        .fetch_optional(db)
        .await?;

        match released {
            Some(allocation) => {
                metrics::track_hostel_allocation("released");
                info!("Hostel bed released");
                Ok(allocation)
            }
            None => {
                let exists = sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM hostel_allocations
                     WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2))",
                )
                .bind(allocation_id)
                .bind(scope)
                .fetch_one(db)
                .await?;
                if exists {
                    Err(AppError::conflict(anyhow::anyhow!("Allocation was already released")))
                } else {
                    Err(AppError::not_found(anyhow::anyhow!("Allocation not found")))
                }
            }
        }
    }

    pub async fn list_allocations(
        db: &PgPool,
        school_id: Uuid,
        filters: &AllocationFilterParams,
    ) -> Result<Vec<HostelAllocation>, AppError> {
        let allocations = sqlx::query_as::<_, HostelAllocation>(&format!(
            "SELECT {ALLOCATION_COLUMNS} FROM hostel_allocations
             WHERE school_id = $1
               AND ($2::uuid IS NULL OR room_id = $2)
               AND ($3::uuid IS NULL OR student_id = $3)
               AND (COALESCE($4, false) OR released_at IS NULL)
             ORDER BY allocated_at DESC"
        ))
        .bind(school_id)
        .bind(filters.room_id)
        .bind(filters.student_id)
        .bind(filters.include_released)
        .fetch_all(db)
        .await?;
        Ok(allocations)
    }
}
