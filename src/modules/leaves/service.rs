use chrono::Utc;
use scholaris_core::{AppError, PaginationMeta};
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::metrics;
use crate::modules::students::service::StudentService;
use crate::modules::users::model::UserRole;
use crate::utils::codes::random_code;

use super::model::{
    CreateLeaveDto, GATE_PASS_CODE_LEN, GATE_PASS_COLUMNS, GatePass, GatePassVerification,
    LEAVE_COLUMNS, LeaveDecisionDto, LeaveDecisionResponse, LeaveFilterParams, LeaveRequest,
    LeaveStatus, PaginatedLeavesResponse,
};
use super::workflow::{Stage, next_status};

const CODE_ATTEMPTS: usize = 3;

/// The caller acting on leave requests.
#[derive(Debug, Clone, Copy)]
pub struct LeaveActor {
    pub user_id: Uuid,
    pub role: UserRole,
    pub scope: Option<Uuid>,
}

pub struct LeaveService;

impl LeaveService {
    /// Students file for themselves; parents must name one of their children.
    async fn resolve_student(
        db: &PgPool,
        actor: LeaveActor,
        requested: Option<Uuid>,
    ) -> Result<Uuid, AppError> {
        match actor.role {
            UserRole::Student => match requested {
                Some(id) if id != actor.user_id => Err(AppError::forbidden(
                    "Students can only request leave for themselves",
                )),
                _ => Ok(actor.user_id),
            },
            UserRole::Parent => {
                let student_id = requested.ok_or_else(|| {
                    AppError::bad_request(anyhow::anyhow!("student_id is required"))
                })?;
                StudentService::can_view(db, actor.user_id, actor.role, actor.scope, student_id)
                    .await?;
                Ok(student_id)
            }
            _ => Err(AppError::forbidden(
                "Only students and parents can request leave",
            )),
        }
    }

    #[instrument(skip(db, dto), fields(requested_by = %actor.user_id))]
    pub async fn create_leave(
        db: &PgPool,
        school_id: Uuid,
        actor: LeaveActor,
        dto: CreateLeaveDto,
    ) -> Result<LeaveRequest, AppError> {
        let student_id = Self::resolve_student(db, actor, dto.student_id).await?;

        let leave = sqlx::query_as::<_, LeaveRequest>(&format!(
            "INSERT INTO leave_requests (school_id, student_id, requested_by, reason, from_date, to_date)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {LEAVE_COLUMNS}"
        ))
        .bind(school_id)
        .bind(student_id)
        .bind(actor.user_id)
        .bind(dto.reason.trim())
        .bind(dto.from_date)
        .bind(dto.to_date)
        .fetch_one(db)
        .await?;

        info!(leave.id = %leave.id, student.id = %student_id, "Leave requested");
        Ok(leave)
    }

    /// Students see their own requests, parents their children's, everyone
    /// else with read access the whole school.
    pub async fn list_leaves(
        db: &PgPool,
        school_id: Uuid,
        actor: LeaveActor,
        filters: &LeaveFilterParams,
    ) -> Result<PaginatedLeavesResponse, AppError> {
        let own_student = (actor.role == UserRole::Student).then_some(actor.user_id);
        let parent = (actor.role == UserRole::Parent).then_some(actor.user_id);

        let where_clause = "WHERE school_id = $1
               AND ($2::leave_status IS NULL OR status = $2)
               AND ($3::uuid IS NULL OR student_id = $3)
               AND ($4::uuid IS NULL OR student_id = $4)
               AND ($5::uuid IS NULL OR student_id IN (SELECT id FROM users WHERE parent_id = $5))";

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM leave_requests {where_clause}"
        ))
        .bind(school_id)
        .bind(filters.status)
        .bind(filters.student_id)
        .bind(own_student)
        .bind(parent)
        .fetch_one(db)
        .await?;

        let data = sqlx::query_as::<_, LeaveRequest>(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests {where_clause}
             ORDER BY created_at DESC
             LIMIT $6 OFFSET $7"
        ))
        .bind(school_id)
        .bind(filters.status)
        .bind(filters.student_id)
        .bind(own_student)
        .bind(parent)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await?;

        Ok(PaginatedLeavesResponse {
            data,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    pub async fn get_leave(db: &PgPool, id: Uuid, actor: LeaveActor) -> Result<LeaveRequest, AppError> {
        let leave = sqlx::query_as::<_, LeaveRequest>(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests
             WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)"
        ))
        .bind(id)
        .bind(actor.scope)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Leave request not found")))?;

        StudentService::can_view(db, actor.user_id, actor.role, actor.scope, leave.student_id)
            .await?;
        Ok(leave)
    }

    async fn issue_gate_pass(
        conn: &mut PgConnection,
        leave: &LeaveRequest,
    ) -> Result<GatePass, AppError> {
        for attempt in 1..=CODE_ATTEMPTS {
            let pass = sqlx::query_as::<_, GatePass>(&format!(
                "INSERT INTO gate_passes (school_id, leave_request_id, code, valid_from, valid_until)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (school_id, code) DO NOTHING
                 RETURNING {GATE_PASS_COLUMNS}"
            ))
            .bind(leave.school_id)
            .bind(leave.id)
            .bind(random_code(GATE_PASS_CODE_LEN))
            .bind(leave.from_date)
            .bind(leave.to_date)
            .fetch_optional(&mut *conn)
            .await?;

            match pass {
                Some(pass) => return Ok(pass),
                None => warn!(attempt, "Gate pass code collision"),
            }
        }

        Err(AppError::internal(anyhow::anyhow!(
            "Could not allocate a unique gate pass code"
        )))
    }

    /// Applies a parent or school decision. School approval issues the gate pass
    /// in the same transaction.
    #[instrument(skip(db, dto), fields(stage = stage.as_str(), approve = dto.approve))]
    pub async fn decide(
        db: &PgPool,
        id: Uuid,
        actor: LeaveActor,
        stage: Stage,
        dto: LeaveDecisionDto,
    ) -> Result<LeaveDecisionResponse, AppError> {
        let mut tx = db.begin().await?;

        let leave = sqlx::query_as::<_, LeaveRequest>(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests
             WHERE id = $1 AND ($2::uuid IS NULL OR school_id = $2)
             FOR UPDATE"
        ))
        .bind(id)
        .bind(actor.scope)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Leave request not found")))?;

        if stage == Stage::Parent {
            let parent_id =
                sqlx::query_scalar::<_, Option<Uuid>>("SELECT parent_id FROM users WHERE id = $1")
                    .bind(leave.student_id)
                    .fetch_optional(&mut *tx)
                    .await?
                    .flatten();
            if parent_id != Some(actor.user_id) {
                return Err(AppError::forbidden(
                    "Only the student's parent can decide at this stage",
                ));
            }
        }

        let status = next_status(leave.status, stage, dto.approve)
            .map_err(AppError::conflict)?;

        let column_prefix = match stage {
            Stage::Parent => "parent",
            Stage::School => "school",
        };
        let leave = sqlx::query_as::<_, LeaveRequest>(&format!(
            "UPDATE leave_requests
             SET status = $2,
                 {column_prefix}_decided_by = $3,
                 {column_prefix}_decided_at = NOW(),
                 decision_note = COALESCE($4, decision_note),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {LEAVE_COLUMNS}"
        ))
        .bind(leave.id)
        .bind(status)
        .bind(actor.user_id)
        .bind(&dto.note)
        .fetch_one(&mut *tx)
        .await?;

        let gate_pass = if status == LeaveStatus::Approved {
            Some(Self::issue_gate_pass(&mut tx, &leave).await?)
        } else {
            None
        };

        tx.commit().await?;

        metrics::track_leave_decision(stage.as_str(), dto.approve);
        info!(leave.id = %leave.id, status = ?leave.status, "Leave decision recorded");

        Ok(LeaveDecisionResponse { leave, gate_pass })
    }

    pub async fn get_gate_pass(
        db: &PgPool,
        leave_id: Uuid,
        actor: LeaveActor,
    ) -> Result<GatePass, AppError> {
        let leave = Self::get_leave(db, leave_id, actor).await?;
        sqlx::query_as::<_, GatePass>(&format!(
            "SELECT {GATE_PASS_COLUMNS} FROM gate_passes WHERE leave_request_id = $1"
        ))
        .bind(leave.id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| {
            AppError::not_found(anyhow::anyhow!("No gate pass issued for this leave request"))
        })
    }

    /// Checks a code at the gate and marks the pass used. A pass is single-use
    /// and only valid within the leave dates.
    #[instrument(skip(db, code))]
    pub async fn verify_gate_pass(
        db: &PgPool,
        school_id: Uuid,
        code: &str,
    ) -> Result<GatePassVerification, AppError> {
        let code = code.trim().to_ascii_uppercase();
        let mut tx = db.begin().await?;

        let pass = sqlx::query_as::<_, GatePass>(&format!(
            "SELECT {GATE_PASS_COLUMNS} FROM gate_passes
             WHERE school_id = $1 AND code = $2
             FOR UPDATE"
        ))
        .bind(school_id)
        .bind(&code)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Invalid gate pass code")))?;

        if let Some(used_at) = pass.used_at {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Gate pass was already used at {}",
                used_at.format("%Y-%m-%d %H:%M")
            )));
        }
        if !pass.is_valid_on(Utc::now().date_naive()) {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Gate pass is only valid from {} to {}",
                pass.valid_from,
                pass.valid_until
            )));
        }

        let gate_pass = sqlx::query_as::<_, GatePass>(&format!(
            "UPDATE gate_passes SET used_at = NOW() WHERE id = $1 RETURNING {GATE_PASS_COLUMNS}"
        ))
        .bind(pass.id)
        .fetch_one(&mut *tx)
        .await?;

        let (student_id, first_name, last_name) = sqlx::query_as::<_, (Uuid, String, String)>(
            "SELECT u.id, u.first_name, u.last_name
             FROM leave_requests l JOIN users u ON u.id = l.student_id
             WHERE l.id = $1",
        )
        .bind(gate_pass.leave_request_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(gate_pass.id = %gate_pass.id, student.id = %student_id, "Gate pass used");

        Ok(GatePassVerification {
            gate_pass,
            student_id,
            student_name: format!("{first_name} {last_name}"),
        })
    }
}
