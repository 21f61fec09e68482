use scholaris_core::AppError;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::users::model::{USER_COLUMNS, User, UserRole};
use crate::modules::users::service::UserService;

pub struct StudentService;

impl StudentService {
    /// Students linked to a parent account.
    #[instrument(skip(db))]
    pub async fn children_of(db: &PgPool, parent_id: Uuid) -> Result<Vec<User>, AppError> {
        let children = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE parent_id = $1 AND role = 'student'
             ORDER BY first_name"
        ))
        .bind(parent_id)
        .fetch_all(db)
        .await?;
        Ok(children)
    }

    /// Whether `viewer` may see records of `student_id`: staff with read
    /// access see their school, students see themselves, parents their children.
    pub async fn can_view(
        db: &PgPool,
        viewer_id: Uuid,
        viewer_role: UserRole,
        scope: Option<Uuid>,
        student_id: Uuid,
    ) -> Result<User, AppError> {
        let student = UserService::get_user(db, student_id, scope, Some(UserRole::Student)).await?;

        let allowed = match viewer_role {
            UserRole::Student => student.id == viewer_id,
            UserRole::Parent => student.parent_id == Some(viewer_id),
            _ => true,
        };

        if !allowed {
            return Err(AppError::forbidden("You cannot view this student's records"));
        }
        Ok(student)
    }
}
