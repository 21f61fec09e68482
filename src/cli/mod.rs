//! Administrative commands behind `scholaris-cli`.
//!
//! - [`create_system_admin`]: the only way to create an `admin` account
//! - [`seeder`]: fake schools, classes and users for local development
//! - [`check_db`] / [`check_permissions`]: connection diagnostics

pub mod seeder;

use anyhow::{Context, anyhow};
use scholaris_core::password::hash_password;
use scholaris_db::mask_database_url;
use sqlx::PgPool;

use crate::modules::users::model::UserRole;

pub async fn create_system_admin(
    db: &PgPool,
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    let hashed_password = hash_password(password).map_err(|e| e.error)?;

    let result = sqlx::query(
        "INSERT INTO users (first_name, last_name, email, password, role, school_id)
         VALUES ($1, $2, $3, $4, $5, NULL)
         ON CONFLICT (email) DO NOTHING",
    )
    .bind(first_name)
    .bind(last_name)
    .bind(email.to_lowercase())
    .bind(hashed_password)
    .bind(UserRole::Admin)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(anyhow!("User with this email already exists"));
    }

    Ok(())
}

/// What `check-db` reports after a successful round trip.
#[derive(Debug, Clone)]
pub struct DatabaseReport {
    pub target: String,
    pub server_version: String,
    pub database: String,
    pub current_user: String,
}

pub async fn check_db(db: &PgPool, url: &str) -> anyhow::Result<DatabaseReport> {
    let (server_version, database, current_user): (String, String, String) =
        sqlx::query_as("SELECT version(), current_database()::text, current_user::text")
            .fetch_one(db)
            .await
            .context("database did not answer")?;

    Ok(DatabaseReport {
        target: mask_database_url(url),
        server_version,
        database,
        current_user,
    })
}

/// Creates and drops a scratch table to prove the connected role can run
/// migrations.
pub async fn check_permissions(db: &PgPool) -> anyhow::Result<()> {
    let mut tx = db.begin().await?;

    sqlx::query("CREATE TABLE scholaris_permission_check (id INTEGER PRIMARY KEY)")
        .execute(&mut *tx)
        .await
        .context("cannot create tables")?;
    sqlx::query("INSERT INTO scholaris_permission_check (id) VALUES (1)")
        .execute(&mut *tx)
        .await
        .context("cannot insert rows")?;
    sqlx::query("DROP TABLE scholaris_permission_check")
        .execute(&mut *tx)
        .await
        .context("cannot drop tables")?;

    tx.rollback().await?;
    Ok(())
}
