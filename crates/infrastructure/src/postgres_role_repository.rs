use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use qualigate_application::RoleRepository;
use qualigate_core::{AppError, AppResult};
use qualigate_domain::Role;

// Advisory lock key serializing bootstrap attempts.
const BOOTSTRAP_LOCK_KEY: i64 = 0x5147_5245_4749_5354;

/// PostgreSQL-backed role registry implementation.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    role: String,
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn find_role(&self, subject: &str) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            "SELECT role FROM user_roles WHERE subject = $1",
        )
        .bind(subject)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to look up role: {error}")))?;

        row.map(|row| Role::from_str(row.role.as_str())).transpose()
    }

    async fn save_role(&self, subject: &str, role: Option<Role>) -> AppResult<()> {
        match role {
            Some(role) => {
                sqlx::query(
                    r#"
                    INSERT INTO user_roles (subject, role, updated_at)
                    VALUES ($1, $2, NOW())
                    ON CONFLICT (subject)
                    DO UPDATE SET role = EXCLUDED.role, updated_at = NOW()
                    "#,
                )
                .bind(subject)
                .bind(role.as_str())
                .execute(&self.pool)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to save role assignment: {error}"))
                })?;
            }
            None => {
                sqlx::query("DELETE FROM user_roles WHERE subject = $1")
                    .bind(subject)
                    .execute(&self.pool)
                    .await
                    .map_err(|error| {
                        AppError::Internal(format!("failed to clear role assignment: {error}"))
                    })?;
            }
        }

        Ok(())
    }

    async fn quality_head_exists(&self) -> AppResult<bool> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM user_roles WHERE role = $1)",
        )
        .bind(Role::QualityHead.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to check for quality head: {error}"))
        })?;

        Ok(exists.0)
    }

    async fn bootstrap_quality_head(&self, subject: &str) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to open bootstrap transaction: {error}"))
        })?;

        // The advisory lock serializes concurrent bootstrap attempts so the
        // existence check and the insert form one atomic unit; the second
        // caller waits, then observes the winner's row.
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(BOOTSTRAP_LOCK_KEY)
            .execute(&mut *tx)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to acquire bootstrap lock: {error}"))
            })?;

        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM user_roles WHERE role = $1)",
        )
        .bind(Role::QualityHead.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to check for quality head: {error}"))
        })?;

        if exists.0 {
            return Err(AppError::AlreadyInitialized(
                "a quality head already exists".to_owned(),
            ));
        }

        sqlx::query(
            r#"
            INSERT INTO user_roles (subject, role, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (subject)
            DO UPDATE SET role = EXCLUDED.role, updated_at = NOW()
            "#,
        )
        .bind(subject)
        .bind(Role::QualityHead.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to create bootstrap quality head: {error}"))
        })?;

        tx.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit bootstrap transaction: {error}"))
        })
    }
}
