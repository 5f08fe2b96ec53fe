use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::session::IdeSession;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// Durable record of every IDE session ever created. Rows are only ever
/// inserted and updated; the cooldown check and auditing rely on history
/// staying around.
#[async_trait]
pub trait SessionRepository {
    async fn insert_session(&self, session: &IdeSession) -> Result<(), AppError>;

    /// The active session for one (owner, assignment) pair, if any.
    async fn find_active_session(&self, owner_id: &Uuid, assignment_id: &Uuid) -> Result<Option<IdeSession>, AppError>;

    /// Lookup scoped to the owner but not to active sessions, so a stop
    /// request against an already-ended session still resolves.
    async fn find_session_for_owner(&self, session_id: &Uuid, owner_id: &Uuid) -> Result<Option<IdeSession>, AppError>;

    /// The owner's most recently created inactive session, across all
    /// assignments. Feeds the volume cooldown check.
    async fn find_latest_inactive_session(&self, owner_id: &Uuid) -> Result<Option<IdeSession>, AppError>;

    async fn count_active_sessions(&self) -> Result<i64, AppError>;

    /// Persist the phase and detail blob last reported by the orchestrator.
    async fn record_session_status(&self, session_id: &Uuid, state: &str, data: &Value) -> Result<(), AppError>;

    async fn mark_session_ended(&self, session_id: &Uuid, ended: DateTime<Utc>) -> Result<(), AppError>;

    /// Active sessions created before the cutoff, oldest first. Used by the
    /// reaper binary.
    async fn list_active_sessions_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<IdeSession>, AppError>;
}

#[async_trait]
impl SessionRepository for PostgresRepository {
    async fn insert_session(&self, session: &IdeSession) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO ide_session (
                id, owner_id, assignment_id, course_id, active, state, created, ended,
                image, resources, network_policy, network_locked, repo_url,
                persistent_storage, autosave, privileged, admin, credentials, data
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(session.id)
        .bind(session.owner_id)
        .bind(session.assignment_id)
        .bind(session.course_id)
        .bind(session.active)
        .bind(&session.state)
        .bind(session.created)
        .bind(session.ended)
        .bind(&session.image)
        .bind(&session.resources)
        .bind(&session.network_policy)
        .bind(session.network_locked)
        .bind(&session.repo_url)
        .bind(session.persistent_storage)
        .bind(session.autosave)
        .bind(session.privileged)
        .bind(session.admin)
        .bind(session.credentials)
        .bind(&session.data)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_active_session(&self, owner_id: &Uuid, assignment_id: &Uuid) -> Result<Option<IdeSession>, AppError> {
        let session = sqlx::query_as::<_, IdeSession>(
            r#"
            SELECT * FROM ide_session
            WHERE owner_id = $1
              AND assignment_id = $2
              AND active
            "#,
        )
        .bind(owner_id)
        .bind(assignment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn find_session_for_owner(&self, session_id: &Uuid, owner_id: &Uuid) -> Result<Option<IdeSession>, AppError> {
        let session = sqlx::query_as::<_, IdeSession>(
            r#"
            SELECT * FROM ide_session
            WHERE id = $1
              AND owner_id = $2
            "#,
        )
        .bind(session_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn find_latest_inactive_session(&self, owner_id: &Uuid) -> Result<Option<IdeSession>, AppError> {
        let session = sqlx::query_as::<_, IdeSession>(
            r#"
            SELECT * FROM ide_session
            WHERE owner_id = $1
              AND active = FALSE
            ORDER BY created DESC
            LIMIT 1
            "#,
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn count_active_sessions(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ide_session WHERE active")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn record_session_status(&self, session_id: &Uuid, state: &str, data: &Value) -> Result<(), AppError> {
        sqlx::query("UPDATE ide_session SET state = $2, data = $3 WHERE id = $1")
            .bind(session_id)
            .bind(state)
            .bind(data)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn mark_session_ended(&self, session_id: &Uuid, ended: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE ide_session
            SET active = FALSE, state = 'Ended', ended = $2
            WHERE id = $1
            "#,
        )
        .bind(session_id)
        .bind(ended)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_active_sessions_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<IdeSession>, AppError> {
        let sessions = sqlx::query_as::<_, IdeSession>(
            r#"
            SELECT * FROM ide_session
            WHERE active
              AND created < $1
            ORDER BY created ASC
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }
}
