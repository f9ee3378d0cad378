use async_trait::async_trait;
use sqlx::PgPool;

use pagecraft_application::{AuditEvent, AuditRepository};
use pagecraft_core::{AppError, AppResult};

/// Appends management audit events to the `access_audit_events` table.
#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO access_audit_events
                (id, org_id, actor_id, action, resource_type, resource_id, detail, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(uuid::Uuid::new_v4())
        .bind(event.org_id.as_uuid())
        .bind(event.actor.as_uuid())
        .bind(event.action.as_str())
        .bind(&event.resource_type)
        .bind(&event.resource_id)
        .bind(event.detail.as_deref())
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append audit event: {error}")))?;

        Ok(())
    }
}
