use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use pagecraft_application::{DirectoryRepository, OrgRecord, SiteRecord};
use pagecraft_core::{AppError, AppResult, OrgId, SiteId, UserId};

/// PostgreSQL lookups against the platform directory tables.
#[derive(Clone)]
pub struct PostgresDirectoryRepository {
    pool: PgPool,
}

impl PostgresDirectoryRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct OrgRow {
    id: uuid::Uuid,
    name: String,
}

#[derive(Debug, FromRow)]
struct SiteRow {
    id: uuid::Uuid,
    org_id: uuid::Uuid,
    name: String,
}

#[async_trait]
impl DirectoryRepository for PostgresDirectoryRepository {
    async fn find_org(&self, org_id: OrgId) -> AppResult<Option<OrgRecord>> {
        let row = sqlx::query_as::<_, OrgRow>("SELECT id, name FROM orgs WHERE id = $1")
            .bind(org_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to load organization: {error}"))
            })?;

        Ok(row.map(|row| OrgRecord {
            id: OrgId::from_uuid(row.id),
            name: row.name,
        }))
    }

    async fn find_site(&self, site_id: SiteId) -> AppResult<Option<SiteRecord>> {
        let row =
            sqlx::query_as::<_, SiteRow>("SELECT id, org_id, name FROM sites WHERE id = $1")
                .bind(site_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|error| AppError::Internal(format!("failed to load site: {error}")))?;

        Ok(row.map(|row| SiteRecord {
            id: SiteId::from_uuid(row.id),
            org_id: OrgId::from_uuid(row.org_id),
            name: row.name,
        }))
    }

    async fn is_member(&self, org_id: OrgId, user_id: UserId) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM org_memberships WHERE org_id = $1 AND user_id = $2",
        )
        .bind(org_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to check membership: {error}")))?;

        Ok(count > 0)
    }
}
