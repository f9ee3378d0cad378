use pagecraft_core::{AppError, AppResult, OrgId};
use pagecraft_domain::OrgPolicy;

use super::{PolicyRow, PostgresAccessRepository, policy_from_row};

const POLICY_COLUMNS: &str = "id AS policy_id, org_id, capability_key, enabled, created_by";

impl PostgresAccessRepository {
    pub(super) async fn list_policies_impl(&self, org_id: OrgId) -> AppResult<Vec<OrgPolicy>> {
        let query = format!(
            "SELECT {POLICY_COLUMNS} FROM access_org_policies WHERE org_id = $1 ORDER BY capability_key"
        );

        let rows = sqlx::query_as::<_, PolicyRow>(&query)
            .bind(org_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to list policies: {error}")))?;

        rows.into_iter().map(policy_from_row).collect()
    }

    pub(super) async fn upsert_policy_impl(&self, policy: OrgPolicy) -> AppResult<OrgPolicy> {
        let query = format!(
            r#"
            INSERT INTO access_org_policies (id, org_id, capability_key, enabled, created_by)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (org_id, capability_key)
            DO UPDATE SET enabled = EXCLUDED.enabled, created_by = EXCLUDED.created_by
            RETURNING {POLICY_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, PolicyRow>(&query)
            .bind(policy.id.as_uuid())
            .bind(policy.org_id.as_uuid())
            .bind(policy.capability_key.as_str())
            .bind(policy.enabled)
            .bind(policy.created_by.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to upsert policy: {error}")))?;

        policy_from_row(row)
    }
}
