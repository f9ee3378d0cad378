use pagecraft_core::{AppError, AppResult, OrgId};
use pagecraft_domain::{Role, RoleId, RoleScope};

use super::{PostgresAccessRepository, RoleRow, aggregate_roles, map_unique_violation};

const ROLE_COLUMNS: &str = r#"
    r.id AS role_id,
    r.org_id,
    r.name AS role_name,
    r.description,
    r.role_type,
    r.scope,
    r.is_immutable,
    c.capability_key
"#;

impl PostgresAccessRepository {
    pub(super) async fn list_roles_impl(&self, org_id: OrgId) -> AppResult<Vec<Role>> {
        let query = format!(
            r#"
            SELECT {ROLE_COLUMNS}
            FROM access_roles r
            LEFT JOIN access_role_capabilities c ON c.role_id = r.id
            WHERE r.org_id = $1
            ORDER BY r.name
            "#
        );

        let rows = sqlx::query_as::<_, RoleRow>(&query)
            .bind(org_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        aggregate_roles(rows)
    }

    pub(super) async fn find_role_impl(
        &self,
        org_id: OrgId,
        role_id: RoleId,
    ) -> AppResult<Option<Role>> {
        let query = format!(
            r#"
            SELECT {ROLE_COLUMNS}
            FROM access_roles r
            LEFT JOIN access_role_capabilities c ON c.role_id = r.id
            WHERE r.org_id = $1 AND r.id = $2
            "#
        );

        let rows = sqlx::query_as::<_, RoleRow>(&query)
            .bind(org_id.as_uuid())
            .bind(role_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to load role: {error}")))?;

        Ok(aggregate_roles(rows)?.into_iter().next())
    }

    pub(super) async fn find_role_by_name_impl(
        &self,
        org_id: OrgId,
        name: &str,
        scope: RoleScope,
    ) -> AppResult<Option<Role>> {
        let query = format!(
            r#"
            SELECT {ROLE_COLUMNS}
            FROM access_roles r
            LEFT JOIN access_role_capabilities c ON c.role_id = r.id
            WHERE r.org_id = $1 AND r.name = $2 AND r.scope = $3
            "#
        );

        let rows = sqlx::query_as::<_, RoleRow>(&query)
            .bind(org_id.as_uuid())
            .bind(name)
            .bind(scope.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to look up role by name: {error}"))
            })?;

        Ok(aggregate_roles(rows)?.into_iter().next())
    }

    pub(super) async fn insert_role_impl(&self, role: Role) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO access_roles (id, org_id, name, description, role_type, scope, is_immutable)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(role.id.as_uuid())
        .bind(role.org_id.as_uuid())
        .bind(&role.name)
        .bind(&role.description)
        .bind(role.role_type.as_str())
        .bind(role.scope.as_str())
        .bind(role.is_immutable)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            map_unique_violation(
                error,
                AppError::Conflict(format!(
                    "a role named '{}' already exists in this organization",
                    role.name
                )),
            )
        })?;

        for capability in &role.capabilities {
            sqlx::query(
                r#"
                INSERT INTO access_role_capabilities (role_id, capability_key)
                VALUES ($1, $2)
                "#,
            )
            .bind(role.id.as_uuid())
            .bind(capability.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to store role capability: {error}"))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit role insert: {error}"))
        })
    }

    pub(super) async fn update_role_impl(&self, role: Role) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            UPDATE access_roles
            SET name = $3, description = $4
            WHERE org_id = $1 AND id = $2
            "#,
        )
        .bind(role.org_id.as_uuid())
        .bind(role.id.as_uuid())
        .bind(&role.name)
        .bind(&role.description)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            map_unique_violation(
                error,
                AppError::Conflict(format!(
                    "a role named '{}' already exists in this organization",
                    role.name
                )),
            )
        })?;

        // Capability sets are replaced whole, never patched.
        sqlx::query("DELETE FROM access_role_capabilities WHERE role_id = $1")
            .bind(role.id.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to clear role capabilities: {error}"))
            })?;

        for capability in &role.capabilities {
            sqlx::query(
                r#"
                INSERT INTO access_role_capabilities (role_id, capability_key)
                VALUES ($1, $2)
                "#,
            )
            .bind(role.id.as_uuid())
            .bind(capability.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to store role capability: {error}"))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit role update: {error}"))
        })
    }

    pub(super) async fn delete_role_impl(&self, org_id: OrgId, role_id: RoleId) -> AppResult<()> {
        sqlx::query("DELETE FROM access_roles WHERE org_id = $1 AND id = $2")
            .bind(org_id.as_uuid())
            .bind(role_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to delete role: {error}")))?;

        Ok(())
    }
}
