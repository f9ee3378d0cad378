use pagecraft_core::{AppError, AppResult, OrgId, SiteId, UserId};
use pagecraft_domain::{AssignmentId, RoleAssignment, RoleId};

use super::{
    AssignmentRow, PostgresAccessRepository, assignment_from_row, map_unique_violation,
};

const ASSIGNMENT_COLUMNS: &str =
    "id AS assignment_id, org_id, user_id, role_id, site_id";

impl PostgresAccessRepository {
    pub(super) async fn list_assignments_impl(
        &self,
        org_id: OrgId,
    ) -> AppResult<Vec<RoleAssignment>> {
        let query = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM access_role_assignments WHERE org_id = $1 ORDER BY id"
        );

        let rows = sqlx::query_as::<_, AssignmentRow>(&query)
            .bind(org_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to list assignments: {error}"))
            })?;

        Ok(rows.into_iter().map(assignment_from_row).collect())
    }

    pub(super) async fn list_assignments_for_user_impl(
        &self,
        org_id: OrgId,
        user_id: UserId,
    ) -> AppResult<Vec<RoleAssignment>> {
        let query = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM access_role_assignments WHERE org_id = $1 AND user_id = $2"
        );

        let rows = sqlx::query_as::<_, AssignmentRow>(&query)
            .bind(org_id.as_uuid())
            .bind(user_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to list user assignments: {error}"))
            })?;

        Ok(rows.into_iter().map(assignment_from_row).collect())
    }

    pub(super) async fn find_assignment_impl(
        &self,
        org_id: OrgId,
        assignment_id: AssignmentId,
    ) -> AppResult<Option<RoleAssignment>> {
        let query = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM access_role_assignments WHERE org_id = $1 AND id = $2"
        );

        let row = sqlx::query_as::<_, AssignmentRow>(&query)
            .bind(org_id.as_uuid())
            .bind(assignment_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to load assignment: {error}"))
            })?;

        Ok(row.map(assignment_from_row))
    }

    pub(super) async fn find_assignment_for_grant_impl(
        &self,
        org_id: OrgId,
        user_id: UserId,
        role_id: RoleId,
        site_id: Option<SiteId>,
    ) -> AppResult<Option<RoleAssignment>> {
        let query = format!(
            r#"
            SELECT {ASSIGNMENT_COLUMNS}
            FROM access_role_assignments
            WHERE org_id = $1 AND user_id = $2 AND role_id = $3 AND site_id IS NOT DISTINCT FROM $4
            "#
        );

        let row = sqlx::query_as::<_, AssignmentRow>(&query)
            .bind(org_id.as_uuid())
            .bind(user_id.as_uuid())
            .bind(role_id.as_uuid())
            .bind(site_id.map(|site| site.as_uuid()))
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to look up assignment grant: {error}"))
            })?;

        Ok(row.map(assignment_from_row))
    }

    pub(super) async fn insert_assignment_impl(
        &self,
        assignment: RoleAssignment,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO access_role_assignments (id, org_id, user_id, role_id, site_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(assignment.id.as_uuid())
        .bind(assignment.org_id.as_uuid())
        .bind(assignment.user_id.as_uuid())
        .bind(assignment.role_id.as_uuid())
        .bind(assignment.site_id.map(|site| site.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|error| {
            map_unique_violation(
                error,
                AppError::Conflict("this role is already assigned to the user".to_owned()),
            )
        })?;

        Ok(())
    }

    pub(super) async fn delete_assignment_impl(
        &self,
        org_id: OrgId,
        assignment_id: AssignmentId,
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM access_role_assignments WHERE org_id = $1 AND id = $2")
            .bind(org_id.as_uuid())
            .bind(assignment_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to delete assignment: {error}"))
            })?;

        Ok(())
    }

    pub(super) async fn count_assignments_for_role_impl(
        &self,
        org_id: OrgId,
        role_id: RoleId,
    ) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM access_role_assignments WHERE org_id = $1 AND role_id = $2",
        )
        .bind(org_id.as_uuid())
        .bind(role_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to count role assignments: {error}"))
        })?;

        Ok(count.max(0) as u64)
    }

    pub(super) async fn delete_assignments_for_role_impl(
        &self,
        org_id: OrgId,
        role_id: RoleId,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM access_role_assignments WHERE org_id = $1 AND role_id = $2",
        )
        .bind(org_id.as_uuid())
        .bind(role_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to delete role assignments: {error}"))
        })?;

        Ok(result.rows_affected())
    }
}
