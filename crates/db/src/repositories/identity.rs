use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;

use tenderflow_core::domain::identity::{Employee, Organization, OrganizationType};
use tenderflow_core::domain::ids::{EmployeeId, OrganizationId};
use tenderflow_core::store::{IdentityDirectory, StoreError};

use super::codec::{optional_text, text, uuid};
use super::RepositoryError;
use crate::DbPool;

/// Read-only view over employees and the organizations they are responsible for.
pub struct SqlIdentityDirectory {
    pool: DbPool,
}

impl SqlIdentityDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn fetch_employee_by_username(&self, username: &str) -> Result<Employee, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, username, first_name, last_name FROM employee WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref row) => row_to_employee(row),
            None => Err(RepositoryError::not_found("employee", username)),
        }
    }

    async fn fetch_employee(&self, id: EmployeeId) -> Result<Employee, RepositoryError> {
        let row =
            sqlx::query("SELECT id, username, first_name, last_name FROM employee WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(ref row) => row_to_employee(row),
            None => Err(RepositoryError::not_found("employee", id)),
        }
    }

    async fn fetch_organization(&self, id: OrganizationId) -> Result<Organization, RepositoryError> {
        let row =
            sqlx::query("SELECT id, name, description, type FROM organization WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(ref row) => row_to_organization(row),
            None => Err(RepositoryError::not_found("organization", id)),
        }
    }

    async fn fetch_organization_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Option<Organization>, RepositoryError> {
        let row = sqlx::query(
            "SELECT o.id, o.name, o.description, o.type
             FROM organization o
             JOIN organization_responsible r ON r.organization_id = o.id
             WHERE r.user_id = ?",
        )
        .bind(employee_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_organization).transpose()
    }

    async fn fetch_employees_in_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Employee>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT e.id, e.username, e.first_name, e.last_name
             FROM employee e
             JOIN organization_responsible r ON r.user_id = e.id
             WHERE r.organization_id = ?
             ORDER BY e.username",
        )
        .bind(organization_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_employee).collect()
    }
}

fn row_to_employee(row: &SqliteRow) -> Result<Employee, RepositoryError> {
    Ok(Employee {
        id: EmployeeId(uuid(row, "id")?),
        username: text(row, "username")?,
        first_name: optional_text(row, "first_name")?,
        last_name: optional_text(row, "last_name")?,
    })
}

fn row_to_organization(row: &SqliteRow) -> Result<Organization, RepositoryError> {
    Ok(Organization {
        id: OrganizationId(uuid(row, "id")?),
        name: text(row, "name")?,
        description: optional_text(row, "description")?,
        organization_type: OrganizationType::from_stored(&text(row, "type")?),
    })
}

#[async_trait]
impl IdentityDirectory for SqlIdentityDirectory {
    async fn employee_by_username(&self, username: &str) -> Result<Employee, StoreError> {
        Ok(self.fetch_employee_by_username(username).await?)
    }

    async fn employee(&self, id: EmployeeId) -> Result<Employee, StoreError> {
        Ok(self.fetch_employee(id).await?)
    }

    async fn organization(&self, id: OrganizationId) -> Result<Organization, StoreError> {
        Ok(self.fetch_organization(id).await?)
    }

    async fn organization_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Option<Organization>, StoreError> {
        Ok(self.fetch_organization_for_employee(employee_id).await?)
    }

    async fn employees_in_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Employee>, StoreError> {
        Ok(self.fetch_employees_in_organization(organization_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use tenderflow_core::domain::identity::OrganizationType;
    use tenderflow_core::store::{IdentityDirectory, StoreError};

    use super::SqlIdentityDirectory;
    use crate::fixtures::{DemoSeedDataset, SEED_ORGANIZATIONS};
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn resolves_employee_and_their_organization() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        DemoSeedDataset::load(&pool).await.expect("seed");
        let directory = SqlIdentityDirectory::new(pool);

        let employee = directory.employee_by_username("a.volkova").await.expect("employee");
        let organization = directory
            .organization_for_employee(employee.id)
            .await
            .expect("lookup")
            .expect("employee is responsible for an organization");
        assert_eq!(organization.name, SEED_ORGANIZATIONS[0].name);
        assert_eq!(organization.organization_type, OrganizationType::Llc);

        let staff = directory.employees_in_organization(organization.id).await.expect("staff");
        assert_eq!(staff.len(), 5);
    }

    #[tokio::test]
    async fn unknown_username_is_not_found() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        let directory = SqlIdentityDirectory::new(pool);

        let error = directory.employee_by_username("nobody").await.unwrap_err();
        assert_eq!(error, StoreError::NotFound { entity: "employee", key: "nobody".to_owned() });
    }

    #[tokio::test]
    async fn unaffiliated_employee_has_no_organization() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        DemoSeedDataset::load(&pool).await.expect("seed");
        let directory = SqlIdentityDirectory::new(pool);

        let freelancer = directory.employee_by_username("freelancer").await.expect("employee");
        let organization =
            directory.organization_for_employee(freelancer.id).await.expect("lookup");
        assert!(organization.is_none());
    }
}
