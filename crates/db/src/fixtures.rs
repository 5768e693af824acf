use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Fixed timestamp for seeded reference rows so repeated loads stay identical.
const SEED_TIMESTAMP: &str = "2024-09-01T08:00:00.000000Z";

#[derive(Debug, Clone, Copy)]
pub struct SeedOrganization {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub organization_type: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct SeedEmployee {
    pub id: &'static str,
    pub username: &'static str,
    pub first_name: &'static str,
    pub last_name: &'static str,
    /// Index into [`SEED_ORGANIZATIONS`]; `None` for unaffiliated employees.
    pub organization: Option<usize>,
}

pub const SEED_ORGANIZATIONS: &[SeedOrganization] = &[
    SeedOrganization {
        id: "6f1c2a8e-0d4b-4e8a-9b51-0c7a1d2e3f01",
        name: "Volga Build",
        description: "Road and bridge construction",
        organization_type: "LLC",
    },
    SeedOrganization {
        id: "6f1c2a8e-0d4b-4e8a-9b51-0c7a1d2e3f02",
        name: "Northern Freight",
        description: "Regional cargo delivery",
        organization_type: "JSC",
    },
    SeedOrganization {
        id: "6f1c2a8e-0d4b-4e8a-9b51-0c7a1d2e3f03",
        name: "Ivanov Workshop",
        description: "Small-batch metal fabrication",
        organization_type: "IP",
    },
];

pub const SEED_EMPLOYEES: &[SeedEmployee] = &[
    SeedEmployee {
        id: "3b9d7e40-5a2c-4f61-8d13-7e2f4a6b8c01",
        username: "a.volkova",
        first_name: "Anna",
        last_name: "Volkova",
        organization: Some(0),
    },
    SeedEmployee {
        id: "3b9d7e40-5a2c-4f61-8d13-7e2f4a6b8c02",
        username: "d.sokolov",
        first_name: "Dmitry",
        last_name: "Sokolov",
        organization: Some(0),
    },
    SeedEmployee {
        id: "3b9d7e40-5a2c-4f61-8d13-7e2f4a6b8c03",
        username: "m.orlova",
        first_name: "Maria",
        last_name: "Orlova",
        organization: Some(0),
    },
    SeedEmployee {
        id: "3b9d7e40-5a2c-4f61-8d13-7e2f4a6b8c04",
        username: "p.kuznetsov",
        first_name: "Pavel",
        last_name: "Kuznetsov",
        organization: Some(0),
    },
    SeedEmployee {
        id: "3b9d7e40-5a2c-4f61-8d13-7e2f4a6b8c05",
        username: "e.smirnova",
        first_name: "Elena",
        last_name: "Smirnova",
        organization: Some(0),
    },
    SeedEmployee {
        id: "3b9d7e40-5a2c-4f61-8d13-7e2f4a6b8c06",
        username: "i.petrov",
        first_name: "Ivan",
        last_name: "Petrov",
        organization: Some(1),
    },
    SeedEmployee {
        id: "3b9d7e40-5a2c-4f61-8d13-7e2f4a6b8c07",
        username: "n.fedorova",
        first_name: "Natalia",
        last_name: "Fedorova",
        organization: Some(1),
    },
    SeedEmployee {
        id: "3b9d7e40-5a2c-4f61-8d13-7e2f4a6b8c08",
        username: "s.ivanov",
        first_name: "Sergey",
        last_name: "Ivanov",
        organization: Some(2),
    },
    SeedEmployee {
        id: "3b9d7e40-5a2c-4f61-8d13-7e2f4a6b8c09",
        username: "freelancer",
        first_name: "Oleg",
        last_name: "Morozov",
        organization: None,
    },
];

/// Deterministic reference data: three organizations of different sizes and one
/// employee with no organization.
///
/// Employees and organizations are owned by an upstream directory; this dataset
/// stands in for it during local runs and tests.
pub struct DemoSeedDataset;

impl DemoSeedDataset {
    /// Insert the dataset. Rows that already exist are left alone.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        let mut responsible_links = 0;

        for organization in SEED_ORGANIZATIONS {
            sqlx::query(
                "INSERT OR IGNORE INTO organization
                    (id, name, description, type, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(organization.id)
            .bind(organization.name)
            .bind(organization.description)
            .bind(organization.organization_type)
            .bind(SEED_TIMESTAMP)
            .bind(SEED_TIMESTAMP)
            .execute(&mut *tx)
            .await?;
        }

        for (index, employee) in SEED_EMPLOYEES.iter().enumerate() {
            sqlx::query(
                "INSERT OR IGNORE INTO employee
                    (id, username, first_name, last_name, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(employee.id)
            .bind(employee.username)
            .bind(employee.first_name)
            .bind(employee.last_name)
            .bind(SEED_TIMESTAMP)
            .bind(SEED_TIMESTAMP)
            .execute(&mut *tx)
            .await?;

            if let Some(organization) = employee.organization.and_then(|i| SEED_ORGANIZATIONS.get(i))
            {
                sqlx::query(
                    "INSERT OR IGNORE INTO organization_responsible (id, organization_id, user_id)
                     VALUES (?, ?, ?)",
                )
                .bind(format!("seed-responsible-{index:02}"))
                .bind(organization.id)
                .bind(employee.id)
                .execute(&mut *tx)
                .await?;
                responsible_links += 1;
            }
        }

        tx.commit().await?;

        Ok(SeedResult {
            organizations: SEED_ORGANIZATIONS.len(),
            employees: SEED_EMPLOYEES.len(),
            responsible_links,
        })
    }

    /// Check that every seeded row is present with its organization link.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for organization in SEED_ORGANIZATIONS {
            let present: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM organization WHERE id = ?1 AND type = ?2)",
            )
            .bind(organization.id)
            .bind(organization.organization_type)
            .fetch_one(pool)
            .await?;
            checks.push((organization.name, present == 1));
        }

        for employee in SEED_EMPLOYEES {
            let linked_organization = sqlx::query_scalar::<_, Option<String>>(
                "SELECT r.organization_id
                 FROM employee e
                 LEFT JOIN organization_responsible r ON r.user_id = e.id
                 WHERE e.username = ?1",
            )
            .bind(employee.username)
            .fetch_optional(pool)
            .await?
            .flatten();

            let expected = employee
                .organization
                .and_then(|i| SEED_ORGANIZATIONS.get(i))
                .map(|organization| organization.id.to_owned());
            let present: i64 =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM employee WHERE username = ?1)")
                    .bind(employee.username)
                    .fetch_one(pool)
                    .await?;

            checks.push((employee.username, present == 1 && linked_organization == expected));
        }

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }

    /// Remove the seeded reference rows. Tenders and bids referencing them must be gone first.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;

        for employee in SEED_EMPLOYEES {
            sqlx::query("DELETE FROM organization_responsible WHERE user_id = ?")
                .bind(employee.id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM employee WHERE id = ?")
                .bind(employee.id)
                .execute(&mut *tx)
                .await?;
        }
        for organization in SEED_ORGANIZATIONS {
            sqlx::query("DELETE FROM organization WHERE id = ?")
                .bind(organization.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedResult {
    pub organizations: usize,
    pub employees: usize,
    pub responsible_links: usize,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
