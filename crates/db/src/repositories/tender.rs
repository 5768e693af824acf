use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

use tenderflow_core::domain::ids::{OrganizationId, TenderId};
use tenderflow_core::domain::page::Page;
use tenderflow_core::domain::tender::{
    NewTender, ServiceType, Tender, TenderContent, TenderFilter, TenderStatus,
};
use tenderflow_core::store::{StoreError, TenderStore};
use tenderflow_core::versioning::{VersionRecord, VersionStore};

use super::codec::{datetime, limit_offset, text, timestamp, uuid, version};
use super::RepositoryError;
use crate::DbPool;

const CURRENT_TENDER_SELECT: &str = "SELECT t.id, t.organization_id, t.status, t.created_at,
        v.version, v.name, v.description, v.service_type
     FROM tender t
     JOIN tender_version v ON v.id = t.current_version_id";

pub struct SqlTenderRepository {
    pool: DbPool,
}

impl SqlTenderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, draft: NewTender) -> Result<Tender, RepositoryError> {
        let version_id = Uuid::new_v4().to_string();
        let created_at = timestamp(draft.created_at);
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO tender (id, organization_id, status, created_at, current_version_id)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(draft.id.to_string())
        .bind(draft.organization_id.to_string())
        .bind(TenderStatus::Created.as_str())
        .bind(&created_at)
        .bind(&version_id)
        .execute(&mut *tx)
        .await?;

        insert_version(&mut tx, &version_id, draft.id, 1, &draft.content, &created_at).await?;
        let tender = fetch_current(&mut tx, draft.id).await?;
        tx.commit().await?;

        Ok(tender)
    }

    async fn append(
        &self,
        id: TenderId,
        number: u32,
        content: TenderContent,
    ) -> Result<Tender, RepositoryError> {
        let version_id = Uuid::new_v4().to_string();
        let created_at = timestamp(chrono::Utc::now());
        let mut tx = self.pool.begin().await?;

        ensure_exists(&mut tx, id).await?;
        insert_version(&mut tx, &version_id, id, number, &content, &created_at).await?;
        sqlx::query("UPDATE tender SET current_version_id = ? WHERE id = ?")
            .bind(&version_id)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;
        let tender = fetch_current(&mut tx, id).await?;
        tx.commit().await?;

        Ok(tender)
    }

    async fn repoint(&self, id: TenderId, number: u32) -> Result<Tender, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let version_id: Option<String> = sqlx::query_scalar(
            "SELECT id FROM tender_version WHERE tender_id = ? AND version = ?",
        )
        .bind(id.to_string())
        .bind(i64::from(number))
        .fetch_optional(&mut *tx)
        .await?;
        let Some(version_id) = version_id else {
            return Err(RepositoryError::not_found("tender version", format!("{id}@{number}")));
        };

        sqlx::query("UPDATE tender SET current_version_id = ? WHERE id = ?")
            .bind(&version_id)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;
        let tender = fetch_current(&mut tx, id).await?;
        tx.commit().await?;

        Ok(tender)
    }

    async fn latest(&self, id: TenderId) -> Result<u32, RepositoryError> {
        let latest: Option<i64> =
            sqlx::query_scalar("SELECT MAX(version) FROM tender_version WHERE tender_id = ?")
                .bind(id.to_string())
                .fetch_one(&self.pool)
                .await?;

        match latest {
            Some(latest) => u32::try_from(latest)
                .map_err(|_| RepositoryError::Decode(format!("version out of range: {latest}"))),
            None => Err(RepositoryError::not_found("tender", id)),
        }
    }

    async fn history(
        &self,
        id: TenderId,
        page: Page,
    ) -> Result<Vec<VersionRecord<TenderContent>>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        ensure_exists(&mut conn, id).await?;

        let (limit, offset) = limit_offset(page);
        let rows = sqlx::query(
            "SELECT version, name, description, service_type, created_at
             FROM tender_version
             WHERE tender_id = ?
             ORDER BY version DESC
             LIMIT ? OFFSET ?",
        )
        .bind(id.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;

        rows.iter().map(row_to_version).collect()
    }

    async fn specific_version(
        &self,
        id: TenderId,
        number: u32,
    ) -> Result<VersionRecord<TenderContent>, RepositoryError> {
        let row = sqlx::query(
            "SELECT version, name, description, service_type, created_at
             FROM tender_version
             WHERE tender_id = ? AND version = ?",
        )
        .bind(id.to_string())
        .bind(i64::from(number))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref row) => row_to_version(row),
            None => Err(RepositoryError::not_found("tender version", format!("{id}@{number}"))),
        }
    }

    async fn update_status(
        &self,
        id: TenderId,
        status: TenderStatus,
    ) -> Result<Tender, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let result = sqlx::query("UPDATE tender SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id.to_string())
            .execute(&mut *conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("tender", id));
        }

        fetch_current(&mut conn, id).await
    }

    async fn list_filtered(
        &self,
        filter: &TenderFilter,
        organization_id: Option<OrganizationId>,
        page: Page,
    ) -> Result<Vec<Tender>, RepositoryError> {
        let mut builder = QueryBuilder::<Sqlite>::new(CURRENT_TENDER_SELECT);
        builder.push(" WHERE 1=1");

        if let Some(organization_id) = organization_id {
            builder.push(" AND t.organization_id = ").push_bind(organization_id.to_string());
        }
        if !filter.service_types.is_empty() {
            builder.push(" AND v.service_type IN (");
            let mut separated = builder.separated(", ");
            for service_type in &filter.service_types {
                separated.push_bind(service_type.as_str());
            }
            separated.push_unseparated(")");
        }

        let (limit, offset) = limit_offset(page);
        builder.push(" ORDER BY t.created_at DESC, t.rowid DESC LIMIT ").push_bind(limit);
        builder.push(" OFFSET ").push_bind(offset);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_tender).collect()
    }
}

async fn ensure_exists(conn: &mut SqliteConnection, id: TenderId) -> Result<(), RepositoryError> {
    let exists: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tender WHERE id = ?)")
        .bind(id.to_string())
        .fetch_one(&mut *conn)
        .await?;
    if exists == 1 {
        Ok(())
    } else {
        Err(RepositoryError::not_found("tender", id))
    }
}

async fn insert_version(
    conn: &mut SqliteConnection,
    version_id: &str,
    tender_id: TenderId,
    number: u32,
    content: &TenderContent,
    created_at: &str,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO tender_version
            (id, tender_id, version, name, description, service_type, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(version_id)
    .bind(tender_id.to_string())
    .bind(i64::from(number))
    .bind(&content.name)
    .bind(&content.description)
    .bind(content.service_type.as_str())
    .bind(created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn fetch_current(conn: &mut SqliteConnection, id: TenderId) -> Result<Tender, RepositoryError> {
    let row = sqlx::query(&format!("{CURRENT_TENDER_SELECT} WHERE t.id = ?"))
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(ref row) => row_to_tender(row),
        None => Err(RepositoryError::not_found("tender", id)),
    }
}

fn row_to_tender(row: &SqliteRow) -> Result<Tender, RepositoryError> {
    Ok(Tender {
        id: TenderId(uuid(row, "id")?),
        organization_id: OrganizationId(uuid(row, "organization_id")?),
        status: TenderStatus::from_stored(&text(row, "status")?),
        version: version(row, "version")?,
        content: TenderContent {
            name: text(row, "name")?,
            description: text(row, "description")?,
            service_type: ServiceType::from_stored(&text(row, "service_type")?),
        },
        created_at: datetime(row, "created_at")?,
    })
}

fn row_to_version(row: &SqliteRow) -> Result<VersionRecord<TenderContent>, RepositoryError> {
    Ok(VersionRecord {
        version: version(row, "version")?,
        content: TenderContent {
            name: text(row, "name")?,
            description: text(row, "description")?,
            service_type: ServiceType::from_stored(&text(row, "service_type")?),
        },
        created_at: datetime(row, "created_at")?,
    })
}

#[async_trait]
impl VersionStore<Tender> for SqlTenderRepository {
    async fn create(&self, draft: NewTender) -> Result<Tender, StoreError> {
        Ok(self.insert(draft).await?)
    }

    async fn get(&self, id: TenderId) -> Result<Tender, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(RepositoryError::from)?;
        Ok(fetch_current(&mut conn, id).await?)
    }

    async fn append_version(
        &self,
        id: TenderId,
        version: u32,
        content: TenderContent,
    ) -> Result<Tender, StoreError> {
        Ok(self.append(id, version, content).await?)
    }

    async fn rollback(&self, id: TenderId, version: u32) -> Result<Tender, StoreError> {
        Ok(self.repoint(id, version).await?)
    }

    async fn latest_version_number(&self, id: TenderId) -> Result<u32, StoreError> {
        Ok(self.latest(id).await?)
    }

    async fn version_history(
        &self,
        id: TenderId,
        page: Page,
    ) -> Result<Vec<VersionRecord<TenderContent>>, StoreError> {
        Ok(self.history(id, page).await?)
    }

    async fn version(
        &self,
        id: TenderId,
        version: u32,
    ) -> Result<VersionRecord<TenderContent>, StoreError> {
        Ok(self.specific_version(id, version).await?)
    }
}

#[async_trait]
impl TenderStore for SqlTenderRepository {
    async fn set_status(&self, id: TenderId, status: TenderStatus) -> Result<Tender, StoreError> {
        Ok(self.update_status(id, status).await?)
    }

    async fn list(&self, filter: &TenderFilter, page: Page) -> Result<Vec<Tender>, StoreError> {
        Ok(self.list_filtered(filter, None, page).await?)
    }

    async fn list_by_organization(
        &self,
        organization_id: OrganizationId,
        page: Page,
    ) -> Result<Vec<Tender>, StoreError> {
        Ok(self.list_filtered(&TenderFilter::default(), Some(organization_id), page).await?)
    }
}

#[cfg(test)]
mod tests {
    use tenderflow_core::domain::ids::{OrganizationId, TenderId};
    use tenderflow_core::domain::page::Page;
    use tenderflow_core::domain::tender::{
        NewTender, ServiceType, TenderContent, TenderFilter, TenderStatus,
    };
    use tenderflow_core::store::{StoreError, TenderStore};
    use tenderflow_core::versioning::VersionStore;

    use super::SqlTenderRepository;
    use crate::fixtures::{DemoSeedDataset, SEED_ORGANIZATIONS};
    use crate::{connect_with_settings, migrations};

    async fn repository() -> (SqlTenderRepository, OrganizationId) {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        DemoSeedDataset::load(&pool).await.expect("seed");
        let organization_id = SEED_ORGANIZATIONS[0].id.parse().expect("seed organization id");
        (SqlTenderRepository::new(pool), organization_id)
    }

    fn content(name: &str, service_type: ServiceType) -> TenderContent {
        TenderContent {
            name: name.to_owned(),
            description: format!("{name} description"),
            service_type,
        }
    }

    #[tokio::test]
    async fn create_then_read_current_version() {
        let (repo, organization_id) = repository().await;
        let created = repo
            .create(NewTender::new(organization_id, content("Road", ServiceType::Construction)))
            .await
            .expect("create");

        assert_eq!(created.version, 1);
        assert_eq!(created.status, TenderStatus::Created);
        assert_eq!(repo.get(created.id).await.expect("get"), created);
        assert_eq!(repo.latest_version_number(created.id).await.expect("latest"), 1);
    }

    #[tokio::test]
    async fn missing_tender_is_not_found() {
        let (repo, _) = repository().await;
        let id = TenderId::new();

        assert!(matches!(repo.get(id).await, Err(StoreError::NotFound { entity: "tender", .. })));
        assert!(matches!(
            repo.latest_version_number(id).await,
            Err(StoreError::NotFound { entity: "tender", .. })
        ));
        assert!(matches!(
            repo.set_status(id, TenderStatus::Published).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn duplicate_version_number_is_a_conflict() {
        let (repo, organization_id) = repository().await;
        let tender = repo
            .create(NewTender::new(organization_id, content("Road", ServiceType::Construction)))
            .await
            .expect("create");

        let error = repo
            .append_version(tender.id, 1, content("Road again", ServiceType::Construction))
            .await
            .unwrap_err();
        assert!(matches!(error, StoreError::Conflict(_)), "got {error:?}");
        assert_eq!(repo.get(tender.id).await.expect("get").content.name, "Road");
    }

    #[tokio::test]
    async fn history_is_newest_first_and_paginated() {
        let (repo, organization_id) = repository().await;
        let tender = repo
            .create(NewTender::new(organization_id, content("v1", ServiceType::Delivery)))
            .await
            .expect("create");
        repo.append_version(tender.id, 2, content("v2", ServiceType::Delivery)).await.expect("v2");
        repo.append_version(tender.id, 3, content("v3", ServiceType::Delivery)).await.expect("v3");

        let page = repo.version_history(tender.id, Page { limit: 2, offset: 0 }).await.unwrap();
        assert_eq!(page.iter().map(|record| record.version).collect::<Vec<_>>(), vec![3, 2]);

        let second = repo.version(tender.id, 2).await.expect("version 2");
        assert_eq!(second.content.name, "v2");
        assert!(matches!(
            repo.version(tender.id, 9).await,
            Err(StoreError::NotFound { entity: "tender version", .. })
        ));
    }

    #[tokio::test]
    async fn listing_filters_by_service_type_and_organization() {
        let (repo, organization_id) = repository().await;
        let other_organization = SEED_ORGANIZATIONS[1].id.parse().expect("seed organization id");
        repo.create(NewTender::new(organization_id, content("a", ServiceType::Construction)))
            .await
            .expect("a");
        repo.create(NewTender::new(organization_id, content("b", ServiceType::Delivery)))
            .await
            .expect("b");
        repo.create(NewTender::new(other_organization, content("c", ServiceType::Manufacture)))
            .await
            .expect("c");

        let all = repo.list(&TenderFilter::default(), Page::default()).await.expect("all");
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].content.name, "c");

        let filter = TenderFilter {
            service_types: vec![ServiceType::Delivery, ServiceType::Manufacture],
        };
        let filtered = repo.list(&filter, Page::default()).await.expect("filtered");
        assert_eq!(
            filtered.iter().map(|t| t.content.name.as_str()).collect::<Vec<_>>(),
            vec!["c", "b"]
        );

        let mine = repo.list_by_organization(organization_id, Page::default()).await.expect("mine");
        assert_eq!(mine.len(), 2);

        let paged = repo.list(&TenderFilter::default(), Page { limit: 1, offset: 1 }).await.unwrap();
        assert_eq!(paged.len(), 1);
        assert_eq!(paged[0].content.name, "b");
    }
}
