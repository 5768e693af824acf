use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

use tenderflow_core::domain::bid::{Bid, BidAuthor, BidAuthorType, BidContent, BidStatus, NewBid};
use tenderflow_core::domain::ids::{BidId, TenderId};
use tenderflow_core::domain::page::Page;
use tenderflow_core::store::{BidStore, StoreError};
use tenderflow_core::versioning::{VersionRecord, VersionStore};

use super::codec::{datetime, limit_offset, text, timestamp, uuid, version};
use super::RepositoryError;
use crate::DbPool;

const CURRENT_BID_SELECT: &str = "SELECT b.id, b.tender_id, b.status, b.author_type, b.author_id,
        b.created_at, v.version, v.name, v.description
     FROM bid b
     JOIN bid_version v ON v.id = b.current_version_id";

pub struct SqlBidRepository {
    pool: DbPool,
}

impl SqlBidRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, draft: NewBid) -> Result<Bid, RepositoryError> {
        let version_id = Uuid::new_v4().to_string();
        let created_at = timestamp(draft.created_at);
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO bid
                (id, tender_id, status, author_type, author_id, created_at, current_version_id)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(draft.id.to_string())
        .bind(draft.tender_id.to_string())
        .bind(BidStatus::Created.as_str())
        .bind(draft.author.author_type().as_str())
        .bind(draft.author.author_id().to_string())
        .bind(&created_at)
        .bind(&version_id)
        .execute(&mut *tx)
        .await?;

        insert_version(&mut tx, &version_id, draft.id, 1, &draft.content, &created_at).await?;
        let bid = fetch_current(&mut tx, draft.id).await?;
        tx.commit().await?;

        Ok(bid)
    }

    async fn append(
        &self,
        id: BidId,
        number: u32,
        content: BidContent,
    ) -> Result<Bid, RepositoryError> {
        let version_id = Uuid::new_v4().to_string();
        let created_at = timestamp(chrono::Utc::now());
        let mut tx = self.pool.begin().await?;

        ensure_exists(&mut tx, id).await?;
        insert_version(&mut tx, &version_id, id, number, &content, &created_at).await?;
        sqlx::query("UPDATE bid SET current_version_id = ? WHERE id = ?")
            .bind(&version_id)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;
        let bid = fetch_current(&mut tx, id).await?;
        tx.commit().await?;

        Ok(bid)
    }

    async fn repoint(&self, id: BidId, number: u32) -> Result<Bid, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let version_id: Option<String> =
            sqlx::query_scalar("SELECT id FROM bid_version WHERE bid_id = ? AND version = ?")
                .bind(id.to_string())
                .bind(i64::from(number))
                .fetch_optional(&mut *tx)
                .await?;
        let Some(version_id) = version_id else {
            return Err(RepositoryError::not_found("bid version", format!("{id}@{number}")));
        };

        sqlx::query("UPDATE bid SET current_version_id = ? WHERE id = ?")
            .bind(&version_id)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;
        let bid = fetch_current(&mut tx, id).await?;
        tx.commit().await?;

        Ok(bid)
    }

    async fn latest(&self, id: BidId) -> Result<u32, RepositoryError> {
        let latest: Option<i64> =
            sqlx::query_scalar("SELECT MAX(version) FROM bid_version WHERE bid_id = ?")
                .bind(id.to_string())
                .fetch_one(&self.pool)
                .await?;

        match latest {
            Some(latest) => u32::try_from(latest)
                .map_err(|_| RepositoryError::Decode(format!("version out of range: {latest}"))),
            None => Err(RepositoryError::not_found("bid", id)),
        }
    }

    async fn history(
        &self,
        id: BidId,
        page: Page,
    ) -> Result<Vec<VersionRecord<BidContent>>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        ensure_exists(&mut conn, id).await?;

        let (limit, offset) = limit_offset(page);
        let rows = sqlx::query(
            "SELECT version, name, description, created_at
             FROM bid_version
             WHERE bid_id = ?
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
        id: BidId,
        number: u32,
    ) -> Result<VersionRecord<BidContent>, RepositoryError> {
        let row = sqlx::query(
            "SELECT version, name, description, created_at
             FROM bid_version
             WHERE bid_id = ? AND version = ?",
        )
        .bind(id.to_string())
        .bind(i64::from(number))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref row) => row_to_version(row),
            None => Err(RepositoryError::not_found("bid version", format!("{id}@{number}"))),
        }
    }

    async fn update_status(&self, id: BidId, status: BidStatus) -> Result<Bid, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        write_status(&mut conn, id, status).await?;
        fetch_current(&mut conn, id).await
    }

    async fn list_where(
        &self,
        tender_id: Option<TenderId>,
        authors: Option<&[BidAuthor]>,
        page: Page,
    ) -> Result<Vec<Bid>, RepositoryError> {
        let mut builder = QueryBuilder::<Sqlite>::new(CURRENT_BID_SELECT);
        builder.push(" WHERE 1=1");
        if let Some(tender_id) = tender_id {
            builder.push(" AND b.tender_id = ").push_bind(tender_id.to_string());
        }
        if let Some(authors) = authors {
            push_author_clause(&mut builder, authors);
        }

        let (limit, offset) = limit_offset(page);
        builder.push(" ORDER BY b.created_at DESC, b.rowid DESC LIMIT ").push_bind(limit);
        builder.push(" OFFSET ").push_bind(offset);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_bid).collect()
    }

    async fn any_for_tender(
        &self,
        tender_id: TenderId,
        authors: &[BidAuthor],
    ) -> Result<bool, RepositoryError> {
        if authors.is_empty() {
            return Ok(false);
        }

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT EXISTS(SELECT 1 FROM bid b WHERE ");
        builder.push("b.tender_id = ").push_bind(tender_id.to_string());
        push_author_clause(&mut builder, authors);
        builder.push(")");

        let exists: i64 = builder.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(exists == 1)
    }
}

/// Appends `AND (author = ? OR ...)`. An empty author list matches nothing.
fn push_author_clause(builder: &mut QueryBuilder<'_, Sqlite>, authors: &[BidAuthor]) {
    if authors.is_empty() {
        builder.push(" AND 0");
        return;
    }

    builder.push(" AND (");
    for (index, author) in authors.iter().enumerate() {
        if index > 0 {
            builder.push(" OR ");
        }
        builder.push("(b.author_type = ").push_bind(author.author_type().as_str());
        builder.push(" AND b.author_id = ").push_bind(author.author_id().to_string());
        builder.push(")");
    }
    builder.push(")");
}

pub(super) async fn write_status(
    conn: &mut SqliteConnection,
    id: BidId,
    status: BidStatus,
) -> Result<(), RepositoryError> {
    let result = sqlx::query("UPDATE bid SET status = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(id.to_string())
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepositoryError::not_found("bid", id));
    }
    Ok(())
}

async fn ensure_exists(conn: &mut SqliteConnection, id: BidId) -> Result<(), RepositoryError> {
    let exists: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM bid WHERE id = ?)")
        .bind(id.to_string())
        .fetch_one(&mut *conn)
        .await?;
    if exists == 1 {
        Ok(())
    } else {
        Err(RepositoryError::not_found("bid", id))
    }
}

async fn insert_version(
    conn: &mut SqliteConnection,
    version_id: &str,
    bid_id: BidId,
    number: u32,
    content: &BidContent,
    created_at: &str,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO bid_version (id, bid_id, version, name, description, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(version_id)
    .bind(bid_id.to_string())
    .bind(i64::from(number))
    .bind(&content.name)
    .bind(&content.description)
    .bind(created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub(super) async fn fetch_current(
    conn: &mut SqliteConnection,
    id: BidId,
) -> Result<Bid, RepositoryError> {
    let row = sqlx::query(&format!("{CURRENT_BID_SELECT} WHERE b.id = ?"))
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(ref row) => row_to_bid(row),
        None => Err(RepositoryError::not_found("bid", id)),
    }
}

fn row_to_bid(row: &SqliteRow) -> Result<Bid, RepositoryError> {
    Ok(Bid {
        id: BidId(uuid(row, "id")?),
        tender_id: TenderId(uuid(row, "tender_id")?),
        status: BidStatus::from_stored(&text(row, "status")?),
        author_type: BidAuthorType::from_stored(&text(row, "author_type")?),
        author_id: uuid(row, "author_id")?,
        version: version(row, "version")?,
        content: BidContent { name: text(row, "name")?, description: text(row, "description")? },
        created_at: datetime(row, "created_at")?,
    })
}

fn row_to_version(row: &SqliteRow) -> Result<VersionRecord<BidContent>, RepositoryError> {
    Ok(VersionRecord {
        version: version(row, "version")?,
        content: BidContent { name: text(row, "name")?, description: text(row, "description")? },
        created_at: datetime(row, "created_at")?,
    })
}

#[async_trait]
impl VersionStore<Bid> for SqlBidRepository {
    async fn create(&self, draft: NewBid) -> Result<Bid, StoreError> {
        Ok(self.insert(draft).await?)
    }

    async fn get(&self, id: BidId) -> Result<Bid, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(RepositoryError::from)?;
        Ok(fetch_current(&mut conn, id).await?)
    }

    async fn append_version(
        &self,
        id: BidId,
        version: u32,
        content: BidContent,
    ) -> Result<Bid, StoreError> {
        Ok(self.append(id, version, content).await?)
    }

    async fn rollback(&self, id: BidId, version: u32) -> Result<Bid, StoreError> {
        Ok(self.repoint(id, version).await?)
    }

    async fn latest_version_number(&self, id: BidId) -> Result<u32, StoreError> {
        Ok(self.latest(id).await?)
    }

    async fn version_history(
        &self,
        id: BidId,
        page: Page,
    ) -> Result<Vec<VersionRecord<BidContent>>, StoreError> {
        Ok(self.history(id, page).await?)
    }

    async fn version(&self, id: BidId, version: u32) -> Result<VersionRecord<BidContent>, StoreError> {
        Ok(self.specific_version(id, version).await?)
    }
}

#[async_trait]
impl BidStore for SqlBidRepository {
    async fn set_status(&self, id: BidId, status: BidStatus) -> Result<Bid, StoreError> {
        Ok(self.update_status(id, status).await?)
    }

    async fn list_by_authors(
        &self,
        authors: &[BidAuthor],
        page: Page,
    ) -> Result<Vec<Bid>, StoreError> {
        Ok(self.list_where(None, Some(authors), page).await?)
    }

    async fn list_by_tender(&self, tender_id: TenderId, page: Page) -> Result<Vec<Bid>, StoreError> {
        Ok(self.list_where(Some(tender_id), None, page).await?)
    }

    async fn exists_for_tender_by_authors(
        &self,
        tender_id: TenderId,
        authors: &[BidAuthor],
    ) -> Result<bool, StoreError> {
        Ok(self.any_for_tender(tender_id, authors).await?)
    }
}
