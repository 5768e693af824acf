use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Sqlite};

use tenderflow_core::domain::bid::BidAuthor;
use tenderflow_core::domain::feedback::BidFeedback;
use tenderflow_core::domain::ids::{BidId, EmployeeId, FeedbackId};
use tenderflow_core::domain::page::Page;
use tenderflow_core::store::{FeedbackStore, StoreError};

use super::codec::{datetime, limit_offset, text, timestamp, uuid};
use super::RepositoryError;
use crate::DbPool;

pub struct SqlFeedbackRepository {
    pool: DbPool,
}

impl SqlFeedbackRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, feedback: &BidFeedback) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO bid_feedback (id, bid_id, description, author_id, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(feedback.id.to_string())
        .bind(feedback.bid_id.to_string())
        .bind(&feedback.description)
        .bind(feedback.author_id.to_string())
        .bind(timestamp(feedback.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch_for_authors(
        &self,
        authors: &[BidAuthor],
        page: Page,
    ) -> Result<Vec<BidFeedback>, RepositoryError> {
        if authors.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT f.id, f.bid_id, f.description, f.author_id, f.created_at
             FROM bid_feedback f
             JOIN bid b ON b.id = f.bid_id
             WHERE ",
        );
        for (index, author) in authors.iter().enumerate() {
            if index > 0 {
                builder.push(" OR ");
            }
            builder.push("(b.author_type = ").push_bind(author.author_type().as_str());
            builder.push(" AND b.author_id = ").push_bind(author.author_id().to_string());
            builder.push(")");
        }

        let (limit, offset) = limit_offset(page);
        builder.push(" ORDER BY f.created_at DESC, f.rowid DESC LIMIT ").push_bind(limit);
        builder.push(" OFFSET ").push_bind(offset);

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_feedback).collect()
    }
}

fn row_to_feedback(row: &SqliteRow) -> Result<BidFeedback, RepositoryError> {
    Ok(BidFeedback {
        id: FeedbackId(uuid(row, "id")?),
        bid_id: BidId(uuid(row, "bid_id")?),
        description: text(row, "description")?,
        author_id: EmployeeId(uuid(row, "author_id")?),
        created_at: datetime(row, "created_at")?,
    })
}

#[async_trait]
impl FeedbackStore for SqlFeedbackRepository {
    async fn create(&self, feedback: &BidFeedback) -> Result<(), StoreError> {
        Ok(self.insert(feedback).await?)
    }

    async fn list_for_bid_authors(
        &self,
        authors: &[BidAuthor],
        page: Page,
    ) -> Result<Vec<BidFeedback>, StoreError> {
        Ok(self.fetch_for_authors(authors, page).await?)
    }
}

#[cfg(test)]
mod tests {
    use tenderflow_core::domain::bid::{BidAuthor, BidContent, NewBid};
    use tenderflow_core::domain::feedback::BidFeedback;
    use tenderflow_core::domain::ids::EmployeeId;
    use tenderflow_core::domain::page::Page;
    use tenderflow_core::domain::tender::{NewTender, ServiceType, TenderContent};
    use tenderflow_core::store::FeedbackStore;
    use tenderflow_core::versioning::VersionStore;

    use super::SqlFeedbackRepository;
    use crate::fixtures::{DemoSeedDataset, SEED_EMPLOYEES, SEED_ORGANIZATIONS};
    use crate::repositories::{SqlBidRepository, SqlTenderRepository};
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn feedback_is_listed_for_every_bid_by_the_author() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        DemoSeedDataset::load(&pool).await.expect("seed");

        let tenders = SqlTenderRepository::new(pool.clone());
        let bids = SqlBidRepository::new(pool.clone());
        let feedback = SqlFeedbackRepository::new(pool);
        let reviewer: EmployeeId = SEED_EMPLOYEES[0].id.parse().expect("employee id");
        let author = BidAuthor::User(SEED_EMPLOYEES[5].id.parse().expect("employee id"));
        let other = BidAuthor::User(SEED_EMPLOYEES[6].id.parse().expect("employee id"));

        let mut authored = Vec::new();
        for name in ["first", "second"] {
            let tender = tenders
                .create(NewTender::new(
                    SEED_ORGANIZATIONS[0].id.parse().expect("organization id"),
                    TenderContent {
                        name: name.to_owned(),
                        description: "tender".to_owned(),
                        service_type: ServiceType::Manufacture,
                    },
                ))
                .await
                .expect("tender");
            let bid = bids
                .create(NewBid::new(
                    tender.id,
                    author,
                    BidContent { name: name.to_owned(), description: "bid".to_owned() },
                ))
                .await
                .expect("bid");
            authored.push(bid);
        }
        let unrelated = bids
            .create(NewBid::new(
                authored[0].tender_id,
                other,
                BidContent { name: "other".to_owned(), description: "bid".to_owned() },
            ))
            .await
            .expect("bid");

        feedback.create(&BidFeedback::new(authored[0].id, reviewer, "late delivery")).await.unwrap();
        feedback.create(&BidFeedback::new(authored[1].id, reviewer, "good price")).await.unwrap();
        feedback.create(&BidFeedback::new(unrelated.id, reviewer, "unrelated")).await.unwrap();

        let listed = feedback.list_for_bid_authors(&[author], Page::default()).await.expect("list");
        assert_eq!(
            listed.iter().map(|f| f.description.as_str()).collect::<Vec<_>>(),
            vec!["good price", "late delivery"]
        );

        let first_page =
            feedback.list_for_bid_authors(&[author], Page { limit: 1, offset: 0 }).await.unwrap();
        assert_eq!(first_page.len(), 1);
        assert!(feedback.list_for_bid_authors(&[], Page::default()).await.unwrap().is_empty());
    }
}
