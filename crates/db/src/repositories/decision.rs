use async_trait::async_trait;
use sqlx::SqliteConnection;

use tenderflow_core::domain::bid::{Bid, BidStatus};
use tenderflow_core::domain::decision::BidDecision;
use tenderflow_core::domain::ids::{BidId, TenderId};
use tenderflow_core::domain::tender::TenderStatus;
use tenderflow_core::quorum::Verdict;
use tenderflow_core::store::{DecisionStore, StoreError};

use super::bid::{fetch_current, write_status};
use super::codec::timestamp;
use super::RepositoryError;
use crate::DbPool;

/// Write-once log of reviewer votes.
pub struct SqlDecisionRepository {
    pool: DbPool,
}

impl SqlDecisionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn record_in_transaction(
        &self,
        decision: &BidDecision,
        tender_id: TenderId,
        decide: &(dyn Fn(u32) -> Verdict + Send + Sync),
    ) -> Result<(Bid, Verdict), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        insert(&mut tx, decision).await?;
        let verdict = decide(count(&mut tx, decision.bid_id).await?);
        match verdict {
            Verdict::Rejected => write_status(&mut tx, decision.bid_id, BidStatus::Rejected).await?,
            Verdict::Approved { .. } => {
                write_status(&mut tx, decision.bid_id, BidStatus::Approved).await?;
                close_tender(&mut tx, tender_id).await?;
            }
            Verdict::Pending { .. } => {}
        }
        let bid = fetch_current(&mut tx, decision.bid_id).await?;
        tx.commit().await?;

        Ok((bid, verdict))
    }
}

async fn insert(conn: &mut SqliteConnection, decision: &BidDecision) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO bid_decision (id, bid_id, decision, employee_id, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(decision.id.to_string())
    .bind(decision.bid_id.to_string())
    .bind(decision.kind.as_str())
    .bind(decision.employee_id.to_string())
    .bind(timestamp(decision.created_at))
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn count(conn: &mut SqliteConnection, bid_id: BidId) -> Result<u32, RepositoryError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bid_decision WHERE bid_id = ?")
        .bind(bid_id.to_string())
        .fetch_one(&mut *conn)
        .await?;
    u32::try_from(count)
        .map_err(|_| RepositoryError::Decode(format!("decision count out of range: {count}")))
}

async fn close_tender(conn: &mut SqliteConnection, tender_id: TenderId) -> Result<(), RepositoryError> {
    let closed = sqlx::query("UPDATE tender SET status = ? WHERE id = ?")
        .bind(TenderStatus::Closed.as_str())
        .bind(tender_id.to_string())
        .execute(&mut *conn)
        .await?
        .rows_affected();
    if closed == 0 {
        return Err(RepositoryError::not_found("tender", tender_id));
    }
    Ok(())
}

#[async_trait]
impl DecisionStore for SqlDecisionRepository {
    async fn record_and_apply(
        &self,
        decision: &BidDecision,
        tender_id: TenderId,
        decide: &(dyn Fn(u32) -> Verdict + Send + Sync),
    ) -> Result<(Bid, Verdict), StoreError> {
        Ok(self.record_in_transaction(decision, tender_id, decide).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tenderflow_core::domain::bid::{Bid, BidAuthor, BidContent, BidStatus, NewBid};
    use tenderflow_core::domain::decision::{BidDecision, DecisionKind};
    use tenderflow_core::domain::ids::{EmployeeId, TenderId};
    use tenderflow_core::domain::tender::{NewTender, ServiceType, Tender, TenderContent, TenderStatus};
    use tenderflow_core::quorum::Verdict;
    use tenderflow_core::store::{DecisionStore, StoreError};
    use tenderflow_core::versioning::VersionStore;

    use super::SqlDecisionRepository;
    use crate::fixtures::{DemoSeedDataset, SEED_EMPLOYEES, SEED_ORGANIZATIONS};
    use crate::repositories::{SqlBidRepository, SqlTenderRepository};
    use crate::{connect_with_settings, migrations};

    struct Harness {
        decisions: SqlDecisionRepository,
        tenders: SqlTenderRepository,
        bids: SqlBidRepository,
        tender: Tender,
        bid: Bid,
        reviewer: EmployeeId,
    }

    async fn harness() -> Harness {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        DemoSeedDataset::load(&pool).await.expect("seed");

        let tenders = SqlTenderRepository::new(pool.clone());
        let tender = tenders
            .create(NewTender::new(
                SEED_ORGANIZATIONS[0].id.parse().expect("organization id"),
                TenderContent {
                    name: "Fleet".to_owned(),
                    description: "Delivery fleet".to_owned(),
                    service_type: ServiceType::Delivery,
                },
            ))
            .await
            .expect("tender");
        let bids = SqlBidRepository::new(pool.clone());
        let bid = bids
            .create(NewBid::new(
                tender.id,
                BidAuthor::User(SEED_EMPLOYEES[5].id.parse().expect("employee id")),
                BidContent { name: "Vans".to_owned(), description: "Ten vans".to_owned() },
            ))
            .await
            .expect("bid");

        Harness {
            decisions: SqlDecisionRepository::new(pool),
            tenders,
            bids,
            tender,
            bid,
            reviewer: SEED_EMPLOYEES[0].id.parse().expect("employee id"),
        }
    }

    fn pending(recorded: u32) -> Verdict {
        Verdict::Pending { quorum: 3, recorded }
    }

    #[tokio::test]
    async fn repeated_votes_by_one_employee_are_all_counted() {
        let h = harness().await;
        let seen = Mutex::new(Vec::new());
        let decide = |recorded: u32| {
            seen.lock().expect("counts").push(recorded);
            pending(recorded)
        };

        for _ in 0..2 {
            let vote = BidDecision::new(h.bid.id, h.reviewer, DecisionKind::Approved);
            let (bid, verdict) =
                h.decisions.record_and_apply(&vote, h.tender.id, &decide).await.expect("vote");
            assert_eq!(bid.status, BidStatus::Created);
            assert!(matches!(verdict, Verdict::Pending { .. }));
        }

        assert_eq!(*seen.lock().expect("counts"), vec![1, 2]);
    }

    #[tokio::test]
    async fn approval_closes_the_tender_in_the_same_transaction() {
        let h = harness().await;
        let vote = BidDecision::new(h.bid.id, h.reviewer, DecisionKind::Approved);
        let approve = |recorded: u32| Verdict::Approved { quorum: 1, recorded };

        let (bid, verdict) =
            h.decisions.record_and_apply(&vote, h.tender.id, &approve).await.expect("approve");
        assert_eq!(bid.status, BidStatus::Approved);
        assert_eq!(verdict, Verdict::Approved { quorum: 1, recorded: 1 });
        assert_eq!(h.tenders.get(h.tender.id).await.expect("tender").status, TenderStatus::Closed);
    }

    #[tokio::test]
    async fn rejection_updates_only_the_bid() {
        let h = harness().await;
        let vote = BidDecision::new(h.bid.id, h.reviewer, DecisionKind::Rejected);

        let (bid, _) = h
            .decisions
            .record_and_apply(&vote, h.tender.id, &|_: u32| Verdict::Rejected)
            .await
            .expect("reject");
        assert_eq!(bid.status, BidStatus::Rejected);
        assert_eq!(h.tenders.get(h.tender.id).await.expect("tender").status, TenderStatus::Created);
    }

    #[tokio::test]
    async fn failed_verdict_discards_the_vote() {
        let h = harness().await;
        let vote = BidDecision::new(h.bid.id, h.reviewer, DecisionKind::Approved);
        let approve = |recorded: u32| Verdict::Approved { quorum: 1, recorded };

        let error = h
            .decisions
            .record_and_apply(&vote, TenderId::new(), &approve)
            .await
            .expect_err("missing tender");
        assert!(matches!(error, StoreError::NotFound { entity: "tender", .. }));
        assert_eq!(h.bids.get(h.bid.id).await.expect("bid").status, BidStatus::Created);

        let retry = BidDecision::new(h.bid.id, h.reviewer, DecisionKind::Approved);
        let (_, verdict) =
            h.decisions.record_and_apply(&retry, h.tender.id, &pending).await.expect("retry");
        assert_eq!(verdict, pending(1));
    }
}
