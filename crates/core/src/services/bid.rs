use tracing::{debug, info};

use crate::domain::bid::{Bid, BidAuthor, BidContent, BidPatch, BidStatus, NewBid};
use crate::domain::decision::{BidDecision, DecisionKind};
use crate::domain::feedback::BidFeedback;
use crate::domain::identity::Actor;
use crate::domain::ids::{BidId, TenderId};
use crate::domain::page::Page;
use crate::errors::{ApplicationError, DomainError};
use crate::guard;
use crate::quorum::{QuorumEngine, Verdict};
use crate::services::{require_text, resolve_actor};
use crate::store::{BidStore, Stores};
use crate::versioning::{append_next_version, VersionRecord, VersionStore};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateBid {
    pub content: BidContent,
    pub tender_id: TenderId,
    pub author: BidAuthor,
}

#[derive(Clone)]
pub struct BidService {
    stores: Stores,
    quorum: QuorumEngine,
}

impl BidService {
    pub fn new(stores: Stores, quorum: QuorumEngine) -> Self {
        Self { stores, quorum }
    }

    pub async fn create(&self, request: CreateBid) -> Result<Bid, ApplicationError> {
        require_text("name", &request.content.name)?;
        self.stores.tenders.get(request.tender_id).await?;
        match request.author {
            BidAuthor::User(employee_id) => {
                self.stores.identity.employee(employee_id).await?;
            }
            BidAuthor::Organization(organization_id) => {
                self.stores.identity.organization(organization_id).await?;
            }
        }

        let bid = self
            .stores
            .bids
            .create(NewBid::new(request.tender_id, request.author, request.content))
            .await?;
        info!(
            event_name = "bid.created",
            bid_id = %bid.id,
            tender_id = %bid.tender_id,
            author_type = %bid.author_type,
            "bid created"
        );
        Ok(bid)
    }

    /// Bids the caller wrote personally or through their organization.
    pub async fn my(&self, username: &str, page: Page) -> Result<Vec<Bid>, ApplicationError> {
        let actor = resolve_actor(self.stores.identity.as_ref(), username).await?;
        Ok(self.stores.bids.list_by_authors(&authors_of(&actor), page).await?)
    }

    pub async fn list_for_tender(
        &self,
        tender_id: TenderId,
        username: &str,
        page: Page,
    ) -> Result<Vec<Bid>, ApplicationError> {
        let actor = resolve_actor(self.stores.identity.as_ref(), username).await?;
        let tender = self.stores.tenders.get(tender_id).await?;
        guard::ensure_tender_owner(&tender, &actor)?;
        Ok(self.stores.bids.list_by_tender(tender_id, page).await?)
    }

    pub async fn status(&self, id: BidId, username: &str) -> Result<BidStatus, ApplicationError> {
        let actor = resolve_actor(self.stores.identity.as_ref(), username).await?;
        let bid = self.stores.bids.get(id).await?;
        guard::ensure_read_access(&bid, &actor)?;
        Ok(bid.status)
    }

    pub async fn set_status(
        &self,
        id: BidId,
        username: &str,
        status: BidStatus,
    ) -> Result<Bid, ApplicationError> {
        if !status.is_author_settable() {
            return Err(DomainError::InvalidArgument(format!(
                "bid status `{status}` cannot be set directly"
            ))
            .into());
        }
        let current = self.authorize_author(id, username).await?;
        if current.status.is_terminal() {
            return Err(DomainError::InvalidState {
                entity: "bid",
                id: id.to_string(),
                expected: "created, published or canceled",
                actual: current.status.to_string(),
            }
            .into());
        }

        let bid = self.stores.bids.set_status(id, status).await?;
        info!(
            event_name = "bid.status.changed",
            bid_id = %id,
            status = %status,
            "bid status changed"
        );
        Ok(bid)
    }

    pub async fn update(
        &self,
        id: BidId,
        username: &str,
        patch: BidPatch,
    ) -> Result<Bid, ApplicationError> {
        let current = self.authorize_author(id, username).await?;

        let content = BidContent {
            name: patch.name.unwrap_or(current.content.name),
            description: patch.description.unwrap_or(current.content.description),
        };
        require_text("name", &content.name)?;

        let bid = append_next_version::<Bid, _>(self.stores.bids.as_ref(), id, content).await?;
        info!(
            event_name = "bid.version.appended",
            bid_id = %id,
            version = bid.version,
            "bid content updated"
        );
        Ok(bid)
    }

    pub async fn rollback(
        &self,
        id: BidId,
        username: &str,
        version: u32,
    ) -> Result<Bid, ApplicationError> {
        self.authorize_author(id, username).await?;

        let bid = self.stores.bids.rollback(id, version).await?;
        info!(event_name = "bid.version.rolled_back", bid_id = %id, version, "bid rolled back");
        Ok(bid)
    }

    pub async fn versions(
        &self,
        id: BidId,
        username: &str,
        page: Page,
    ) -> Result<Vec<VersionRecord<BidContent>>, ApplicationError> {
        self.authorize_author(id, username).await?;
        Ok(self.stores.bids.version_history(id, page).await?)
    }

    pub async fn version(
        &self,
        id: BidId,
        username: &str,
        version: u32,
    ) -> Result<VersionRecord<BidContent>, ApplicationError> {
        self.authorize_author(id, username).await?;
        Ok(self.stores.bids.version(id, version).await?)
    }

    /// Records one reviewer's vote and applies the quorum verdict.
    pub async fn submit_decision(
        &self,
        id: BidId,
        username: &str,
        decision: DecisionKind,
    ) -> Result<Bid, ApplicationError> {
        if decision == DecisionKind::Unknown {
            return Err(DomainError::InvalidArgument("decision is required".to_owned()).into());
        }
        let actor = resolve_actor(self.stores.identity.as_ref(), username).await?;
        let bid = self.stores.bids.get(id).await?;
        let tender = self.stores.tenders.get(bid.tender_id).await?;
        self.quorum.validate(&tender, &bid, &actor)?;

        let headcount = self
            .stores
            .identity
            .employees_in_organization(tender.organization_id)
            .await?
            .len();
        let record = BidDecision::new(bid.id, actor.employee.id, decision);
        let engine = self.quorum;
        let decide = move |recorded: u32| engine.evaluate(decision, headcount, recorded);
        let (bid, verdict) =
            self.stores.decisions.record_and_apply(&record, tender.id, &decide).await?;
        info!(
            event_name = "bid.decision.recorded",
            correlation_id = %record.id,
            bid_id = %bid.id,
            decision = %decision,
            reviewer = %actor.employee.username,
            "bid decision recorded"
        );

        match verdict {
            Verdict::Rejected => {
                info!(event_name = "bid.rejected", bid_id = %bid.id, "bid rejected by reviewer");
            }
            Verdict::Approved { quorum, recorded } => {
                info!(
                    event_name = "bid.quorum.reached",
                    bid_id = %bid.id,
                    tender_id = %tender.id,
                    quorum,
                    recorded,
                    "bid approved and tender closed"
                );
            }
            Verdict::Pending { quorum, recorded } => {
                debug!(
                    event_name = "bid.quorum.pending",
                    bid_id = %bid.id,
                    quorum,
                    recorded,
                    "bid awaiting further approvals"
                );
            }
        }
        Ok(bid)
    }

    pub async fn leave_feedback(
        &self,
        id: BidId,
        username: &str,
        description: &str,
    ) -> Result<Bid, ApplicationError> {
        require_text("feedback", description)?;
        let actor = resolve_actor(self.stores.identity.as_ref(), username).await?;
        let bid = self.stores.bids.get(id).await?;
        let tender = self.stores.tenders.get(bid.tender_id).await?;
        guard::ensure_tender_owner(&tender, &actor)?;

        let feedback = BidFeedback::new(bid.id, actor.employee.id, description);
        self.stores.feedback.create(&feedback).await?;
        info!(
            event_name = "bid.feedback.recorded",
            correlation_id = %feedback.id,
            bid_id = %bid.id,
            reviewer = %actor.employee.username,
            "bid feedback recorded"
        );
        Ok(bid)
    }

    /// Feedback history of a bidder, visible to the owner of a tender the bidder competed on.
    pub async fn authors_feedback(
        &self,
        tender_id: TenderId,
        author_username: &str,
        requester_username: &str,
        page: Page,
    ) -> Result<Vec<BidFeedback>, ApplicationError> {
        let requester = resolve_actor(self.stores.identity.as_ref(), requester_username).await?;
        let tender = self.stores.tenders.get(tender_id).await?;
        guard::ensure_tender_owner(&tender, &requester)?;

        let author = resolve_actor(self.stores.identity.as_ref(), author_username).await?;
        let authors = authors_of(&author);
        if !self.stores.bids.exists_for_tender_by_authors(tender_id, &authors).await? {
            return Err(ApplicationError::not_found(
                "bid",
                format!("by {} on tender {tender_id}", author.employee.username),
            ));
        }

        Ok(self.stores.feedback.list_for_bid_authors(&authors, page).await?)
    }

    async fn authorize_author(&self, id: BidId, username: &str) -> Result<Bid, ApplicationError> {
        let actor = resolve_actor(self.stores.identity.as_ref(), username).await?;
        let bid = self.stores.bids.get(id).await?;
        guard::ensure_bid_author(&bid, &actor)?;
        Ok(bid)
    }
}

/// Every author identity an actor can write bids under.
fn authors_of(actor: &Actor) -> Vec<BidAuthor> {
    let mut authors = vec![BidAuthor::User(actor.employee.id)];
    if let Some(organization_id) = actor.organization_id() {
        authors.push(BidAuthor::Organization(organization_id));
    }
    authors
}
