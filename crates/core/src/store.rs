//! Persistence ports consumed by the services. `tenderflow-db` provides the SQLite adapters.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::bid::{Bid, BidAuthor, BidStatus};
use crate::domain::decision::BidDecision;
use crate::domain::feedback::BidFeedback;
use crate::domain::identity::{Employee, Organization};
use crate::domain::ids::{BidId, EmployeeId, OrganizationId, TenderId};
use crate::domain::page::Page;
use crate::domain::tender::{Tender, TenderFilter, TenderStatus};
use crate::errors::ApplicationError;
use crate::quorum::Verdict;
use crate::versioning::VersionStore;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("storage backend failure: {0}")]
    Backend(String),
    #[error("stored row could not be decoded: {0}")]
    Decode(String),
}

impl From<StoreError> for ApplicationError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { entity, key } => Self::NotFound { entity, key },
            StoreError::Conflict(message) => Self::Conflict(message),
            StoreError::Backend(message) | StoreError::Decode(message) => {
                Self::Persistence(message)
            }
        }
    }
}

#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn employee_by_username(&self, username: &str) -> Result<Employee, StoreError>;

    async fn employee(&self, id: EmployeeId) -> Result<Employee, StoreError>;

    async fn organization(&self, id: OrganizationId) -> Result<Organization, StoreError>;

    /// `None` when the employee is not responsible for any organization.
    async fn organization_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Option<Organization>, StoreError>;

    async fn employees_in_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Employee>, StoreError>;
}

#[async_trait]
pub trait TenderStore: VersionStore<Tender> {
    async fn set_status(&self, id: TenderId, status: TenderStatus) -> Result<Tender, StoreError>;

    /// Newest first.
    async fn list(&self, filter: &TenderFilter, page: Page) -> Result<Vec<Tender>, StoreError>;

    async fn list_by_organization(
        &self,
        organization_id: OrganizationId,
        page: Page,
    ) -> Result<Vec<Tender>, StoreError>;
}

#[async_trait]
pub trait BidStore: VersionStore<Bid> {
    async fn set_status(&self, id: BidId, status: BidStatus) -> Result<Bid, StoreError>;

    /// Bids written by any of `authors`, newest first.
    async fn list_by_authors(
        &self,
        authors: &[BidAuthor],
        page: Page,
    ) -> Result<Vec<Bid>, StoreError>;

    async fn list_by_tender(&self, tender_id: TenderId, page: Page)
        -> Result<Vec<Bid>, StoreError>;

    async fn exists_for_tender_by_authors(
        &self,
        tender_id: TenderId,
        authors: &[BidAuthor],
    ) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait DecisionStore: Send + Sync {
    /// Records the vote and applies whatever `decide` returns for the bid's vote count, the new
    /// vote included. `Approved` also closes `tender_id`. One transaction covers every write.
    async fn record_and_apply(
        &self,
        decision: &BidDecision,
        tender_id: TenderId,
        decide: &(dyn Fn(u32) -> Verdict + Send + Sync),
    ) -> Result<(Bid, Verdict), StoreError>;
}

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn create(&self, feedback: &BidFeedback) -> Result<(), StoreError>;

    /// Feedback left on bids written by any of `authors`, newest first.
    async fn list_for_bid_authors(
        &self,
        authors: &[BidAuthor],
        page: Page,
    ) -> Result<Vec<BidFeedback>, StoreError>;
}

/// The full set of ports a service layer needs.
#[derive(Clone)]
pub struct Stores {
    pub identity: Arc<dyn IdentityDirectory>,
    pub tenders: Arc<dyn TenderStore>,
    pub bids: Arc<dyn BidStore>,
    pub decisions: Arc<dyn DecisionStore>,
    pub feedback: Arc<dyn FeedbackStore>,
}
