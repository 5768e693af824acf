pub mod config;
pub mod domain;
pub mod errors;
pub mod guard;
pub mod quorum;
pub mod services;
pub mod store;
pub mod versioning;

pub use domain::bid::{Bid, BidAuthor, BidAuthorType, BidContent, BidPatch, BidStatus, NewBid};
pub use domain::decision::{BidDecision, DecisionKind};
pub use domain::feedback::BidFeedback;
pub use domain::identity::{Actor, Employee, Organization, OrganizationType};
pub use domain::ids::{BidId, DecisionId, EmployeeId, FeedbackId, OrganizationId, TenderId};
pub use domain::page::{Page, PageSettings};
pub use domain::tender::{
    NewTender, ServiceType, Tender, TenderContent, TenderFilter, TenderPatch, TenderStatus,
};
pub use errors::{ApplicationError, DomainError, ErrorKind, InterfaceError};
pub use quorum::{QuorumEngine, Verdict};
pub use services::{BidService, CreateBid, CreateTender, TenderService};
pub use store::{
    BidStore, DecisionStore, FeedbackStore, IdentityDirectory, StoreError, Stores, TenderStore,
};
pub use versioning::{VersionRecord, VersionStore, Versioned};
