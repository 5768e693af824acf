use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ids::{BidId, EmployeeId, OrganizationId, TenderId};
use crate::versioning::Versioned;

token_enum!(
    /// `Approved` and `Rejected` are terminal and only reached through decisions.
    BidStatus, "bid status" {
        Created => "created",
        Published => "published",
        Canceled => "canceled",
        Approved => "approved",
        Rejected => "rejected",
    }
);

impl BidStatus {
    /// Statuses an author may set directly.
    pub fn is_author_settable(&self) -> bool {
        matches!(self, Self::Created | Self::Published | Self::Canceled)
    }

    /// Decided bids never change status again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

token_enum!(BidAuthorType, "bid author type" {
    User => "user",
    Organization => "organization",
});

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidContent {
    pub name: String,
    pub description: String,
}

/// Who submitted a bid. Fixed at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BidAuthor {
    User(EmployeeId),
    Organization(OrganizationId),
}

impl BidAuthor {
    pub fn author_type(&self) -> BidAuthorType {
        match self {
            Self::User(_) => BidAuthorType::User,
            Self::Organization(_) => BidAuthorType::Organization,
        }
    }

    pub fn author_id(&self) -> Uuid {
        match self {
            Self::User(id) => id.0,
            Self::Organization(id) => id.0,
        }
    }

    pub fn from_parts(author_type: BidAuthorType, author_id: Uuid) -> Option<Self> {
        match author_type {
            BidAuthorType::User => Some(Self::User(EmployeeId(author_id))),
            BidAuthorType::Organization => Some(Self::Organization(OrganizationId(author_id))),
            BidAuthorType::Unknown => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bid {
    pub id: BidId,
    pub tender_id: TenderId,
    pub status: BidStatus,
    /// Kept as stored so an unrecognized author type surfaces at authorization time.
    pub author_type: BidAuthorType,
    pub author_id: Uuid,
    pub version: u32,
    pub content: BidContent,
    pub created_at: DateTime<Utc>,
}

impl Bid {
    pub fn author(&self) -> Option<BidAuthor> {
        BidAuthor::from_parts(self.author_type, self.author_id)
    }
}

impl Versioned for Bid {
    type Id = BidId;
    type Content = BidContent;
    type Draft = NewBid;

    const KIND: &'static str = "bid";

    fn id(&self) -> BidId {
        self.id
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn content(&self) -> &BidContent {
        &self.content
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewBid {
    pub id: BidId,
    pub tender_id: TenderId,
    pub author: BidAuthor,
    pub content: BidContent,
    pub created_at: DateTime<Utc>,
}

impl NewBid {
    pub fn new(tender_id: TenderId, author: BidAuthor, content: BidContent) -> Self {
        Self { id: BidId::new(), tender_id, author, content, created_at: Utc::now() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BidPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}
