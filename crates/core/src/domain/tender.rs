use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ids::{OrganizationId, TenderId};
use crate::versioning::Versioned;

token_enum!(
    /// Lives on the identity row; edits to content never touch it.
    TenderStatus, "tender status" {
        Created => "created",
        Published => "published",
        Closed => "closed",
    }
);

token_enum!(ServiceType, "service type" {
    Construction => "construction",
    Delivery => "delivery",
    Manufacture => "manufacture",
});

/// The versioned part of a tender. Each edit stores a full copy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenderContent {
    pub name: String,
    pub description: String,
    pub service_type: ServiceType,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tender {
    pub id: TenderId,
    pub organization_id: OrganizationId,
    pub status: TenderStatus,
    pub version: u32,
    pub content: TenderContent,
    pub created_at: DateTime<Utc>,
}

impl Versioned for Tender {
    type Id = TenderId;
    type Content = TenderContent;
    type Draft = NewTender;

    const KIND: &'static str = "tender";

    fn id(&self) -> TenderId {
        self.id
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn content(&self) -> &TenderContent {
        &self.content
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTender {
    pub id: TenderId,
    pub organization_id: OrganizationId,
    pub content: TenderContent,
    pub created_at: DateTime<Utc>,
}

impl NewTender {
    pub fn new(organization_id: OrganizationId, content: TenderContent) -> Self {
        Self { id: TenderId::new(), organization_id, content, created_at: Utc::now() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TenderPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub service_type: Option<ServiceType>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TenderFilter {
    /// Empty means every service type.
    pub service_types: Vec<ServiceType>,
}
