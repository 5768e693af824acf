use tracing::info;

use crate::domain::ids::{OrganizationId, TenderId};
use crate::domain::page::Page;
use crate::domain::tender::{
    NewTender, Tender, TenderContent, TenderFilter, TenderPatch, TenderStatus,
};
use crate::errors::{ApplicationError, DomainError};
use crate::guard;
use crate::services::{require_text, resolve_actor};
use crate::store::{Stores, TenderStore};
use crate::versioning::{append_next_version, VersionRecord, VersionStore};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateTender {
    pub content: TenderContent,
    pub organization_id: OrganizationId,
    pub creator_username: String,
}

#[derive(Clone)]
pub struct TenderService {
    stores: Stores,
}

impl TenderService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn create(&self, request: CreateTender) -> Result<Tender, ApplicationError> {
        require_text("name", &request.content.name)?;
        let actor = resolve_actor(self.stores.identity.as_ref(), &request.creator_username).await?;
        if actor.organization_id() != Some(request.organization_id) {
            return Err(ApplicationError::Forbidden(format!(
                "user {} does not represent organization {}",
                actor.employee.username, request.organization_id
            )));
        }

        let draft = NewTender::new(request.organization_id, request.content);
        let tender = self.stores.tenders.create(draft).await?;
        info!(
            event_name = "tender.created",
            tender_id = %tender.id,
            organization_id = %tender.organization_id,
            creator = %actor.employee.username,
            "tender created"
        );
        Ok(tender)
    }

    /// Public listing; no caller identity involved.
    pub async fn list(
        &self,
        filter: &TenderFilter,
        page: Page,
    ) -> Result<Vec<Tender>, ApplicationError> {
        Ok(self.stores.tenders.list(filter, page).await?)
    }

    pub async fn my(&self, username: &str, page: Page) -> Result<Vec<Tender>, ApplicationError> {
        let actor = resolve_actor(self.stores.identity.as_ref(), username).await?;
        let Some(organization_id) = actor.organization_id() else {
            return Ok(Vec::new());
        };
        Ok(self.stores.tenders.list_by_organization(organization_id, page).await?)
    }

    pub async fn status(
        &self,
        id: TenderId,
        username: &str,
    ) -> Result<TenderStatus, ApplicationError> {
        Ok(self.authorize(id, username).await?.status)
    }

    pub async fn set_status(
        &self,
        id: TenderId,
        username: &str,
        status: TenderStatus,
    ) -> Result<Tender, ApplicationError> {
        if status == TenderStatus::Unknown {
            let message = "tender status is required".to_owned();
            return Err(DomainError::InvalidArgument(message).into());
        }
        let current = self.authorize(id, username).await?;
        if current.status == TenderStatus::Closed && status != TenderStatus::Closed {
            return Err(DomainError::InvalidState {
                entity: "tender",
                id: id.to_string(),
                expected: "created or published",
                actual: current.status.to_string(),
            }
            .into());
        }

        let tender = self.stores.tenders.set_status(id, status).await?;
        info!(
            event_name = "tender.status.changed",
            tender_id = %id,
            status = %status,
            "tender status changed"
        );
        Ok(tender)
    }

    pub async fn update(
        &self,
        id: TenderId,
        username: &str,
        patch: TenderPatch,
    ) -> Result<Tender, ApplicationError> {
        let current = self.authorize(id, username).await?;

        let content = TenderContent {
            name: patch.name.unwrap_or(current.content.name),
            description: patch.description.unwrap_or(current.content.description),
            service_type: patch.service_type.unwrap_or(current.content.service_type),
        };
        require_text("name", &content.name)?;

        let tender =
            append_next_version::<Tender, _>(self.stores.tenders.as_ref(), id, content).await?;
        info!(
            event_name = "tender.version.appended",
            tender_id = %id,
            version = tender.version,
            "tender content updated"
        );
        Ok(tender)
    }

    pub async fn rollback(
        &self,
        id: TenderId,
        username: &str,
        version: u32,
    ) -> Result<Tender, ApplicationError> {
        self.authorize(id, username).await?;

        let tender = self.stores.tenders.rollback(id, version).await?;
        info!(
            event_name = "tender.version.rolled_back",
            tender_id = %id,
            version,
            "tender rolled back"
        );
        Ok(tender)
    }

    pub async fn versions(
        &self,
        id: TenderId,
        username: &str,
        page: Page,
    ) -> Result<Vec<VersionRecord<TenderContent>>, ApplicationError> {
        self.authorize(id, username).await?;
        Ok(self.stores.tenders.version_history(id, page).await?)
    }

    pub async fn version(
        &self,
        id: TenderId,
        username: &str,
        version: u32,
    ) -> Result<VersionRecord<TenderContent>, ApplicationError> {
        self.authorize(id, username).await?;
        Ok(self.stores.tenders.version(id, version).await?)
    }

    async fn authorize(&self, id: TenderId, username: &str) -> Result<Tender, ApplicationError> {
        let actor = resolve_actor(self.stores.identity.as_ref(), username).await?;
        let tender = self.stores.tenders.get(id).await?;
        guard::ensure_tender_owner(&tender, &actor)?;
        Ok(tender)
    }
}
