//! Append-only versioning shared by tenders and bids.
//!
//! An entity is an identity row (status, ownership, current pointer) plus immutable content rows
//! numbered from 1. Updates append `max(all versions) + 1` and repoint; rollbacks only repoint.

use std::fmt::Display;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::page::Page;
use crate::store::StoreError;

pub trait Versioned: Clone + Send + Sync + 'static {
    type Id: Copy + Display + Send + Sync + 'static;
    type Content: Clone + Send + Sync + 'static;
    type Draft: Send + 'static;

    const KIND: &'static str;

    fn id(&self) -> Self::Id;
    fn version(&self) -> u32;
    fn content(&self) -> &Self::Content;
}

/// One stored content row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionRecord<C> {
    pub version: u32,
    pub content: C,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait VersionStore<E: Versioned>: Send + Sync {
    /// Identity row plus version 1, atomically.
    async fn create(&self, draft: E::Draft) -> Result<E, StoreError>;

    /// Identity row joined with its current content.
    async fn get(&self, id: E::Id) -> Result<E, StoreError>;

    /// Writes content as `version` and repoints the current marker in one transaction.
    /// A version number that already exists for the entity is a `Conflict`.
    async fn append_version(
        &self,
        id: E::Id,
        version: u32,
        content: E::Content,
    ) -> Result<E, StoreError>;

    /// Repoints the current marker to an existing version without writing a new row.
    async fn rollback(&self, id: E::Id, version: u32) -> Result<E, StoreError>;

    /// Highest version ever written, regardless of where the current marker points.
    async fn latest_version_number(&self, id: E::Id) -> Result<u32, StoreError>;

    /// Newest first.
    async fn version_history(
        &self,
        id: E::Id,
        page: Page,
    ) -> Result<Vec<VersionRecord<E::Content>>, StoreError>;

    async fn version(&self, id: E::Id, version: u32)
        -> Result<VersionRecord<E::Content>, StoreError>;
}

/// Appends `content` as the next version after the highest one ever written.
pub async fn append_next_version<E, S>(
    store: &S,
    id: E::Id,
    content: E::Content,
) -> Result<E, StoreError>
where
    E: Versioned,
    S: VersionStore<E> + ?Sized,
{
    let latest = store.latest_version_number(id).await?;
    store.append_version(id, latest + 1, content).await
}
