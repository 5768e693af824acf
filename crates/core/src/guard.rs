//! Authorization decisions over an already-resolved actor. Nothing here touches storage.

use crate::domain::bid::{Bid, BidAuthor, BidStatus};
use crate::domain::identity::Actor;
use crate::domain::tender::Tender;
use crate::errors::{ApplicationError, DomainError};

/// Whether `actor` wrote `bid`, either personally or through their organization.
pub fn is_author(bid: &Bid, actor: &Actor) -> Result<bool, DomainError> {
    match bid.author() {
        Some(BidAuthor::User(author_id)) => Ok(author_id == actor.employee.id),
        Some(BidAuthor::Organization(author_id)) => Ok(actor.organization_id() == Some(author_id)),
        None => Err(DomainError::InvariantViolation(format!(
            "bid {} has unknown author type `{}`",
            bid.id, bid.author_type
        ))),
    }
}

/// Published bids are public; everything else is visible to its author only.
pub fn has_read_access(bid: &Bid, actor: &Actor) -> Result<bool, DomainError> {
    if bid.status == BidStatus::Published {
        return Ok(true);
    }
    is_author(bid, actor)
}

pub fn ensure_bid_author(bid: &Bid, actor: &Actor) -> Result<(), ApplicationError> {
    if is_author(bid, actor)? {
        Ok(())
    } else {
        Err(ApplicationError::Forbidden(format!(
            "user {} is not the author of bid {}",
            actor.employee.username, bid.id
        )))
    }
}

pub fn ensure_read_access(bid: &Bid, actor: &Actor) -> Result<(), ApplicationError> {
    if has_read_access(bid, actor)? {
        Ok(())
    } else {
        Err(ApplicationError::Forbidden(format!(
            "user {} cannot read bid {}",
            actor.employee.username, bid.id
        )))
    }
}

pub fn ensure_tender_owner(tender: &Tender, actor: &Actor) -> Result<(), ApplicationError> {
    if actor.organization_id() == Some(tender.organization_id) {
        Ok(())
    } else {
        Err(ApplicationError::Forbidden(format!(
            "user {} does not represent the organization owning tender {}",
            actor.employee.username, tender.id
        )))
    }
}
