//! Orchestration: resolve the caller, load the target, authorize, then delegate to the stores.

pub mod bid;
pub mod tender;

pub use bid::{BidService, CreateBid};
pub use tender::{CreateTender, TenderService};

use crate::domain::identity::Actor;
use crate::errors::{ApplicationError, DomainError};
use crate::store::IdentityDirectory;

pub(crate) async fn resolve_actor(
    identity: &dyn IdentityDirectory,
    username: &str,
) -> Result<Actor, ApplicationError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(DomainError::InvalidArgument("username is required".to_owned()).into());
    }

    let employee = identity.employee_by_username(username).await?;
    let organization = identity.organization_for_employee(employee.id).await?;
    Ok(Actor { employee, organization })
}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ApplicationError> {
    if value.trim().is_empty() {
        return Err(DomainError::InvalidArgument(format!("{field} must not be empty")).into());
    }
    Ok(())
}
