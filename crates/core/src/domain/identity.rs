use serde::{Deserialize, Serialize};

use crate::domain::ids::{EmployeeId, OrganizationId};

token_enum!(OrganizationType, "organization type" {
    Ip => "IP",
    Llc => "LLC",
    Jsc => "JSC",
});

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub description: Option<String>,
    pub organization_type: OrganizationType,
}

/// A resolved caller: the employee plus the organization they are responsible for, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub employee: Employee,
    pub organization: Option<Organization>,
}

impl Actor {
    pub fn organization_id(&self) -> Option<OrganizationId> {
        self.organization.as_ref().map(|organization| organization.id)
    }
}
