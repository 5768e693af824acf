use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

macro_rules! entity_id {
    ($name:ident, $label:literal) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.hyphenated())
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(value.trim()).map(Self).map_err(|_| {
                    DomainError::InvalidIdentifier { kind: $label, value: value.to_owned() }
                })
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(TenderId, "tender");
entity_id!(BidId, "bid");
entity_id!(EmployeeId, "employee");
entity_id!(OrganizationId, "organization");
entity_id!(DecisionId, "decision");
entity_id!(FeedbackId, "feedback");

#[cfg(test)]
mod tests {
    use super::{BidId, TenderId};
    use crate::errors::DomainError;

    #[test]
    fn ids_are_random_v4_and_parse_back() {
        let id = TenderId::new();
        assert_eq!(id.0.get_version_num(), 4);
        assert_eq!(id.to_string().parse::<TenderId>(), Ok(id));
        assert_ne!(TenderId::new(), id);
    }

    #[test]
    fn malformed_id_is_rejected_with_its_kind() {
        assert_eq!(
            "not-a-uuid".parse::<BidId>(),
            Err(DomainError::InvalidIdentifier { kind: "bid", value: "not-a-uuid".to_owned() })
        );
    }
}
