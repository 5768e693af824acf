use crate::domain::bid::{Bid, BidStatus};
use crate::domain::decision::DecisionKind;
use crate::domain::identity::Actor;
use crate::domain::tender::{Tender, TenderStatus};
use crate::errors::{ApplicationError, DomainError};
use crate::guard;

pub const DEFAULT_MAX_QUORUM: u32 = 3;

/// What a freshly recorded decision does to the bid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// A single rejection is final.
    Rejected,
    /// Approve the bid and close its tender.
    Approved { quorum: u32, recorded: u32 },
    Pending { quorum: u32, recorded: u32 },
}

/// Bid approval state machine: `published -> rejected | approved`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuorumEngine {
    max_quorum: u32,
}

impl Default for QuorumEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_QUORUM)
    }
}

impl QuorumEngine {
    pub fn new(max_quorum: u32) -> Self {
        Self { max_quorum }
    }

    pub fn max_quorum(&self) -> u32 {
        self.max_quorum
    }

    /// Approvals needed for an organization of `headcount` employees.
    pub fn quorum(&self, headcount: usize) -> u32 {
        u32::try_from(headcount).map_or(self.max_quorum, |count| count.min(self.max_quorum))
    }

    /// Preconditions checked before anything is recorded.
    pub fn validate(&self, tender: &Tender, bid: &Bid, actor: &Actor) -> Result<(), ApplicationError> {
        if tender.status != TenderStatus::Published {
            return Err(DomainError::InvalidState {
                entity: "tender",
                id: tender.id.to_string(),
                expected: TenderStatus::Published.as_str(),
                actual: tender.status.to_string(),
            }
            .into());
        }
        if bid.status != BidStatus::Published {
            return Err(DomainError::InvalidState {
                entity: "bid",
                id: bid.id.to_string(),
                expected: BidStatus::Published.as_str(),
                actual: bid.status.to_string(),
            }
            .into());
        }
        guard::ensure_tender_owner(tender, actor)
    }

    /// `recorded` counts every decision row for the bid, including the one just written.
    pub fn evaluate(&self, decision: DecisionKind, headcount: usize, recorded: u32) -> Verdict {
        let quorum = self.quorum(headcount);
        match decision {
            DecisionKind::Rejected => Verdict::Rejected,
            _ if recorded >= quorum => Verdict::Approved { quorum, recorded },
            _ => Verdict::Pending { quorum, recorded },
        }
    }
}
