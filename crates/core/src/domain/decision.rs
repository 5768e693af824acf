use chrono::{DateTime, Utc};

use crate::domain::ids::{BidId, DecisionId, EmployeeId};

token_enum!(DecisionKind, "decision" {
    Approved => "approved",
    Rejected => "rejected",
});

impl DecisionKind {
    pub fn from_approval(approved: bool) -> Self {
        if approved {
            Self::Approved
        } else {
            Self::Rejected
        }
    }
}

/// One reviewer's vote. Votes are never deduplicated, so the same employee may appear twice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BidDecision {
    pub id: DecisionId,
    pub bid_id: BidId,
    pub kind: DecisionKind,
    pub employee_id: EmployeeId,
    pub created_at: DateTime<Utc>,
}

impl BidDecision {
    pub fn new(bid_id: BidId, employee_id: EmployeeId, kind: DecisionKind) -> Self {
        Self { id: DecisionId::new(), bid_id, kind, employee_id, created_at: Utc::now() }
    }
}
