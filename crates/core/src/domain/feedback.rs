use chrono::{DateTime, Utc};

use crate::domain::ids::{BidId, EmployeeId, FeedbackId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BidFeedback {
    pub id: FeedbackId,
    pub bid_id: BidId,
    pub description: String,
    pub author_id: EmployeeId,
    pub created_at: DateTime<Utc>,
}

impl BidFeedback {
    pub fn new(bid_id: BidId, author_id: EmployeeId, description: impl Into<String>) -> Self {
        Self {
            id: FeedbackId::new(),
            bid_id,
            description: description.into(),
            author_id,
            created_at: Utc::now(),
        }
    }
}
