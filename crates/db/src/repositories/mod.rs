use std::sync::Arc;

use thiserror::Error;

use tenderflow_core::store::{StoreError, Stores};

use crate::DbPool;

mod codec;
pub mod bid;
pub mod decision;
pub mod feedback;
pub mod identity;
pub mod tender;

pub use bid::SqlBidRepository;
pub use decision::SqlDecisionRepository;
pub use feedback::SqlFeedbackRepository;
pub use identity::SqlIdentityDirectory;
pub use tender::SqlTenderRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },
}

impl RepositoryError {
    pub(crate) fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound { entity, key: key.to_string() }
    }
}

impl From<RepositoryError> for StoreError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound { entity, key } => Self::NotFound { entity, key },
            RepositoryError::Decode(message) => Self::Decode(message),
            RepositoryError::Database(sqlx::Error::Database(error))
                if error.is_unique_violation() =>
            {
                Self::Conflict(error.message().to_owned())
            }
            RepositoryError::Database(error) => Self::Backend(error.to_string()),
        }
    }
}

/// Wires every SQLite adapter onto one pool.
pub fn sql_stores(pool: DbPool) -> Stores {
    Stores {
        identity: Arc::new(SqlIdentityDirectory::new(pool.clone())),
        tenders: Arc::new(SqlTenderRepository::new(pool.clone())),
        bids: Arc::new(SqlBidRepository::new(pool.clone())),
        decisions: Arc::new(SqlDecisionRepository::new(pool.clone())),
        feedback: Arc::new(SqlFeedbackRepository::new(pool)),
    }
}
