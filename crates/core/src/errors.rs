use std::fmt;

use thiserror::Error;

/// Coarse classification shared by every layer. Only the transport turns it into a status code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    Unauthorized,
    Forbidden,
    AlreadyExists,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvalidArgument => "invalid_argument",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::AlreadyExists => "already_exists",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown {kind}: `{value}`")]
    UnknownVariant { kind: &'static str, value: String },
    #[error("invalid {kind} id: `{value}`")]
    InvalidIdentifier { kind: &'static str, value: String },
    #[error("{entity} {id} is {actual}, expected {expected}")]
    InvalidState { entity: &'static str, id: String, expected: &'static str, actual: String },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownVariant { .. }
            | Self::InvalidIdentifier { .. }
            | Self::InvalidState { .. }
            | Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::InvariantViolation(_) => ErrorKind::Internal,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    pub fn not_found(entity: &'static str, key: impl fmt::Display) -> Self {
        Self::NotFound { entity, key: key.to_string() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(error) => error.kind(),
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::Conflict(_) => ErrorKind::AlreadyExists,
            Self::Persistence(_) | Self::Configuration(_) => ErrorKind::Internal,
        }
    }

    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        InterfaceError {
            kind: self.kind(),
            message: self.to_string(),
            correlation_id: correlation_id.into(),
        }
    }
}

/// Transport-facing error. Internal failures keep their detail for logs only.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct InterfaceError {
    pub kind: ErrorKind,
    pub message: String,
    pub correlation_id: String,
}

impl InterfaceError {
    pub fn user_message(&self) -> &str {
        match self.kind {
            ErrorKind::Internal => "An unexpected internal error occurred.",
            ErrorKind::Unauthorized => "Authentication is required for this operation.",
            _ => &self.message,
        }
    }
}
