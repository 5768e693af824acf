//! JSON transport for the tender and bid services, mounted under `/api`.

mod bids;
mod tenders;

use std::str::FromStr;

use axum::{http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tenderflow_core::domain::page::{Page, PageSettings};
use tenderflow_core::errors::{ApplicationError, DomainError, ErrorKind};
use tenderflow_core::services::{BidService, TenderService};
use tracing::{error, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ApiState {
    pub tenders: TenderService,
    pub bids: BidService,
    pub pages: PageSettings,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub reason: String,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

pub fn router(state: ApiState) -> Router {
    let api = Router::new()
        .route("/ping", get(ping))
        .merge(tenders::routes())
        .merge(bids::routes());

    Router::new().nest("/api", api.with_state(state))
}

async fn ping() -> &'static str {
    "ok"
}

pub(crate) fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::AlreadyExists => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Converts a service failure into a response, logging it under a fresh correlation id.
pub(crate) fn reject(error: impl Into<ApplicationError>) -> ApiError {
    let interface = error.into().into_interface(Uuid::new_v4().to_string());

    if interface.kind == ErrorKind::Internal {
        error!(
            event_name = "api.request.failed",
            correlation_id = %interface.correlation_id,
            error_kind = %interface.kind,
            error = %interface.message,
            "request failed"
        );
    } else {
        warn!(
            event_name = "api.request.rejected",
            correlation_id = %interface.correlation_id,
            error_kind = %interface.kind,
            error = %interface.message,
            "request rejected"
        );
    }

    (
        status_for(interface.kind),
        Json(ErrorBody { reason: interface.user_message().to_owned() }),
    )
}

pub(crate) fn parse<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = DomainError>,
{
    raw.trim().parse().map_err(reject)
}

/// Enum tokens arrive in any case; ids and everything else are parsed as given.
pub(crate) fn parse_token<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = DomainError>,
{
    parse(&raw.to_lowercase())
}

pub(crate) fn parse_version(raw: &str) -> Result<u32, ApiError> {
    match raw.trim().parse::<u32>() {
        Ok(version) if version >= 1 => Ok(version),
        _ => Err(reject(DomainError::InvalidArgument(format!(
            "version must be a positive integer, got `{raw}`"
        )))),
    }
}

pub(crate) fn page(
    settings: PageSettings,
    limit: Option<i64>,
    offset: Option<i64>,
) -> Result<Page, ApiError> {
    settings.resolve(limit, offset).map_err(reject)
}


#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::Value;
    use tenderflow_core::errors::ErrorKind;

    use super::status_for;
    use super::test_support::{app, send};

    #[test]
    fn every_error_kind_has_a_status() {
        assert_eq!(status_for(ErrorKind::InvalidArgument), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(ErrorKind::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::AlreadyExists), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::Internal), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn ping_answers_ok() {
        let app = app().await;
        let (status, body) = send(&app, Method::GET, "/api/ping", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("ok".to_owned()));
    }
}
