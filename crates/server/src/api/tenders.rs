use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, post, put},
    Json, Router,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tenderflow_core::domain::ids::{OrganizationId, TenderId};
use tenderflow_core::domain::tender::{
    ServiceType, Tender, TenderContent, TenderFilter, TenderPatch, TenderStatus,
};
use tenderflow_core::errors::DomainError;
use tenderflow_core::services::CreateTender;
use tenderflow_core::versioning::VersionRecord;

use super::{page, parse, parse_token, parse_version, reject, ApiError, ApiState};

pub(super) fn routes() -> Router<ApiState> {
    Router::new()
        .route("/tenders", get(list_tenders))
        .route("/tenders/new", post(create_tender))
        .route("/tenders/my", get(my_tenders))
        .route("/tenders/{id}/status", get(tender_status).put(set_tender_status))
        .route("/tenders/{id}/edit", patch(edit_tender))
        .route("/tenders/{id}/rollback/{version}", put(rollback_tender))
        .route("/tenders/{id}/versions", get(tender_versions))
        .route("/tenders/{id}/versions/{version}", get(tender_version))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenderResponse {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub description: String,
    pub status: TenderStatus,
    pub service_type: ServiceType,
    pub version: u32,
    pub created_at: String,
}

impl From<Tender> for TenderResponse {
    fn from(tender: Tender) -> Self {
        Self {
            id: tender.id.to_string(),
            organization_id: tender.organization_id.to_string(),
            name: tender.content.name,
            description: tender.content.description,
            status: tender.status,
            service_type: tender.content.service_type,
            version: tender.version,
            created_at: format_timestamp(tender.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenderVersionResponse {
    pub version: u32,
    pub name: String,
    pub description: String,
    pub service_type: ServiceType,
    pub created_at: String,
}

impl From<VersionRecord<TenderContent>> for TenderVersionResponse {
    fn from(record: VersionRecord<TenderContent>) -> Self {
        Self {
            version: record.version,
            name: record.content.name,
            description: record.content.description,
            service_type: record.content.service_type,
            created_at: format_timestamp(record.created_at),
        }
    }
}

pub(super) fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenderRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub service_type: String,
    pub organization_id: String,
    pub creator_username: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditTenderRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub service_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PagedUserQuery {
    #[serde(default)]
    pub username: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub status: String,
}

/// `service_type` may repeat, so the query arrives as raw pairs.
async fn list_tenders(
    State(state): State<ApiState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<TenderResponse>>, ApiError> {
    let mut filter = TenderFilter::default();
    let mut limit = None;
    let mut offset = None;

    for (key, value) in &pairs {
        match key.as_str() {
            "service_type" => filter.service_types.push(parse_token(value)?),
            "limit" => limit = Some(parse_integer("limit", value)?),
            "offset" => offset = Some(parse_integer("offset", value)?),
            _ => {}
        }
    }

    let page = page(state.pages, limit, offset)?;
    let tenders = state.tenders.list(&filter, page).await.map_err(reject)?;
    Ok(Json(tenders.into_iter().map(TenderResponse::from).collect()))
}

fn parse_integer(field: &str, raw: &str) -> Result<i64, ApiError> {
    raw.trim().parse().map_err(|_| {
        reject(DomainError::InvalidArgument(format!("{field} must be an integer, got `{raw}`")))
    })
}

async fn create_tender(
    State(state): State<ApiState>,
    Json(body): Json<CreateTenderRequest>,
) -> Result<Json<TenderResponse>, ApiError> {
    let request = CreateTender {
        content: TenderContent {
            name: body.name,
            description: body.description,
            service_type: parse_token(&body.service_type)?,
        },
        organization_id: parse::<OrganizationId>(&body.organization_id)?,
        creator_username: body.creator_username,
    };

    let tender = state.tenders.create(request).await.map_err(reject)?;
    Ok(Json(tender.into()))
}

async fn my_tenders(
    State(state): State<ApiState>,
    Query(query): Query<PagedUserQuery>,
) -> Result<Json<Vec<TenderResponse>>, ApiError> {
    let page = page(state.pages, query.limit, query.offset)?;
    let tenders = state.tenders.my(&query.username, page).await.map_err(reject)?;
    Ok(Json(tenders.into_iter().map(TenderResponse::from).collect()))
}

async fn tender_status(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<Json<TenderStatus>, ApiError> {
    let id = parse::<TenderId>(&id)?;
    let status = state.tenders.status(id, &query.username).await.map_err(reject)?;
    Ok(Json(status))
}

async fn set_tender_status(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<TenderResponse>, ApiError> {
    let id = parse::<TenderId>(&id)?;
    let status = parse_token::<TenderStatus>(&query.status)?;
    let tender = state.tenders.set_status(id, &query.username, status).await.map_err(reject)?;
    Ok(Json(tender.into()))
}

async fn edit_tender(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<UserQuery>,
    Json(body): Json<EditTenderRequest>,
) -> Result<Json<TenderResponse>, ApiError> {
    let id = parse::<TenderId>(&id)?;
    let patch = TenderPatch {
        name: body.name,
        description: body.description,
        service_type: body.service_type.as_deref().map(parse_token).transpose()?,
    };

    let tender = state.tenders.update(id, &query.username, patch).await.map_err(reject)?;
    Ok(Json(tender.into()))
}

async fn rollback_tender(
    State(state): State<ApiState>,
    Path((id, version)): Path<(String, String)>,
    Query(query): Query<UserQuery>,
) -> Result<Json<TenderResponse>, ApiError> {
    let id = parse::<TenderId>(&id)?;
    let version = parse_version(&version)?;
    let tender = state.tenders.rollback(id, &query.username, version).await.map_err(reject)?;
    Ok(Json(tender.into()))
}

async fn tender_versions(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<PagedUserQuery>,
) -> Result<Json<Vec<TenderVersionResponse>>, ApiError> {
    let id = parse::<TenderId>(&id)?;
    let page = page(state.pages, query.limit, query.offset)?;
    let history = state.tenders.versions(id, &query.username, page).await.map_err(reject)?;
    Ok(Json(history.into_iter().map(TenderVersionResponse::from).collect()))
}

async fn tender_version(
    State(state): State<ApiState>,
    Path((id, version)): Path<(String, String)>,
    Query(query): Query<UserQuery>,
) -> Result<Json<TenderVersionResponse>, ApiError> {
    let id = parse::<TenderId>(&id)?;
    let version = parse_version(&version)?;
    let record = state.tenders.version(id, &query.username, version).await.map_err(reject)?;
    Ok(Json(record.into()))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};
    use tenderflow_db::fixtures::SEED_ORGANIZATIONS;

    use crate::api::test_support::{app, send};

    fn create_body(name: &str, service_type: &str, username: &str) -> Value {
        json!({
            "name": name,
            "description": format!("{name} works"),
            "serviceType": service_type,
            "organizationId": SEED_ORGANIZATIONS[0].id,
            "creatorUsername": username,
        })
    }

    #[tokio::test]
    async fn create_edit_and_rollback_round() {
        let app = app().await;

        let (status, created) = send(
            &app,
            Method::POST,
            "/api/tenders/new",
            Some(create_body("Road", "Construction", "a.volkova")),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{created}");
        assert_eq!(created["serviceType"], "construction");
        assert_eq!(created["status"], "created");
        assert_eq!(created["version"], 1);
        let id = created["id"].as_str().expect("id").to_owned();

        let (status, edited) = send(
            &app,
            Method::PATCH,
            &format!("/api/tenders/{id}/edit?username=a.volkova"),
            Some(json!({ "name": "Road v2", "serviceType": "DELIVERY" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{edited}");
        assert_eq!(edited["version"], 2);
        assert_eq!(edited["serviceType"], "delivery");

        let (status, rolled_back) = send(
            &app,
            Method::PUT,
            &format!("/api/tenders/{id}/rollback/1?username=a.volkova"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rolled_back["name"], "Road");
        assert_eq!(rolled_back["version"], 1);

        let (status, history) =
            send(&app, Method::GET, &format!("/api/tenders/{id}/versions?username=a.volkova"), None)
                .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn status_transitions_and_authorization() {
        let app = app().await;
        let (_, created) = send(
            &app,
            Method::POST,
            "/api/tenders/new",
            Some(create_body("Bridge", "construction", "a.volkova")),
        )
        .await;
        let id = created["id"].as_str().expect("id").to_owned();

        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/api/tenders/{id}/status?username=a.volkova&status=Published"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "published");

        let (status, body) =
            send(&app, Method::GET, &format!("/api/tenders/{id}/status?username=i.petrov"), None)
                .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["reason"].as_str().is_some());

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/api/tenders/{id}/status?username=a.volkova&status=archived"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) =
            send(&app, Method::GET, "/api/tenders/not-a-uuid/status?username=a.volkova", None)
                .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn listing_filters_and_validates_pagination() {
        let app = app().await;
        for (name, service_type) in [("a", "construction"), ("b", "delivery"), ("c", "manufacture")]
        {
            let (status, _) = send(
                &app,
                Method::POST,
                "/api/tenders/new",
                Some(create_body(name, service_type, "d.sokolov")),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, listed) = send(
            &app,
            Method::GET,
            "/api/tenders?service_type=delivery&service_type=Manufacture",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<_> =
            listed.as_array().expect("array").iter().map(|t| t["name"].clone()).collect();
        assert_eq!(names, vec![json!("c"), json!("b")]);

        let (status, _) = send(&app, Method::GET, "/api/tenders?limit=0", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, mine) =
            send(&app, Method::GET, "/api/tenders/my?username=a.volkova&limit=2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mine.as_array().map(Vec::len), Some(2));

        let (status, _) = send(&app, Method::GET, "/api/tenders/my?username=ghost", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn creating_for_a_foreign_organization_is_forbidden() {
        let app = app().await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/tenders/new",
            Some(create_body("Foreign", "delivery", "freelancer")),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["reason"].as_str().unwrap_or_default().contains("freelancer"));
    }
}
