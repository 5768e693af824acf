use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tenderflow_core::domain::bid::{
    Bid, BidAuthor, BidAuthorType, BidContent, BidPatch, BidStatus,
};
use tenderflow_core::domain::decision::DecisionKind;
use tenderflow_core::domain::feedback::BidFeedback;
use tenderflow_core::domain::ids::{BidId, EmployeeId, OrganizationId, TenderId};
use tenderflow_core::errors::DomainError;
use tenderflow_core::services::CreateBid;
use tenderflow_core::versioning::VersionRecord;

use super::tenders::{format_timestamp, PagedUserQuery, StatusQuery, UserQuery};
use super::{page, parse, parse_token, parse_version, reject, ApiError, ApiState};

pub(super) fn routes() -> Router<ApiState> {
    Router::new()
        .route("/bids/new", post(create_bid))
        .route("/bids/my", get(my_bids))
        .route("/bids/{id}/list", get(bids_for_tender))
        .route("/bids/{id}/status", get(bid_status).put(set_bid_status))
        .route("/bids/{id}/edit", patch(edit_bid))
        .route("/bids/{id}/submit_decision", put(submit_decision))
        .route("/bids/{id}/feedback", put(leave_feedback))
        .route("/bids/{id}/rollback/{version}", put(rollback_bid))
        .route("/bids/{id}/reviews", get(authors_feedback))
        .route("/bids/{id}/versions", get(bid_versions))
        .route("/bids/{id}/versions/{version}", get(bid_version))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidResponse {
    pub id: String,
    pub tender_id: String,
    pub name: String,
    pub description: String,
    pub status: BidStatus,
    pub author_type: BidAuthorType,
    pub author_id: String,
    pub version: u32,
    pub created_at: String,
}

impl From<Bid> for BidResponse {
    fn from(bid: Bid) -> Self {
        Self {
            id: bid.id.to_string(),
            tender_id: bid.tender_id.to_string(),
            name: bid.content.name,
            description: bid.content.description,
            status: bid.status,
            author_type: bid.author_type,
            author_id: bid.author_id.to_string(),
            version: bid.version,
            created_at: format_timestamp(bid.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidVersionResponse {
    pub version: u32,
    pub name: String,
    pub description: String,
    pub created_at: String,
}

impl From<VersionRecord<BidContent>> for BidVersionResponse {
    fn from(record: VersionRecord<BidContent>) -> Self {
        Self {
            version: record.version,
            name: record.content.name,
            description: record.content.description,
            created_at: format_timestamp(record.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub id: String,
    pub description: String,
    pub created_at: String,
}

impl From<BidFeedback> for FeedbackResponse {
    fn from(feedback: BidFeedback) -> Self {
        Self {
            id: feedback.id.to_string(),
            description: feedback.description,
            created_at: format_timestamp(feedback.created_at),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBidRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "tenderID")]
    pub tender_id: String,
    pub author_type: String,
    #[serde(alias = "authorID")]
    pub author_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditBidRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DecisionQuery {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub decision: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackQuery {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub bid_feedback: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewsQuery {
    #[serde(default)]
    pub author_username: String,
    #[serde(default)]
    pub requester_username: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn author_from(author_type: &str, author_id: &str) -> Result<BidAuthor, ApiError> {
    match parse_token::<BidAuthorType>(author_type)? {
        BidAuthorType::User => Ok(BidAuthor::User(parse::<EmployeeId>(author_id)?)),
        BidAuthorType::Organization => {
            Ok(BidAuthor::Organization(parse::<OrganizationId>(author_id)?))
        }
        BidAuthorType::Unknown => Err(reject(DomainError::InvalidArgument(
            "authorType is required".to_owned(),
        ))),
    }
}

async fn create_bid(
    State(state): State<ApiState>,
    Json(body): Json<CreateBidRequest>,
) -> Result<(StatusCode, Json<BidResponse>), ApiError> {
    let request = CreateBid {
        content: BidContent { name: body.name, description: body.description },
        tender_id: parse::<TenderId>(&body.tender_id)?,
        author: author_from(&body.author_type, &body.author_id)?,
    };

    let bid = state.bids.create(request).await.map_err(reject)?;
    Ok((StatusCode::CREATED, Json(bid.into())))
}

async fn my_bids(
    State(state): State<ApiState>,
    Query(query): Query<PagedUserQuery>,
) -> Result<Json<Vec<BidResponse>>, ApiError> {
    let page = page(state.pages, query.limit, query.offset)?;
    let bids = state.bids.my(&query.username, page).await.map_err(reject)?;
    Ok(Json(bids.into_iter().map(BidResponse::from).collect()))
}

async fn bids_for_tender(
    State(state): State<ApiState>,
    Path(tender_id): Path<String>,
    Query(query): Query<PagedUserQuery>,
) -> Result<Json<Vec<BidResponse>>, ApiError> {
    let tender_id = parse::<TenderId>(&tender_id)?;
    let page = page(state.pages, query.limit, query.offset)?;
    let bids =
        state.bids.list_for_tender(tender_id, &query.username, page).await.map_err(reject)?;
    Ok(Json(bids.into_iter().map(BidResponse::from).collect()))
}

async fn bid_status(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<UserQuery>,
) -> Result<Json<BidStatus>, ApiError> {
    let id = parse::<BidId>(&id)?;
    let status = state.bids.status(id, &query.username).await.map_err(reject)?;
    Ok(Json(status))
}

async fn set_bid_status(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<BidResponse>, ApiError> {
    let id = parse::<BidId>(&id)?;
    let status = parse_token::<BidStatus>(&query.status)?;
    let bid = state.bids.set_status(id, &query.username, status).await.map_err(reject)?;
    Ok(Json(bid.into()))
}

async fn edit_bid(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<UserQuery>,
    Json(body): Json<EditBidRequest>,
) -> Result<Json<BidResponse>, ApiError> {
    let id = parse::<BidId>(&id)?;
    let patch = BidPatch { name: body.name, description: body.description };
    let bid = state.bids.update(id, &query.username, patch).await.map_err(reject)?;
    Ok(Json(bid.into()))
}

async fn submit_decision(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<DecisionQuery>,
) -> Result<Json<BidResponse>, ApiError> {
    let id = parse::<BidId>(&id)?;
    let decision = parse_token::<DecisionKind>(&query.decision)?;
    let bid = state.bids.submit_decision(id, &query.username, decision).await.map_err(reject)?;
    Ok(Json(bid.into()))
}

async fn leave_feedback(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<FeedbackQuery>,
) -> Result<Json<BidResponse>, ApiError> {
    let id = parse::<BidId>(&id)?;
    let bid = state
        .bids
        .leave_feedback(id, &query.username, &query.bid_feedback)
        .await
        .map_err(reject)?;
    Ok(Json(bid.into()))
}

async fn rollback_bid(
    State(state): State<ApiState>,
    Path((id, version)): Path<(String, String)>,
    Query(query): Query<UserQuery>,
) -> Result<Json<BidResponse>, ApiError> {
    let id = parse::<BidId>(&id)?;
    let version = parse_version(&version)?;
    let bid = state.bids.rollback(id, &query.username, version).await.map_err(reject)?;
    Ok(Json(bid.into()))
}

/// The path id here is the tender the author competed on.
async fn authors_feedback(
    State(state): State<ApiState>,
    Path(tender_id): Path<String>,
    Query(query): Query<ReviewsQuery>,
) -> Result<Json<Vec<FeedbackResponse>>, ApiError> {
    let tender_id = parse::<TenderId>(&tender_id)?;
    let page = page(state.pages, query.limit, query.offset)?;
    let feedback = state
        .bids
        .authors_feedback(tender_id, &query.author_username, &query.requester_username, page)
        .await
        .map_err(reject)?;
    Ok(Json(feedback.into_iter().map(FeedbackResponse::from).collect()))
}

async fn bid_versions(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<PagedUserQuery>,
) -> Result<Json<Vec<BidVersionResponse>>, ApiError> {
    let id = parse::<BidId>(&id)?;
    let page = page(state.pages, query.limit, query.offset)?;
    let history = state.bids.versions(id, &query.username, page).await.map_err(reject)?;
    Ok(Json(history.into_iter().map(BidVersionResponse::from).collect()))
}

async fn bid_version(
    State(state): State<ApiState>,
    Path((id, version)): Path<(String, String)>,
    Query(query): Query<UserQuery>,
) -> Result<Json<BidVersionResponse>, ApiError> {
    let id = parse::<BidId>(&id)?;
    let version = parse_version(&version)?;
    let record = state.bids.version(id, &query.username, version).await.map_err(reject)?;
    Ok(Json(record.into()))
}
