use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use haru_core::{Error, Issue, IssuePatch, NewIssue};
use haru_crawler::batch;

use crate::state::AppState;

/// Attribution for rows created through the CRUD endpoints.
const CRUD_ADMIN_ID: i64 = 1;
const DEFAULT_WRITER: &str = "관리자";

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error half of every handler: a status code plus a JSON `{error}` body.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        warn!(error = %e, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Issue as the frontend expects it: the writer nickname defaults to the
/// admin display name and the date is formatted `YYYY.MM.DD`.
#[derive(Debug, Serialize)]
pub struct IssueResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub writer: String,
    pub reference: String,
    pub date: String,
}

impl From<Issue> for IssueResponse {
    fn from(issue: Issue) -> Self {
        Self {
            id: issue.id,
            title: issue.title,
            content: issue.content,
            writer: DEFAULT_WRITER.to_string(),
            reference: issue.reference,
            date: issue.created_at.format("%Y.%m.%d").to_string(),
        }
    }
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

// ---- issues CRUD ----

pub async fn list_issues(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<IssueResponse>>, ApiError> {
    let issues = state.store.list().await?;
    Ok(Json(issues.into_iter().map(IssueResponse::from).collect()))
}

pub async fn get_issue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<IssueResponse>, ApiError> {
    match state.store.get(id).await? {
        Some(issue) => Ok(Json(issue.into())),
        None => Err(ApiError::not_found("Issue not found")),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateIssueRequest {
    pub title: String,
    pub content: String,
    pub reference: String,
}

pub async fn create_issue(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateIssueRequest>,
) -> Result<Json<IssueResponse>, ApiError> {
    let new = NewIssue {
        title: request.title,
        content: request.content,
        reference: request.reference,
        role: None,
        admin_id: Some(CRUD_ADMIN_ID),
    };
    let issue = state.store.create(&new).await?;
    Ok(Json(issue.into()))
}

pub async fn update_issue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(patch): Json<IssuePatch>,
) -> Result<Json<IssueResponse>, ApiError> {
    if patch.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }
    match state.store.update(id, &patch).await? {
        Some(issue) => Ok(Json(issue.into())),
        None => Err(ApiError::not_found("Issue not found")),
    }
}

pub async fn delete_issue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.store.delete(id).await? {
        return Err(ApiError::not_found("Issue not found"));
    }
    Ok(Json(json!({
        "message": format!("Issue {id} deleted successfully")
    })))
}

// ---- crawl operations ----

fn crawl_delay(delay: f64) -> Duration {
    Duration::from_secs_f64(delay.max(0.0))
}

fn default_delay() -> f64 {
    1.0
}

fn default_step_count() -> u32 {
    5
}

#[derive(Debug, Deserialize)]
pub struct CrawlQuery {
    pub url: String,
}

pub async fn crawl(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CrawlQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    url::Url::parse(&query.url).map_err(|e| ApiError::bad_request(format!("invalid url: {e}")))?;

    match state.crawler.pipeline().crawl_url(&query.url).await {
        Ok(article) => Ok(Json(json!({
            "title": article.title,
            "content": article.content,
            "reference": article.reference,
        }))),
        Err(e) if e.is_handled() => Ok(Json(json!({
            "error": e.to_string(),
            "reference": query.url,
        }))),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start_number: u32,
    pub end_number: u32,
    #[serde(default = "default_delay")]
    pub delay: f64,
}

pub async fn crawl_range(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> Json<serde_json::Value> {
    let results = batch::crawl_range(
        state.crawler.pipeline(),
        query.start_number,
        query.end_number,
        crawl_delay(query.delay),
    )
    .await;
    Json(json!({
        "message": format!(
            "Batch crawl completed for articles {} to {}",
            query.start_number, query.end_number
        ),
        "results": results,
    }))
}

#[derive(Debug, Deserialize)]
pub struct StepQuery {
    pub current_number: u32,
    #[serde(default = "default_step_count")]
    pub count: u32,
    #[serde(default = "default_delay")]
    pub delay: f64,
}

pub async fn crawl_next(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StepQuery>,
) -> Json<serde_json::Value> {
    let results = batch::crawl_next(
        state.crawler.pipeline(),
        query.current_number,
        query.count,
        crawl_delay(query.delay),
    )
    .await;
    Json(json!({
        "message": format!(
            "Crawled next {} articles starting from {}",
            query.count, query.current_number
        ),
        "results": results,
    }))
}

pub async fn crawl_previous(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StepQuery>,
) -> Json<serde_json::Value> {
    let results = batch::crawl_previous(
        state.crawler.pipeline(),
        query.current_number,
        query.count,
        crawl_delay(query.delay),
    )
    .await;
    Json(json!({
        "message": format!(
            "Crawled previous {} articles ending at {}",
            query.count, query.current_number
        ),
        "results": results,
    }))
}

pub async fn monthly_crawl(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.crawler.monthly_crawl().await)
}

#[derive(Debug, Deserialize)]
pub struct ManualQuery {
    pub start_number: u32,
    #[serde(default = "default_manual_count")]
    pub count: u32,
}

fn default_manual_count() -> u32 {
    10
}

pub async fn manual_crawl(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ManualQuery>,
) -> impl IntoResponse {
    Json(
        state
            .crawler
            .manual_crawl_from(query.start_number, query.count)
            .await,
    )
}

pub async fn crawler_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.crawler.status().await)
}

#[derive(Debug, Deserialize)]
pub struct CleanupQuery {
    #[serde(default = "default_cleanup_count")]
    pub count: u64,
}

fn default_cleanup_count() -> u64 {
    10
}

pub async fn cleanup_oldest(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CleanupQuery>,
) -> impl IntoResponse {
    Json(state.crawler.cleanup_oldest(query.count).await)
}

// ---- meals ----

/// Forward an uploaded food photo to the vision model. Model failures come
/// back as an `{error}` body, like every other crawl-side degradation.
pub async fn analyze_meal(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut data = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            data = Some(field.bytes().await.map_err(|e| {
                ApiError::bad_request(format!("failed to read uploaded file: {e}"))
            })?);
            break;
        }
    }
    let Some(data) = data else {
        return Err(ApiError::bad_request("missing file field"));
    };

    let encoded = BASE64.encode(&data);
    match state.vision.analyze_food_image(&encoded).await {
        Ok(result) => Ok(Json(json!({ "result": result }))),
        Err(e) => {
            warn!(error = %e, "meal analysis failed");
            Ok(Json(json!({ "error": e.to_string() })))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn issue_response_formats_the_date_and_writer() {
        let issue = Issue {
            id: 3,
            title: "제목".to_string(),
            content: "내용".to_string(),
            reference: "https://kjcn.or.kr/journal/view.php?number=1669".to_string(),
            role: Some("ADMIN".to_string()),
            admin_id: Some(8),
            created_at: Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap(),
        };
        let response = IssueResponse::from(issue);
        assert_eq!(response.date, "2025.03.09");
        assert_eq!(response.writer, "관리자");
    }

    #[test]
    fn crawl_delay_clamps_negative_values() {
        assert_eq!(crawl_delay(-2.0), Duration::ZERO);
        assert_eq!(crawl_delay(0.5), Duration::from_millis(500));
    }
}
