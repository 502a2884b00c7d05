use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use newsbrew_common::{NewArticle, ReviewStatus, ReviewUpdates};
use newsbrew_store::{HistoricalFilters, StoreError};

use crate::AppState;

// --- Query/body structs ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    keywords: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    page: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalRequest {
    keywords: Option<String>,
    time_range: Option<String>,
    category: Option<String>,
    bias_range: Option<serde_json::Value>,
    quality_range: Option<serde_json::Value>,
    page: Option<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsRequest {
    article_ids: Option<Vec<i64>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordCloudQuery {
    start_date: Option<String>,
    end_date: Option<String>,
}

#[derive(Deserialize)]
pub struct ReviewQuery {
    status: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUpdate {
    image_data: Option<String>,
    image_haiku: Option<String>,
}

// --- Helpers ---

/// Lenient timestamp parsing for optional date parameters: RFC 3339,
/// then `YYYY-MM-DD HH:MM:SS`, then a bare date (taken as midnight
/// UTC). Anything else is treated as absent rather than an error.
fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let s = raw?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

/// Lenient page parsing: unparsable input falls back to page 1 via
/// the clamp in the store.
fn parse_page_str(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
}

/// Page numbers in JSON bodies arrive as numbers or numeric strings.
fn parse_page_value(raw: &Option<serde_json::Value>) -> Option<i64> {
    match raw {
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// An inclusive [min, max] pair; anything malformed is ignored.
fn parse_range(raw: &Option<serde_json::Value>) -> Option<(f64, f64)> {
    let arr = raw.as_ref()?.as_array()?;
    let min = arr.first()?.as_f64()?;
    let max = arr.get(1)?.as_f64()?;
    Some((min, max))
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({"error": message})),
    )
        .into_response()
}

fn store_error(context: &str, e: StoreError) -> Response {
    warn!(error = %e, "{}", context);
    let status = match &e {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(serde_json::json!({"status": "error", "message": e.to_string()})),
    )
        .into_response()
}

// --- Handlers ---

pub async fn api_search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> impl IntoResponse {
    let keywords = params.keywords.as_deref().unwrap_or("");
    let start = parse_timestamp(params.start_date.as_deref());
    let end = parse_timestamp(params.end_date.as_deref());
    let page = parse_page_str(params.page.as_deref());

    match state.reader.search(keywords, start, end, page).await {
        Ok(results) => Json(results).into_response(),
        Err(e) => store_error("Search failed", e),
    }
}

pub async fn api_historical(
    State(state): State<Arc<AppState>>,
    Json(body): Json<HistoricalRequest>,
) -> impl IntoResponse {
    let keywords = body.keywords.as_deref().unwrap_or("").trim().to_string();
    if keywords.is_empty() {
        return bad_request("Keywords required");
    }

    let time_range = body.time_range.as_deref().unwrap_or("all");
    let filters = HistoricalFilters {
        category: body.category.clone(),
        bias_range: parse_range(&body.bias_range),
        quality_range: parse_range(&body.quality_range),
        page: parse_page_value(&body.page),
    };

    match state.reader.historical(&keywords, time_range, &filters).await {
        Ok(results) => Json(serde_json::json!({
            "status": "success",
            "articles": results.articles,
            "metadata": results.metadata,
        }))
        .into_response(),
        Err(e) => store_error("Historical search failed", e),
    }
}

pub async fn api_details(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DetailsRequest>,
) -> impl IntoResponse {
    let Some(ids) = body.article_ids else {
        return bad_request("Article IDs required");
    };

    match state.reader.by_ids(&ids).await {
        Ok(articles) => Json(articles).into_response(),
        Err(e) => store_error("Detail lookup failed", e),
    }
}

pub async fn api_latest(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.reader.latest().await {
        Ok(articles) => Json(articles).into_response(),
        Err(e) => store_error("Failed to load latest articles", e),
    }
}

pub async fn api_by_index(
    State(state): State<Arc<AppState>>,
    Path(index): Path<String>,
) -> impl IntoResponse {
    let index: i64 = index.trim().parse().unwrap_or(0);
    match state.reader.by_index(index).await {
        Ok(article) => Json(article).into_response(),
        Err(e) => store_error("Failed to load article by index", e),
    }
}

pub async fn api_unreviewed(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.reader.next_unreviewed().await {
        Ok(article) => Json(article).into_response(),
        Err(e) => store_error("Failed to load unreviewed article", e),
    }
}

pub async fn api_missing_haiku_image(
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    match state.reader.next_missing_haiku_image().await {
        Ok(article) => Json(article).into_response(),
        Err(e) => store_error("Failed to load article missing haiku image", e),
    }
}

pub async fn api_publish(
    State(state): State<Arc<AppState>>,
    Json(article): Json<NewArticle>,
) -> impl IntoResponse {
    match state.writer.publish(&article).await {
        Ok(id) => Json(serde_json::json!({
            "status": "success",
            "message": "Article published successfully",
            "articleId": id,
            "link": format!("{}{}", state.article_base_url, id),
        }))
        .into_response(),
        Err(e) => store_error("Publish failed", e),
    }
}

pub async fn api_update_images(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<ImageUpdate>,
) -> impl IntoResponse {
    match state
        .writer
        .update_images(id, body.image_data.as_deref(), body.image_haiku.as_deref())
        .await
    {
        Ok(()) => Json(serde_json::json!({
            "status": "success",
            "message": "Images updated successfully",
        }))
        .into_response(),
        Err(e) => store_error("Image update failed", e),
    }
}

pub async fn api_update_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<ReviewQuery>,
    body: Option<Json<ReviewUpdates>>,
) -> impl IntoResponse {
    let Some(status) = params.status.as_deref().and_then(ReviewStatus::parse) else {
        return bad_request("Article ID and status required");
    };
    let updates = body.map(|Json(u)| u).unwrap_or_default();

    match state.writer.update_review(id, status, &updates).await {
        Ok(()) => Json(serde_json::json!({
            "status": "success",
            "message": "Article updated successfully",
        }))
        .into_response(),
        Err(e) => store_error("Review update failed", e),
    }
}

pub async fn api_dashboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.reader.dashboard().await {
        Ok(metrics) => Json(metrics).into_response(),
        Err(e) => store_error("Failed to compute dashboard metrics", e),
    }
}

pub async fn api_word_cloud(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WordCloudQuery>,
) -> impl IntoResponse {
    let start = parse_timestamp(params.start_date.as_deref());
    let end = parse_timestamp(params.end_date.as_deref());

    match state.reader.word_cloud(start, end).await {
        Ok(words) => Json(serde_json::json!({
            "status": "success",
            "data": words,
            "dateRange": {
                "start": params.start_date.as_deref().unwrap_or("all"),
                "end": params.end_date.as_deref().unwrap_or("all"),
            },
        }))
        .into_response(),
        Err(e) => store_error("Word cloud aggregation failed", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_bare_dates_as_midnight_utc() {
        assert_eq!(
            parse_timestamp(Some("2025-03-01")),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn parses_datetime_and_rfc3339() {
        assert_eq!(
            parse_timestamp(Some("2025-03-01 13:45:00")),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 13, 45, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp(Some("2025-03-01T13:45:00Z")),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 13, 45, 0).unwrap())
        );
    }

    #[test]
    fn malformed_dates_are_ignored() {
        assert_eq!(parse_timestamp(Some("yesterday")), None);
        assert_eq!(parse_timestamp(Some("")), None);
        assert_eq!(parse_timestamp(None), None);
    }

    #[test]
    fn page_strings_parse_leniently() {
        assert_eq!(parse_page_str(Some("3")), Some(3));
        assert_eq!(parse_page_str(Some(" 2 ")), Some(2));
        assert_eq!(parse_page_str(Some("abc")), None);
        assert_eq!(parse_page_str(None), None);
    }

    #[test]
    fn page_values_accept_numbers_and_strings() {
        assert_eq!(parse_page_value(&Some(serde_json::json!(4))), Some(4));
        assert_eq!(parse_page_value(&Some(serde_json::json!("5"))), Some(5));
        assert_eq!(parse_page_value(&Some(serde_json::json!(null))), None);
        assert_eq!(parse_page_value(&Some(serde_json::json!([1]))), None);
        assert_eq!(parse_page_value(&None), None);
    }

    #[test]
    fn ranges_require_two_numbers() {
        assert_eq!(
            parse_range(&Some(serde_json::json!([-0.5, 0.5]))),
            Some((-0.5, 0.5))
        );
        assert_eq!(parse_range(&Some(serde_json::json!([1.0]))), None);
        assert_eq!(parse_range(&Some(serde_json::json!("1,2"))), None);
        assert_eq!(parse_range(&None), None);
    }
}
