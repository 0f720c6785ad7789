// src/server/handlers.rs
// =============================================================================
// HTTP handler functions for the crawl API.
//
// The handlers only shape requests and responses. A crawl that fails to
// fetch its page still answers 200; the failure is in the report's `error`.
// =============================================================================

use actix_web::{web, HttpResponse};
use chrono::{SecondsFormat, Utc};
use futures::FutureExt;
use serde::Deserialize;
use std::panic::AssertUnwindSafe;

use super::AppState;
use crate::error::ApiError;
use crate::models::{CrawlRequest, ImageRole, SizeOverride};

/// Body of `POST /api/crawl`.
///
/// Every field is optional here so a missing `url` or `type` gets our own
/// 400 message instead of a deserializer error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlBody {
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub role: Option<String>,
    pub target_container: Option<String>,
    pub overrides: Option<Vec<SizeOverride>>,
}

impl CrawlBody {
    pub fn into_request(self) -> Result<CrawlRequest, ApiError> {
        let url = self.url.filter(|url| !url.trim().is_empty());
        let role = self.role.filter(|role| !role.is_empty());

        let (Some(url), Some(role)) = (url, role) else {
            return Err(ApiError::BadRequest("URL and type are required".to_string()));
        };
        let role: ImageRole = role.parse().map_err(ApiError::BadRequest)?;

        Ok(CrawlRequest {
            url,
            role,
            target_container: self.target_container.unwrap_or_default(),
            overrides: self.overrides.unwrap_or_default(),
        })
    }
}

/// `POST /api/crawl`
pub async fn crawl(
    state: web::Data<AppState>,
    body: web::Json<CrawlBody>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner().into_request()?;

    // A panic inside the pipeline becomes a 500 instead of a dropped
    // connection
    let report = AssertUnwindSafe(state.crawler.crawl(&request))
        .catch_unwind()
        .await
        .map_err(|panic| ApiError::Internal(panic_message(panic.as_ref())))?;

    Ok(HttpResponse::Ok().json(report))
}

/// `GET /api/test`
pub async fn api_test() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Crawler API is working"
    }))
}

/// `GET /` (development only)
pub async fn index() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Image Crawler API is running"
    }))
}

/// `GET /health` (development only)
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }))
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "Unexpected internal error".to_string()
    }
}
