// src/error.rs
// =============================================================================
// Error types.
//
// CrawlError covers everything that can go wrong while fetching a page or
// probing one image. Callers never let it escape a crawl: it is turned into
// an issue string (one image) or the report's top-level error (whole page).
//
// ApiError is what the HTTP layer hands back to actix-web.
// =============================================================================

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("invalid target container selector '{0}'")]
    InvalidSelector(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("unable to determine image dimensions ({0})")]
    UnknownImage(String),

    #[error("probe limiter closed")]
    LimiterClosed,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string()
        }))
    }
}
