// src/models.rs
// =============================================================================
// Data types shared by the crawler, the CLI and the HTTP API.
//
// Everything here is created fresh for one crawl and thrown away once the
// report has been returned. The JSON field names follow the API contract
// (camelCase, `type` for the role), hence the serde attributes.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which size policy applies to an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageRole {
    /// Thumbnail shown in a listing grid
    Listing,
    /// Large image shown on a detail page
    Detail,
    /// Image whose dimensions match one of the request's overrides
    Override,
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageRole::Listing => "listing",
            ImageRole::Detail => "detail",
            ImageRole::Override => "override",
        };
        f.write_str(name)
    }
}

impl FromStr for ImageRole {
    type Err = String;

    // Only the two page roles can be requested; `override` is assigned by
    // the crawler, never asked for.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "listing" => Ok(ImageRole::Listing),
            "detail" => Ok(ImageRole::Detail),
            other => Err(format!(
                "Invalid type '{}': expected 'listing' or 'detail'",
                other
            )),
        }
    }
}

/// A manually sanctioned image size with its own file size limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeOverride {
    pub width: u32,
    pub height: u32,
    pub max_file_size: u64,
}

/// One crawl invocation.
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    pub url: String,
    pub role: ImageRole,
    /// CSS selector of the region to search; empty means the whole page
    pub target_container: String,
    pub overrides: Vec<SizeOverride>,
}

impl CrawlRequest {
    pub fn new(url: impl Into<String>, role: ImageRole) -> Self {
        Self {
            url: url.into(),
            role,
            target_container: String::new(),
            overrides: Vec::new(),
        }
    }
}

/// One `<source>` (or the inner `<img srcset>`) of a `<picture>`.
///
/// `media` and `mime_type` are empty strings when the attribute is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub urls: Vec<String>,
    pub media: String,
    pub mime_type: String,
}

/// What the metadata probe learned about one image.
///
/// Either every field was measured, or every field is zero/"unknown".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMetrics {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub file_size: u64,
}

impl ImageMetrics {
    pub fn unknown() -> Self {
        Self {
            width: 0,
            height: 0,
            format: "unknown".to_string(),
            file_size: 0,
        }
    }
}

/// One candidate URL of a source descriptor after probing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzedVariant {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub format: String,
}

/// A source descriptor with all of its candidates probed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsiveSourceInfo {
    pub media: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub sources: Vec<AnalyzedVariant>,
}

/// One discovered and probed image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
    #[serde(rename = "type")]
    pub role: ImageRole,
    pub format: String,
    pub issues: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsive_sources: Option<Vec<ResponsiveSourceInfo>>,
}

impl ImageRecord {
    /// True when the image passed every check for its role
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Final output of one crawl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlReport {
    pub url: String,
    pub images: Vec<ImageRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CrawlReport {
    /// A whole-page failure: no images, one top-level error.
    pub fn failed(url: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            url: url.into(),
            images: Vec::new(),
            error: Some(format!("Failed to crawl page: {}", error)),
        }
    }

    pub fn issue_count(&self) -> usize {
        self.images.iter().filter(|image| !image.is_ok()).count()
    }
}
