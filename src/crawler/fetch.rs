// src/crawler/fetch.rs
// =============================================================================
// Downloads the page we are auditing.
//
// Only the raw markup is fetched. Scripts are never executed, so images that
// a page injects from JavaScript are invisible to the crawler.
// =============================================================================

use log::info;
use reqwest::Client;
use std::time::Duration;

use crate::error::CrawlError;

// Fetches a web page and returns its HTML content
//
// Any non-2xx status is an error, the same as a network failure.
pub async fn fetch_page(client: &Client, url: &str, timeout: Duration) -> Result<String, CrawlError> {
    let response = client.get(url).timeout(timeout).send().await?;

    if !response.status().is_success() {
        return Err(CrawlError::Status(response.status()));
    }

    let html = response.text().await?;
    info!("Fetched {} ({} bytes)", url, html.len());
    Ok(html)
}
