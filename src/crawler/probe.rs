// src/crawler/probe.rs
// =============================================================================
// Measures remote images without downloading them.
//
// For every image two requests go out at the same time:
// - a streaming GET that stops as soon as the header bytes reveal the
//   width, height and format (no pixels are decoded)
// - a HEAD request whose Content-Length gives the file size
//
// Every network call holds a permit from the crawl's semaphore and runs
// under the probe timeout, so one slow host can't stall the whole crawl and
// a page with hundreds of images can't open hundreds of connections at once.
// =============================================================================

use futures::future::{join_all, try_join};
use imagesize::ImageType;
use log::{debug, warn};
use reqwest::header::{HeaderMap, CONTENT_LENGTH};
use reqwest::Client;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::config::CrawlerConfig;
use crate::error::CrawlError;
use crate::models::{AnalyzedVariant, ImageMetrics, ResponsiveSourceInfo, SourceDescriptor};

/// Width, height and format read from an image header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
    pub format: String,
}

/// Probes images for one crawl.
///
/// Cloning is cheap: the client and the limiter are shared.
#[derive(Clone)]
pub struct Prober {
    client: Client,
    limiter: Arc<Semaphore>,
    timeout: Duration,
    sniff_limit: usize,
}

impl Prober {
    pub fn new(client: Client, config: &CrawlerConfig) -> Self {
        Self {
            client,
            limiter: Arc::new(Semaphore::new(config.max_concurrency.max(1))),
            timeout: config.probe_timeout,
            sniff_limit: config.sniff_limit,
        }
    }

    /// Measures one image: dimensions, format and byte size.
    ///
    /// A failure of either request fails the whole probe, so a caller never
    /// sees half-measured metrics.
    pub async fn probe(&self, url: &str) -> Result<ImageMetrics, CrawlError> {
        let (dimensions, file_size) = try_join(self.probe_dimensions(url), self.probe_size(url)).await?;

        debug!(
            "Probed {}: {}x{} {} ({} bytes)",
            url, dimensions.width, dimensions.height, dimensions.format, file_size
        );

        Ok(ImageMetrics {
            width: dimensions.width,
            height: dimensions.height,
            format: dimensions.format,
            file_size,
        })
    }

    /// Probes every candidate of every descriptor.
    ///
    /// Only dimensions and format are measured for variants. Output order
    /// matches input order at both levels; a failed variant is zero-valued.
    pub async fn analyze_responsive(&self, descriptors: &[SourceDescriptor]) -> Vec<ResponsiveSourceInfo> {
        join_all(descriptors.iter().map(|descriptor| async move {
            let sources = join_all(descriptor.urls.iter().map(|url| self.analyze_variant(url))).await;
            ResponsiveSourceInfo {
                media: descriptor.media.clone(),
                mime_type: descriptor.mime_type.clone(),
                sources,
            }
        }))
        .await
    }

    async fn analyze_variant(&self, url: &str) -> AnalyzedVariant {
        match self.probe_dimensions(url).await {
            Ok(dimensions) => AnalyzedVariant {
                url: url.to_string(),
                width: dimensions.width,
                height: dimensions.height,
                format: dimensions.format,
            },
            Err(e) => {
                warn!("Failed to analyze responsive source {}: {}", url, e);
                AnalyzedVariant {
                    url: url.to_string(),
                    width: 0,
                    height: 0,
                    format: "unknown".to_string(),
                }
            }
        }
    }

    async fn probe_dimensions(&self, url: &str) -> Result<Dimensions, CrawlError> {
        self.limited(self.sniff(url)).await
    }

    async fn probe_size(&self, url: &str) -> Result<u64, CrawlError> {
        self.limited(self.head_size(url)).await
    }

    // Runs one network operation under a limiter permit and the timeout
    //
    // Why a Semaphore and not .buffer_unordered(n)?
    // - A crawl fans out at two levels (images, then each image's
    //   responsive variants) and every image makes two requests
    // - buffer_unordered only bounds one stream; a shared permit pool bounds
    //   every request of the crawl, whatever level it comes from
    // - join_all then keeps results in input order for free
    //
    // The permit is held until the operation finishes or times out, so the
    // timeout also frees the slot for the next request.
    async fn limited<T, F>(&self, operation: F) -> Result<T, CrawlError>
    where
        F: Future<Output = Result<T, CrawlError>>,
    {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| CrawlError::LimiterClosed)?;

        tokio::time::timeout(self.timeout, operation)
            .await
            .map_err(|_| CrawlError::Timeout(self.timeout))?
    }

    // Reads the body chunk by chunk until the header can be parsed
    //
    // Parameters:
    //   url: the image to measure
    //
    // Returns: the dimensions and format, or UnknownImage when the body
    // ends (or passes the sniff limit) before a header could be read.
    // Returning early drops the response, which closes the download.
    async fn sniff(&self, url: &str) -> Result<Dimensions, CrawlError> {
        let mut response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(CrawlError::Status(response.status()));
        }

        let mut buffer: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            buffer.extend_from_slice(&chunk);

            if let Some(dimensions) = read_header(&buffer) {
                return Ok(dimensions);
            }
            if buffer.len() >= self.sniff_limit {
                return Err(CrawlError::UnknownImage(format!(
                    "no usable header in the first {} bytes",
                    self.sniff_limit
                )));
            }
        }

        let reason = if imagesize::image_type(&buffer).is_ok() {
            "truncated image header"
        } else {
            "unrecognized image format"
        };
        Err(CrawlError::UnknownImage(reason.to_string()))
    }

    // Asks for the byte size with a HEAD request (no body download)
    //
    // Returns: the Content-Length, or 0 when the server doesn't send one
    async fn head_size(&self, url: &str) -> Result<u64, CrawlError> {
        let response = self.client.head(url).send().await?;
        if !response.status().is_success() {
            return Err(CrawlError::Status(response.status()));
        }
        Ok(content_length(response.headers()))
    }
}

/// The issue recorded on an image whose probe failed
pub fn failure_issue(error: &CrawlError) -> String {
    format!("Failed to analyze image: {}", error)
}

// Parses dimensions and format out of the bytes read so far
fn read_header(data: &[u8]) -> Option<Dimensions> {
    let kind = imagesize::image_type(data).ok()?;
    let size = imagesize::blob_size(data).ok()?;

    Some(Dimensions {
        width: u32::try_from(size.width).ok()?,
        height: u32::try_from(size.height).ok()?,
        format: format_name(kind),
    })
}

// Short lower-case format names: "jpg", "png", "webp", ...
fn format_name(kind: ImageType) -> String {
    if matches!(kind, ImageType::Jpeg) {
        return "jpg".to_string();
    }
    // Variants with a payload (e.g. Heif(Hevc)) keep only the type name
    let name = format!("{:?}", kind);
    name.split('(').next().unwrap_or(&name).to_lowercase()
}

// Missing or garbled Content-Length counts as 0 bytes
fn content_length(headers: &HeaderMap) -> u64 {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0)
}
