// src/crawler/aggregate.rs
// =============================================================================
// Runs one crawl from start to finish.
//
// How it works:
// 1. Fetch the page (the only step that can fail the whole crawl)
// 2. Extract candidate image URLs and their responsive variants
// 3. For every image, at the same time: probe it, analyze its responsive
//    variants if it has any, then validate it against its role's policy
// 4. Put the records back in discovery order and return the report
//
// Nothing here panics or returns an error. Failures end up in the report,
// either as its top-level error or as an issue on a single image.
// =============================================================================

use futures::future::{join, join_all};
use log::{info, warn};
use reqwest::Client;

use super::extract::extract_images;
use super::fetch::fetch_page;
use super::probe::{failure_issue, Prober};
use super::validate::{resolve_policy, validate};
use crate::config::CrawlerConfig;
use crate::error::CrawlError;
use crate::models::{CrawlReport, CrawlRequest, ImageMetrics, ImageRecord, SourceDescriptor};

/// Holds the HTTP client and configuration shared by every crawl.
///
/// The crawler itself is stateless between requests; each call to
/// [`Crawler::crawl`] gets its own concurrency limiter.
pub struct Crawler {
    client: Client,
    config: CrawlerConfig,
}

impl Crawler {
    pub fn new(config: CrawlerConfig) -> Result<Self, CrawlError> {
        // One client for all requests (connection pooling)
        let client = Client::builder().user_agent(config.user_agent.as_str()).build()?;
        Ok(Self { client, config })
    }

    /// Crawls one page and audits every image on it.
    ///
    /// Never fails: a page that can't be fetched or searched gives a report
    /// with `error` set and no images.
    pub async fn crawl(&self, request: &CrawlRequest) -> CrawlReport {
        info!("Crawling {} for {} images", request.url, request.role);

        let html = match fetch_page(&self.client, &request.url, self.config.fetch_timeout).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Failed to crawl {}: {}", request.url, e);
                return CrawlReport::failed(&request.url, e);
            }
        };

        let extraction = match extract_images(&html, &request.target_container, &request.url) {
            Ok(extraction) => extraction,
            Err(e) => {
                warn!("Failed to crawl {}: {}", request.url, e);
                return CrawlReport::failed(&request.url, e);
            }
        };

        info!("Found {} image(s) on {}", extraction.urls.len(), request.url);

        let prober = Prober::new(self.client.clone(), &self.config);

        // join_all keeps the input order, so record i belongs to url i
        // whatever order the probes finish in
        let images = join_all(extraction.urls.iter().map(|url| {
            self.analyze_image(&prober, request, url, extraction.responsive.get(url))
        }))
        .await;

        CrawlReport {
            url: request.url.clone(),
            images,
            error: None,
        }
    }

    // Builds the record for one image
    //
    // Parameters:
    //   prober: the crawl's prober (shares its limiter with every image)
    //   request: the original request, for the role and overrides
    //   url: the resolved image URL
    //   descriptors: responsive variants, when the image came from <picture>
    //
    // Returns: a complete record. A failed probe gives zero metrics, the
    // requested role and a single "Failed to analyze image" issue.
    async fn analyze_image(
        &self,
        prober: &Prober,
        request: &CrawlRequest,
        url: &str,
        descriptors: Option<&Vec<SourceDescriptor>>,
    ) -> ImageRecord {
        let responsive = async {
            match descriptors {
                Some(descriptors) => Some(prober.analyze_responsive(descriptors).await),
                None => None,
            }
        };

        let (probed, responsive_sources) = join(prober.probe(url), responsive).await;

        match probed {
            Ok(metrics) => {
                let (role, policy) = resolve_policy(
                    &metrics,
                    request.role,
                    &request.overrides,
                    &self.config.policies,
                );
                let issues = validate(&metrics, &policy);

                ImageRecord {
                    url: url.to_string(),
                    width: metrics.width,
                    height: metrics.height,
                    file_size: metrics.file_size,
                    role,
                    format: metrics.format,
                    issues,
                    responsive_sources,
                }
            }
            Err(e) => {
                warn!("Failed to analyze image {}: {}", url, e);
                let metrics = ImageMetrics::unknown();

                ImageRecord {
                    url: url.to_string(),
                    width: metrics.width,
                    height: metrics.height,
                    file_size: metrics.file_size,
                    role: request.role,
                    format: metrics.format,
                    issues: vec![failure_issue(&e)],
                    responsive_sources,
                }
            }
        }
    }
}
