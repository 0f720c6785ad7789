// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - scan: audit one page from the terminal
// - serve: run the HTTP API
//
// Both share the crawler tuning flags (CrawlerArgs), and every one of those
// can also come from a GUARDIAN_* environment variable, which is how a
// deployment changes the size policies without a rebuild.
// =============================================================================

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{
    CrawlerConfig, Policy, PolicySet, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_MAX_CONCURRENCY,
    DEFAULT_PROBE_TIMEOUT_SECS, DEFAULT_SNIFF_LIMIT, DETAIL_MAX_BYTES, DETAIL_MIN_EDGE,
    LISTING_MAX_BYTES, LISTING_MIN_EDGE,
};
use crate::models::{ImageRole, SizeOverride};

#[derive(Parser, Debug)]
#[command(
    name = "image-guardian",
    version,
    about = "Audit the images on a web page against listing/detail size policies",
    long_about = "image-guardian fetches a page, finds every image in it (img tags, inline \
                  background images, responsive <picture> sources), measures each one and \
                  reports the images that are not square, too small, or too heavy."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Audit the images of one page
    ///
    /// Example: image-guardian scan https://shop.example/item/42 --type detail
    Scan {
        /// Page URL to audit
        url: String,

        /// Which policy applies: listing or detail
        #[arg(long = "type", short = 't', default_value = "listing")]
        role: ImageRole,

        /// CSS selector of the region to search (default: whole page)
        #[arg(long, default_value = "")]
        target: String,

        /// Sanctioned size as WIDTHxHEIGHT:MAX_BYTES, e.g. 1200x600:307200
        ///
        /// Can be repeated. An image measuring exactly WIDTHxHEIGHT is
        /// judged by this override instead of the --type policy.
        #[arg(long = "override", value_parser = parse_override)]
        overrides: Vec<SizeOverride>,

        /// Output the report as JSON instead of a table
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        crawler: CrawlerArgs,
    },

    /// Run the crawl HTTP API
    Serve {
        /// Address to bind
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(long, env = "PORT", default_value_t = 3000)]
        port: u16,

        /// Serve the built front-end instead of the development routes
        #[arg(long, env = "GUARDIAN_PRODUCTION")]
        production: bool,

        /// Directory holding the built front-end (production only)
        #[arg(long, env = "GUARDIAN_STATIC_DIR", default_value = "dist/client")]
        static_dir: PathBuf,

        #[command(flatten)]
        crawler: CrawlerArgs,
    },
}

/// Crawler tuning shared by both subcommands.
#[derive(Args, Debug, Clone)]
pub struct CrawlerArgs {
    /// Minimum edge in px for listing images
    #[arg(long, env = "GUARDIAN_LISTING_MIN_EDGE", default_value_t = LISTING_MIN_EDGE)]
    pub listing_min_edge: u32,

    /// Maximum file size in bytes for listing images
    #[arg(long, env = "GUARDIAN_LISTING_MAX_BYTES", default_value_t = LISTING_MAX_BYTES)]
    pub listing_max_bytes: u64,

    /// Minimum edge in px for detail images
    #[arg(long, env = "GUARDIAN_DETAIL_MIN_EDGE", default_value_t = DETAIL_MIN_EDGE)]
    pub detail_min_edge: u32,

    /// Maximum file size in bytes for detail images
    #[arg(long, env = "GUARDIAN_DETAIL_MAX_BYTES", default_value_t = DETAIL_MAX_BYTES)]
    pub detail_max_bytes: u64,

    /// Seconds to wait for the page itself
    #[arg(
        long,
        env = "GUARDIAN_FETCH_TIMEOUT",
        default_value_t = DEFAULT_FETCH_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub fetch_timeout: u64,

    /// Seconds to wait for each image request
    #[arg(
        long,
        env = "GUARDIAN_PROBE_TIMEOUT",
        default_value_t = DEFAULT_PROBE_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub probe_timeout: u64,

    /// Maximum image requests in flight per crawl
    #[arg(long, env = "GUARDIAN_MAX_CONCURRENCY", default_value_t = DEFAULT_MAX_CONCURRENCY)]
    pub max_concurrency: usize,

    /// Bytes of an image to read while looking for its dimensions
    #[arg(long, env = "GUARDIAN_SNIFF_LIMIT", default_value_t = DEFAULT_SNIFF_LIMIT)]
    pub sniff_limit: usize,
}

impl CrawlerArgs {
    pub fn to_config(&self) -> CrawlerConfig {
        CrawlerConfig {
            policies: PolicySet {
                listing: Policy::square(self.listing_min_edge, self.listing_max_bytes),
                detail: Policy::square(self.detail_min_edge, self.detail_max_bytes),
            },
            fetch_timeout: Duration::from_secs(self.fetch_timeout),
            probe_timeout: Duration::from_secs(self.probe_timeout),
            max_concurrency: self.max_concurrency,
            sniff_limit: self.sniff_limit,
            ..CrawlerConfig::default()
        }
    }
}

// Parses "1200x600:307200" into an override
fn parse_override(value: &str) -> Result<SizeOverride, String> {
    let usage = || format!("'{}' is not WIDTHxHEIGHT:MAX_BYTES", value);

    let (dimensions, max_bytes) = value.split_once(':').ok_or_else(usage)?;
    let (width, height) = dimensions
        .split_once(|c: char| c == 'x' || c == 'X')
        .ok_or_else(usage)?;

    Ok(SizeOverride {
        width: width.trim().parse().map_err(|_| usage())?,
        height: height.trim().parse().map_err(|_| usage())?,
        max_file_size: max_bytes.trim().parse().map_err(|_| usage())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_override() {
        assert_eq!(
            parse_override("1200x600:307200"),
            Ok(SizeOverride {
                width: 1200,
                height: 600,
                max_file_size: 307200
            })
        );
        assert!(parse_override("1200x600").is_err());
        assert!(parse_override("1200:5").is_err());
        assert!(parse_override("wide x tall:5").is_err());
    }

    #[test]
    fn test_scan_arguments() {
        let cli = Cli::try_parse_from([
            "image-guardian",
            "scan",
            "https://example.test/item",
            "--type",
            "detail",
            "--target",
            "#gallery",
            "--override",
            "640x640:102400",
            "--listing-min-edge",
            "600",
        ])
        .unwrap();

        let Commands::Scan {
            url,
            role,
            target,
            overrides,
            json,
            crawler,
        } = cli.command
        else {
            panic!("expected scan");
        };
        assert_eq!(url, "https://example.test/item");
        assert_eq!(role, ImageRole::Detail);
        assert_eq!(target, "#gallery");
        assert_eq!(overrides.len(), 1);
        assert!(!json);

        let config = crawler.to_config();
        assert_eq!(config.policies.listing, Policy::square(600, LISTING_MAX_BYTES));
        assert_eq!(config.policies.detail, PolicySet::default().detail);
    }

    #[test]
    fn test_scan_rejects_override_role() {
        let result = Cli::try_parse_from(["image-guardian", "scan", "https://example.test", "--type", "override"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_timeouts_are_rejected() {
        for flag in ["--fetch-timeout", "--probe-timeout"] {
            let result = Cli::try_parse_from(["image-guardian", "scan", "https://example.test", flag, "0"]);
            assert!(result.is_err(), "{} 0 should be rejected", flag);
        }

        let cli = Cli::try_parse_from(["image-guardian", "scan", "https://example.test", "--probe-timeout", "1"])
            .unwrap();
        let Commands::Scan { crawler, .. } = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(crawler.to_config().probe_timeout, Duration::from_secs(1));
    }
}
