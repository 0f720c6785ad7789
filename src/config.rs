// src/config.rs
// =============================================================================
// Runtime configuration for a crawl.
//
// The size policies live in a PolicySet so a deployment can tune them
// (see the --listing-*/--detail-* flags in cli.rs).
// =============================================================================

use std::time::Duration;

use crate::models::{ImageRole, SizeOverride};

pub const LISTING_MIN_EDGE: u32 = 800;
pub const DETAIL_MIN_EDGE: u32 = 1500;
pub const LISTING_MAX_BYTES: u64 = 200 * 1024; // 200KB
pub const DETAIL_MAX_BYTES: u64 = 500 * 1024; // 500KB

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;
pub const DEFAULT_SNIFF_LIMIT: usize = 4 * 1024 * 1024;

/// Size thresholds for one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    pub min_width: u32,
    pub min_height: u32,
    pub max_bytes: u64,
}

impl Policy {
    /// A square policy: both edges must reach `min_edge`.
    pub const fn square(min_edge: u32, max_bytes: u64) -> Self {
        Self {
            min_width: min_edge,
            min_height: min_edge,
            max_bytes,
        }
    }

    pub fn is_square(&self) -> bool {
        self.min_width == self.min_height
    }
}

impl From<SizeOverride> for Policy {
    fn from(o: SizeOverride) -> Self {
        Self {
            min_width: o.width,
            min_height: o.height,
            max_bytes: o.max_file_size,
        }
    }
}

/// The per-role defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicySet {
    pub listing: Policy,
    pub detail: Policy,
}

impl Default for PolicySet {
    fn default() -> Self {
        Self {
            listing: Policy::square(LISTING_MIN_EDGE, LISTING_MAX_BYTES),
            detail: Policy::square(DETAIL_MIN_EDGE, DETAIL_MAX_BYTES),
        }
    }
}

impl PolicySet {
    /// The default policy of a page role.
    ///
    /// `Override` has no default of its own; it falls back to listing.
    pub fn for_role(&self, role: ImageRole) -> Policy {
        match role {
            ImageRole::Detail => self.detail,
            ImageRole::Listing | ImageRole::Override => self.listing,
        }
    }
}

/// Everything the crawler needs besides the request itself.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub policies: PolicySet,
    pub fetch_timeout: Duration,
    pub probe_timeout: Duration,
    /// Upper bound on simultaneous network operations in one crawl
    pub max_concurrency: usize,
    /// How many bytes of an image we read before giving up on its header
    pub sniff_limit: usize,
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            policies: PolicySet::default(),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            probe_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            sniff_limit: DEFAULT_SNIFF_LIMIT,
            user_agent: format!("image-guardian/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}
