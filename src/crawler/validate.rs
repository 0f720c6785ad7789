// src/crawler/validate.rs
// =============================================================================
// Checks a measured image against the size policy of its role.
//
// Three checks run, always all of them, in this order:
// 1. shape:     square policies want width == height
// 2. dimension: both edges must reach the policy minimum
// 3. file size: the byte size must not exceed the policy maximum
//
// Each failing check adds one human-readable issue. An empty list means the
// image passed.
// =============================================================================

use crate::config::{Policy, PolicySet};
use crate::models::{ImageMetrics, ImageRole, SizeOverride};

// Picks the role and policy an image is judged by
//
// An image whose measured size equals one of the overrides exactly is an
// `override` image and uses that override's limits. Everything else keeps
// the requested role's default policy.
//
// Since a match means the edges already equal the override's, an override
// image can only fail on file size.
pub fn resolve_policy(
    metrics: &ImageMetrics,
    role: ImageRole,
    overrides: &[SizeOverride],
    policies: &PolicySet,
) -> (ImageRole, Policy) {
    let matching = overrides
        .iter()
        .find(|o| o.width == metrics.width && o.height == metrics.height);

    match matching {
        Some(o) => (ImageRole::Override, Policy::from(*o)),
        None => (role, policies.for_role(role)),
    }
}

// Runs every check and returns the issues found
pub fn validate(metrics: &ImageMetrics, policy: &Policy) -> Vec<String> {
    let mut issues = Vec::new();

    if policy.is_square() && metrics.width != metrics.height {
        issues.push(format!(
            "Image should be square (currently {}x{})",
            metrics.width, metrics.height
        ));
    }

    if metrics.width < policy.min_width || metrics.height < policy.min_height {
        issues.push(format!(
            "Image should be at least {}x{}px",
            policy.min_width, policy.min_height
        ));
    }

    if metrics.file_size > policy.max_bytes {
        issues.push(format!(
            "File size ({}KB) exceeds {}KB limit",
            kilobytes(metrics.file_size),
            kilobytes(policy.max_bytes)
        ));
    }

    issues
}

// Bytes to whole kilobytes, rounding half up
fn kilobytes(bytes: u64) -> u64 {
    (bytes as f64 / 1024.0).round() as u64
}
