// src/crawler/resolve.rs
// =============================================================================
// Turns a possibly-relative URL from the markup into an absolute URL.
//
// Resolution never fails. If the candidate can't be resolved it comes back
// unchanged, and the probe of that string will fail later with an error
// that is attached to that one image only.
// =============================================================================

use url::Url;

// Resolves `candidate` against `base`
//
// Examples:
//   base = "https://example.com/page"
//   "/a.jpg"               -> "https://example.com/a.jpg"
//   "../img/b.png"         -> "https://example.com/img/b.png"
//   "https://cdn.test/c"   -> "https://cdn.test/c"
//   "http://[::1"          -> "http://[::1"  (unparseable, returned as-is)
pub fn resolve_url(candidate: &str, base: &str) -> String {
    // An absolute candidate still resolves when the base itself is broken
    let resolved = Url::parse(base)
        .and_then(|base| base.join(candidate))
        .or_else(|_| Url::parse(candidate));

    match resolved {
        Ok(url) => url.to_string(),
        Err(_) => candidate.to_string(),
    }
}
