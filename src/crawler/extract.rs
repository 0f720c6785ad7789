// src/crawler/extract.rs
// =============================================================================
// Finds every image a page references inside the target region.
//
// Three kinds of references are collected, in this order:
// 1. <img src="...">
// 2. inline styles mentioning "background" with a url(...) in them
// 3. <picture> elements: the inner <img> is the image, and every <source>
//    (plus the inner <img srcset>) is recorded as a responsive variant set
//    keyed by that image's URL
//
// All URLs are resolved against the page URL and deduplicated. The set keeps
// insertion order so the report lists images in the order they were found.
// =============================================================================

use indexmap::IndexSet;
use log::{debug, warn};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::OnceLock;

use super::resolve::resolve_url;
use crate::error::CrawlError;
use crate::models::SourceDescriptor;

/// The images found on one page.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Absolute image URLs in discovery order, each listed once
    pub urls: IndexSet<String>,
    /// Responsive variants of the <picture> images, keyed by the inner <img>
    pub responsive: HashMap<String, Vec<SourceDescriptor>>,
}

// Builds a selector from one of our constant patterns
fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("constant selector is valid CSS")
}

// Matches the first url(...) of a style attribute, with or without quotes
fn background_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"url\(['"]?(.*?)['"]?\)"#).expect("constant regex is valid")
    })
}

// Extracts image URLs from a page
//
// Parameters:
//   html: the page markup
//   target: CSS selector of the region to search, or "" for the whole page
//   base_url: the page URL, used to resolve relative references
//
// When `target` matches several elements only the first one (in document
// order) is searched, together with everything inside it. When it matches
// nothing the result is empty.
pub fn extract_images(html: &str, target: &str, base_url: &str) -> Result<Extraction, CrawlError> {
    let document = Html::parse_document(html);
    let mut extraction = Extraction::default();

    let target = target.trim();
    let scope = if target.is_empty() {
        document.root_element()
    } else {
        let region = Selector::parse(target)
            .map_err(|_| CrawlError::InvalidSelector(target.to_string()))?;
        match document.select(&region).next() {
            Some(element) => element,
            None => {
                warn!("Target container '{}' not found on {}", target, base_url);
                return Ok(extraction);
            }
        }
    };

    collect_img_sources(scope, base_url, &mut extraction.urls);
    collect_backgrounds(scope, base_url, &mut extraction.urls);
    collect_pictures(scope, base_url, &mut extraction);

    debug!(
        "Extracted {} image(s), {} with responsive sources, from {}",
        extraction.urls.len(),
        extraction.responsive.len(),
        base_url
    );

    Ok(extraction)
}

// Elements of the region matching `selector`, the region root included
//
// ElementRef::select only walks descendants, so the root is tested on its
// own first. Yields in document order.
fn within<'a, 'b>(
    scope: ElementRef<'a>,
    selector: &'b Selector,
) -> impl Iterator<Item = ElementRef<'a>> + 'b
where
    'a: 'b,
{
    std::iter::once(scope)
        .filter(move |root| selector.matches(root))
        .chain(scope.select(selector))
}

fn collect_img_sources(scope: ElementRef<'_>, base_url: &str, urls: &mut IndexSet<String>) {
    for img in within(scope, &selector("img[src]")) {
        if let Some(src) = non_empty_attr(img, "src") {
            urls.insert(resolve_url(src, base_url));
        }
    }
}

// Only the first url(...) of each style is taken. A style with several
// background layers contributes one image.
fn collect_backgrounds(scope: ElementRef<'_>, base_url: &str, urls: &mut IndexSet<String>) {
    for element in within(scope, &selector(r#"[style*="background"]"#)) {
        if let Some(reference) = element.value().attr("style").and_then(background_url) {
            urls.insert(resolve_url(reference, base_url));
        }
    }
}

fn background_url(style: &str) -> Option<&str> {
    background_pattern()
        .captures(style)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
        .filter(|reference| !reference.is_empty())
}

fn collect_pictures(scope: ElementRef<'_>, base_url: &str, extraction: &mut Extraction) {
    let source_selector = selector("source[srcset]");
    let img_selector = selector("img");

    for picture in within(scope, &selector("picture")) {
        let mut descriptors: Vec<SourceDescriptor> = picture
            .select(&source_selector)
            .filter_map(|source| {
                descriptor(
                    source.value().attr("srcset")?,
                    source.value().attr("media").unwrap_or_default(),
                    source.value().attr("type").unwrap_or_default(),
                    base_url,
                )
            })
            .collect();

        let Some(img) = picture.select(&img_selector).next() else {
            continue;
        };

        if let Some(own) = img
            .value()
            .attr("srcset")
            .and_then(|srcset| descriptor(srcset, "", "", base_url))
        {
            descriptors.push(own);
        }

        // Without a main source there is nothing to hang the variants on
        let Some(src) = non_empty_attr(img, "src") else {
            continue;
        };

        let key = resolve_url(src, base_url);
        extraction.urls.insert(key.clone());
        if !descriptors.is_empty() {
            extraction.responsive.entry(key).or_default().extend(descriptors);
        }
    }
}

fn descriptor(srcset: &str, media: &str, mime_type: &str, base_url: &str) -> Option<SourceDescriptor> {
    let urls: Vec<String> = parse_srcset(srcset)
        .into_iter()
        .map(|candidate| resolve_url(candidate, base_url))
        .collect();

    if urls.is_empty() {
        return None;
    }

    Some(SourceDescriptor {
        urls,
        media: media.to_string(),
        mime_type: mime_type.to_string(),
    })
}

// Splits a srcset value into its URLs
//
// Example:
//   "a.jpg 1x, b.jpg 2x, c.jpg" -> ["a.jpg", "b.jpg", "c.jpg"]
//
// The width/density descriptor after each URL is dropped, as are empty
// entries such as the one a trailing comma leaves behind.
pub fn parse_srcset(srcset: &str) -> Vec<&str> {
    srcset
        .split(',')
        .filter_map(|entry| entry.split_whitespace().next())
        .collect()
}

fn non_empty_attr<'a>(element: ElementRef<'a>, name: &str) -> Option<&'a str> {
    element
        .value()
        .attr(name)
        .filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://example.test/page";

    fn urls(extraction: &Extraction) -> Vec<&str> {
        extraction.urls.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_parse_srcset() {
        assert_eq!(parse_srcset("a.jpg 1x, b.jpg 2x, c.jpg"), vec!["a.jpg", "b.jpg", "c.jpg"]);
        assert_eq!(parse_srcset("small.jpg 480w,, large.jpg 1080w, "), vec!["small.jpg", "large.jpg"]);
        assert!(parse_srcset("").is_empty());
    }

    #[test]
    fn test_img_sources_are_resolved() {
        let html = r#"<img src="/a.jpg"><img src="https://cdn.test/b.png"><img src="">"#;
        let extraction = extract_images(html, "", BASE).unwrap();
        assert_eq!(urls(&extraction), vec!["https://example.test/a.jpg", "https://cdn.test/b.png"]);
        assert!(extraction.responsive.is_empty());
    }

    #[test]
    fn test_background_first_url_only() {
        let html = r#"
            <div style="background-image: url('/bg1.jpg'), url('/bg2.jpg')"></div>
            <div style="background: url(&quot;/bg3.jpg&quot;) no-repeat"></div>
            <div style="color: red"></div>
        "#;
        let extraction = extract_images(html, "", BASE).unwrap();
        assert_eq!(
            urls(&extraction),
            vec!["https://example.test/bg1.jpg", "https://example.test/bg3.jpg"]
        );
    }

    #[test]
    fn test_same_image_via_img_and_background_is_listed_once() {
        let html = r#"
            <img src="/hero.jpg">
            <section style="background-image: url(/hero.jpg)"></section>
            <img src="https://example.test/hero.jpg">
        "#;
        let extraction = extract_images(html, "", BASE).unwrap();
        assert_eq!(urls(&extraction), vec!["https://example.test/hero.jpg"]);
    }

    #[test]
    fn test_target_container_limits_search() {
        let html = r#"
            <img src="/outside.jpg">
            <div class="gallery"><img src="/first.jpg"></div>
            <div class="gallery"><img src="/second.jpg"></div>
        "#;
        let extraction = extract_images(html, ".gallery", BASE).unwrap();
        assert_eq!(urls(&extraction), vec!["https://example.test/first.jpg"]);
    }

    #[test]
    fn test_missing_target_container_yields_nothing() {
        let html = r#"<img src="/a.jpg">"#;
        let extraction = extract_images(html, "#missing", BASE).unwrap();
        assert!(extraction.urls.is_empty());
    }

    #[test]
    fn test_invalid_target_container_is_an_error() {
        let result = extract_images("<img src=\"/a.jpg\">", "div[", BASE);
        assert!(matches!(result, Err(CrawlError::InvalidSelector(_))));
    }

    #[test]
    fn test_target_container_that_is_a_picture() {
        let html = r#"
            <picture class="main">
                <source srcset="/a.webp" type="image/webp">
                <img src="/a.jpg">
            </picture>
        "#;
        let extraction = extract_images(html, ".main", BASE).unwrap();
        assert_eq!(urls(&extraction), vec!["https://example.test/a.jpg"]);
        assert_eq!(
            extraction.responsive["https://example.test/a.jpg"],
            vec![SourceDescriptor {
                urls: vec!["https://example.test/a.webp".to_string()],
                media: String::new(),
                mime_type: "image/webp".to_string(),
            }]
        );
    }

    #[test]
    fn test_target_container_that_is_an_img() {
        let html = r#"<img src="/other.jpg"><img id="main" src="/m.jpg">"#;
        let extraction = extract_images(html, "#main", BASE).unwrap();
        assert_eq!(urls(&extraction), vec!["https://example.test/m.jpg"]);
    }

    #[test]
    fn test_target_container_with_background() {
        let html = r#"
            <div id="hero" style="background-image: url(/hero.jpg)">
                <img src="/inner.png">
            </div>
            <div style="background: url(/outside.jpg)"></div>
        "#;
        let extraction = extract_images(html, "#hero", BASE).unwrap();
        assert_eq!(
            urls(&extraction),
            vec!["https://example.test/inner.png", "https://example.test/hero.jpg"]
        );
    }

    #[test]
    fn test_picture_sources_are_keyed_by_inner_img() {
        let html = r#"
            <picture>
                <source srcset="/hero.avif 1x, /hero@2x.avif 2x" type="image/avif">
                <source srcset="/hero-wide.jpg" media="(min-width: 800px)">
                <source srcset="">
                <img src="/hero.jpg" srcset="/hero-small.jpg 480w, /hero-big.jpg 1080w">
            </picture>
        "#;
        let extraction = extract_images(html, "", BASE).unwrap();
        assert_eq!(urls(&extraction), vec!["https://example.test/hero.jpg"]);

        let descriptors = &extraction.responsive["https://example.test/hero.jpg"];
        assert_eq!(
            descriptors,
            &vec![
                SourceDescriptor {
                    urls: vec![
                        "https://example.test/hero.avif".to_string(),
                        "https://example.test/hero@2x.avif".to_string(),
                    ],
                    media: String::new(),
                    mime_type: "image/avif".to_string(),
                },
                SourceDescriptor {
                    urls: vec!["https://example.test/hero-wide.jpg".to_string()],
                    media: "(min-width: 800px)".to_string(),
                    mime_type: String::new(),
                },
                SourceDescriptor {
                    urls: vec![
                        "https://example.test/hero-small.jpg".to_string(),
                        "https://example.test/hero-big.jpg".to_string(),
                    ],
                    media: String::new(),
                    mime_type: String::new(),
                },
            ]
        );
    }

    #[test]
    fn test_picture_without_img_src_is_skipped() {
        let html = r#"<picture><source srcset="/a.webp"><img alt="none"></picture>"#;
        let extraction = extract_images(html, "", BASE).unwrap();
        assert!(extraction.urls.is_empty());
        assert!(extraction.responsive.is_empty());
    }

    #[test]
    fn test_discovery_order() {
        let html = r#"
            <div style="background: url(/bg.jpg)"></div>
            <picture><source srcset="/p.webp"><img src="/p.jpg"></picture>
            <img src="/plain.jpg">
        "#;
        let extraction = extract_images(html, "", BASE).unwrap();
        // every <img> comes first, then backgrounds
        assert_eq!(
            urls(&extraction),
            vec![
                "https://example.test/p.jpg",
                "https://example.test/plain.jpg",
                "https://example.test/bg.jpg",
            ]
        );
    }
}
