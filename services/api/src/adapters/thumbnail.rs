//! services/api/src/adapters/thumbnail.rs
//!
//! Best-effort discovery of a representative image for a review article.
//! It implements the `ThumbnailService` port from the `core` crate.
//!
//! The page is fetched once and scanned by an ordered chain of extractors:
//! 1. `<meta property="og:image">`
//! 2. `<meta name="twitter:image">`
//! 3. `<link rel="image_src">`
//! 4. `<img src>` elements in document order
//!
//! Structured sharing metadata outranks raw content images, so the chain order
//! is fixed. A failed fetch yields no thumbnail, never an error.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};
use truthshield_core::ports::ThumbnailService;
use url::Url;

/// Extracts at most one candidate URL from a parsed page.
type Extractor = fn(&Html) -> Option<String>;

/// Metadata extractors, highest trust first. Content images are scanned after these.
const METADATA_EXTRACTORS: &[(&str, Extractor)] = &[
    ("og:image", open_graph_image),
    ("twitter:image", twitter_card_image),
    ("image_src", link_image_src),
];

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ThumbnailService` by scraping the review page.
#[derive(Clone)]
pub struct ScrapingThumbnailAdapter {
    client: Client,
    default_timeout: Duration,
}

impl ScrapingThumbnailAdapter {
    /// Creates a new `ScrapingThumbnailAdapter`.
    pub fn new(default_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (compatible; TruthShield/0.1)")
            .build()?;
        Ok(Self {
            client,
            default_timeout,
        })
    }

    async fn fetch_page(&self, page_url: Url, timeout: Duration) -> Option<(Url, String)> {
        let response = match self.client.get(page_url.clone()).timeout(timeout).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("Could not fetch review URL ({}) for thumbnail: {}", page_url, e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(
                "Review URL ({}) returned HTTP {} while looking for a thumbnail",
                page_url, status
            );
            return None;
        }

        let final_url = response.url().clone();
        match response.text().await {
            Ok(html) => Some((final_url, html)),
            Err(e) => {
                warn!("Error reading review URL ({}) for thumbnail: {}", page_url, e);
                None
            }
        }
    }
}

//=========================================================================================
// `ThumbnailService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ThumbnailService for ScrapingThumbnailAdapter {
    async fn resolve(
        &self,
        review_url: Option<&str>,
        max_candidates: usize,
        timeout: Duration,
    ) -> Vec<String> {
        let Some(raw) = review_url.map(str::trim).filter(|u| !u.is_empty()) else {
            return Vec::new();
        };
        if max_candidates == 0 {
            return Vec::new();
        }

        let page_url = match Url::parse(raw) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => u,
            _ => {
                debug!("Skipping thumbnail lookup for non-web URL: {}", raw);
                return Vec::new();
            }
        };

        match self.fetch_page(page_url, timeout).await {
            Some((final_url, html)) => extract_candidates(&html, Some(&final_url), max_candidates),
            None => Vec::new(),
        }
    }

    fn default_timeout(&self) -> Duration {
        self.default_timeout
    }
}

//=========================================================================================
// Extraction Chain
//=========================================================================================

/// Runs the extraction chain over `html`, returning up to `max_candidates`
/// distinct absolute image URLs in trust order. Relative URLs are resolved
/// against `base` when it is given.
pub fn extract_candidates(html: &str, base: Option<&Url>, max_candidates: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut candidates: Vec<String> = Vec::new();

    for (name, extractor) in METADATA_EXTRACTORS {
        if candidates.len() >= max_candidates {
            return candidates;
        }
        if let Some(url) = extractor(&document).and_then(|raw| normalize(&raw, base)) {
            debug!("Thumbnail candidate from {}: {}", name, url);
            push_unique(&mut candidates, url);
        }
    }

    for raw in content_image_sources(&document) {
        if candidates.len() >= max_candidates {
            break;
        }
        if let Some(url) = normalize(&raw, base) {
            push_unique(&mut candidates, url);
        }
    }

    candidates
}

fn push_unique(candidates: &mut Vec<String>, url: String) {
    if !candidates.contains(&url) {
        candidates.push(url);
    }
}

/// Trims, drops inline `data:` images, and resolves relative references.
fn normalize(raw: &str, base: Option<&Url>) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with("data:") {
        return None;
    }
    let resolved = match Url::parse(raw) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => base?.join(raw).ok()?,
        Err(_) => return None,
    };
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

fn attr_is(element: &ElementRef, attr: &str, expected: &str) -> bool {
    element
        .value()
        .attr(attr)
        .map(|v| v.trim().eq_ignore_ascii_case(expected))
        .unwrap_or(false)
}

/// The `content` of the first `<meta>` whose `key_attr` equals `key`.
fn meta_content(document: &Html, key_attr: &str, key: &str) -> Option<String> {
    let selector = Selector::parse("meta[content]").ok()?;
    document
        .select(&selector)
        .find(|el| attr_is(el, key_attr, key))
        .and_then(|el| el.value().attr("content"))
        .map(str::to_string)
}

fn open_graph_image(document: &Html) -> Option<String> {
    meta_content(document, "property", "og:image")
}

fn twitter_card_image(document: &Html) -> Option<String> {
    meta_content(document, "name", "twitter:image")
}

/// `rel` is a space-separated token list, so `image_src` may share it with others.
fn rel_has(element: &ElementRef, token: &str) -> bool {
    element
        .value()
        .attr("rel")
        .map(|rel| rel.split_whitespace().any(|t| t.eq_ignore_ascii_case(token)))
        .unwrap_or(false)
}

fn link_image_src(document: &Html) -> Option<String> {
    let selector = Selector::parse("link[href]").ok()?;
    document
        .select(&selector)
        .find(|el| rel_has(el, "image_src"))
        .and_then(|el| el.value().attr("href"))
        .map(str::to_string)
}

fn content_image_sources(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse("img[src]") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("src"))
        .map(str::to_string)
        .collect()
}
