//! services/api/src/adapters/fact_check.rs
//!
//! This module contains the adapter for the Google Fact Check Tools claim search.
//! It implements the `FactCheckService` port from the `core` crate.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, warn};
use truthshield_core::{
    domain::{ClaimPage, ClaimRecord, PageToken, ReviewRecord, SearchError, SearchResult},
    ports::FactCheckService,
};

/// Largest page the provider is asked for; larger requests are clamped.
pub const MAX_PAGE_SIZE: u32 = 100;

/// How much of an error body is kept in a failure message.
const ERROR_BODY_LIMIT: usize = 500;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `FactCheckService` over the provider's REST API.
#[derive(Clone)]
pub struct GoogleFactCheckAdapter {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
    timeout: Duration,
}

impl GoogleFactCheckAdapter {
    /// Creates a new `GoogleFactCheckAdapter`.
    ///
    /// A missing `api_key` is accepted here; every search then fails with a
    /// configuration error before touching the network.
    pub fn new(
        api_key: Option<String>,
        endpoint: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            endpoint,
            timeout,
        })
    }
}

//=========================================================================================
// `FactCheckService` Trait Implementation
//=========================================================================================

#[async_trait]
impl FactCheckService for GoogleFactCheckAdapter {
    async fn search(
        &self,
        query: Option<&str>,
        language_code: &str,
        page_size: u32,
        cursor: Option<&PageToken>,
    ) -> SearchResult {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("Fact check search skipped: no API key configured.");
            return Err(SearchError::missing_api_key());
        };

        let mut params: Vec<(&str, String)> = vec![
            ("key", api_key.to_string()),
            ("languageCode", language_code.to_string()),
            ("pageSize", page_size.clamp(1, MAX_PAGE_SIZE).to_string()),
        ];
        if let Some(q) = query.map(str::trim).filter(|q| !q.is_empty()) {
            params.push(("query", q.to_string()));
        }
        if let Some(token) = cursor {
            params.push(("pageToken", token.as_str().to_string()));
        }

        debug!(
            "Searching fact checks: query={:?} language={} page_size={} has_cursor={}",
            query,
            language_code,
            page_size,
            cursor.is_some()
        );

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(classify_request_error)
            .inspect_err(|e| warn!("Fact check request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            // The status decides the class; an unreadable body only loses the detail.
            let body = response.text().await.unwrap_or_default();
            let err = SearchError::Http {
                status: status.as_u16(),
                detail: truncate(&body, ERROR_BODY_LIMIT),
            };
            warn!("Fact check provider rejected the request: {}", err);
            return Err(err);
        }

        let body = response
            .text()
            .await
            .map_err(classify_request_error)
            .inspect_err(|e| warn!("Fact check response body unreadable: {}", e))?;

        if body.trim().is_empty() {
            return Ok(ClaimPage::default());
        }

        decode_page(&body).inspect_err(|e| error!("{}", e))
    }
}

/// Maps a transport fault from `reqwest` onto the search taxonomy.
fn classify_request_error(e: reqwest::Error) -> SearchError {
    if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
        SearchError::Transport {
            detail: e.to_string(),
        }
    } else if e.is_decode() {
        SearchError::Decode {
            detail: e.to_string(),
        }
    } else {
        SearchError::Unexpected {
            kind: if e.is_builder() { "RequestBuilder" } else { "reqwest::Error" }.to_string(),
            detail: e.to_string(),
        }
    }
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

//=========================================================================================
// Wire Format
//=========================================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClaimSearchResponse {
    /// Kept untyped so one malformed claim cannot sink the rest of the page.
    claims: Option<Vec<serde_json::Value>>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireClaim {
    text: Option<String>,
    claimant: Option<String>,
    claim_date: Option<String>,
    claim_review: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireReview {
    publisher: Option<WirePublisher>,
    url: Option<String>,
    title: Option<String>,
    review_date: Option<String>,
    textual_rating: Option<String>,
    language_code: Option<String>,
    image: Option<WireImages>,
    review_rating: Option<WireReviewRating>,
}

#[derive(Debug, Deserialize)]
struct WirePublisher {
    name: Option<String>,
    site: Option<String>,
    image: Option<WireImages>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireReviewRating {
    image_url: Option<String>,
    image: Option<WireImages>,
}

#[derive(Debug, Deserialize)]
struct WireImage {
    url: Option<String>,
}

/// Image metadata appears as a single object, a list of objects, or something else
/// entirely; anything unrecognised contributes no URL.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireImages {
    One(WireImage),
    Many(Vec<WireImage>),
    Other(serde_json::Value),
}

impl WireImages {
    fn first_url(&self) -> Option<&str> {
        let url = match self {
            Self::One(image) => image.url.as_deref(),
            Self::Many(images) => images.first().and_then(|i| i.url.as_deref()),
            Self::Other(_) => None,
        };
        url.filter(|u| !u.trim().is_empty())
    }
}

fn decode_page(body: &str) -> SearchResult {
    let response: ClaimSearchResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Decode {
            detail: format!("{}. Response text: {}", e, truncate(body, ERROR_BODY_LIMIT)),
        })?;

    Ok(ClaimPage {
        claims: decode_each::<WireClaim, ClaimRecord>(response.claims, "claim"),
        next_page_token: PageToken::from_provider(response.next_page_token),
    })
}

/// Decodes list entries one by one. `null` reads as an empty list and entries
/// that do not fit the wire shape are skipped.
fn decode_each<W, T>(values: Option<Vec<serde_json::Value>>, what: &str) -> Vec<T>
where
    W: serde::de::DeserializeOwned,
    T: From<W>,
{
    values
        .unwrap_or_default()
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<W>(value) {
            Ok(wire) => Some(T::from(wire)),
            Err(e) => {
                warn!("Skipping malformed {} in fact check response: {}", what, e);
                None
            }
        })
        .collect()
}

impl From<WireClaim> for ClaimRecord {
    fn from(wire: WireClaim) -> Self {
        Self {
            text: wire.text.unwrap_or_else(|| "N/A".to_string()),
            claimant: non_empty(wire.claimant),
            claim_date: non_empty(wire.claim_date),
            reviews: decode_each::<WireReview, ReviewRecord>(wire.claim_review, "review"),
        }
    }
}

impl From<WireReview> for ReviewRecord {
    fn from(wire: WireReview) -> Self {
        // Trust order: the review's own image, the rating badge, then the publisher logo.
        let candidates = [
            wire.image.as_ref().and_then(WireImages::first_url),
            wire.review_rating
                .as_ref()
                .and_then(|r| r.image_url.as_deref())
                .filter(|u| !u.trim().is_empty()),
            wire.review_rating
                .as_ref()
                .and_then(|r| r.image.as_ref())
                .and_then(WireImages::first_url),
            wire.publisher
                .as_ref()
                .and_then(|p| p.image.as_ref())
                .and_then(WireImages::first_url),
        ];
        let mut image_hints: Vec<String> = Vec::new();
        for url in candidates.into_iter().flatten() {
            if !image_hints.iter().any(|seen| seen == url) {
                image_hints.push(url.to_string());
            }
        }

        let (publisher_name, publisher_site) = match wire.publisher {
            Some(p) => (non_empty(p.name), non_empty(p.site)),
            None => (None, None),
        };

        Self {
            publisher_name,
            publisher_site,
            url: non_empty(wire.url),
            title: non_empty(wire.title),
            textual_rating: non_empty(wire.textual_rating),
            review_date: non_empty(wire.review_date),
            language_code: non_empty(wire.language_code),
            image_hints,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
