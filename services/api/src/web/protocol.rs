//! services/api/src/web/protocol.rs
//!
//! Defines the JSON message protocol between the browser client and the API server.
//! The browser renders these payloads as cards, lists, and chat bubbles.

use serde::{Deserialize, Serialize};
use truthshield_core::domain::{
    ClaimRecord, FormattedDate, ReviewRecord, SearchError, MISSING_RATING,
};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Language codes offered to the user, with their display names.
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[("en", "English"), ("hi", "Hindi")];

pub fn language_name(code: &str) -> Option<&'static str> {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

#[derive(Deserialize, Debug, ToSchema)]
pub struct LanguageRequest {
    pub language_code: String,
}

#[derive(Deserialize, Debug, IntoParams)]
pub struct SearchParams {
    /// Free-text claim or topic.
    pub q: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct ChatRequest {
    pub message: String,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

#[derive(Serialize, Debug, ToSchema)]
pub struct SessionCreatedResponse {
    pub session_id: Uuid,
    pub language_code: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct LanguageOption {
    pub code: String,
    pub name: String,
}

/// One claim, flattened for card rendering from its first review.
#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct ClaimCard {
    pub claim_text: String,
    pub claimant: Option<String>,
    /// `false` when the claim has no review; the review fields are then all empty.
    pub has_review: bool,
    pub rating: String,
    pub publisher_name: Option<String>,
    pub publisher_site: Option<String>,
    pub review_url: Option<String>,
    pub review_date: Option<String>,
    pub review_time: Option<String>,
    /// `None` means the browser shows its placeholder.
    pub thumbnail_url: Option<String>,
}

impl ClaimCard {
    pub fn from_claim(claim: &ClaimRecord, thumbnail_url: Option<String>) -> Self {
        let review = claim.primary_review();
        let date = review.and_then(|r| r.formatted_date());
        Self {
            claim_text: claim.text.clone(),
            claimant: claim.claimant.clone(),
            has_review: review.is_some(),
            rating: review
                .map(|r| r.rating())
                .unwrap_or(MISSING_RATING)
                .to_string(),
            publisher_name: review.and_then(|r| r.publisher_name.clone()),
            publisher_site: review.and_then(|r| r.publisher_site.clone()),
            review_url: review.and_then(|r| r.url.clone()),
            review_date: date.as_ref().map(|d| d.date.clone()),
            review_time: date.and_then(|d| d.time),
            thumbnail_url,
        }
    }
}

/// One review of a claim, as shown in the claim detail view.
#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct ReviewDetail {
    pub publisher_name: Option<String>,
    pub publisher_site: Option<String>,
    pub title: Option<String>,
    pub rating: String,
    pub review_url: Option<String>,
    pub review_date: Option<String>,
    pub review_time: Option<String>,
    pub language_code: Option<String>,
    pub image_urls: Vec<String>,
}

impl From<&ReviewRecord> for ReviewDetail {
    fn from(review: &ReviewRecord) -> Self {
        let date = review.formatted_date();
        Self {
            publisher_name: review.publisher_name.clone(),
            publisher_site: review.publisher_site.clone(),
            title: review.title.clone(),
            rating: review.rating().to_string(),
            review_url: review.url.clone(),
            review_date: date.as_ref().map(|d| d.date.clone()),
            review_time: date.and_then(|d| d.time),
            language_code: review.language_code.clone(),
            image_urls: review.image_hints.clone(),
        }
    }
}

/// A single claim with every review, selected by its position on the current gallery page.
#[derive(Serialize, Debug, ToSchema)]
pub struct ClaimDetailResponse {
    pub index: usize,
    pub claim_text: String,
    pub claimant: Option<String>,
    pub claim_date: Option<String>,
    pub thumbnail_url: Option<String>,
    pub reviews: Vec<ReviewDetail>,
}

impl ClaimDetailResponse {
    pub fn from_claim(index: usize, claim: &ClaimRecord, thumbnail_url: Option<String>) -> Self {
        Self {
            index,
            claim_text: claim.text.clone(),
            claimant: claim.claimant.clone(),
            claim_date: claim
                .claim_date
                .as_deref()
                .map(|raw| FormattedDate::from_raw(raw).date),
            thumbnail_url,
            reviews: claim.reviews.iter().map(ReviewDetail::from).collect(),
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct GalleryResponse {
    pub language_code: String,
    /// One-based page number within this session's history.
    pub page: usize,
    pub claims: Vec<ClaimCard>,
    pub can_advance: bool,
    pub can_retreat: bool,
    /// Set when the page has nothing to show.
    pub notice: Option<String>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct SearchResponse {
    pub query: String,
    pub language_code: String,
    pub total: usize,
    pub claims: Vec<ClaimCard>,
    pub notice: Option<String>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ChatResponse {
    pub reply: String,
    pub extracted_claim: Option<String>,
    pub claims: Vec<ClaimCard>,
    /// Set when the fact-check lookup failed; the reply still explains it.
    pub warning: Option<String>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ErrorResponse {
    pub kind: String,
    pub message: String,
    pub hint: Option<String>,
}

impl ErrorResponse {
    pub fn new(kind: &str, message: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            message: message.into(),
            hint: None,
        }
    }
}

impl From<&SearchError> for ErrorResponse {
    fn from(e: &SearchError) -> Self {
        Self {
            kind: e.kind().to_string(),
            message: e.to_string(),
            hint: e.hint().map(str::to_string),
        }
    }
}
