//! crates/truthshield_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any transport or serialization format;
//! the provider's JSON shape is mapped into them by the service adapters.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use std::fmt;

/// Rating shown when a review carries no textual rating.
pub const MISSING_RATING: &str = "N/A";

//=========================================================================================
// Page Token
//=========================================================================================

/// An opaque, provider-issued continuation marker for the next result page.
///
/// Nothing outside the search adapter looks inside a token. It is only stored
/// and replayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageToken(String);

impl PageToken {
    /// Wraps a token handed back by the provider. Absent and empty tokens both
    /// mean "no further page" and collapse to `None`.
    pub fn from_provider(raw: Option<String>) -> Option<Self> {
        raw.filter(|t| !t.is_empty()).map(Self)
    }

    /// The raw value, for replaying to the provider.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//=========================================================================================
// Claims and Reviews
//=========================================================================================

/// A factual assertion catalogued by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimRecord {
    pub text: String,
    pub claimant: Option<String>,
    pub claim_date: Option<String>,
    pub reviews: Vec<ReviewRecord>,
}

impl ClaimRecord {
    /// The review used for card rendering and chat summaries.
    pub fn primary_review(&self) -> Option<&ReviewRecord> {
        self.reviews.first()
    }
}

/// A third party's assessment of a claim.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReviewRecord {
    pub publisher_name: Option<String>,
    pub publisher_site: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub textual_rating: Option<String>,
    pub review_date: Option<String>,
    pub language_code: Option<String>,
    /// Image URLs embedded in the review or publisher metadata, in trust order.
    pub image_hints: Vec<String>,
}

impl ReviewRecord {
    pub fn rating(&self) -> &str {
        self.textual_rating.as_deref().unwrap_or(MISSING_RATING)
    }

    /// The review timestamp in display form, if the review carries one.
    pub fn formatted_date(&self) -> Option<FormattedDate> {
        self.review_date.as_deref().map(FormattedDate::from_raw)
    }
}

/// A review timestamp split into a long date and a short clock time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedDate {
    /// e.g. `Monday, 4th March 2024`, or the raw string when it did not parse.
    pub date: String,
    /// e.g. `10:30am`. `None` when the raw string did not parse.
    pub time: Option<String>,
}

impl FormattedDate {
    pub fn from_raw(raw: &str) -> Self {
        match parse_timestamp(raw) {
            Some(ts) => {
                let day = day_with_suffix(ts.day());
                Self {
                    date: ts.format(&format!("%A, {} %B %Y", day)).to_string(),
                    time: Some(ts.format("%I:%M%p").to_string().to_lowercase()),
                }
            }
            None => Self {
                date: raw.to_string(),
                time: None,
            },
        }
    }
}

impl fmt::Display for FormattedDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.time {
            Some(time) => write!(f, "{} at {}", self.date, time),
            None => write!(f, "{}", self.date),
        }
    }
}

/// Accepts RFC 3339 (with `Z` or an offset), a naive date-time, or a bare date.
/// Timestamps are shown in the offset they were written in.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_local());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ts);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn day_with_suffix(day: u32) -> String {
    let suffix = match (day % 100, day % 10) {
        (11..=13, _) => "th",
        (_, 1) => "st",
        (_, 2) => "nd",
        (_, 3) => "rd",
        _ => "th",
    };
    format!("{}{}", day, suffix)
}

//=========================================================================================
// Search Results
//=========================================================================================

/// One page of claims as returned by the provider.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClaimPage {
    pub claims: Vec<ClaimRecord>,
    /// `None` means this is the last page. A present token does not promise
    /// that the next page is non-empty.
    pub next_page_token: Option<PageToken>,
}

/// A classified search failure. Failures are values: every search path returns
/// through `SearchResult`, and failures are cached like successes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("{message}")]
    Configuration { message: String },
    #[error("HTTP Error: {status} - {detail}")]
    Http { status: u16, detail: String },
    #[error("API Request Error: {detail}")]
    Transport { detail: String },
    #[error("API JSON Decode Error: {detail}")]
    Decode { detail: String },
    #[error("An unexpected error occurred in API call: {kind} - {detail}")]
    Unexpected { kind: String, detail: String },
}

impl SearchError {
    pub fn missing_api_key() -> Self {
        Self::Configuration {
            message: "API Key missing".to_string(),
        }
    }

    /// A stable, machine-readable name for the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration_error",
            Self::Http { .. } => "http_error",
            Self::Transport { .. } => "transport_error",
            Self::Decode { .. } => "decode_error",
            Self::Unexpected { .. } => "unexpected_error",
        }
    }

    /// Remediation guidance for failures the operator can fix.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Configuration { .. } => {
                Some("Please ensure FACT_CHECK_API_KEY is configured in the environment or .env file")
            }
            _ => None,
        }
    }
}

/// The outcome of one external search call.
pub type SearchResult = Result<ClaimPage, SearchError>;

//=========================================================================================
// Chat
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

/// A single turn in a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}
