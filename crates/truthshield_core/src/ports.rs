//! crates/truthshield_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like the fact-check
//! provider, arbitrary web pages, or a hosted language model.

use async_trait::async_trait;
use std::time::Duration;

use crate::chat::ExtractedClaim;
use crate::domain::{ChatMessage, PageToken, SearchResult};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for the language-model ports.
/// Search failures have their own taxonomy in `SearchError`.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait FactCheckService: Send + Sync {
    /// Issues exactly one query to the claim-review provider.
    ///
    /// Never fails by panicking; every failure is classified into the `Err` side
    /// of the returned `SearchResult`.
    async fn search(
        &self,
        query: Option<&str>,
        language_code: &str,
        page_size: u32,
        cursor: Option<&PageToken>,
    ) -> SearchResult;
}

#[async_trait]
pub trait ThumbnailService: Send + Sync {
    /// Fetches `review_url` once and returns up to `max_candidates` image URLs in
    /// trust order. Any failure yields an empty list.
    async fn resolve(
        &self,
        review_url: Option<&str>,
        max_candidates: usize,
        timeout: Duration,
    ) -> Vec<String>;

    /// The fetch timeout used by `resolve_thumbnail`.
    fn default_timeout(&self) -> Duration;

    /// The single-image contract used by card rendering.
    async fn resolve_thumbnail(&self, review_url: Option<&str>) -> Option<String> {
        self.resolve(review_url, 1, self.default_timeout())
            .await
            .into_iter()
            .next()
    }
}

#[async_trait]
pub trait ClaimExtractionService: Send + Sync {
    /// Identifies the core checkable claim or topic in free user text.
    async fn extract_claim(&self, user_text: &str) -> PortResult<ExtractedClaim>;
}

#[async_trait]
pub trait ChatResponseService: Send + Sync {
    /// Produces a conversational reply grounded in `fact_check_context`.
    async fn respond(
        &self,
        user_message: &str,
        fact_check_context: &str,
        history: &[ChatMessage],
    ) -> PortResult<String>;
}
