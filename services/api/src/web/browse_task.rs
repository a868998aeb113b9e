//! services/api/src/web/browse_task.rs
//!
//! Loads gallery pages for a session and turns claims into renderable cards.
//! The session lock is only taken to read the position and to record the
//! outcome, never while searching or scraping.

use crate::web::{
    protocol::{language_name, ClaimCard, GalleryResponse},
    state::{AppState, SessionHandle},
};
use futures::future::join_all;
use std::time::Instant;
use tracing::{debug, info};
use truthshield_core::{
    domain::{ClaimRecord, PageToken, SearchError, SearchResult},
    pagination::PaginationState,
};

/// Where a session stood when a gallery load started.
struct GalleryPosition {
    language_code: String,
    cursor: Option<PageToken>,
    page_index: usize,
    can_retreat: bool,
}

impl GalleryPosition {
    async fn snapshot(session_lock: &SessionHandle) -> Self {
        let session = session_lock.lock().await;
        Self {
            language_code: session.language_code.clone(),
            cursor: session.pagination.current().cloned(),
            page_index: session.pagination.page_index(),
            can_retreat: session.pagination.can_retreat(),
        }
    }
}

async fn search_page(app_state: &AppState, position: &GalleryPosition) -> SearchResult {
    let config = &app_state.config;
    app_state
        .cached_search(
            Some(&config.browse_query),
            &position.language_code,
            config.browse_page_size,
            position.cursor.as_ref(),
        )
        .await
}

/// Fetches the session's current gallery page (through the cache) and records
/// the result so the next-page decision is based on it.
pub async fn load_gallery(
    app_state: &AppState,
    session_lock: &SessionHandle,
) -> Result<GalleryResponse, SearchError> {
    let position = GalleryPosition::snapshot(session_lock).await;
    let result = search_page(app_state, &position).await;
    let can_advance = PaginationState::can_advance(&result);

    {
        let mut session = session_lock.lock().await;
        // A concurrent request may have moved the session; its own load records that page.
        if session.language_code == position.language_code
            && session.pagination.page_index() == position.page_index
            && session.pagination.current() == position.cursor.as_ref()
        {
            session.last_gallery_result = Some(result.clone());
        } else {
            debug!("Session {} moved during a gallery load", session.session_id);
        }
    }
    let page = result?;

    let notice = if !page.claims.is_empty() {
        None
    } else if position.cursor.is_none() {
        Some(format!(
            "No recent fact checks found for the current filters (Language: {}, Query: {}).",
            language_name(&position.language_code).unwrap_or(position.language_code.as_str()),
            app_state.config.browse_query
        ))
    } else {
        Some("No more fact checks found for the current filters.".to_string())
    };

    Ok(GalleryResponse {
        claims: build_cards(app_state, &page.claims).await,
        language_code: position.language_code,
        page: position.page_index + 1,
        can_advance,
        can_retreat: position.can_retreat,
        notice,
    })
}

/// The claims on the session's current gallery page, normally served from the cache.
pub async fn current_page_claims(
    app_state: &AppState,
    session_lock: &SessionHandle,
) -> Result<Vec<ClaimRecord>, SearchError> {
    let position = GalleryPosition::snapshot(session_lock).await;
    search_page(app_state, &position).await.map(|page| page.claims)
}

/// The thumbnail for one claim. Embedded image hints are preferred; otherwise
/// the review page is scraped.
pub async fn claim_thumbnail(app_state: &AppState, claim: &ClaimRecord) -> Option<String> {
    let review = claim.primary_review()?;
    if let Some(hint) = review.image_hints.first() {
        return Some(hint.clone());
    }
    app_state
        .thumbnails
        .resolve_thumbnail(review.url.as_deref())
        .await
}

/// Builds one card per claim. Cards resolve their thumbnails concurrently and
/// independently.
pub async fn build_cards(app_state: &AppState, claims: &[ClaimRecord]) -> Vec<ClaimCard> {
    let started = Instant::now();
    let thumbnails = join_all(claims.iter().map(|claim| claim_thumbnail(app_state, claim))).await;

    let cards: Vec<ClaimCard> = claims
        .iter()
        .zip(thumbnails)
        .map(|(claim, thumbnail)| ClaimCard::from_claim(claim, thumbnail))
        .collect();
    info!(
        "Built {} cards ({} with thumbnails) in {:?}",
        cards.len(),
        cards.iter().filter(|c| c.thumbnail_url.is_some()).count(),
        started.elapsed()
    );
    cards
}
