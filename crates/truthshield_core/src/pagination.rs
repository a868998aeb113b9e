//! crates/truthshield_core/src/pagination.rs
//!
//! Back/forward cursor history for one browsing session.

use crate::domain::{PageToken, SearchResult};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("Already on the first page")]
    AtFirstPage,
    #[error("No next page is available")]
    NoNextPage,
}

/// A stack of page cursors. The bottom element is always `None`, the first page.
///
/// The state is owned by exactly one session and only moves on explicit
/// navigation; it never creates or alters a token itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState {
    history: Vec<Option<PageToken>>,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new()
    }
}

impl PaginationState {
    pub fn new() -> Self {
        Self { history: vec![None] }
    }

    /// Returns to the first page. Used whenever the query or language changes.
    pub fn reset(&mut self) {
        self.history.clear();
        self.history.push(None);
    }

    /// The cursor to pass to the next search call.
    pub fn current(&self) -> Option<&PageToken> {
        self.history.last().and_then(Option::as_ref)
    }

    /// Pushes a provider-issued cursor. Repeating the step that produced the
    /// current page (same token already on top) leaves the history unchanged.
    pub fn advance(&mut self, next: PageToken) {
        if self.current() == Some(&next) {
            return;
        }
        self.history.push(Some(next));
    }

    /// Advances using the cursor carried by the most recent search result.
    pub fn advance_from(&mut self, last: &SearchResult) -> Result<(), PaginationError> {
        match last {
            Ok(page) => match &page.next_page_token {
                Some(token) => {
                    self.advance(token.clone());
                    Ok(())
                }
                None => Err(PaginationError::NoNextPage),
            },
            Err(_) => Err(PaginationError::NoNextPage),
        }
    }

    /// Pops back to the previous page.
    pub fn retreat(&mut self) -> Result<(), PaginationError> {
        if !self.can_retreat() {
            return Err(PaginationError::AtFirstPage);
        }
        self.history.pop();
        Ok(())
    }

    pub fn can_retreat(&self) -> bool {
        self.history.len() > 1
    }

    /// Whether the page described by `last` offers a next page.
    pub fn can_advance(last: &SearchResult) -> bool {
        matches!(last, Ok(page) if page.next_page_token.is_some())
    }

    /// Zero-based index of the current page.
    pub fn page_index(&self) -> usize {
        self.history.len() - 1
    }
}
