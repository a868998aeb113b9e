//! crates/truthshield_core/src/chat.rs
//!
//! Text plumbing between the fact-check search and the chat model: reading the
//! claim-extraction reply and turning search outcomes into model context.

use std::fmt::Write;

use crate::domain::{ClaimRecord, SearchResult};

/// Sentinel the extraction model answers with when no checkable claim exists.
pub const NO_CLAIM: &str = "NO_CLAIM";

/// Context handed to the chat model when nothing was looked up.
pub const NO_CLAIM_CONTEXT: &str = "Please provide a specific claim or topic to check.";

/// Labels the extraction model sometimes prepends despite being told not to.
const LABEL_PREFIXES: &[&str] = &[
    "your response:",
    "extracted topic:",
    "the claim is:",
    "the core factual claim or topic being asked about is:",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedClaim {
    Claim(String),
    None,
}

impl ExtractedClaim {
    /// Interprets the raw extraction reply. Blank replies and the `NO_CLAIM`
    /// sentinel (quoted or not) mean there is nothing to look up.
    pub fn from_model_output(raw: &str) -> Self {
        let mut text = raw.trim();
        for prefix in LABEL_PREFIXES {
            if text.len() >= prefix.len()
                && text.is_char_boundary(prefix.len())
                && text[..prefix.len()].eq_ignore_ascii_case(prefix)
            {
                text = text[prefix.len()..].trim();
            }
        }
        let text = text.trim_matches(|c| c == '"' || c == '\'').trim();

        if text.is_empty() || text == NO_CLAIM {
            Self::None
        } else {
            Self::Claim(text.to_string())
        }
    }

    pub fn as_deref(&self) -> Option<&str> {
        match self {
            Self::Claim(text) => Some(text),
            Self::None => None,
        }
    }
}

/// Formats claims into the numbered block the chat model is grounded on.
pub fn format_fact_check_results(claims: &[ClaimRecord]) -> String {
    if claims.is_empty() {
        return "No fact-check results found for the query.".to_string();
    }

    let mut out = String::from("Here are the fact-check results found:\n\n");
    for (i, claim) in claims.iter().enumerate() {
        let review = claim.primary_review();
        let publisher = review
            .and_then(|r| r.publisher_name.as_deref())
            .unwrap_or("N/A");
        let rating = review.map(|r| r.rating()).unwrap_or("N/A");
        let url = review.and_then(|r| r.url.as_deref()).unwrap_or("N/A");

        let _ = writeln!(out, "{}. Claim: {}", i + 1, claim.text);
        let _ = writeln!(out, "   Claimant: {}", claim.claimant.as_deref().unwrap_or("N/A"));
        let _ = writeln!(out, "   Rating: {} (by {})", rating, publisher);
        let _ = writeln!(out, "   Review URL: {}\n", url);
    }
    out.trim().to_string()
}

/// Builds the model context for a looked-up claim from its search outcome.
pub fn fact_check_context(claim: &str, result: &SearchResult) -> String {
    match result {
        Ok(page) if !page.claims.is_empty() => format_fact_check_results(&page.claims),
        Ok(_) => format!("No specific fact-check results found for: '{}'.", claim),
        Err(e) => format!(
            "Could not retrieve fact-check results for '{}' due to an error: {}",
            claim, e
        ),
    }
}
