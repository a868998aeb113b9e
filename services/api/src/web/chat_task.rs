//! services/api/src/web/chat_task.rs
//!
//! This module contains the worker function responsible for handling a single
//! chat turn: extract a claim, look it up, and ask the chat model to summarize.

use crate::web::{
    protocol::{ChatResponse, ClaimCard},
    state::{AppState, SessionHandle},
};
use std::time::Instant;
use tracing::{error, info, warn};
use truthshield_core::{
    chat::{fact_check_context, ExtractedClaim, NO_CLAIM_CONTEXT},
    domain::ChatMessage,
    ports::PortError,
};

/// Returned when the chat model fails for any reason other than missing configuration.
pub const CHAT_FAILURE_REPLY: &str =
    "Sorry, I encountered an error trying to process your request with the language model.";

/// Handles one user message end to end and records both sides of the exchange
/// in the session's history. The session lock is not held during model or
/// search calls.
pub async fn chat_turn(
    app_state: &AppState,
    session_lock: &SessionHandle,
    user_message: &str,
) -> ChatResponse {
    let started = Instant::now();
    let (language_code, history) = {
        let session = session_lock.lock().await;
        (session.language_code.clone(), session.chat_history.clone())
    };

    // --- 1. Claim extraction ---
    let extracted = match app_state.claim_extractor.extract_claim(user_message).await {
        Ok(claim) => claim,
        Err(PortError::Unavailable(_)) => ExtractedClaim::None,
        Err(e) => {
            error!("Claim extraction error: {}", e);
            ExtractedClaim::None
        }
    };
    info!("Extracted claim: {:?}", extracted);

    // --- 2. Fact-check lookup ---
    let mut claims = Vec::new();
    let mut warning = None;
    let context = match extracted.as_deref() {
        Some(claim) => {
            let result = app_state
                .cached_search(
                    Some(claim),
                    &language_code,
                    app_state.config.chat_page_size,
                    None,
                )
                .await;
            match &result {
                Ok(page) => claims = page.claims.clone(),
                Err(e) => {
                    let message = format!(
                        "Error fetching fact-check data for '{}': {}",
                        claim, e
                    );
                    warn!("{}", message);
                    warning = Some(message);
                }
            }
            fact_check_context(claim, &result)
        }
        None => NO_CLAIM_CONTEXT.to_string(),
    };

    // --- 3. Conversational reply ---
    let llm_started = Instant::now();
    let reply = match app_state
        .chat_responder
        .respond(user_message, &context, &history)
        .await
    {
        Ok(reply) => reply,
        Err(PortError::Unavailable(message)) => message,
        Err(e) => {
            error!("LLM API Error: {}", e);
            CHAT_FAILURE_REPLY.to_string()
        }
    };
    info!("Chat LLM took {:?}", llm_started.elapsed());

    // --- 4. Record the exchange ---
    {
        let mut session = session_lock.lock().await;
        session.chat_history.push(ChatMessage::user(user_message));
        session.chat_history.push(ChatMessage::assistant(reply.clone()));
    }
    info!("Chat turn finished in {:?}", started.elapsed());

    ChatResponse {
        reply,
        extracted_claim: extracted.as_deref().map(str::to_string),
        claims: claims
            .iter()
            .map(|claim| {
                let hint = claim
                    .primary_review()
                    .and_then(|r| r.image_hints.first().cloned());
                ClaimCard::from_claim(claim, hint)
            })
            .collect(),
        warning,
    }
}
