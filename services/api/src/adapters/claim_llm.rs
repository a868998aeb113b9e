//! services/api/src/adapters/claim_llm.rs
//!
//! This module contains the adapter for the claim-extraction LLM.
//! It implements the `ClaimExtractionService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    types::chat::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client, error::OpenAIError,
};
use async_trait::async_trait;
use truthshield_core::{
    chat::{ExtractedClaim, NO_CLAIM},
    ports::{ClaimExtractionService, PortError, PortResult},
};

use super::chat_llm::strip_reasoning;

const EXTRACTION_TEMPLATE: &str = r#"Analyze the following user query: '{query}'

Your task is to identify the core factual claim or topic in the user query.
Return ONLY the concise claim or topic string itself.
If the query is a greeting, general chat, a vague request (like "latest news"), or does not contain a checkable factual claim, return the exact string "{no_claim}".

Do not add explanations, labels, or phrases like "Extracted Topic:" or "The claim is:".
Your response must be ONLY the extracted claim/topic or the string "{no_claim}".

Examples:
- User query: "Is the earth flat?"
  YOUR RESPONSE: Is the earth flat?
- User query: "Tell me about the moon landing."
  YOUR RESPONSE: moon landing
- User query: "Hi there!"
  YOUR RESPONSE: {no_claim}
- User query: "What's the news?"
  YOUR RESPONSE: {no_claim}

User query: '{query}'
YOUR RESPONSE:"#;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ClaimExtractionService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiClaimAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiClaimAdapter {
    /// Creates a new `OpenAiClaimAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

pub(crate) fn extraction_prompt(user_text: &str) -> String {
    EXTRACTION_TEMPLATE
        .replace("{no_claim}", NO_CLAIM)
        .replace("{query}", user_text)
}

//=========================================================================================
// `ClaimExtractionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ClaimExtractionService for OpenAiClaimAdapter {
    /// Asks a small, low-temperature model for the checkable claim in `user_text`.
    async fn extract_claim(&self, user_text: &str) -> PortResult<ExtractedClaim> {
        let messages = vec![ChatCompletionRequestUserMessageArgs::default()
            .content(extraction_prompt(user_text))
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.1)
            .max_tokens(64u32)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let raw = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected("Claim extraction LLM returned no text content.".to_string())
            })?;

        Ok(ExtractedClaim::from_model_output(&strip_reasoning(&raw)))
    }
}
