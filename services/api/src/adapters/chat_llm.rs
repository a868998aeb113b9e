//! services/api/src/adapters/chat_llm.rs
//!
//! This module contains the adapter for the conversational fact-check LLM.
//! It implements the `ChatResponseService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client, error::OpenAIError,
};
use async_trait::async_trait;
use regex::Regex;
use truthshield_core::{
    chat::ExtractedClaim,
    domain::{ChatMessage, ChatRole},
    ports::{ChatResponseService, ClaimExtractionService, PortError, PortResult},
};

const SYSTEM_TEMPLATE: &str = r#"You are a helpful and friendly assistant designed to discuss fact-checking information.
The user has asked: '{question}'.

Here are the fact-check results relevant to their query:
{results}

Instructions:
1. If fact-check results ARE provided, answer the user's query based only on those results. Be conversational, mention the key findings (claim, rating, publisher), and include the source URL if available. Do not add information that is not present in the results.
2. If the results say no fact-check results were found, acknowledge this clearly and politely, and ask the user for a more specific claim or topic to check.
3. If the user's input is a greeting or general chat unrelated to fact-checking, respond conversationally without mentioning fact-checking unless they bring it up.
4. Always be helpful and conversational."#;

/// Returned to the user when no LLM credential is configured.
pub const NO_LLM_MESSAGE: &str =
    "Error: No LLM API key found. Please configure GROQ_API_KEY or GEMINI_API_KEY.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ChatResponseService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiChatAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiChatAdapter {
    /// Creates a new `OpenAiChatAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

pub(crate) fn system_prompt(question: &str, results: &str) -> String {
    SYSTEM_TEMPLATE
        .replace("{results}", results)
        .replace("{question}", question)
}

/// Removes `<think>…</think>` reasoning blocks some hosted models emit.
pub(crate) fn strip_reasoning(text: &str) -> String {
    match Regex::new(r"(?s)<think>.*?</think>") {
        Ok(re) => re.replace_all(text, "").trim().to_string(),
        Err(_) => text.trim().to_string(),
    }
}

//=========================================================================================
// `ChatResponseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ChatResponseService for OpenAiChatAdapter {
    async fn respond(
        &self,
        user_message: &str,
        fact_check_context: &str,
        history: &[ChatMessage],
    ) -> PortResult<String> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(history.len() + 2);
        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt(user_message, fact_check_context))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        );
        for turn in history {
            let message: ChatCompletionRequestMessage = match turn.role {
                ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(turn.content.clone())
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
                    .into(),
                ChatRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(turn.content.clone())
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
                    .into(),
            };
            messages.push(message);
        }
        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_message)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.7)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        if let Some(choice) = response.choices.into_iter().next() {
            if let Some(content) = choice.message.content {
                Ok(strip_reasoning(&content))
            } else {
                Err(PortError::Unexpected(
                    "Chat LLM response contained no text content.".to_string(),
                ))
            }
        } else {
            Err(PortError::Unexpected(
                "Chat LLM returned no choices in its response.".to_string(),
            ))
        }
    }
}

//=========================================================================================
// Fallback When No LLM Is Configured
//=========================================================================================

/// Stands in for both LLM ports when no credential is configured.
/// Every call reports `PortError::Unavailable`.
#[derive(Clone, Default)]
pub struct UnconfiguredLlmAdapter;

#[async_trait]
impl ClaimExtractionService for UnconfiguredLlmAdapter {
    async fn extract_claim(&self, _user_text: &str) -> PortResult<ExtractedClaim> {
        Err(PortError::Unavailable(NO_LLM_MESSAGE.to_string()))
    }
}

#[async_trait]
impl ChatResponseService for UnconfiguredLlmAdapter {
    async fn respond(
        &self,
        _user_message: &str,
        _fact_check_context: &str,
        _history: &[ChatMessage],
    ) -> PortResult<String> {
        Err(PortError::Unavailable(NO_LLM_MESSAGE.to_string()))
    }
}
