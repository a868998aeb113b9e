//! services/api/src/web/state.rs
//!
//! Defines the application's shared and session-specific states.

use crate::adapters::{
    GoogleFactCheckAdapter, OpenAiChatAdapter, OpenAiClaimAdapter, ScrapingThumbnailAdapter,
    UnconfiguredLlmAdapter,
};
use crate::config::Config;
use crate::error::ApiError;
use async_openai::{config::OpenAIConfig, Client};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use truthshield_core::{
    cache::{CacheKey, ResultCache},
    domain::{ChatMessage, PageToken, SearchResult},
    pagination::PaginationState,
    ports::{ChatResponseService, ClaimExtractionService, FactCheckService, ThumbnailService},
};
use uuid::Uuid;

/// Sessions untouched for this long are dropped when new sessions are created.
const SESSION_IDLE_LIMIT_HOURS: i64 = 12;

//=========================================================================================
// AppState (Shared Across All Sessions)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub fact_check: Arc<dyn FactCheckService>,
    pub thumbnails: Arc<dyn ThumbnailService>,
    pub claim_extractor: Arc<dyn ClaimExtractionService>,
    pub chat_responder: Arc<dyn ChatResponseService>,
    pub cache: Arc<ResultCache>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    /// Wires the production adapters from configuration.
    pub fn from_config(config: Arc<Config>) -> Result<Self, ApiError> {
        let fact_check = Arc::new(GoogleFactCheckAdapter::new(
            config.fact_check_api_key.clone(),
            config.fact_check_endpoint.clone(),
            config.search_timeout,
        )?);
        let thumbnails = Arc::new(ScrapingThumbnailAdapter::new(config.thumbnail_timeout)?);

        let (claim_extractor, chat_responder): (
            Arc<dyn ClaimExtractionService>,
            Arc<dyn ChatResponseService>,
        ) = match &config.llm {
            Some(llm) => {
                info!("Chat LLM configured at {} ({})", llm.api_base, llm.chat_model);
                let openai_config = OpenAIConfig::new()
                    .with_api_base(llm.api_base.clone())
                    .with_api_key(llm.api_key.clone());
                let client = Client::with_config(openai_config);
                (
                    Arc::new(OpenAiClaimAdapter::new(
                        client.clone(),
                        llm.extraction_model.clone(),
                    )),
                    Arc::new(OpenAiChatAdapter::new(client, llm.chat_model.clone())),
                )
            }
            None => {
                info!("No LLM key configured; chat replies will explain how to enable it.");
                (
                    Arc::new(UnconfiguredLlmAdapter),
                    Arc::new(UnconfiguredLlmAdapter),
                )
            }
        };

        Ok(Self {
            config,
            fact_check,
            thumbnails,
            claim_extractor,
            chat_responder,
            cache: Arc::new(ResultCache::new()),
            sessions: Arc::new(SessionStore::default()),
        })
    }

    /// Runs one fact-check search through the shared result cache.
    pub async fn cached_search(
        &self,
        query: Option<&str>,
        language_code: &str,
        page_size: u32,
        cursor: Option<&PageToken>,
    ) -> SearchResult {
        let key = CacheKey::new(query, language_code, page_size, cursor);
        let fact_check = self.fact_check.clone();
        let stored = self.cache.len();
        self.cache
            .get_or_fetch(key, self.config.cache_ttl, || async move {
                debug!("Result cache miss ({} entries stored); querying provider.", stored);
                fact_check
                    .search(query, language_code, page_size, cursor)
                    .await
            })
            .await
    }
}

//=========================================================================================
// SessionState (Specific to One Browsing Session)
//=========================================================================================

/// The state for a single browser session. Owned by exactly one session and
/// never shared with another.
pub struct SessionState {
    pub session_id: Uuid,
    pub language_code: String,
    pub pagination: PaginationState,
    /// The most recent gallery search, which decides whether "next" is offered.
    pub last_gallery_result: Option<SearchResult>,
    pub chat_history: Vec<ChatMessage>,
    pub last_accessed_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new(session_id: Uuid, language_code: String) -> Self {
        Self {
            session_id,
            language_code,
            pagination: PaginationState::new(),
            last_gallery_result: None,
            chat_history: Vec::new(),
            last_accessed_at: Utc::now(),
        }
    }

    /// Switches the gallery language. Any change sends pagination back to page one.
    pub fn set_language(&mut self, language_code: &str) -> bool {
        if self.language_code == language_code {
            return false;
        }
        self.language_code = language_code.to_string();
        self.pagination.reset();
        self.last_gallery_result = None;
        true
    }
}

pub type SessionHandle = Arc<Mutex<SessionState>>;

//=========================================================================================
// SessionStore
//=========================================================================================

/// Live sessions keyed by id. Each session sits behind its own lock.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
}

impl SessionStore {
    pub async fn create(&self, language_code: &str) -> (Uuid, SessionHandle) {
        self.evict_idle(Duration::hours(SESSION_IDLE_LIMIT_HOURS)).await;

        let session_id = Uuid::new_v4();
        let handle = Arc::new(Mutex::new(SessionState::new(
            session_id,
            language_code.to_string(),
        )));
        let live = {
            let mut sessions = self.sessions.write().await;
            sessions.insert(session_id, handle.clone());
            sessions.len()
        };
        info!("Created session {} ({} live)", session_id, live);
        (session_id, handle)
    }

    pub async fn get(&self, session_id: Uuid) -> Option<SessionHandle> {
        self.sessions.read().await.get(&session_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops sessions idle for longer than `max_idle`. Sessions currently in use
    /// are kept.
    pub async fn evict_idle(&self, max_idle: Duration) {
        let cutoff = Utc::now() - max_idle;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => session.last_accessed_at > cutoff,
            Err(_) => true,
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!("Evicted {} idle sessions", evicted);
        }
    }
}
