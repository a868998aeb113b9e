//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{
    browse_task::{build_cards, claim_thumbnail, current_page_claims, load_gallery},
    chat_task::chat_turn,
    protocol::{
        language_name, ChatRequest, ChatResponse, ClaimCard, ClaimDetailResponse, ErrorResponse,
        GalleryResponse, LanguageOption, LanguageRequest, ReviewDetail, SearchParams,
        SearchResponse, SessionCreatedResponse, SUPPORTED_LANGUAGES,
    },
    state::{AppState, SessionHandle},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use truthshield_core::{domain::SearchError, pagination::PaginationError};
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_session_handler,
        list_languages_handler,
        gallery_handler,
        claim_detail_handler,
        next_page_handler,
        previous_page_handler,
        set_language_handler,
        search_handler,
        chat_handler,
        clear_chat_handler,
    ),
    components(
        schemas(
            SessionCreatedResponse, LanguageOption, LanguageRequest, ClaimCard,
            ClaimDetailResponse, ReviewDetail, GalleryResponse, SearchResponse, ChatRequest, ChatResponse, ErrorResponse
        )
    ),
    tags(
        (name = "TruthShield API", description = "Fact-check browsing, search, and chat endpoints.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Error Mapping
//=========================================================================================

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn search_failure(e: &SearchError) -> HandlerError {
    let status = match e {
        SearchError::Configuration { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_GATEWAY,
    };
    error!("Fact check search failed: {}", e);
    (status, Json(ErrorResponse::from(e)))
}

fn navigation_conflict(e: PaginationError) -> HandlerError {
    let kind = match e {
        PaginationError::AtFirstPage => "at_first_page",
        PaginationError::NoNextPage => "no_next_page",
    };
    (StatusCode::CONFLICT, Json(ErrorResponse::new(kind, e.to_string())))
}

fn bad_request(message: &str) -> HandlerError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new("invalid_request", message)),
    )
}

//=========================================================================================
// Session Handlers
//=========================================================================================

/// Create a new browsing session.
///
/// The returned id must be sent in the `x-session-id` header on every other
/// session-scoped request.
#[utoipa::path(
    post,
    path = "/sessions",
    responses(
        (status = 201, description = "Session created successfully", body = SessionCreatedResponse)
    )
)]
pub async fn create_session_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let language_code = app_state.config.default_language.clone();
    let (session_id, _) = app_state.sessions.create(&language_code).await;
    (
        StatusCode::CREATED,
        Json(SessionCreatedResponse {
            session_id,
            language_code,
        }),
    )
}

/// List the languages the gallery can be filtered by.
#[utoipa::path(
    get,
    path = "/languages",
    responses((status = 200, description = "Supported languages", body = [LanguageOption]))
)]
pub async fn list_languages_handler() -> Json<Vec<LanguageOption>> {
    Json(
        SUPPORTED_LANGUAGES
            .iter()
            .map(|(code, name)| LanguageOption {
                code: code.to_string(),
                name: name.to_string(),
            })
            .collect(),
    )
}

//=========================================================================================
// Gallery Handlers
//=========================================================================================

/// Show the session's current gallery page.
#[utoipa::path(
    get,
    path = "/claims",
    responses(
        (status = 200, description = "Current gallery page", body = GalleryResponse),
        (status = 401, description = "Missing or unknown session"),
        (status = 502, description = "Fact check provider failed", body = ErrorResponse),
        (status = 503, description = "Fact check provider not configured", body = ErrorResponse)
    ),
    params(("x-session-id" = Uuid, Header, description = "Session id from POST /sessions."))
)]
pub async fn gallery_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session_lock): Extension<SessionHandle>,
) -> Result<Json<GalleryResponse>, HandlerError> {
    load_gallery(&app_state, &session_lock)
        .await
        .map(Json)
        .map_err(|e| search_failure(&e))
}

/// Show one claim from the current gallery page with all of its reviews.
#[utoipa::path(
    get,
    path = "/claims/{index}",
    responses(
        (status = 200, description = "The selected claim", body = ClaimDetailResponse),
        (status = 404, description = "No claim at that position on the current page", body = ErrorResponse),
        (status = 502, description = "Fact check provider failed", body = ErrorResponse)
    ),
    params(
        ("index" = usize, Path, description = "Zero-based position on the current gallery page."),
        ("x-session-id" = Uuid, Header, description = "Session id from POST /sessions.")
    )
)]
pub async fn claim_detail_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session_lock): Extension<SessionHandle>,
    Path(index): Path<usize>,
) -> Result<Json<ClaimDetailResponse>, HandlerError> {
    let claims = current_page_claims(&app_state, &session_lock)
        .await
        .map_err(|e| search_failure(&e))?;
    let Some(claim) = claims.get(index) else {
        warn!("Claim {} requested but the current page has {}", index, claims.len());
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(
                "claim_not_found",
                "Could not display the selected claim. It might not be available on the current page.",
            )),
        ));
    };

    let thumbnail = claim_thumbnail(&app_state, claim).await;
    Ok(Json(ClaimDetailResponse::from_claim(index, claim, thumbnail)))
}

/// Move to the next gallery page.
///
/// Only allowed when the last loaded page offered a next-page cursor.
#[utoipa::path(
    post,
    path = "/claims/next",
    responses(
        (status = 200, description = "The next gallery page", body = GalleryResponse),
        (status = 409, description = "No next page is available", body = ErrorResponse),
        (status = 502, description = "Fact check provider failed", body = ErrorResponse)
    ),
    params(("x-session-id" = Uuid, Header, description = "Session id from POST /sessions."))
)]
pub async fn next_page_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session_lock): Extension<SessionHandle>,
) -> Result<Json<GalleryResponse>, HandlerError> {
    {
        let mut session = session_lock.lock().await;
        let state = &mut *session;
        let advanced = match state.last_gallery_result.as_ref() {
            Some(last) => state.pagination.advance_from(last),
            None => Err(PaginationError::NoNextPage),
        };
        advanced.map_err(navigation_conflict)?;
        info!(
            "Session {} advanced to page {}",
            session.session_id,
            session.pagination.page_index() + 1
        );
    }

    load_gallery(&app_state, &session_lock)
        .await
        .map(Json)
        .map_err(|e| search_failure(&e))
}

/// Move back to the previous gallery page.
#[utoipa::path(
    post,
    path = "/claims/previous",
    responses(
        (status = 200, description = "The previous gallery page", body = GalleryResponse),
        (status = 409, description = "Already on the first page", body = ErrorResponse),
        (status = 502, description = "Fact check provider failed", body = ErrorResponse)
    ),
    params(("x-session-id" = Uuid, Header, description = "Session id from POST /sessions."))
)]
pub async fn previous_page_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session_lock): Extension<SessionHandle>,
) -> Result<Json<GalleryResponse>, HandlerError> {
    session_lock
        .lock()
        .await
        .pagination
        .retreat()
        .map_err(navigation_conflict)?;

    load_gallery(&app_state, &session_lock)
        .await
        .map(Json)
        .map_err(|e| search_failure(&e))
}

/// Change the gallery language. A change returns the gallery to its first page.
#[utoipa::path(
    put,
    path = "/language",
    request_body = LanguageRequest,
    responses(
        (status = 200, description = "Gallery page in the selected language", body = GalleryResponse),
        (status = 400, description = "Unsupported language", body = ErrorResponse)
    ),
    params(("x-session-id" = Uuid, Header, description = "Session id from POST /sessions."))
)]
pub async fn set_language_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session_lock): Extension<SessionHandle>,
    Json(req): Json<LanguageRequest>,
) -> Result<Json<GalleryResponse>, HandlerError> {
    let code = req.language_code.trim();
    if language_name(code).is_none() {
        warn!("Rejected unsupported language '{}'", code);
        return Err(bad_request("Unsupported language code."));
    }

    {
        let mut session = session_lock.lock().await;
        if session.set_language(code) {
            info!("Session {} switched language to {}", session.session_id, code);
        }
    }

    load_gallery(&app_state, &session_lock)
        .await
        .map(Json)
        .map_err(|e| search_failure(&e))
}

//=========================================================================================
// Search Handler
//=========================================================================================

/// Search fact checks for a free-text claim or topic.
///
/// Returns a single page of results in the session's language.
#[utoipa::path(
    get,
    path = "/search",
    params(
        SearchParams,
        ("x-session-id" = Uuid, Header, description = "Session id from POST /sessions.")
    ),
    responses(
        (status = 200, description = "Search results", body = SearchResponse),
        (status = 400, description = "Blank query", body = ErrorResponse),
        (status = 502, description = "Fact check provider failed", body = ErrorResponse)
    )
)]
pub async fn search_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session_lock): Extension<SessionHandle>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, HandlerError> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(bad_request("Please enter a search query."));
    }
    let language_code = session_lock.lock().await.language_code.clone();

    let page = app_state
        .cached_search(
            Some(query),
            &language_code,
            app_state.config.search_page_size,
            None,
        )
        .await
        .map_err(|e| search_failure(&e))?;

    let notice = page
        .claims
        .is_empty()
        .then(|| format!("No fact checks found matching: {}", query));

    Ok(Json(SearchResponse {
        query: query.to_string(),
        language_code,
        total: page.claims.len(),
        claims: build_cards(&app_state, &page.claims).await,
        notice,
    }))
}

//=========================================================================================
// Chat Handlers
//=========================================================================================

/// Send one chat message and receive the assistant's reply.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatResponse),
        (status = 400, description = "Blank message", body = ErrorResponse)
    ),
    params(("x-session-id" = Uuid, Header, description = "Session id from POST /sessions."))
)]
pub async fn chat_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(session_lock): Extension<SessionHandle>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, HandlerError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(bad_request("Please enter a message."));
    }
    Ok(Json(chat_turn(&app_state, &session_lock, message).await))
}

/// Forget the session's chat history.
#[utoipa::path(
    delete,
    path = "/chat",
    responses((status = 204, description = "Chat history cleared")),
    params(("x-session-id" = Uuid, Header, description = "Session id from POST /sessions."))
)]
pub async fn clear_chat_handler(Extension(session_lock): Extension<SessionHandle>) -> StatusCode {
    session_lock.lock().await.chat_history.clear();
    StatusCode::NO_CONTENT
}
