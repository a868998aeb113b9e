//! services/api/src/web/middleware.rs
//!
//! Session middleware for routes that work on a browsing session.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::web::state::AppState;

/// Header carrying the id returned by `POST /sessions`.
pub const SESSION_HEADER: &str = "x-session-id";

/// Middleware that resolves the `x-session-id` header to a live session.
///
/// If valid, inserts the `SessionHandle` into request extensions for handlers to use.
/// If missing, malformed, or unknown, returns 401 Unauthorized.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract and parse the session header
    let session_id = req
        .headers()
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Look up the session
    let handle = state.sessions.get(session_id).await.ok_or_else(|| {
        debug!("Unknown session id {}", session_id);
        StatusCode::UNAUTHORIZED
    })?;

    // 3. Mark it as active
    handle.lock().await.last_accessed_at = Utc::now();

    // 4. Insert the handle into request extensions
    req.extensions_mut().insert(handle);

    // 5. Continue to the handler
    Ok(next.run(req).await)
}
