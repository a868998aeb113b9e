pub mod browse_task;
pub mod chat_task;
pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

pub use middleware::require_session;
pub use rest::ApiDoc;
use state::AppState;

/// Builds the API router. Every route except session creation and the
/// language list requires a live `x-session-id`.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/sessions", post(rest::create_session_handler))
        .route("/languages", get(rest::list_languages_handler));

    let session_routes = Router::new()
        .route("/claims", get(rest::gallery_handler))
        .route("/claims/{index}", get(rest::claim_detail_handler))
        .route("/claims/next", post(rest::next_page_handler))
        .route("/claims/previous", post(rest::previous_page_handler))
        .route("/language", put(rest::set_language_handler))
        .route("/search", get(rest::search_handler))
        .route(
            "/chat",
            post(rest::chat_handler).delete(rest::clear_chat_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_session,
        ));

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .with_state(app_state)
}
