//! services/api/tests/api_routes.rs
//!
//! Exercises the HTTP surface through `build_router` with the production
//! adapters pointed at a local fake provider.

mod common;

use api_lib::{
    adapters::chat_llm::NO_LLM_MESSAGE,
    web::{build_router, middleware::SESSION_HEADER, state::AppState},
};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    response::Html,
    routing::get,
    Router,
};
use common::{claims_body, serve, spawn_provider, test_config, Params, ProviderLog};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use truthshield_core::{
    chat::ExtractedClaim,
    domain::ChatMessage,
    ports::{ChatResponseService, ClaimExtractionService, PortResult},
};
use uuid::Uuid;

//=========================================================================================
// Harness
//=========================================================================================

/// Page one carries cursor `T1`; page two is the last page.
fn two_page_provider(params: &Params) -> (StatusCode, String) {
    match params.get("pageToken").map(String::as_str) {
        None => (StatusCode::OK, claims_body(&["First A", "First B"], Some("T1"))),
        Some("T1") => (StatusCode::OK, claims_body(&["Second"], None)),
        Some(other) => (StatusCode::BAD_REQUEST, format!("unknown token {}", other)),
    }
}

fn state_for(endpoint: String, api_key: Option<&str>) -> AppState {
    AppState::from_config(Arc::new(test_config(endpoint, api_key))).unwrap()
}

async fn app_with<F>(respond: F, api_key: Option<&str>) -> (Router, ProviderLog)
where
    F: Fn(&Params) -> (StatusCode, String) + Clone + Send + Sync + 'static,
{
    let (endpoint, log) = spawn_provider(respond).await;
    (build_router(Arc::new(state_for(endpoint, api_key))), log)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    session: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = session {
        builder = builder.header(SESSION_HEADER, id);
    }
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn new_session(app: &Router) -> String {
    let (status, body) = send(app, Method::POST, "/sessions", None, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["language_code"], "en");
    body["session_id"].as_str().unwrap().to_string()
}

//=========================================================================================
// Sessions
//=========================================================================================

#[tokio::test]
async fn session_routes_reject_missing_or_unknown_ids() {
    let (app, log) = app_with(two_page_provider, Some("secret")).await;

    let (status, _) = send(&app, Method::GET, "/claims", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let unknown = Uuid::new_v4().to_string();
    let (status, _) = send(&app, Method::GET, "/claims", Some(&unknown), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/claims", Some("not-a-uuid"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(log.hits(), 0);
}

#[tokio::test]
async fn languages_are_listed_without_a_session() {
    let (app, _) = app_with(two_page_provider, Some("secret")).await;
    let (status, body) = send(&app, Method::GET, "/languages", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"code": "en", "name": "English"}, {"code": "hi", "name": "Hindi"}]));
}

//=========================================================================================
// Gallery Navigation
//=========================================================================================

#[tokio::test]
async fn gallery_pages_forward_and_back_through_the_cache() {
    let (app, log) = app_with(two_page_provider, Some("secret")).await;
    let session = new_session(&app).await;

    let (status, page) = send(&app, Method::GET, "/claims", Some(&session), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["page"], 1);
    assert_eq!(page["claims"].as_array().unwrap().len(), 2);
    assert_eq!(page["can_advance"], true);
    assert_eq!(page["can_retreat"], false);
    assert_eq!(page["notice"], Value::Null);
    assert_eq!(log.last_request().get("query").map(String::as_str), Some("India"));
    assert_eq!(log.last_request().get("pageSize").map(String::as_str), Some("10"));

    let (status, page) = send(&app, Method::POST, "/claims/next", Some(&session), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["page"], 2);
    assert_eq!(page["claims"][0]["claim_text"], "Second");
    assert_eq!(page["can_advance"], false);
    assert_eq!(page["can_retreat"], true);
    assert_eq!(log.last_request().get("pageToken").map(String::as_str), Some("T1"));
    assert_eq!(log.hits(), 2);

    let (status, err) = send(&app, Method::POST, "/claims/next", Some(&session), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["kind"], "no_next_page");

    let (status, page) = send(&app, Method::POST, "/claims/previous", Some(&session), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["page"], 1);
    assert_eq!(page["claims"][0]["claim_text"], "First A");
    assert_eq!(log.hits(), 2);

    let (status, err) =
        send(&app, Method::POST, "/claims/previous", Some(&session), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["kind"], "at_first_page");
}

#[tokio::test]
async fn claim_detail_reads_the_current_page() {
    let (app, log) = app_with(two_page_provider, Some("secret")).await;
    let session = new_session(&app).await;
    send(&app, Method::GET, "/claims", Some(&session), None).await;

    let (status, detail) = send(&app, Method::GET, "/claims/1", Some(&session), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["index"], 1);
    assert_eq!(detail["claim_text"], "First B");
    assert_eq!(detail["claimant"], "Someone");
    assert_eq!(detail["reviews"].as_array().unwrap().len(), 1);
    assert_eq!(detail["reviews"][0]["publisher_name"], "Fact Desk");
    assert_eq!(detail["reviews"][0]["rating"], "False");
    assert_eq!(log.hits(), 1);

    let (status, err) = send(&app, Method::GET, "/claims/2", Some(&session), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["kind"], "claim_not_found");

    send(&app, Method::POST, "/claims/next", Some(&session), None).await;
    let (_, detail) = send(&app, Method::GET, "/claims/0", Some(&session), None).await;
    assert_eq!(detail["claim_text"], "Second");
    let (status, _) = send(&app, Method::GET, "/claims/1", Some(&session), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(log.hits(), 2);
}

#[tokio::test]
async fn claim_detail_keeps_every_review() {
    let body = json!({"claims": [{
        "text": "Disputed claim",
        "claimDate": "2024-02-29",
        "claimReview": [
            {"publisher": {"name": "First Desk"}, "title": "Not true", "textualRating": "False",
             "image": {"url": "https://first.example/hero.jpg"}},
            {"publisher": {"name": "Second Desk"}, "textualRating": "Misleading"}
        ]
    }]})
    .to_string();
    let (app, _) = app_with(move |_| (StatusCode::OK, body.clone()), Some("secret")).await;
    let session = new_session(&app).await;

    let (status, detail) = send(&app, Method::GET, "/claims/0", Some(&session), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["claim_date"], "Thursday, 29th February 2024");
    assert_eq!(detail["thumbnail_url"], "https://first.example/hero.jpg");
    assert_eq!(detail["reviews"][0]["title"], "Not true");
    assert_eq!(detail["reviews"][1]["publisher_name"], "Second Desk");
    assert_eq!(detail["reviews"][1]["rating"], "Misleading");
}

#[tokio::test]
async fn slow_thumbnails_do_not_block_the_session() {
    let site = Router::new().route(
        "/story",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Html("<img src=\"/late.jpg\">")
        }),
    );
    let story_url = format!("http://{}/story", serve(site).await);
    let body = json!({"claims": [{
        "text": "Slow claim",
        "claimReview": [{"publisher": {"name": "Fact Desk"}, "url": story_url}]
    }]})
    .to_string();
    let (app, _) = app_with(move |_| (StatusCode::OK, body.clone()), Some("secret")).await;
    let session = new_session(&app).await;

    let gallery = {
        let app = app.clone();
        let session = session.clone();
        tokio::spawn(async move { send(&app, Method::GET, "/claims", Some(&session), None).await })
    };
    tokio::time::sleep(Duration::from_millis(300)).await;

    let cleared = tokio::time::timeout(
        Duration::from_secs(1),
        send(&app, Method::DELETE, "/chat", Some(&session), None),
    )
    .await
    .expect("session stayed locked during the gallery load");
    assert_eq!(cleared.0, StatusCode::NO_CONTENT);

    let (status, page) = gallery.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["claims"][0]["thumbnail_url"], Value::Null);
}

#[tokio::test]
async fn next_is_refused_before_any_page_is_loaded() {
    let (app, log) = app_with(two_page_provider, Some("secret")).await;
    let session = new_session(&app).await;

    let (status, _) = send(&app, Method::POST, "/claims/next", Some(&session), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(log.hits(), 0);
}

#[tokio::test]
async fn sessions_share_cached_pages_but_not_position() {
    let (app, log) = app_with(two_page_provider, Some("secret")).await;
    let first = new_session(&app).await;
    let second = new_session(&app).await;

    send(&app, Method::GET, "/claims", Some(&first), None).await;
    send(&app, Method::POST, "/claims/next", Some(&first), None).await;

    let (_, page) = send(&app, Method::GET, "/claims", Some(&second), None).await;
    assert_eq!(page["page"], 1);
    assert_eq!(page["can_retreat"], false);
    assert_eq!(log.hits(), 2);
}

#[tokio::test]
async fn empty_first_page_explains_the_filters() {
    let (app, _) = app_with(|_| (StatusCode::OK, claims_body(&[], None)), Some("secret")).await;
    let session = new_session(&app).await;

    let (status, page) = send(&app, Method::GET, "/claims", Some(&session), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["can_advance"], false);
    assert_eq!(
        page["notice"],
        "No recent fact checks found for the current filters (Language: English, Query: India)."
    );
}

#[tokio::test]
async fn missing_api_key_is_reported_without_contacting_the_provider() {
    let (app, log) = app_with(two_page_provider, None).await;
    let session = new_session(&app).await;

    let (status, err) = send(&app, Method::GET, "/claims", Some(&session), None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(err["kind"], "configuration_error");
    assert_eq!(err["message"], "API Key missing");
    assert!(err["hint"].as_str().unwrap().contains("FACT_CHECK_API_KEY"));
    assert_eq!(log.hits(), 0);
}

#[tokio::test]
async fn provider_failures_are_cached_like_successes() {
    let (app, log) = app_with(
        |_| (StatusCode::INTERNAL_SERVER_ERROR, "backend exploded".to_string()),
        Some("secret"),
    )
    .await;
    let session = new_session(&app).await;

    for _ in 0..2 {
        let (status, err) = send(&app, Method::GET, "/claims", Some(&session), None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(err["kind"], "http_error");
    }
    assert_eq!(log.hits(), 1);

    let (status, _) = send(&app, Method::POST, "/claims/next", Some(&session), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn language_change_returns_to_the_first_page() {
    let (app, log) = app_with(two_page_provider, Some("secret")).await;
    let session = new_session(&app).await;
    send(&app, Method::GET, "/claims", Some(&session), None).await;
    send(&app, Method::POST, "/claims/next", Some(&session), None).await;

    let (status, page) = send(
        &app,
        Method::PUT,
        "/language",
        Some(&session),
        Some(json!({"language_code": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["language_code"], "hi");
    assert_eq!(page["page"], 1);
    assert_eq!(page["can_retreat"], false);
    assert_eq!(log.last_request().get("languageCode").map(String::as_str), Some("hi"));
    assert!(!log.last_request().contains_key("pageToken"));

    let (status, _) = send(
        &app,
        Method::PUT,
        "/language",
        Some(&session),
        Some(json!({"language_code": "xx"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

//=========================================================================================
// Search
//=========================================================================================

#[tokio::test]
async fn search_returns_a_single_page_for_the_query() {
    let (app, log) = app_with(
        |params: &Params| match params.get("query").map(String::as_str) {
            Some("vaccine myths") => (StatusCode::OK, claims_body(&["Vaccines cause X"], Some("T5"))),
            _ => (StatusCode::OK, claims_body(&[], None)),
        },
        Some("secret"),
    )
    .await;
    let session = new_session(&app).await;

    let (status, body) =
        send(&app, Method::GET, "/search?q=vaccine%20myths", Some(&session), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "vaccine myths");
    assert_eq!(body["total"], 1);
    assert_eq!(body["claims"][0]["claim_text"], "Vaccines cause X");
    assert_eq!(body["claims"][0]["rating"], "False");
    assert_eq!(body["notice"], Value::Null);
    assert_eq!(log.last_request().get("pageSize").map(String::as_str), Some("20"));

    let (_, body) = send(&app, Method::GET, "/search?q=nothing", Some(&session), None).await;
    assert_eq!(body["total"], 0);
    assert_eq!(body["notice"], "No fact checks found matching: nothing");
}

#[tokio::test]
async fn blank_search_is_rejected_without_a_request() {
    let (app, log) = app_with(two_page_provider, Some("secret")).await;
    let session = new_session(&app).await;

    let (status, err) = send(&app, Method::GET, "/search?q=%20%20", Some(&session), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["kind"], "invalid_request");
    assert_eq!(log.hits(), 0);
}

//=========================================================================================
// Chat
//=========================================================================================

struct FixedClaim;

#[async_trait]
impl ClaimExtractionService for FixedClaim {
    async fn extract_claim(&self, user_text: &str) -> PortResult<ExtractedClaim> {
        Ok(if user_text.contains("hello") {
            ExtractedClaim::None
        } else {
            ExtractedClaim::Claim("moon landing staged".to_string())
        })
    }
}

/// Replies with the context it was grounded on and the history length it saw.
struct EchoResponder;

#[async_trait]
impl ChatResponseService for EchoResponder {
    async fn respond(
        &self,
        _user_message: &str,
        fact_check_context: &str,
        history: &[ChatMessage],
    ) -> PortResult<String> {
        Ok(format!("{} [history={}]", fact_check_context, history.len()))
    }
}

#[tokio::test]
async fn chat_without_llm_explains_the_missing_key() {
    let (app, log) = app_with(two_page_provider, Some("secret")).await;
    let session = new_session(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/chat",
        Some(&session),
        Some(json!({"message": "Was the moon landing staged?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], NO_LLM_MESSAGE);
    assert_eq!(body["extracted_claim"], Value::Null);
    assert_eq!(log.hits(), 0);
}

#[tokio::test]
async fn chat_grounds_replies_in_fact_checks_and_keeps_history() {
    let (endpoint, log) = spawn_provider(|_| {
        (StatusCode::OK, claims_body(&["The moon landing was staged"], None))
    })
    .await;
    let mut state = state_for(endpoint, Some("secret"));
    state.claim_extractor = Arc::new(FixedClaim);
    state.chat_responder = Arc::new(EchoResponder);
    let app = build_router(Arc::new(state));
    let session = new_session(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/chat",
        Some(&session),
        Some(json!({"message": "Was the moon landing staged?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["extracted_claim"], "moon landing staged");
    assert_eq!(body["claims"].as_array().unwrap().len(), 1);
    let reply = body["reply"].as_str().unwrap();
    assert!(reply.starts_with("Here are the fact-check results found:"));
    assert!(reply.contains("1. Claim: The moon landing was staged"));
    assert!(reply.ends_with("[history=0]"));
    assert_eq!(log.last_request().get("query").map(String::as_str), Some("moon landing staged"));
    assert_eq!(log.last_request().get("pageSize").map(String::as_str), Some("5"));

    let (_, body) = send(
        &app,
        Method::POST,
        "/chat",
        Some(&session),
        Some(json!({"message": "hello there"})),
    )
    .await;
    assert_eq!(
        body["reply"],
        "Please provide a specific claim or topic to check. [history=2]"
    );
    assert_eq!(body["extracted_claim"], Value::Null);

    let (status, _) = send(&app, Method::DELETE, "/chat", Some(&session), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(
        &app,
        Method::POST,
        "/chat",
        Some(&session),
        Some(json!({"message": "hello again"})),
    )
    .await;
    assert!(body["reply"].as_str().unwrap().ends_with("[history=0]"));
}

#[tokio::test]
async fn blank_chat_message_is_rejected() {
    let (app, _) = app_with(two_page_provider, Some("secret")).await;
    let session = new_session(&app).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/chat",
        Some(&session),
        Some(json!({"message": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
