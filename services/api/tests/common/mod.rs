//! services/api/tests/common/mod.rs
//!
//! Throwaway HTTP servers standing in for the fact-check provider and for
//! review pages.

#![allow(dead_code)]

use api_lib::config::Config;
use axum::{extract::Query, http::StatusCode, routing::get, Router};
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type Params = HashMap<String, String>;

/// Serves `app` on an ephemeral local port for the rest of the test.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An address nothing is listening on.
pub async fn unused_address() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Counts and records every claim-search request the fake provider receives.
#[derive(Clone, Default)]
pub struct ProviderLog {
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Params>>>,
}

impl ProviderLog {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Params {
        self.requests.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

/// Starts a fake claim-search endpoint. `respond` decides the status and body
/// from the query parameters. Returns the endpoint URL.
pub async fn spawn_provider<F>(respond: F) -> (String, ProviderLog)
where
    F: Fn(&Params) -> (StatusCode, String) + Clone + Send + Sync + 'static,
{
    let log = ProviderLog::default();
    let recorder = log.clone();
    let app = Router::new().route(
        "/v1alpha1/claims",
        get(move |Query(params): Query<Params>| {
            let recorder = recorder.clone();
            let respond = respond.clone();
            async move {
                recorder.hits.fetch_add(1, Ordering::SeqCst);
                let reply = respond(&params);
                recorder.requests.lock().unwrap().push(params);
                reply
            }
        }),
    );
    let addr = serve(app).await;
    (format!("http://{}/v1alpha1/claims", addr), log)
}

/// A provider response body with one review per claim and no review URLs,
/// so card rendering never reaches out for thumbnails.
pub fn claims_body(texts: &[&str], next_page_token: Option<&str>) -> String {
    let claims: Vec<_> = texts
        .iter()
        .map(|text| {
            json!({
                "text": text,
                "claimant": "Someone",
                "claimReview": [{
                    "publisher": {"name": "Fact Desk", "site": "factdesk.example"},
                    "textualRating": "False",
                    "reviewDate": "2024-03-04T10:30:00Z",
                    "languageCode": "en"
                }]
            })
        })
        .collect();
    let mut body = json!({ "claims": claims });
    if let Some(token) = next_page_token {
        body["nextPageToken"] = json!(token);
    }
    body.to_string()
}

pub fn test_config(endpoint: String, api_key: Option<&str>) -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        log_level: tracing::Level::INFO,
        allowed_origin: "http://localhost:3000".to_string(),
        fact_check_api_key: api_key.map(str::to_string),
        fact_check_endpoint: endpoint,
        search_timeout: Duration::from_secs(5),
        thumbnail_timeout: Duration::from_secs(2),
        cache_ttl: Duration::from_secs(3600),
        browse_query: "India".to_string(),
        default_language: "en".to_string(),
        browse_page_size: 10,
        search_page_size: 20,
        chat_page_size: 5,
        llm: None,
    }
}
