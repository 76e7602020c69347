//! HTTP routes over the fetch orchestrator.
//!
//! Every resource route reads `page` and `limit` from the query string,
//! asks the orchestrator for that page, and copies the result into the JSON
//! envelope plus two headers:
//!
//! - `x-data-source`: `cache`, `scrape` or `error`
//! - `x-fetched-at`: ISO-8601 UTC rendering of `fetchedAt`
//!
//! Upstream failures never surface as 5xx; they arrive as a well-formed
//! envelope with `source: "error"`.
//!
//! # Routes
//!
//! | Route | Resource | Default `limit` |
//! |-------|----------|-----------------|
//! | `GET /` | health check, no key required | |
//! | `GET /vlr/matches` | matches | 10 |
//! | `GET /vlr/results` | results | 50 |
//! | `GET /vlr/news` | news | 30 |
//! | `GET /quotes` | quotes | 10 |

use crate::models::{FetchResult, ResourceType};
use crate::orchestrator::Orchestrator;
use axum::extract::{Query, Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::SecondsFormat;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

/// Largest `limit` a caller may ask for.
pub const MAX_LIMIT: u32 = 50;

const API_KEY_HEADER: &str = "x-api-key";
static DATA_SOURCE: HeaderName = HeaderName::from_static("x-data-source");
static FETCHED_AT: HeaderName = HeaderName::from_static("x-fetched-at");

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Key callers must present; `None` rejects every guarded request.
    pub api_key: Option<Arc<str>>,
}

/// Build the router with all routes and layers.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let guarded = Router::new()
        .route("/vlr/matches", get(matches))
        .route("/vlr/results", get(results))
        .route("/vlr/news", get(news))
        .route("/quotes", get(quotes))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/", get(health))
        .merge(guarded)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Pagination parameters shared by every resource route.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    /// Apply defaults for `resource` and check bounds.
    pub fn resolve(&self, resource: ResourceType) -> Result<(u32, u32), String> {
        let page = self.page.unwrap_or(1);
        if page < 1 {
            return Err("page must be at least 1".to_string());
        }
        let limit = self.limit.unwrap_or_else(|| resource.default_limit());
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(format!("limit must be between 1 and {MAX_LIMIT}"));
        }
        Ok((page, limit))
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn matches(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Response {
    serve(&state, ResourceType::Matches, &query).await
}

async fn results(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Response {
    serve(&state, ResourceType::Results, &query).await
}

async fn news(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Response {
    serve(&state, ResourceType::News, &query).await
}

async fn quotes(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Response {
    serve(&state, ResourceType::Quotes, &query).await
}

async fn serve(state: &AppState, resource: ResourceType, query: &PageQuery) -> Response {
    let (page, limit) = match query.resolve(resource) {
        Ok(resolved) => resolved,
        Err(message) => {
            debug!(%resource, ?query, %message, "Rejected query");
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response();
        }
    };
    let result = state.orchestrator.fetch(resource, page, limit).await;
    envelope(result)
}

/// Render a [`FetchResult`] as the JSON envelope with provenance headers.
fn envelope(result: FetchResult) -> Response {
    let source = HeaderValue::from_static(result.provenance.as_str());
    let fetched_at = result
        .fetched_at
        .to_rfc3339_opts(SecondsFormat::Millis, true);

    let mut response = Json(result).into_response();
    let headers = response.headers_mut();
    headers.insert(DATA_SOURCE.clone(), source);
    match HeaderValue::from_str(&fetched_at) {
        Ok(value) => {
            headers.insert(FETCHED_AT.clone(), value);
        }
        Err(e) => warn!(%fetched_at, error = %e, "Unrenderable fetched-at header"),
    }
    response
}

async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authorized = match (state.api_key.as_deref(), request.headers().get(API_KEY_HEADER)) {
        (Some(expected), Some(presented)) => presented.as_bytes() == expected.as_bytes(),
        _ => false,
    };
    if authorized {
        return next.run(request).await;
    }
    warn!(path = %request.uri().path(), "Rejected request without a valid API key");
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" }))).into_response()
}
