use std::sync::Arc;

use anyhow::Result;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::warn;

use prop_browse::{render_classes, render_wikiprojects};

use crate::models::{class_records, wikiproject_records, DatasetPayload};
use crate::sparql::{classes_query, wikiprojects_query};
use crate::state::AppState;
use crate::util::{normalize_language, now_ms};

#[derive(Deserialize)]
pub(crate) struct DatasetParams {
    language: Option<String>,
}

pub(crate) async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub(crate) async fn index_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    html_response(state.index_html.clone())
}

pub(crate) async fn classes_page_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let html = state.classes_html.read().await.clone();
    html_response(html)
}

pub(crate) async fn wikiprojects_page_handler(
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let html = state.wikiprojects_html.read().await.clone();
    html_response(html)
}

pub(crate) async fn classes_dataset_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DatasetParams>,
) -> Response {
    let language = normalize_language(params.language.as_deref());
    let now = now_ms();
    let ttl = state.config.dataset_cache_ttl.as_millis() as u64;

    let stale = state.cached_classes(&language).await;
    if let Some(entry) = stale.as_ref() {
        if now.saturating_sub(entry.ts_ms) < ttl {
            return json_response(&entry.payload);
        }
    }

    match refresh_classes_dataset(&state, &language).await {
        Ok(payload) => json_response(&payload),
        Err(err) => {
            // Serve the expired entry over an error while upstream is down.
            if let Some(entry) = stale {
                warn!(?err, language = %language, "classes refresh failed; serving stale dataset");
                return json_response(&entry.payload);
            }
            error_response(err.to_string())
        }
    }
}

pub(crate) async fn wikiprojects_dataset_handler(State(state): State<Arc<AppState>>) -> Response {
    let now = now_ms();
    let ttl = state.config.dataset_cache_ttl.as_millis() as u64;

    let stale = state.cached_wikiprojects().await;
    if let Some(entry) = stale.as_ref() {
        if now.saturating_sub(entry.ts_ms) < ttl {
            return json_response(&entry.payload);
        }
    }

    match refresh_wikiprojects_dataset(&state).await {
        Ok(payload) => json_response(&payload),
        Err(err) => {
            if let Some(entry) = stale {
                warn!(?err, "wikiprojects refresh failed; serving stale dataset");
                return json_response(&entry.payload);
            }
            error_response(err.to_string())
        }
    }
}

pub(crate) async fn options_handler() -> impl IntoResponse {
    (StatusCode::NO_CONTENT, cors_headers())
}

pub(crate) async fn refresh_classes_dataset(
    state: &AppState,
    language: &str,
) -> Result<DatasetPayload> {
    let results = state.sparql.select(&classes_query(language)).await?;
    let records = class_records(&results);
    let payload = DatasetPayload {
        total: records.len(),
        records,
        ts: now_ms(),
    };
    state.store_classes(language, payload.clone()).await;
    Ok(payload)
}

pub(crate) async fn refresh_wikiprojects_dataset(state: &AppState) -> Result<DatasetPayload> {
    let results = state.sparql.select(&wikiprojects_query()).await?;
    let records = wikiproject_records(&results);
    let payload = DatasetPayload {
        total: records.len(),
        records,
        ts: now_ms(),
    };
    state.store_wikiprojects(payload.clone()).await;
    Ok(payload)
}

// Re-render the cached pages so first paint ships with an embedded dataset
// instead of a fetch round-trip.
pub(crate) async fn refresh_page_caches(state: &Arc<AppState>) {
    let classes_payload = state
        .cached_classes(&state.config.default_language)
        .await
        .and_then(|entry| serialize_payload_for_html(&entry.payload));
    {
        let html = render_classes(&state.cache_bust, classes_payload.as_deref());
        let mut cache = state.classes_html.write().await;
        *cache = Bytes::from(html);
    }

    let wikiprojects_payload = state
        .cached_wikiprojects()
        .await
        .and_then(|entry| serialize_payload_for_html(&entry.payload));
    {
        let html = render_wikiprojects(&state.cache_bust, wikiprojects_payload.as_deref());
        let mut cache = state.wikiprojects_html.write().await;
        *cache = Bytes::from(html);
    }
}

fn serialize_payload_for_html(payload: &DatasetPayload) -> Option<String> {
    let json = serde_json::to_string(payload).ok()?;
    if json.contains("</") {
        Some(json.replace("</", "<\\/"))
    } else {
        Some(json)
    }
}

fn html_response(html: Bytes) -> Response {
    let mut response = Response::new(Body::from(html));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response
}

fn json_response<T: Serialize>(payload: &T) -> Response {
    let body = match serde_json::to_string(payload) {
        Ok(body) => body,
        Err(err) => return error_response(err.to_string()),
    };
    let mut headers = cors_headers();
    headers.insert("Content-Type", HeaderValue::from_static("application/json"));
    headers.insert(
        "Cache-Control",
        HeaderValue::from_static(
            "public, s-maxage=60, stale-while-revalidate=60, stale-if-error=300",
        ),
    );
    (StatusCode::OK, headers, body).into_response()
}

fn error_response(message: String) -> Response {
    let headers = cors_headers();
    (StatusCode::INTERNAL_SERVER_ERROR, headers, message).into_response()
}

fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type"),
    );
    headers
}
