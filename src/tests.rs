use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use crate::config::Config;
use crate::constants::DEFAULT_STATIC_DIR;
use crate::handlers::refresh_page_caches;
use crate::models::{class_records, DatasetPayload, RecordPayload, SparqlResults};
use crate::server::build_router;
use crate::sparql::SparqlClient;
use crate::state::AppState;
use crate::util::{normalize_language, now_ms};

fn test_config() -> Config {
    Config {
        sparql_endpoint: "http://127.0.0.1:1".to_string(),
        port: 0,
        request_timeout: Duration::from_millis(200),
        dataset_cache_ttl: Duration::from_millis(60_000),
        dataset_refresh: Duration::from_millis(60_000),
        default_language: "en".to_string(),
    }
}

fn test_state() -> Arc<AppState> {
    let config = test_config();
    let sparql = SparqlClient::new(config.sparql_endpoint.clone(), config.request_timeout)
        .expect("sparql client");
    AppState::new(config, sparql)
}

fn test_app(state: Arc<AppState>) -> axum::Router {
    build_router(state, DEFAULT_STATIC_DIR.to_string())
}

fn sample_dataset(ts: u64) -> DatasetPayload {
    DatasetPayload {
        total: 2,
        records: vec![
            RecordPayload {
                key: "P31".to_string(),
                columns: vec!["instance of".to_string()],
                href: "class.html?class=P31".to_string(),
            },
            RecordPayload {
                key: "P279".to_string(),
                columns: vec!["subclass of".to_string()],
                href: "class.html?class=P279".to_string(),
            },
        ],
        ts,
    }
}

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let app = test_app(test_state());
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .expect("health response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = response
        .into_body()
        .collect()
        .await
        .expect("health body")
        .to_bytes();
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn classes_dataset_served_from_cache() {
    let state = test_state();
    state.store_classes("en", sample_dataset(now_ms())).await;

    let app = test_app(state);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/classes")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("classes response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("application/json")
    );

    let body = response
        .into_body()
        .collect()
        .await
        .expect("classes body")
        .to_bytes();
    let value: serde_json::Value = serde_json::from_slice(&body).expect("classes json");
    assert_eq!(value["total"], 2);
    let rows = value["records"].as_array().expect("records array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["key"], "P31");
    assert_eq!(rows[0]["columns"][0], "instance of");
    assert_eq!(rows[0]["href"], "class.html?class=P31");
}

#[tokio::test]
async fn classes_dataset_keyed_by_language() {
    let state = test_state();
    state.store_classes("fr", sample_dataset(now_ms())).await;

    let app = test_app(Arc::clone(&state));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/classes?language=fr")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("classes fr response");
    assert_eq!(response.status(), StatusCode::OK);

    // The en cache is cold and the test endpoint unreachable.
    let app = test_app(state);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/classes")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("classes en response");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn expired_dataset_served_stale_when_refresh_fails() {
    let state = test_state();
    // ts far in the past, so the entry is expired on arrival.
    state.store_classes("en", sample_dataset(1)).await;

    let app = test_app(state);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/classes")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("stale classes response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = response
        .into_body()
        .collect()
        .await
        .expect("stale classes body")
        .to_bytes();
    let value: serde_json::Value = serde_json::from_slice(&body).expect("stale classes json");
    assert_eq!(value["records"][0]["key"], "P31");
}

#[tokio::test]
async fn wikiprojects_dataset_served_from_cache() {
    let state = test_state();
    let payload = DatasetPayload {
        total: 1,
        records: vec![RecordPayload {
            key: "Wikidata:WikiProject Chemistry".to_string(),
            columns: vec!["Wikidata:WikiProject Chemistry".to_string()],
            href: "https://www.wikidata.org/wiki/Wikidata:WikiProject Chemistry".to_string(),
        }],
        ts: now_ms(),
    };
    state.store_wikiprojects(payload).await;

    let app = test_app(state);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/wikiprojects")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("wikiprojects response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = response
        .into_body()
        .collect()
        .await
        .expect("wikiprojects body")
        .to_bytes();
    let value: serde_json::Value = serde_json::from_slice(&body).expect("wikiprojects json");
    assert_eq!(value["total"], 1);
    assert_eq!(
        value["records"][0]["key"],
        "Wikidata:WikiProject Chemistry"
    );
}

#[tokio::test]
async fn listing_pages_render_with_anchors() {
    let app = test_app(test_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/classes")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("classes page response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = response
        .into_body()
        .collect()
        .await
        .expect("classes page body")
        .to_bytes();
    let html = String::from_utf8_lossy(&body);
    assert!(html.contains("classes-scroll-container"));
    assert!(html.contains("classes-search"));
    assert!(html.contains("classes-count"));
    assert!(!html.contains("classes-initial-data"));
}

#[tokio::test]
async fn refreshed_page_embeds_initial_dataset() {
    let state = test_state();
    state.store_classes("en", sample_dataset(now_ms())).await;
    refresh_page_caches(&state).await;

    let app = test_app(state);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/classes.html")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("classes page response");
    let body = response
        .into_body()
        .collect()
        .await
        .expect("classes page body")
        .to_bytes();
    let html = String::from_utf8_lossy(&body);
    assert!(html.contains("classes-initial-data"));
    assert!(html.contains("\"key\":\"P31\""));
}

#[test]
fn class_records_strip_entity_prefix_and_keep_order() {
    let envelope = serde_json::json!({
        "head": { "vars": ["item", "label"] },
        "results": { "bindings": [
            {
                "item": { "type": "uri", "value": "http://www.wikidata.org/entity/Q5" },
                "label": { "type": "literal", "value": "human" }
            },
            {
                "item": { "type": "uri", "value": "http://www.wikidata.org/entity/Q11344" }
            },
            {
                "label": { "type": "literal", "value": "orphan label" }
            }
        ] }
    });
    let results: SparqlResults = serde_json::from_value(envelope).expect("sparql envelope");
    let records = class_records(&results);

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].key, "Q5");
    assert_eq!(records[0].columns, vec!["human".to_string()]);
    assert_eq!(records[0].href, "class.html?class=Q5");
    // No label binding: columns stay empty so display falls back to the key.
    assert_eq!(records[1].key, "Q11344");
    assert!(records[1].columns.is_empty());
}

#[test]
fn language_codes_are_validated() {
    assert_eq!(normalize_language(None), "en");
    assert_eq!(normalize_language(Some("")), "en");
    assert_eq!(normalize_language(Some("  FR ")), "fr");
    assert_eq!(normalize_language(Some("pt-br")), "pt-br");
    assert_eq!(normalize_language(Some("zh-hant")), "zh-hant");
    assert_eq!(normalize_language(Some("x")), "en");
    assert_eq!(normalize_language(Some("en\"){ drop }")), "en");
    assert_eq!(normalize_language(Some("abcd")), "en");
}
