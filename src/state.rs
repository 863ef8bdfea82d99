use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::RwLock;

use prop_browse::{render_classes, render_index, render_wikiprojects};

use crate::config::Config;
use crate::models::{CachedPayload, DatasetPayload};
use crate::sparql::SparqlClient;
use crate::util::now_ms;

pub(crate) struct AppState {
    pub(crate) classes_cache: RwLock<HashMap<String, CachedPayload<DatasetPayload>>>,
    pub(crate) wikiprojects_cache: RwLock<Option<CachedPayload<DatasetPayload>>>,
    pub(crate) index_html: Bytes,
    pub(crate) classes_html: RwLock<Bytes>,
    pub(crate) wikiprojects_html: RwLock<Bytes>,
    pub(crate) cache_bust: String,
    pub(crate) sparql: SparqlClient,
    pub(crate) config: Config,
}

impl AppState {
    pub(crate) fn new(config: Config, sparql: SparqlClient) -> Arc<Self> {
        let cache_bust = now_ms().to_string();
        let index_html = render_index(&cache_bust);
        let classes_html = render_classes(&cache_bust, None);
        let wikiprojects_html = render_wikiprojects(&cache_bust, None);
        Arc::new(Self {
            classes_cache: RwLock::new(HashMap::new()),
            wikiprojects_cache: RwLock::new(None),
            index_html: Bytes::from(index_html),
            classes_html: RwLock::new(Bytes::from(classes_html)),
            wikiprojects_html: RwLock::new(Bytes::from(wikiprojects_html)),
            cache_bust,
            sparql,
            config,
        })
    }

    pub(crate) async fn cached_classes(&self, language: &str) -> Option<CachedPayload<DatasetPayload>> {
        self.classes_cache.read().await.get(language).cloned()
    }

    pub(crate) async fn store_classes(&self, language: &str, payload: DatasetPayload) {
        let mut cache = self.classes_cache.write().await;
        cache.insert(
            language.to_string(),
            CachedPayload {
                ts_ms: payload.ts,
                payload,
            },
        );
    }

    pub(crate) async fn cached_wikiprojects(&self) -> Option<CachedPayload<DatasetPayload>> {
        self.wikiprojects_cache.read().await.clone()
    }

    pub(crate) async fn store_wikiprojects(&self, payload: DatasetPayload) {
        let mut cache = self.wikiprojects_cache.write().await;
        *cache = Some(CachedPayload {
            ts_ms: payload.ts,
            payload,
        });
    }
}
