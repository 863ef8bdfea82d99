use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub(crate) const ENTITY_PREFIX: &str = "http://www.wikidata.org/entity/";

#[derive(Clone)]
pub(crate) struct CachedPayload<T> {
    pub(crate) ts_ms: u64,
    pub(crate) payload: T,
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DatasetPayload {
    pub(crate) total: usize,
    pub(crate) records: Vec<RecordPayload>,
    pub(crate) ts: u64,
}

#[derive(Clone, Serialize)]
pub(crate) struct RecordPayload {
    pub(crate) key: String,
    pub(crate) columns: Vec<String>,
    pub(crate) href: String,
}

#[derive(Deserialize)]
pub(crate) struct SparqlResults {
    #[serde(default)]
    pub(crate) results: SparqlBindings,
}

#[derive(Default, Deserialize)]
pub(crate) struct SparqlBindings {
    #[serde(default)]
    pub(crate) bindings: Vec<HashMap<String, SparqlValue>>,
}

#[derive(Deserialize)]
pub(crate) struct SparqlValue {
    pub(crate) value: String,
}

pub(crate) fn class_records(results: &SparqlResults) -> Vec<RecordPayload> {
    results
        .results
        .bindings
        .iter()
        .filter_map(|binding| {
            let item = binding.get("item")?;
            let key = item
                .value
                .strip_prefix(ENTITY_PREFIX)
                .unwrap_or(&item.value);
            if key.is_empty() {
                return None;
            }
            let columns = binding
                .get("label")
                .map(|label| vec![label.value.clone()])
                .unwrap_or_default();
            Some(RecordPayload {
                key: key.to_string(),
                columns,
                href: format!("class.html?class={}", key),
            })
        })
        .collect()
}

pub(crate) fn wikiproject_records(results: &SparqlResults) -> Vec<RecordPayload> {
    results
        .results
        .bindings
        .iter()
        .filter_map(|binding| {
            let title = binding.get("title")?;
            if title.value.is_empty() {
                return None;
            }
            Some(RecordPayload {
                key: title.value.clone(),
                columns: vec![title.value.clone()],
                href: format!("https://www.wikidata.org/wiki/{}", title.value),
            })
        })
        .collect()
}
