use std::env;
use std::time::Duration;

use anyhow::Result;
use tracing::warn;
use url::Url;

use crate::constants::{
    DEFAULT_DATASET_CACHE_TTL_MS, DEFAULT_DATASET_REFRESH_MS, DEFAULT_LANGUAGE, DEFAULT_PORT,
    DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_SPARQL_ENDPOINT,
};

#[derive(Clone)]
pub(crate) struct Config {
    pub(crate) sparql_endpoint: String,
    pub(crate) port: u16,
    pub(crate) request_timeout: Duration,
    pub(crate) dataset_cache_ttl: Duration,
    pub(crate) dataset_refresh: Duration,
    pub(crate) default_language: String,
}

impl Config {
    pub(crate) fn from_env() -> Result<Self> {
        let endpoint_override = read_env_first(&["SPARQL_ENDPOINT_URL", "SPARQL_ENDPOINT"]);
        let using_default_endpoint = endpoint_override.is_none();
        let sparql_endpoint =
            endpoint_override.unwrap_or_else(|| DEFAULT_SPARQL_ENDPOINT.to_string());
        if using_default_endpoint {
            warn!(
                "SPARQL_ENDPOINT_URL not set; defaulting to {}",
                DEFAULT_SPARQL_ENDPOINT
            );
        }
        if Url::parse(&sparql_endpoint).is_err() {
            warn!(
                "SPARQL endpoint {} does not parse as a URL; requests will fail",
                sparql_endpoint
            );
        }

        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let request_timeout = Duration::from_millis(
            env::var("SPARQL_TIMEOUT_MS")
                .ok()
                .and_then(|value| value.parse::<u64>().ok())
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
        );

        let dataset_cache_ttl = Duration::from_millis(
            env::var("DATASET_CACHE_TTL_MS")
                .ok()
                .and_then(|value| value.parse::<u64>().ok())
                .unwrap_or(DEFAULT_DATASET_CACHE_TTL_MS),
        );

        let dataset_refresh = Duration::from_millis(
            env::var("DATASET_REFRESH_MS")
                .ok()
                .and_then(|value| value.parse::<u64>().ok())
                .unwrap_or(DEFAULT_DATASET_REFRESH_MS),
        );

        let default_language = read_env_first(&["DEFAULT_LANGUAGE"])
            .map(|value| value.to_lowercase())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        Ok(Self {
            sparql_endpoint,
            port,
            request_timeout,
            dataset_cache_ttl,
            dataset_refresh,
            default_language,
        })
    }
}

pub(crate) fn read_env_first(keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Ok(value) = env::var(key) {
            let trimmed = value.trim().to_string();
            if !trimmed.is_empty() {
                return Some(trimmed);
            }
        }
    }
    None
}
