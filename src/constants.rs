pub(crate) const DEFAULT_PORT: u16 = 8080;
pub(crate) const DEFAULT_SPARQL_ENDPOINT: &str = "https://query.wikidata.org/sparql";
pub(crate) const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub(crate) const DEFAULT_DATASET_CACHE_TTL_MS: u64 = 300_000;
pub(crate) const DEFAULT_DATASET_REFRESH_MS: u64 = 300_000;
pub(crate) const DEFAULT_LANGUAGE: &str = "en";
pub(crate) const DEFAULT_STATIC_DIR: &str = "./static";

// The Wikidata query service rejects anonymous user agents.
pub(crate) const SPARQL_USER_AGENT: &str = "prop-browse/0.1";
