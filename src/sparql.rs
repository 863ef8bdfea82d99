use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::constants::SPARQL_USER_AGENT;
use crate::models::SparqlResults;

#[derive(Clone)]
pub(crate) struct SparqlClient {
    client: reqwest::Client,
    endpoint: String,
}

impl SparqlClient {
    pub(crate) fn new(endpoint: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(SPARQL_USER_AGENT)
            .build()
            .context("Failed to build SPARQL client")?;
        Ok(Self { client, endpoint })
    }

    pub(crate) async fn select(&self, query: &str) -> Result<SparqlResults> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("query", query), ("format", "json")])
            .header("Accept", "application/sparql-results+json")
            .send()
            .await
            .context("SPARQL request failed")?;

        if !response.status().is_success() {
            return Err(anyhow!("SPARQL query failed ({})", response.status()));
        }

        response
            .json()
            .await
            .context("Invalid SPARQL result envelope")
    }
}

// Two-branch union: subjects carrying property constraints, and the
// classes that properties are instances of. Labels are optional so rows
// without one in the requested language still come through.
pub(crate) fn classes_query(language: &str) -> String {
    format!(
        r#"PREFIX wikibase: <http://wikiba.se/ontology#>
SELECT DISTINCT ?item ?label
{{
  {{
    SELECT ?item ?label
    WHERE
    {{
      ?item wdt:P1963 [].
      OPTIONAL{{ ?item rdfs:label ?label FILTER (lang(?label)="{language}").}}.
    }}
  }}
  UNION
  {{
    SELECT ?item ?label
    WHERE
    {{
      ?property a wikibase:Property;
                wdt:P31 ?item.
      OPTIONAL{{ ?item rdfs:label ?label FILTER (lang(?label)="{language}").}}.
    }}
  }}
}}
ORDER by ?label
"#
    )
}

pub(crate) fn wikiprojects_query() -> String {
    r#"SELECT DISTINCT ?title WHERE {
  SERVICE wikibase:mwapi {
    bd:serviceParam wikibase:api "Search" .
    bd:serviceParam wikibase:endpoint "www.wikidata.org" .
    bd:serviceParam mwapi:srsearch "Wikidata:WikiProject" .
    ?title wikibase:apiOutput mwapi:title .
  }
  FILTER(contains(?title, "Wikidata:WikiProject" )).
}
"#
    .to_string()
}
