//! iNaturalist-compatible species reference client

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{SpeciesRecord, SpeciesReference};
use crate::config::SpeciesConfig;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

#[derive(Debug, Deserialize)]
struct TaxaResponse {
    #[serde(default)]
    results: Vec<ApiTaxon>,
}

#[derive(Debug, Deserialize)]
struct ApiTaxon {
    id: u64,
    name: String,
    #[serde(default)]
    preferred_common_name: Option<String>,
    #[serde(default)]
    wikipedia_summary: Option<String>,
}

impl From<ApiTaxon> for SpeciesRecord {
    fn from(taxon: ApiTaxon) -> Self {
        Self {
            id: taxon.id,
            scientific_name: taxon.name,
            common_name: taxon.preferred_common_name,
            summary: taxon
                .wikipedia_summary
                .map(|s| strip_html(&s))
                .filter(|s| !s.is_empty()),
        }
    }
}

fn strip_html(text: &str) -> String {
    HTML_TAG.replace_all(text, "").trim().to_string()
}

pub struct INaturalistClient {
    client: reqwest::Client,
    base_url: String,
}

impl INaturalistClient {
    pub fn new(config: &SpeciesConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("nature-quest/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch(&self, url: &str, query: &[(&str, String)]) -> Result<Vec<SpeciesRecord>> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        let body: TaxaResponse = response.json().await?;
        Ok(body.results.into_iter().map(SpeciesRecord::from).collect())
    }
}

#[async_trait::async_trait]
impl SpeciesReference for INaturalistClient {
    async fn search_by_name(&self, query: &str, limit: usize) -> Vec<SpeciesRecord> {
        let url = format!("{}/taxa/autocomplete", self.base_url);
        let params = [("q", query.to_string()), ("per_page", limit.to_string())];
        match self.fetch(&url, &params).await {
            Ok(mut records) => {
                records.truncate(limit);
                debug!("Species search '{}' returned {} results", query, records.len());
                records
            }
            Err(e) => {
                warn!("Species search '{}' failed: {}", query, e);
                Vec::new()
            }
        }
    }

    async fn get_by_id(&self, id: u64) -> Option<SpeciesRecord> {
        let url = format!("{}/taxa/{}", self.base_url, id);
        match self.fetch(&url, &[]).await {
            Ok(records) => records.into_iter().find(|r| r.id == id),
            Err(e) => {
                warn!("Species lookup {} failed: {}", id, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_taxa_response() {
        let json = r#"{
            "total_results": 1,
            "results": [{
                "id": 12727,
                "name": "Turdus migratorius",
                "preferred_common_name": "American Robin",
                "wikipedia_summary": "The <b>American robin</b> is a migratory songbird."
            }]
        }"#;
        let body: TaxaResponse = serde_json::from_str(json).unwrap();
        let record = SpeciesRecord::from(body.results.into_iter().next().unwrap());
        assert_eq!(record.common_name.as_deref(), Some("American Robin"));
        assert_eq!(record.summary.as_deref(), Some("The American robin is a migratory songbird."));
    }

    #[test]
    fn test_missing_optional_fields() {
        let json = r#"{"results": [{"id": 1, "name": "Fungi"}]}"#;
        let body: TaxaResponse = serde_json::from_str(json).unwrap();
        let record = SpeciesRecord::from(body.results.into_iter().next().unwrap());
        assert!(record.common_name.is_none());
        assert!(record.summary.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_service_degrades_to_empty() {
        let config = SpeciesConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..Default::default()
        };
        let client = INaturalistClient::new(&config).unwrap();
        assert!(client.search_by_name("robin", 5).await.is_empty());
        assert!(client.get_by_id(12727).await.is_none());
    }
}
