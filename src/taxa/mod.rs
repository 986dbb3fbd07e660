//! Species reference lookups
//!
//! The engines never talk to the network directly. Lookups go through the
//! [`SpeciesReference`] collaborator, are rate limited by a
//! [`MinIntervalGate`], and successful results are cached by id in the
//! `taxon-info-cache` key.

pub mod cache;
pub mod inaturalist;
pub mod throttle;

use serde::{Deserialize, Serialize};

pub use cache::TaxonCache;
pub use inaturalist::INaturalistClient;
pub use throttle::MinIntervalGate;

/// A taxon as returned by the species reference service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesRecord {
    pub id: u64,
    pub scientific_name: String,
    pub common_name: Option<String>,
    pub summary: Option<String>,
}

impl SpeciesRecord {
    /// Display name, preferring the common name
    pub fn display_name(&self) -> &str {
        self.common_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.scientific_name)
    }
}

/// Cached enrichment data for a taxon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl From<&SpeciesRecord> for TaxonInfo {
    fn from(record: &SpeciesRecord) -> Self {
        Self {
            name: record.display_name().to_string(),
            summary: record.summary.clone(),
        }
    }
}

/// External species reference service.
///
/// Implementations swallow their own failures: an unreachable service looks
/// like an empty result.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SpeciesReference: Send + Sync {
    async fn search_by_name(&self, query: &str, limit: usize) -> Vec<SpeciesRecord>;

    async fn get_by_id(&self, id: u64) -> Option<SpeciesRecord>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_common_name() {
        let mut record = SpeciesRecord {
            id: 1,
            scientific_name: "Turdus migratorius".into(),
            common_name: Some("American robin".into()),
            summary: None,
        };
        assert_eq!(record.display_name(), "American robin");

        record.common_name = Some(String::new());
        assert_eq!(record.display_name(), "Turdus migratorius");

        let info = TaxonInfo::from(&record);
        assert_eq!(info.name, "Turdus migratorius");
    }

    #[test]
    fn test_taxon_info_shape() {
        let info = TaxonInfo { name: "Robin".into(), summary: None };
        assert_eq!(serde_json::to_string(&info).unwrap(), r#"{"name":"Robin"}"#);
    }
}
