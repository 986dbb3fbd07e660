//! Taxon enrichment cache keyed by species id

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::{MinIntervalGate, SpeciesRecord, SpeciesReference, TaxonInfo};
use crate::storage::{self, keys, KeyValueStore};

type CacheMap = HashMap<String, TaxonInfo>;

pub struct TaxonCache {
    store: Arc<dyn KeyValueStore>,
    reference: Arc<dyn SpeciesReference>,
    gate: MinIntervalGate,
}

impl TaxonCache {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        reference: Arc<dyn SpeciesReference>,
        gate: MinIntervalGate,
    ) -> Self {
        Self { store, reference, gate }
    }

    /// Taxon info for an id: from the cache, else one throttled lookup.
    /// Only successful lookups are cached.
    pub async fn get(&self, taxon_id: u64) -> Option<TaxonInfo> {
        let key = taxon_id.to_string();
        let mut cached: CacheMap = storage::load_or_default(self.store.as_ref(), keys::TAXON_INFO_CACHE).await;
        if let Some(info) = cached.get(&key) {
            return Some(info.clone());
        }

        self.gate.wait().await;
        let record = self.reference.get_by_id(taxon_id).await?;
        let info = TaxonInfo::from(&record);
        debug!("Caching taxon {} as {}", taxon_id, info.name);

        cached.insert(key, info.clone());
        storage::save_logged(self.store.as_ref(), keys::TAXON_INFO_CACHE, &cached).await;
        Some(info)
    }

    /// Throttled name search; results are not cached
    pub async fn search(&self, query: &str, limit: usize) -> Vec<SpeciesRecord> {
        if query.trim().is_empty() || limit == 0 {
            return Vec::new();
        }
        self.gate.wait().await;
        self.reference.search_by_name(query, limit).await
    }

    /// Everything cached so far
    pub async fn entries(&self) -> CacheMap {
        storage::load_or_default(self.store.as_ref(), keys::TAXON_INFO_CACHE).await
    }
}
